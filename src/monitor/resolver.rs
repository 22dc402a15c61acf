//! Resolution of a VM instance identifier from a process command line
//!
//! The identifier is the argument following a flag token (`-uuid` for
//! QEMU) in the process's NUL-separated argument vector. The process may
//! already be gone by the time it is read; every failure degrades to an
//! empty identifier.

use crate::models::InstanceId;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;

/// Resolves the instance identifier of a process
pub trait IdentityResolver {
    /// Returns an empty identifier when nothing can be resolved
    fn resolve(&self, pid: i32) -> InstanceId;
}

impl<R: IdentityResolver + ?Sized> IdentityResolver for &R {
    fn resolve(&self, pid: i32) -> InstanceId {
        (**self).resolve(pid)
    }
}

/// Reads `<proc_root>/<pid>/cmdline`
#[derive(Debug, Clone)]
pub struct CmdlineResolver {
    proc_root: PathBuf,
    flag: String,
}

impl CmdlineResolver {
    pub fn new(proc_root: impl Into<PathBuf>, flag: impl Into<String>) -> Self {
        Self {
            proc_root: proc_root.into(),
            flag: flag.into(),
        }
    }

    fn cmdline_path(&self, pid: i32) -> PathBuf {
        self.proc_root.join(pid.to_string()).join("cmdline")
    }
}

impl IdentityResolver for CmdlineResolver {
    fn resolve(&self, pid: i32) -> InstanceId {
        if pid <= 0 {
            return InstanceId::empty();
        }

        let path = self.cmdline_path(pid);
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(e) => {
                // Process exited or is not readable; not a fault
                log::debug!("Cannot open {}: {}", path.display(), e);
                return InstanceId::empty();
            }
        };

        match find_flag_value(BufReader::new(file), &self.flag) {
            Some(id) => id,
            None => {
                log::debug!("No {} argument in command line of pid {}", self.flag, pid);
                InstanceId::empty()
            }
        }
    }
}

/// Scan NUL-separated arguments for `flag` and return the argument after it.
///
/// Stops at the first occurrence. Returns `None` when the flag is missing,
/// is the last argument, or the reader fails part way.
pub fn find_flag_value<R: BufRead>(reader: R, flag: &str) -> Option<InstanceId> {
    let mut args = reader.split(b'\0');

    while let Some(arg) = args.next() {
        let arg = match arg {
            Ok(arg) => arg,
            Err(e) => {
                log::debug!("Failed reading command line: {}", e);
                return None;
            }
        };

        if arg == flag.as_bytes() {
            return match args.next() {
                Some(Ok(value)) => Some(InstanceId::from_bytes(&value)),
                Some(Err(e)) => {
                    log::debug!("Failed reading command line: {}", e);
                    None
                }
                None => None,
            };
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Cursor;
    use std::path::Path;
    use tempfile::TempDir;

    fn cmdline(args: &[&str]) -> Vec<u8> {
        let mut bytes = Vec::new();
        for arg in args {
            bytes.extend_from_slice(arg.as_bytes());
            bytes.push(0);
        }
        bytes
    }

    fn fake_proc(pid: i32, args: &[&str]) -> TempDir {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join(pid.to_string());
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("cmdline"), cmdline(args)).unwrap();
        root
    }

    // ==================== find_flag_value() tests ====================

    #[test]
    fn test_value_after_flag_is_returned() {
        let bytes = cmdline(&["qemu-system-x86_64", "-uuid", "abcd-1234", "-smp", "2"]);
        let id = find_flag_value(Cursor::new(bytes), "-uuid");

        assert_eq!(id, Some(InstanceId::new("abcd-1234")));
    }

    #[test]
    fn test_missing_flag_returns_none() {
        let bytes = cmdline(&["qemu-system-x86_64", "-smp", "2"]);
        assert_eq!(find_flag_value(Cursor::new(bytes), "-uuid"), None);
    }

    #[test]
    fn test_trailing_flag_returns_none() {
        let bytes = cmdline(&["qemu-system-x86_64", "-uuid"]);
        assert_eq!(find_flag_value(Cursor::new(bytes), "-uuid"), None);
    }

    #[test]
    fn test_first_occurrence_wins() {
        let bytes = cmdline(&["qemu", "-uuid", "first", "-uuid", "second"]);
        assert_eq!(find_flag_value(Cursor::new(bytes), "-uuid"), Some(InstanceId::new("first")));
    }

    #[test]
    fn test_flag_must_match_exactly() {
        let bytes = cmdline(&["qemu", "-uuidx", "nope", "--uuid", "nope"]);
        assert_eq!(find_flag_value(Cursor::new(bytes), "-uuid"), None);
    }

    #[test]
    fn test_flag_as_value_of_flag() {
        let bytes = cmdline(&["qemu", "-uuid", "-uuid"]);
        assert_eq!(find_flag_value(Cursor::new(bytes), "-uuid"), Some(InstanceId::new("-uuid")));
    }

    #[test]
    fn test_value_without_trailing_nul() {
        let bytes = b"qemu\0-uuid\0abcd".to_vec();
        assert_eq!(find_flag_value(Cursor::new(bytes), "-uuid"), Some(InstanceId::new("abcd")));
    }

    #[test]
    fn test_empty_value_after_flag() {
        let bytes = cmdline(&["qemu", "-uuid", ""]);
        assert_eq!(find_flag_value(Cursor::new(bytes), "-uuid"), Some(InstanceId::empty()));
    }

    #[test]
    fn test_long_value_is_truncated() {
        let long = "0123456789abcdef0123456789abcdef0123456789";
        let bytes = cmdline(&["qemu", "-uuid", long]);
        let id = find_flag_value(Cursor::new(bytes), "-uuid").unwrap();

        assert_eq!(id.as_str(), &long[..36]);
    }

    // ==================== CmdlineResolver tests ====================

    #[test]
    fn test_resolve_from_fake_proc() {
        let root = fake_proc(4321, &["qemu-system-x86_64", "-uuid", "abcd-1234", "-smp", "2"]);
        let resolver = CmdlineResolver::new(root.path(), "-uuid");

        assert_eq!(resolver.resolve(4321).as_str(), "abcd-1234");
    }

    #[test]
    fn test_resolve_missing_process_is_empty() {
        let root = tempfile::tempdir().unwrap();
        let resolver = CmdlineResolver::new(root.path(), "-uuid");

        assert!(resolver.resolve(9999).is_empty());
    }

    #[test]
    fn test_resolve_non_positive_pid_is_empty() {
        let root = fake_proc(0, &["qemu", "-uuid", "should-not-read"]);
        let resolver = CmdlineResolver::new(root.path(), "-uuid");

        assert!(resolver.resolve(0).is_empty());
        assert!(resolver.resolve(-1).is_empty());
    }

    #[test]
    fn test_resolve_with_custom_flag() {
        let root = fake_proc(12, &["cloud-hypervisor", "--id", "vm-7"]);
        let resolver = CmdlineResolver::new(root.path(), "--id");

        assert_eq!(resolver.resolve(12).as_str(), "vm-7");
    }

    #[test]
    fn test_resolve_empty_cmdline() {
        // Kernel threads and zombies expose an empty cmdline
        let root = fake_proc(2, &[]);
        let resolver = CmdlineResolver::new(root.path(), "-uuid");

        assert!(resolver.resolve(2).is_empty());
    }

    #[test]
    fn test_resolve_current_process_without_flag() {
        let resolver = CmdlineResolver::new("/proc", "-uuid-flag-not-present");
        if Path::new("/proc/self/cmdline").exists() {
            assert!(resolver.resolve(std::process::id() as i32).is_empty());
        }
    }
}
