//! Hotplug notification source backed by a `NETLINK_KOBJECT_UEVENT` socket
//!
//! Two encodings arrive on this socket family:
//! - udev daemon group: a `libudev\0` header followed by a block of
//!   `KEY=VALUE\0` properties located by the header
//! - kernel group: `ACTION@DEVPATH\0` followed by `KEY=VALUE\0` properties

use crate::constants::{PROP_SUBSYSTEM, UEVENT_BUFFER_SIZE};
use crate::models::{MonitorError, RawNotification};
use nix::errno::Errno;
use nix::poll::{poll, PollFd, PollFlags};
use nix::sys::socket::{
    bind, recv, socket, AddressFamily, MsgFlags, NetlinkAddr, SockFlag, SockProtocol, SockType,
};
use serde::{Deserialize, Serialize};
use std::os::fd::{AsRawFd, OwnedFd};

const UDEV_PREFIX: &[u8] = b"libudev\0";
const UDEV_MAGIC: u32 = 0xfeed_cafe;
const UDEV_PROPERTIES_OFF: usize = 16;
const UDEV_PROPERTIES_LEN: usize = 20;

/// Yields raw hotplug notifications without blocking
pub trait NotificationSource {
    /// Whether a notification can be received right now
    fn is_ready(&mut self) -> Result<bool, MonitorError>;

    /// Receive the next available notification, `None` when drained
    fn receive(&mut self) -> Result<Option<RawNotification>, MonitorError>;
}

/// Netlink multicast group to listen on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetlinkGroup {
    /// Raw kernel uevents
    Kernel,
    /// Events re-broadcast by the udev daemon after rule processing
    #[default]
    Udev,
}

impl NetlinkGroup {
    fn mask(self) -> u32 {
        match self {
            NetlinkGroup::Kernel => 1,
            NetlinkGroup::Udev => 2,
        }
    }
}

/// Non-blocking uevent socket, optionally filtered by subsystem
pub struct UeventSocket {
    fd: OwnedFd,
    buffer: Vec<u8>,
    subsystem: Option<String>,
}

impl UeventSocket {
    /// Open and bind the socket. Failure here is a setup error.
    pub fn open(group: NetlinkGroup, subsystem: Option<String>) -> Result<Self, MonitorError> {
        let fd = socket(
            AddressFamily::Netlink,
            SockType::Datagram,
            SockFlag::SOCK_NONBLOCK | SockFlag::SOCK_CLOEXEC,
            SockProtocol::NetlinkKObjectUEvent,
        )
        .map_err(MonitorError::SourceSetup)?;

        // Port id 0 lets the kernel assign one
        let addr = NetlinkAddr::new(0, group.mask());
        bind(fd.as_raw_fd(), &addr).map_err(MonitorError::SourceSetup)?;

        log::debug!("Listening for uevents on netlink group {:?}", group);

        Ok(Self {
            fd,
            buffer: vec![0; UEVENT_BUFFER_SIZE],
            subsystem,
        })
    }
}

impl NotificationSource for UeventSocket {
    fn is_ready(&mut self) -> Result<bool, MonitorError> {
        let mut fds = [PollFd::new(&self.fd, PollFlags::POLLIN)];

        match poll(&mut fds, 0) {
            Ok(0) => Ok(false),
            Ok(_) => Ok(fds[0]
                .revents()
                .map_or(false, |revents| revents.contains(PollFlags::POLLIN))),
            Err(Errno::EINTR) => Ok(false),
            Err(e) => Err(MonitorError::SourceReceive(e)),
        }
    }

    fn receive(&mut self) -> Result<Option<RawNotification>, MonitorError> {
        let filter = self.subsystem.as_deref();
        loop {
            let len = match recv(self.fd.as_raw_fd(), &mut self.buffer, MsgFlags::MSG_DONTWAIT) {
                Ok(len) => len,
                Err(Errno::EAGAIN) => return Ok(None),
                Err(Errno::EINTR) => continue,
                Err(e) => return Err(MonitorError::SourceReceive(e)),
            };

            match parse_datagram(&self.buffer[..len]) {
                Some(notification) if matches_subsystem(filter, &notification) => {
                    return Ok(Some(notification))
                }
                Some(_) => continue,
                None => log::debug!("Ignoring malformed uevent datagram ({} bytes)", len),
            }
        }
    }
}

/// Whether `notification` passes the subsystem filter. Without a filter
/// everything passes; with one, a missing `SUBSYSTEM` property never does.
pub fn matches_subsystem(filter: Option<&str>, notification: &RawNotification) -> bool {
    match filter {
        Some(subsystem) => notification.property(PROP_SUBSYSTEM) == Some(subsystem),
        None => true,
    }
}

/// Decode one uevent datagram of either encoding
pub fn parse_datagram(data: &[u8]) -> Option<RawNotification> {
    let block = if data.starts_with(UDEV_PREFIX) {
        udev_property_block(data)?
    } else {
        kernel_property_block(data)?
    };

    let pairs = block
        .split(|&b| b == 0)
        .filter(|entry| !entry.is_empty())
        .filter_map(|entry| {
            let entry = std::str::from_utf8(entry).ok()?;
            entry.split_once('=')
        });

    let notification = RawNotification::from_pairs(pairs);
    if notification.properties().is_empty() {
        None
    } else {
        Some(notification)
    }
}

fn udev_property_block(data: &[u8]) -> Option<&[u8]> {
    let magic = u32::from_be_bytes(data.get(8..12)?.try_into().ok()?);
    if magic != UDEV_MAGIC {
        return None;
    }

    let offset = read_u32_ne(data, UDEV_PROPERTIES_OFF)? as usize;
    let len = read_u32_ne(data, UDEV_PROPERTIES_LEN)? as usize;
    data.get(offset..offset.checked_add(len)?)
}

fn kernel_property_block(data: &[u8]) -> Option<&[u8]> {
    let header_end = data.iter().position(|&b| b == 0)?;
    if !data[..header_end].contains(&b'@') {
        return None;
    }
    Some(&data[header_end + 1..])
}

fn read_u32_ne(data: &[u8], at: usize) -> Option<u32> {
    let bytes = data.get(at..at + 4)?;
    Some(u32::from_ne_bytes(bytes.try_into().ok()?))
}
