pub mod classifier;
pub mod emitter;
pub mod polling;
pub mod resolver;
pub mod uevent;

pub use classifier::{parse_pid, Classification, EventClassifier};
pub use emitter::LifecycleEmitter;
pub use polling::Monitor;
pub use resolver::{CmdlineResolver, IdentityResolver};
pub use uevent::{matches_subsystem, NetlinkGroup, NotificationSource, UeventSocket};
