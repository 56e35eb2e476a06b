//! Door-lock device.
//!
//! Publishes `close` when the door contact closes and `open` when it opens,
//! and lights its unlock indicator for as long as the authority asks.

mod device;
mod state;

pub use device::DoorLock;
pub use state::{DoorLockConfig, DoorLockCore};
