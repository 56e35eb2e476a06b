//! Shared vocabulary of the rig: device identities, the monotonic clock,
//! timing constants and the core error type.

pub mod clock;
pub mod constants;
pub mod error;
pub mod types;

pub use clock::{Clock, ManualClock, MonotonicClock, Timestamp};
pub use error::{Error, Result};
pub use types::*;
