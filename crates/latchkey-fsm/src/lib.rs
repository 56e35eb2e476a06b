//! Timed state machines shared by the rig's devices.
//!
//! Every machine here is plain data advanced by explicit calls carrying the
//! current [`Timestamp`](latchkey_core::Timestamp). None of them read a clock,
//! touch a pin or talk to the bus, so a device loop owns them exclusively and
//! tests drive them with arbitrary timelines.
//!
//! - [`Debouncer`] / [`KeyScanner`]: stable-window edge detection.
//! - [`KeyEntry`]: armed/disarmed input buffer.
//! - [`Indicator`]: Idle / Blinking / Glowing LED timer.
//! - [`DoorWatch`]: door-open timeout with a self-renewing alert.
//! - [`DoorSensor`]: debounced door contact edges.
//! - [`CardDedupe`]: repeated-card suppression.

pub mod card_dedupe;
pub mod debounce;
pub mod door_watch;
pub mod indicator;
pub mod input_buffer;

pub use card_dedupe::CardDedupe;
pub use debounce::{Debouncer, DoorSensor, KeyScanner, SensorEdge};
pub use door_watch::DoorWatch;
pub use indicator::{Indicator, IndicatorMode};
pub use input_buffer::{KeyEntry, KeyOutcome};
