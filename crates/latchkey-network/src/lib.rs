//! Bus transport and device loop for the latchkey rig.
//!
//! # Components
//!
//! - [`Transport`]: non-blocking publish/subscribe capability with an
//!   `ensure_connected` probe.
//! - [`MemoryBroker`] / [`MemoryClient`]: in-process broker with retained
//!   messages and an availability switch, used by tests and the simulator.
//! - [`MqttTransport`]: the same capability over a real MQTT broker.
//! - [`Device`] / [`DeviceLoop`]: the cooperative loop that drives one device
//!   through input sampling, timer ticks, message reactions, output sync and
//!   publishing.
//!
//! # Example
//!
//! ```
//! use latchkey_network::{ConnectionState, MemoryBroker, Transport};
//! use latchkey_protocol::Publication;
//!
//! let broker = MemoryBroker::new();
//! let mut publisher = broker.client("door-1");
//! let mut listener = broker.client("keypad-1");
//!
//! assert_eq!(publisher.ensure_connected(), ConnectionState::Connected);
//! assert_eq!(listener.ensure_connected(), ConnectionState::Connected);
//! listener.subscribe("doorlock/action").unwrap();
//!
//! publisher
//!     .publish(Publication::new("doorlock/action", "{}", false))
//!     .unwrap();
//! assert_eq!(listener.drain().len(), 1);
//! ```

mod device;
mod memory;
mod mqtt;
mod transport;

pub use device::{Device, DeviceLoop, LoopConfig, StepOutcome};
pub use memory::{MemoryBroker, MemoryClient};
pub use mqtt::{MqttConfig, MqttTransport};
pub use transport::{ConnectionState, Transport, TransportError};
