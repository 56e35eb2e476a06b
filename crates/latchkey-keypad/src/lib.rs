//! Keypad device.
//!
//! The keypad collects a PIN while armed by the authority, publishes it as a
//! key submission, mirrors the authority's decisions on its two indicators and
//! raises a door alarm on the primary indicator while its peer door stays open.
//!
//! [`KeypadCore`] holds all protocol state and is independent of hardware;
//! [`Keypad`] binds it to a key matrix and two indicator pins for use with
//! [`latchkey_network::DeviceLoop`].

mod config;
mod device;
mod state;

pub use config::{KeypadConfig, PeerFilter};
pub use device::Keypad;
pub use state::KeypadCore;
