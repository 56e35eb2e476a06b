//! Wire vocabulary shared by every device of the rig.
//!
//! Devices exchange one-way JSON records over a publish/subscribe bus. This
//! crate owns the topic layout ([`TopicConfig`]), the typed records
//! ([`InboundMessage`], [`OutboundRecord`]), the JSON codec that maps between
//! them and bus envelopes ([`RecordCodec`]), and the base64 transform applied
//! to submitted keypad input.

pub mod codec;
pub mod encoding;
pub mod envelope;
pub mod message;
pub mod topics;

pub use codec::RecordCodec;
pub use encoding::{decode_input, encode_input};
pub use envelope::{Delivery, Publication};
pub use message::{
    CardRecord, DoorAction, DoorActionRecord, DoorControlRecord, InboundMessage, KeySubmission,
    KeypadState, KeypadStateRecord, OutboundRecord, StatusRecord,
};
pub use topics::{ChannelRole, TopicConfig};
