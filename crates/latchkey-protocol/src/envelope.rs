//! Bus envelopes.
//!
//! The bus carries opaque UTF-8 payloads with its own message boundaries, so
//! an envelope is just a topic, the payload bytes and the retain flag.

use bytes::Bytes;

/// Outgoing message handed to the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Publication {
    pub topic: String,
    pub payload: Bytes,
    pub retain: bool,
}

impl Publication {
    pub fn new(topic: impl Into<String>, payload: impl Into<Bytes>, retain: bool) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
            retain,
        }
    }
}

/// Incoming message drained from the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub topic: String,
    pub payload: Bytes,
    /// Set when the broker replayed a retained value to a new subscriber.
    ///
    /// A retained delivery may be arbitrarily stale.
    pub retained: bool,
}

impl Delivery {
    pub fn new(topic: impl Into<String>, payload: impl Into<Bytes>) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
            retained: false,
        }
    }

    /// Mark the delivery as a retained replay.
    pub fn replayed(mut self) -> Self {
        self.retained = true;
        self
    }

    /// Payload as text, if it is valid UTF-8.
    pub fn payload_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.payload).ok()
    }
}

impl From<Publication> for Delivery {
    fn from(publication: Publication) -> Self {
        Self {
            topic: publication.topic,
            payload: publication.payload,
            retained: false,
        }
    }
}
