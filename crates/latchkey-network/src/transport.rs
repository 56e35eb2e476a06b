//! Transport capability consumed by the device loop.

use latchkey_protocol::{Delivery, Publication};
use thiserror::Error;

/// Result of a connection probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connected,
    Disconnected,
}

impl ConnectionState {
    pub fn is_connected(self) -> bool {
        self == ConnectionState::Connected
    }
}

/// Errors that can occur during transport operations
#[derive(Debug, Error)]
pub enum TransportError {
    /// Client has no session with the broker
    #[error("Not connected to broker")]
    NotConnected,

    /// Broker refused or dropped the session
    #[error("Broker unavailable")]
    BrokerUnavailable,

    /// Topic string is not usable
    #[error("Invalid topic '{0}'")]
    InvalidTopic(String),

    /// The MQTT client could not queue the request
    #[error("MQTT client error: {0}")]
    Client(#[from] rumqttc::ClientError),
}

/// Publish/subscribe bus as seen by one client.
///
/// No method blocks. A device loop calls [`ensure_connected`] once per
/// iteration (or per backoff period while offline) and only uses the other
/// methods while connected.
///
/// [`ensure_connected`]: Transport::ensure_connected
pub trait Transport: Send {
    /// Check the session and, if there is none, make one connection attempt.
    fn ensure_connected(&mut self) -> ConnectionState;

    /// Subscribe to `topic`. Retained values for it are delivered through the
    /// next [`drain`](Transport::drain).
    fn subscribe(&mut self, topic: &str) -> Result<(), TransportError>;

    /// Hand a message to the broker. Delivery to subscribers is not confirmed.
    fn publish(&mut self, publication: Publication) -> Result<(), TransportError>;

    /// Messages received since the last drain, in arrival order.
    fn drain(&mut self) -> Vec<Delivery>;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn ensure_connected(&mut self) -> ConnectionState {
        (**self).ensure_connected()
    }

    fn subscribe(&mut self, topic: &str) -> Result<(), TransportError> {
        (**self).subscribe(topic)
    }

    fn publish(&mut self, publication: Publication) -> Result<(), TransportError> {
        (**self).publish(publication)
    }

    fn drain(&mut self) -> Vec<Delivery> {
        (**self).drain()
    }
}
