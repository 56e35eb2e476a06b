//! In-process broker.
//!
//! Topics match exactly; there are no wildcards. Retained values are stored
//! per topic and replayed to each new subscription. Taking the broker offline
//! drops every session, and clients notice on their next probe.

use bytes::Bytes;
use latchkey_protocol::{Delivery, Publication};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc;
use tracing::{debug, info, trace};

use crate::transport::{ConnectionState, Transport, TransportError};

#[derive(Debug)]
struct Session {
    client_id: String,
    subscriptions: HashSet<String>,
    inbox: mpsc::UnboundedSender<Delivery>,
}

#[derive(Debug)]
struct BrokerState {
    available: bool,
    retained: HashMap<String, Bytes>,
    sessions: HashMap<u64, Session>,
    next_session: u64,
    published: u64,
}

/// Shared in-memory broker. Clones refer to the same broker.
#[derive(Debug, Clone)]
pub struct MemoryBroker {
    state: Arc<Mutex<BrokerState>>,
}

impl MemoryBroker {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(BrokerState {
                available: true,
                retained: HashMap::new(),
                sessions: HashMap::new(),
                next_session: 1,
                published: 0,
            })),
        }
    }

    /// Create a client that will connect with `client_id`.
    pub fn client(&self, client_id: impl Into<String>) -> MemoryClient {
        MemoryClient {
            broker: self.clone(),
            client_id: client_id.into(),
            session: None,
        }
    }

    /// Take the broker on- or offline. Going offline drops all sessions.
    pub fn set_available(&self, available: bool) {
        let mut state = self.lock();
        if state.available != available {
            info!(available, "Memory broker availability changed");
        }
        state.available = available;
        if !available {
            state.sessions.clear();
        }
    }

    pub fn is_available(&self) -> bool {
        self.lock().available
    }

    /// Retained payload stored for `topic`.
    pub fn retained(&self, topic: &str) -> Option<Bytes> {
        self.lock().retained.get(topic).cloned()
    }

    /// Number of live sessions.
    pub fn session_count(&self) -> usize {
        self.lock().sessions.len()
    }

    /// Number of accepted publications since creation.
    pub fn published_count(&self) -> u64 {
        self.lock().published
    }

    fn lock(&self) -> MutexGuard<'_, BrokerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for MemoryBroker {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
struct ClientSession {
    id: u64,
    inbox: mpsc::UnboundedReceiver<Delivery>,
}

/// [`Transport`] backed by a [`MemoryBroker`].
#[derive(Debug)]
pub struct MemoryClient {
    broker: MemoryBroker,
    client_id: String,
    session: Option<ClientSession>,
}

impl MemoryClient {
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    fn live_session(&self, state: &BrokerState) -> Option<u64> {
        let session = self.session.as_ref()?;
        (state.available && state.sessions.contains_key(&session.id)).then_some(session.id)
    }
}

impl Transport for MemoryClient {
    fn ensure_connected(&mut self) -> ConnectionState {
        let mut state = self.broker.lock();
        if self.live_session(&state).is_some() {
            return ConnectionState::Connected;
        }
        self.session = None;

        if !state.available {
            trace!(client_id = %self.client_id, "Broker unavailable");
            return ConnectionState::Disconnected;
        }

        // A second session with the same client id takes over, as on a real broker.
        let client_id = self.client_id.clone();
        state.sessions.retain(|_, s| s.client_id != client_id);

        let id = state.next_session;
        state.next_session += 1;
        let (inbox_tx, inbox_rx) = mpsc::unbounded_channel();
        state.sessions.insert(
            id,
            Session {
                client_id: client_id.clone(),
                subscriptions: HashSet::new(),
                inbox: inbox_tx,
            },
        );
        self.session = Some(ClientSession {
            id,
            inbox: inbox_rx,
        });

        debug!(client_id = %client_id, session = id, "Memory client connected");
        ConnectionState::Connected
    }

    fn subscribe(&mut self, topic: &str) -> Result<(), TransportError> {
        if topic.is_empty() {
            return Err(TransportError::InvalidTopic(topic.to_string()));
        }

        let mut state = self.broker.lock();
        if !state.available {
            return Err(TransportError::BrokerUnavailable);
        }
        let id = self
            .live_session(&state)
            .ok_or(TransportError::NotConnected)?;

        let retained = state.retained.get(topic).cloned();
        let session = state
            .sessions
            .get_mut(&id)
            .ok_or(TransportError::NotConnected)?;
        session.subscriptions.insert(topic.to_string());

        if let Some(payload) = retained {
            // The receiver lives in self, so this cannot fail while connected.
            let _ = session.inbox.send(Delivery::new(topic, payload).replayed());
        }

        trace!(client_id = %self.client_id, topic, "Subscribed");
        Ok(())
    }

    fn publish(&mut self, publication: Publication) -> Result<(), TransportError> {
        if publication.topic.is_empty() {
            return Err(TransportError::InvalidTopic(publication.topic));
        }

        let mut state = self.broker.lock();
        if !state.available {
            return Err(TransportError::BrokerUnavailable);
        }
        self.live_session(&state)
            .ok_or(TransportError::NotConnected)?;

        if publication.retain {
            if publication.payload.is_empty() {
                state.retained.remove(&publication.topic);
            } else {
                state
                    .retained
                    .insert(publication.topic.clone(), publication.payload.clone());
            }
        }
        state.published += 1;

        let topic = publication.topic.clone();
        let delivery = Delivery::from(publication);
        for session in state.sessions.values() {
            if session.subscriptions.contains(&topic) {
                let _ = session.inbox.send(delivery.clone());
            }
        }

        trace!(client_id = %self.client_id, topic = %topic, "Published");
        Ok(())
    }

    fn drain(&mut self) -> Vec<Delivery> {
        let Some(session) = self.session.as_mut() else {
            return Vec::new();
        };

        let mut deliveries = Vec::new();
        while let Ok(delivery) = session.inbox.try_recv() {
            deliveries.push(delivery);
        }
        deliveries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn connected(broker: &MemoryBroker, id: &str) -> MemoryClient {
        let mut client = broker.client(id);
        assert_eq!(client.ensure_connected(), ConnectionState::Connected);
        client
    }

    #[test]
    fn test_operations_require_connection() {
        let broker = MemoryBroker::new();
        let mut client = broker.client("k1");
        assert!(matches!(
            client.subscribe("keypad/state"),
            Err(TransportError::NotConnected)
        ));
        assert!(matches!(
            client.publish(Publication::new("keypad/key", "{}", true)),
            Err(TransportError::NotConnected)
        ));
        assert!(client.drain().is_empty());
    }

    #[test]
    fn test_retained_replayed_on_subscribe() {
        let broker = MemoryBroker::new();
        let mut publisher = connected(&broker, "k1");
        publisher
            .publish(Publication::new("keypad/key", "first", true))
            .unwrap();
        publisher
            .publish(Publication::new("keypad/key", "second", true))
            .unwrap();

        let mut late = connected(&broker, "authority");
        late.subscribe("keypad/key").unwrap();
        let deliveries = late.drain();

        assert_eq!(deliveries.len(), 1);
        assert!(deliveries[0].retained);
        assert_eq!(deliveries[0].payload_str(), Some("second"));
    }

    #[test]
    fn test_non_retained_not_stored() {
        let broker = MemoryBroker::new();
        let mut publisher = connected(&broker, "d1");
        publisher
            .publish(Publication::new("doorlock/action", "open", false))
            .unwrap();
        assert_eq!(broker.retained("doorlock/action"), None);

        let mut late = connected(&broker, "k1");
        late.subscribe("doorlock/action").unwrap();
        assert!(late.drain().is_empty());
    }

    #[test]
    fn test_empty_retained_payload_clears() {
        let broker = MemoryBroker::new();
        let mut client = connected(&broker, "r1");
        client
            .publish(Publication::new("rfid/uid", "card", true))
            .unwrap();
        client.publish(Publication::new("rfid/uid", "", true)).unwrap();
        assert_eq!(broker.retained("rfid/uid"), None);
    }

    #[test]
    fn test_offline_broker_drops_sessions() {
        let broker = MemoryBroker::new();
        let mut client = connected(&broker, "k1");
        client.subscribe("keypad/state").unwrap();

        broker.set_available(false);
        assert_eq!(broker.session_count(), 0);
        assert_eq!(client.ensure_connected(), ConnectionState::Disconnected);
        assert!(matches!(
            client.publish(Publication::new("keypad/key", "{}", true)),
            Err(TransportError::BrokerUnavailable)
        ));

        broker.set_available(true);
        assert_eq!(client.ensure_connected(), ConnectionState::Connected);

        // Subscriptions do not survive the session.
        let mut other = connected(&broker, "authority");
        other
            .publish(Publication::new("keypad/state", "x", false))
            .unwrap();
        assert!(client.drain().is_empty());
    }

    #[test]
    fn test_duplicate_client_id_takes_over() {
        let broker = MemoryBroker::new();
        let mut first = connected(&broker, "k1");
        let _second = connected(&broker, "k1");

        assert_eq!(broker.session_count(), 1);
        assert_eq!(first.ensure_connected(), ConnectionState::Connected);
        assert_eq!(broker.session_count(), 1);
    }

    #[test]
    fn test_published_count() {
        let broker = MemoryBroker::new();
        let mut client = connected(&broker, "k1");
        client.publish(Publication::new("a", "1", false)).unwrap();
        client.publish(Publication::new("b", "2", false)).unwrap();
        assert_eq!(broker.published_count(), 2);
    }
}
