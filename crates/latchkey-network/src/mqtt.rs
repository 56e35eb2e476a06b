//! [`Transport`] over an MQTT broker.
//!
//! The rumqttc event loop runs on its own tokio task. It records whether a
//! session is up and forwards incoming publishes to an unbounded inbox that
//! [`Transport::drain`] empties. After a connection error the task waits
//! [`MqttConfig::reconnect_backoff`] and polls again, which reconnects.
//!
//! Sessions are clean, so subscriptions die with the connection. When the
//! task reconnects behind the device loop's back, the next
//! [`Transport::ensure_connected`] reports `Disconnected` once so the loop
//! starts a fresh session.

use latchkey_core::constants::RECONNECT_BACKOFF_MS;
use latchkey_protocol::{Delivery, Publication};
use rumqttc::{AsyncClient, ConnectReturnCode, Event, EventLoop, MqttOptions, Packet, QoS};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::transport::{ConnectionState, Transport, TransportError};

/// Broker address and session settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MqttConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub keep_alive: Duration,
    /// Pause after a connection error before polling again.
    pub reconnect_backoff: Duration,
    /// Requests the client may queue before `publish` fails.
    pub capacity: usize,
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 1883,
            username: None,
            password: None,
            keep_alive: Duration::from_secs(15),
            reconnect_backoff: Duration::from_millis(RECONNECT_BACKOFF_MS),
            capacity: 64,
        }
    }
}

impl MqttConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Self::default()
        }
    }

    /// Authenticate with `username` and `password`. An empty username means
    /// no authentication.
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        let username = username.into();
        if username.is_empty() {
            self.username = None;
            self.password = None;
        } else {
            self.username = Some(username);
            self.password = Some(password.into());
        }
        self
    }

    pub fn with_keep_alive(mut self, keep_alive: Duration) -> Self {
        self.keep_alive = keep_alive;
        self
    }

    pub fn with_reconnect_backoff(mut self, backoff: Duration) -> Self {
        self.reconnect_backoff = backoff;
        self
    }

    fn options(&self, client_id: &str) -> MqttOptions {
        let mut options = MqttOptions::new(client_id, self.host.clone(), self.port);
        options.set_keep_alive(self.keep_alive);
        options.set_clean_session(true);
        if let Some(username) = &self.username {
            options.set_credentials(username.clone(), self.password.clone().unwrap_or_default());
        }
        options
    }
}

/// Session bookkeeping shared with the event-loop task.
#[derive(Debug, Default)]
struct Link {
    connected: bool,
    /// Count of accepted connections so far.
    sessions: u64,
}

type SharedLink = Arc<Mutex<Link>>;

fn lock(link: &SharedLink) -> MutexGuard<'_, Link> {
    link.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Apply one event-loop result to the link. Returns false once the inbox
/// has no reader left.
fn on_event(
    link: &SharedLink,
    inbox: &mpsc::UnboundedSender<Delivery>,
    event: Event,
) -> bool {
    match event {
        Event::Incoming(Packet::ConnAck(ack)) if ack.code == ConnectReturnCode::Success => {
            let mut link = lock(link);
            link.connected = true;
            link.sessions += 1;
            info!(session = link.sessions, "MQTT session established");
            true
        }
        Event::Incoming(Packet::Publish(publish)) => {
            let delivery = Delivery::new(publish.topic, publish.payload);
            let delivery = if publish.retain { delivery.replayed() } else { delivery };
            inbox.send(delivery).is_ok()
        }
        Event::Incoming(Packet::Disconnect) => {
            lock(link).connected = false;
            true
        }
        _ => true,
    }
}

fn on_error(link: &SharedLink, error: &rumqttc::ConnectionError) {
    let mut link = lock(link);
    if link.connected {
        warn!(error = %error, "MQTT connection lost");
    } else {
        debug!(error = %error, "MQTT connection attempt failed");
    }
    link.connected = false;
}

async fn drive(
    mut eventloop: EventLoop,
    link: SharedLink,
    inbox: mpsc::UnboundedSender<Delivery>,
    backoff: Duration,
) {
    loop {
        match eventloop.poll().await {
            Ok(event) => {
                if !on_event(&link, &inbox, event) {
                    break;
                }
            }
            Err(e) => {
                on_error(&link, &e);
                tokio::time::sleep(backoff).await;
            }
        }
    }
    debug!("MQTT event loop stopped");
}

/// MQTT client for one device. The client id is the device identity.
pub struct MqttTransport {
    client: AsyncClient,
    link: SharedLink,
    inbox: mpsc::UnboundedReceiver<Delivery>,
    /// Session number last reported as connected, zero when none.
    reported: u64,
    task: Option<JoinHandle<()>>,
}

impl MqttTransport {
    /// Start the client and its event-loop task.
    ///
    /// Must be called from within a tokio runtime. The first connection
    /// attempt starts immediately; [`Transport::ensure_connected`] reports
    /// `Connected` once the broker has accepted it.
    pub fn spawn(client_id: &str, config: &MqttConfig) -> Self {
        let (client, eventloop) = AsyncClient::new(config.options(client_id), config.capacity);
        let link = SharedLink::default();
        let (tx, rx) = mpsc::unbounded_channel();
        info!(client_id, host = %config.host, port = config.port, "Starting MQTT client");

        let task = tokio::spawn(drive(eventloop, Arc::clone(&link), tx, config.reconnect_backoff));
        Self {
            client,
            link,
            inbox: rx,
            reported: 0,
            task: Some(task),
        }
    }

    fn is_connected(&self) -> bool {
        lock(&self.link).connected
    }
}

impl Transport for MqttTransport {
    fn ensure_connected(&mut self) -> ConnectionState {
        let link = lock(&self.link);
        if !link.connected {
            self.reported = 0;
            return ConnectionState::Disconnected;
        }
        if self.reported != 0 && self.reported != link.sessions {
            // Reconnected since the last report: subscriptions are gone.
            self.reported = 0;
            return ConnectionState::Disconnected;
        }
        self.reported = link.sessions;
        ConnectionState::Connected
    }

    fn subscribe(&mut self, topic: &str) -> Result<(), TransportError> {
        if topic.is_empty() {
            return Err(TransportError::InvalidTopic(topic.to_string()));
        }
        if !self.is_connected() {
            return Err(TransportError::NotConnected);
        }
        self.client.try_subscribe(topic, QoS::AtMostOnce)?;
        debug!(topic, "Subscribe queued");
        Ok(())
    }

    fn publish(&mut self, publication: Publication) -> Result<(), TransportError> {
        if publication.topic.is_empty() {
            return Err(TransportError::InvalidTopic(publication.topic));
        }
        if !self.is_connected() {
            return Err(TransportError::NotConnected);
        }
        self.client.try_publish(
            publication.topic,
            QoS::AtMostOnce,
            publication.retain,
            publication.payload.to_vec(),
        )?;
        Ok(())
    }

    fn drain(&mut self) -> Vec<Delivery> {
        let mut deliveries = Vec::new();
        while let Ok(delivery) = self.inbox.try_recv() {
            deliveries.push(delivery);
        }
        deliveries
    }
}

impl Drop for MqttTransport {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
