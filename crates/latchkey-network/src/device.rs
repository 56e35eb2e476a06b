//! Cooperative device loop.
//!
//! One iteration, while connected:
//!
//! 1. sample inputs,
//! 2. advance timers,
//! 3. drain the transport and react to every decodable record in order,
//! 4. copy indicator levels onto the physical outputs,
//! 5. publish the records queued during this iteration.
//!
//! While disconnected the device is idle; a connection attempt is made every
//! [`LoopConfig::reconnect_backoff`]. Each new session subscribes to the
//! device's channels and publishes its retained online status.

use latchkey_core::constants::{DEFAULT_IDLE_DELAY_MS, RECONNECT_BACKOFF_MS};
use latchkey_core::{Clock, DeviceIdentity, Timestamp};
use latchkey_protocol::{ChannelRole, InboundMessage, OutboundRecord, RecordCodec, TopicConfig};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::transport::{ConnectionState, Transport};

/// A device driven by [`DeviceLoop`].
pub trait Device: Send {
    fn identity(&self) -> &DeviceIdentity;

    /// Channels to subscribe to on every new session.
    fn subscriptions(&self) -> &[ChannelRole];

    /// Read physical inputs.
    fn sample_inputs(&mut self, now: Timestamp);

    /// Advance local timers.
    fn tick(&mut self, now: Timestamp);

    /// React to one decoded record. Addressing is the device's concern.
    fn react(&mut self, message: InboundMessage, now: Timestamp);

    /// Drive physical outputs from the current state.
    fn sync_outputs(&mut self);

    /// Records queued for publishing since the last call.
    fn take_outbox(&mut self) -> Vec<OutboundRecord>;
}

/// Loop timing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopConfig {
    /// Delay between iterations.
    pub idle_delay: Duration,

    /// Wait between failed connection attempts.
    pub reconnect_backoff: Duration,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            idle_delay: Duration::from_millis(DEFAULT_IDLE_DELAY_MS),
            reconnect_backoff: Duration::from_millis(RECONNECT_BACKOFF_MS),
        }
    }
}

impl LoopConfig {
    pub fn with_idle_delay(mut self, delay: Duration) -> Self {
        self.idle_delay = delay;
        self
    }

    pub fn with_reconnect_backoff(mut self, backoff: Duration) -> Self {
        self.reconnect_backoff = backoff;
        self
    }
}

/// What one [`DeviceLoop::step`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StepOutcome {
    /// Whether the iteration ran with a live session.
    pub online: bool,
    /// Whether a new session was set up during this step.
    pub connected: bool,
    /// Records decoded and handed to the device.
    pub received: usize,
    /// Deliveries dropped because they could not be decoded.
    pub dropped: usize,
    /// Records accepted by the transport.
    pub published: usize,
}

/// Drives one [`Device`] over one [`Transport`].
pub struct DeviceLoop<D, T> {
    device: D,
    transport: T,
    codec: RecordCodec,
    config: LoopConfig,
    online: bool,
    next_attempt: Timestamp,
}

impl<D: Device, T: Transport> DeviceLoop<D, T> {
    pub fn new(device: D, transport: T, topics: TopicConfig, config: LoopConfig) -> Self {
        Self {
            device,
            transport,
            codec: RecordCodec::new(topics),
            config,
            online: false,
            next_attempt: Timestamp::ZERO,
        }
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn is_online(&self) -> bool {
        self.online
    }

    /// Run one iteration at `now`.
    pub fn step(&mut self, now: Timestamp) -> StepOutcome {
        let mut outcome = StepOutcome::default();

        if !self.online && now < self.next_attempt {
            return outcome;
        }

        match self.transport.ensure_connected() {
            ConnectionState::Connected if self.online => {}
            ConnectionState::Connected => {
                if !self.start_session() {
                    self.next_attempt = now + self.config.reconnect_backoff;
                    return outcome;
                }
                self.online = true;
                outcome.connected = true;
            }
            ConnectionState::Disconnected => {
                if self.online {
                    warn!(device = %self.device.identity(), "Lost connection to broker");
                    self.online = false;
                } else {
                    debug!(
                        device = %self.device.identity(),
                        retry_in_ms = self.config.reconnect_backoff.as_millis() as u64,
                        "Connection attempt failed"
                    );
                }
                self.next_attempt = now + self.config.reconnect_backoff;
                return outcome;
            }
        }
        outcome.online = true;

        self.device.sample_inputs(now);
        self.device.tick(now);

        for delivery in self.transport.drain() {
            match self.codec.decode(&delivery) {
                Ok(message) => {
                    outcome.received += 1;
                    self.device.react(message, now);
                }
                Err(e) => {
                    outcome.dropped += 1;
                    debug!(
                        device = %self.device.identity(),
                        topic = %delivery.topic,
                        error = %e,
                        "Dropping undecodable record"
                    );
                }
            }
        }

        self.device.sync_outputs();
        outcome.published = self.flush_outbox();
        outcome
    }

    /// Step on `clock` until `shutdown` resolves.
    pub async fn run<C, F>(&mut self, clock: &C, shutdown: F)
    where
        C: Clock,
        F: Future<Output = ()>,
    {
        info!(device = %self.device.identity(), "Device loop started");
        tokio::pin!(shutdown);

        loop {
            self.step(clock.now());
            tokio::select! {
                _ = &mut shutdown => break,
                _ = tokio::time::sleep(self.config.idle_delay) => {}
            }
        }

        info!(device = %self.device.identity(), "Device loop stopped");
    }

    fn start_session(&mut self) -> bool {
        let identity = self.device.identity().clone();

        for role in self.device.subscriptions().to_vec() {
            let topic = self.codec.topics().topic(role).to_string();
            if let Err(e) = self.transport.subscribe(&topic) {
                warn!(device = %identity, topic = %topic, error = %e, "Subscribe failed");
                return false;
            }
        }

        if let Err(e) = self.publish(&OutboundRecord::online(identity.clone())) {
            warn!(device = %identity, error = %e, "Publishing online status failed");
            return false;
        }

        info!(device = %identity, "Connected to broker");
        true
    }

    fn flush_outbox(&mut self) -> usize {
        let mut published = 0;
        for record in self.device.take_outbox() {
            match self.publish(&record) {
                Ok(()) => published += 1,
                Err(e) => warn!(
                    device = %self.device.identity(),
                    channel = %record.role(),
                    error = %e,
                    "Publish failed, record dropped"
                ),
            }
        }
        published
    }

    fn publish(&mut self, record: &OutboundRecord) -> Result<(), PublishError> {
        let publication = self.codec.encode(record)?;
        self.transport.publish(publication)?;
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
enum PublishError {
    #[error(transparent)]
    Encode(#[from] latchkey_core::Error),

    #[error(transparent)]
    Transport(#[from] crate::transport::TransportError),
}
