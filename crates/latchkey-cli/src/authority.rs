//! Stand-in for the access-control server.
//!
//! A known card opens a pending session for its keypad; a matching PIN
//! entered while the session is live grants access and lights the door lock.
//! A session that runs out is answered with `IncorrectPassword`, as is any
//! submission that arrives without one. Retained replays are ignored because
//! they may be stale.

use latchkey_core::{DeviceIdentity, Timestamp};
use latchkey_network::{MemoryClient, Transport, TransportError};
use latchkey_protocol::{
    ChannelRole, DoorControlRecord, InboundMessage, KeypadState, KeypadStateRecord,
    OutboundRecord, RecordCodec, TopicConfig, decode_input,
};
use std::time::Duration;
use subtle::ConstantTimeEq;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Decision taken by the authority.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    CardAccepted(String),
    CardRejected(String),
    PinAccepted,
    PinRejected,
    /// A submission arrived with no card session open.
    NoSession,
    /// The card session ran out before a PIN arrived.
    SessionExpired,
}

/// Who the authority admits and how long its answers last.
#[derive(Debug, Clone)]
pub struct AuthorityConfig {
    pub pin: String,
    pub cards: Vec<String>,
    pub keypad: DeviceIdentity,
    pub door: DeviceIdentity,
    /// `time` sent with rejections and `AwaitingPassword`.
    pub state_duration: Duration,
    /// `time` sent with `AccessGranted` and the door-control record.
    pub grant_duration: Duration,
    /// How long an accepted card waits for its PIN.
    pub session_timeout: Duration,
}

#[derive(Debug, Error)]
enum SendError {
    #[error("encode failed: {0}")]
    Encode(#[from] latchkey_core::Error),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

#[derive(Debug, Clone)]
struct PendingSession {
    card: String,
    expires_at: Timestamp,
}

pub struct Authority {
    client: MemoryClient,
    codec: RecordCodec,
    config: AuthorityConfig,
    pending: Option<PendingSession>,
    decisions: Vec<Decision>,
}

impl Authority {
    pub fn new(client: MemoryClient, topics: TopicConfig, config: AuthorityConfig) -> Self {
        Self {
            client,
            codec: RecordCodec::new(topics),
            config,
            pending: None,
            decisions: Vec::new(),
        }
    }

    /// Connect and subscribe to card and key-submission channels.
    pub fn connect(&mut self) -> Result<(), TransportError> {
        if !self.client.ensure_connected().is_connected() {
            return Err(TransportError::BrokerUnavailable);
        }
        for role in [ChannelRole::RfidUid, ChannelRole::KeySubmission] {
            let topic = self.codec.topics().topic(role).to_string();
            self.client.subscribe(&topic)?;
        }
        Ok(())
    }

    pub fn decisions(&self) -> &[Decision] {
        &self.decisions
    }

    /// Expire a stale session, then handle everything received since the
    /// last call.
    pub fn step(&mut self, now: Timestamp) {
        if let Some(session) = &self.pending
            && now >= session.expires_at
        {
            info!(card = %session.card, at = %now, "Session timed out");
            self.pending = None;
            self.decisions.push(Decision::SessionExpired);
            self.send_state(KeypadState::IncorrectPassword, self.config.state_duration);
        }

        for delivery in self.client.drain() {
            if delivery.retained {
                debug!(topic = %delivery.topic, "Ignoring retained replay");
                continue;
            }
            match self.codec.decode(&delivery) {
                Ok(InboundMessage::Card(card)) => self.on_card(&card.rfid_uid, now),
                Ok(InboundMessage::KeySubmission(submission)) => {
                    self.on_submission(&submission.input, now)
                }
                Ok(other) => debug!(channel = %other.role(), "Authority ignores record"),
                Err(e) => debug!(error = %e, "Authority dropped record"),
            }
        }
    }

    fn on_card(&mut self, uid: &str, now: Timestamp) {
        if !self.config.cards.iter().any(|known| known == uid) {
            info!(uid, "Unknown card");
            self.decisions.push(Decision::CardRejected(uid.to_string()));
            self.send_state(KeypadState::IncorrectKeycard, self.config.state_duration);
            return;
        }

        if self.pending.is_some() {
            debug!(uid, "Replacing open session");
        }
        let expires_at = now + self.config.session_timeout;
        info!(uid, until = %expires_at, "Card accepted, awaiting password");
        self.pending = Some(PendingSession {
            card: uid.to_string(),
            expires_at,
        });
        self.decisions.push(Decision::CardAccepted(uid.to_string()));
        self.send_state(KeypadState::AwaitingPassword, self.config.state_duration);
    }

    fn on_submission(&mut self, encoded: &str, now: Timestamp) {
        // One attempt per tap.
        let Some(session) = self.pending.take() else {
            info!("Password entered without a card");
            self.decisions.push(Decision::NoSession);
            self.send_state(KeypadState::IncorrectPassword, self.config.state_duration);
            return;
        };
        if now >= session.expires_at {
            info!(card = %session.card, "Password arrived after the session ran out");
            self.decisions.push(Decision::SessionExpired);
            self.send_state(KeypadState::IncorrectPassword, self.config.state_duration);
            return;
        }

        let matches = match decode_input(encoded) {
            Ok(entered) => entered.as_bytes().ct_eq(self.config.pin.as_bytes()).into(),
            Err(e) => {
                debug!(error = %e, "Undecodable submission");
                false
            }
        };

        if matches {
            info!(card = %session.card, "Password accepted");
            self.decisions.push(Decision::PinAccepted);
            self.send_state(KeypadState::AccessGranted, self.config.grant_duration);
            self.send(OutboundRecord::DoorControl(DoorControlRecord {
                device_id: self.config.door.clone(),
                duration: self.config.grant_duration,
            }));
        } else {
            info!(card = %session.card, "Password rejected");
            self.decisions.push(Decision::PinRejected);
            self.send_state(KeypadState::IncorrectPassword, self.config.state_duration);
        }
    }

    fn send_state(&mut self, state: KeypadState, duration: Duration) {
        self.send(OutboundRecord::KeypadState(KeypadStateRecord {
            device_id: self.config.keypad.clone(),
            state,
            duration,
        }));
    }

    fn send(&mut self, record: OutboundRecord) {
        if let Err(e) = self.try_send(&record) {
            warn!(channel = %record.role(), error = %e, "Authority publish failed");
        }
    }

    fn try_send(&mut self, record: &OutboundRecord) -> Result<(), SendError> {
        let publication = self.codec.encode(record)?;
        self.client.publish(publication)?;
        Ok(())
    }
}
