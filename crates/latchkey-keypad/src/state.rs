//! Protocol state of the keypad.

use latchkey_core::{DeviceIdentity, Timestamp};
use latchkey_fsm::{DoorWatch, Indicator, KeyEntry, KeyOutcome};
use latchkey_hardware::KeySymbol;
use latchkey_protocol::{
    DoorAction, DoorActionRecord, InboundMessage, KeySubmission, KeypadState, KeypadStateRecord,
    OutboundRecord, encode_input,
};
use tracing::{debug, info, trace};

use crate::config::{KeypadConfig, PeerFilter};

/// Keypad state: input buffer, two indicators and the door watch.
///
/// The primary indicator reports rejections and the door alarm; the secondary
/// one prompts for input and confirms a grant.
///
/// # Examples
///
/// ```
/// use latchkey_core::{DeviceIdentity, Timestamp};
/// use latchkey_keypad::{KeypadConfig, KeypadCore};
/// use latchkey_protocol::{InboundMessage, KeypadState, KeypadStateRecord};
/// use std::time::Duration;
///
/// let me = DeviceIdentity::new("K1").unwrap();
/// let door = DeviceIdentity::new("D1").unwrap();
/// let keypad = KeypadCore::new(me.clone(), KeypadConfig::new(door));
///
/// let keypad = keypad.react(
///     InboundMessage::KeypadState(KeypadStateRecord {
///         device_id: me,
///         state: KeypadState::AwaitingPassword,
///         duration: Duration::from_millis(3000),
///     }),
///     Timestamp::from_millis(0),
/// );
/// assert!(keypad.entry().is_armed());
/// assert!(keypad.secondary().is_blinking());
/// ```
#[derive(Debug, Clone)]
pub struct KeypadCore {
    identity: DeviceIdentity,
    door_peer: PeerFilter,
    entry: KeyEntry,
    primary: Indicator,
    secondary: Indicator,
    door: DoorWatch,
    outbox: Vec<OutboundRecord>,
}

impl KeypadCore {
    pub fn new(identity: DeviceIdentity, config: KeypadConfig) -> Self {
        Self {
            identity,
            door_peer: config.door_peer,
            entry: KeyEntry::new(),
            primary: Indicator::with_blink_interval(config.blink_interval),
            secondary: Indicator::with_blink_interval(config.blink_interval),
            door: DoorWatch::with_threshold(config.alert_threshold),
            outbox: Vec::new(),
        }
    }

    pub fn identity(&self) -> &DeviceIdentity {
        &self.identity
    }

    pub fn entry(&self) -> &KeyEntry {
        &self.entry
    }

    pub fn primary(&self) -> &Indicator {
        &self.primary
    }

    pub fn secondary(&self) -> &Indicator {
        &self.secondary
    }

    pub fn door(&self) -> &DoorWatch {
        &self.door
    }

    /// Pure form of [`apply`](Self::apply).
    #[must_use]
    pub fn react(mut self, message: InboundMessage, now: Timestamp) -> Self {
        self.apply(message, now);
        self
    }

    /// React to one inbound record.
    ///
    /// State records count only when addressed to this keypad; door actions
    /// only when their publisher passes the peer filter. Everything else is
    /// ignored.
    pub fn apply(&mut self, message: InboundMessage, now: Timestamp) {
        match message {
            InboundMessage::KeypadState(record) => {
                if record.device_id != self.identity {
                    trace!(target_id = %record.device_id, "State record for another keypad");
                    return;
                }
                self.apply_state(record, now);
            }
            InboundMessage::DoorAction(record) => {
                if !self.door_peer.accepts(&record.device_id) {
                    trace!(door = %record.device_id, "Door action from unwatched door");
                    return;
                }
                self.apply_door_action(record, now);
            }
            other => {
                trace!(channel = %other.role(), "Record not handled by keypad");
            }
        }
    }

    fn apply_state(&mut self, record: KeypadStateRecord, now: Timestamp) {
        let KeypadStateRecord {
            state, duration, ..
        } = record;

        match &state {
            KeypadState::AwaitingPassword => {
                self.primary.force_off();
                self.secondary.start_blink(now, duration);
                self.entry.arm();
                info!(keypad = %self.identity, "Keypad input enabled");
            }
            KeypadState::IncorrectPassword | KeypadState::IncorrectKeycard => {
                self.primary.start_blink(now, duration);
                self.entry.disarm();
                info!(keypad = %self.identity, state = %state, "Access rejected");
            }
            KeypadState::AccessGranted => {
                self.secondary.start_glow(now, duration);
                self.entry.disarm();
                info!(keypad = %self.identity, "Access granted");
            }
            KeypadState::Unrecognized(name) => {
                debug!(keypad = %self.identity, state = %name, "Ignoring unknown state");
            }
        }
    }

    fn apply_door_action(&mut self, record: DoorActionRecord, now: Timestamp) {
        match record.action {
            DoorAction::Open => {
                self.door.on_open(now);
                info!(door = %record.device_id, "Door opened");
            }
            DoorAction::Close => {
                self.door.on_close(&mut self.primary);
                info!(door = %record.device_id, "Door closed");
            }
        }
    }

    /// Handle one debounced key press.
    pub fn press(&mut self, key: KeySymbol) {
        match self.entry.press(key) {
            KeyOutcome::Dropped => {
                debug!(key = %key, "Input ignored (not awaiting password)");
            }
            KeyOutcome::Ignored => {
                debug!(key = %key, "Key ignored");
            }
            KeyOutcome::Appended | KeyOutcome::Deleted | KeyOutcome::Cleared => {
                trace!(key = %key, length = self.entry.buffer().len(), "Buffer edited");
            }
            KeyOutcome::Submitted(digits) => {
                self.secondary.force_off();
                self.outbox.push(OutboundRecord::KeySubmission(KeySubmission {
                    device_id: self.identity.clone(),
                    input: encode_input(&digits),
                }));
                info!(keypad = %self.identity, "Password submitted, waiting for response");
            }
        }
    }

    /// Advance indicator and door timers.
    pub fn tick(&mut self, now: Timestamp) {
        self.primary.tick(now);
        self.secondary.tick(now);
        if self.door.tick(now, &mut self.primary) {
            info!(keypad = %self.identity, "Door left open, alarm on");
        }
    }

    /// Records queued since the last call.
    pub fn take_outbox(&mut self) -> Vec<OutboundRecord> {
        std::mem::take(&mut self.outbox)
    }
}
