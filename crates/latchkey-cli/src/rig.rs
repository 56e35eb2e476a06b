//! Rig file: identities, PIN, cards, topics and timing for a simulation.
//!
//! Every field is optional; missing fields keep their defaults.
//!
//! ```json
//! {
//!   "pin": "2468",
//!   "cards": ["04:AB:CD:EF"],
//!   "anyDoor": false,
//!   "alertThresholdMs": 5000,
//!   "topics": { "keypadState": "lab/keypad/state" }
//! }
//! ```

use anyhow::{Context, Result};
use latchkey_core::DeviceIdentity;
use latchkey_core::constants::{
    DEFAULT_STATE_DURATION_MS, DOOR_ALERT_THRESHOLD_MS, KEYPAD_DEBOUNCE_MS, LED_BLINK_INTERVAL_MS,
    RFID_DEDUPE_WINDOW_MS,
};
use latchkey_doorlock::DoorLockConfig;
use latchkey_hardware::identity_from;
use latchkey_hardware::mock::FixedSerial;
use latchkey_keypad::KeypadConfig;
use latchkey_network::LoopConfig;
use latchkey_protocol::TopicConfig;
use latchkey_rfid::RfidConfig;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::authority::AuthorityConfig;

/// Factory serials of the simulated boards.
const KEYPAD_SERIAL: &[u8] = &[0x30, 0x42, 0x42, 0x37, 0x52, 0x41, 0xC9, 0x03];
const DOOR_SERIAL: &[u8] = &[0x30, 0x42, 0x42, 0x37, 0x52, 0x41, 0xC9, 0x11];
const RFID_SERIAL: &[u8] = &[0x30, 0x42, 0x42, 0x37, 0x52, 0x41, 0xC9, 0x2F];

#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct RigFile {
    pub keypad_id: Option<DeviceIdentity>,
    pub door_id: Option<DeviceIdentity>,
    pub rfid_id: Option<DeviceIdentity>,
    /// PIN the simulated authority accepts.
    pub pin: String,
    /// Card UIDs (colon hex) the simulated authority knows.
    pub cards: Vec<String>,
    /// Accept door actions from any lock instead of only `door_id`.
    pub any_door: bool,
    pub topics: TopicConfig,
    pub debounce_ms: u64,
    pub blink_interval_ms: u64,
    pub alert_threshold_ms: u64,
    pub dedupe_window_ms: u64,
    /// `time` the authority sends with keypad-state records.
    pub state_ms: u64,
    /// `time` the authority sends with a grant and the door-control record.
    pub grant_ms: u64,
    /// How long an accepted card waits for its PIN; `stateMs` when unset.
    pub session_ms: Option<u64>,
}

impl Default for RigFile {
    fn default() -> Self {
        Self {
            keypad_id: None,
            door_id: None,
            rfid_id: None,
            pin: "1234".to_string(),
            cards: vec!["04:AB:CD:EF".to_string()],
            any_door: false,
            topics: TopicConfig::default(),
            debounce_ms: KEYPAD_DEBOUNCE_MS,
            blink_interval_ms: LED_BLINK_INTERVAL_MS,
            alert_threshold_ms: DOOR_ALERT_THRESHOLD_MS,
            dedupe_window_ms: RFID_DEDUPE_WINDOW_MS,
            state_ms: DEFAULT_STATE_DURATION_MS,
            grant_ms: DEFAULT_STATE_DURATION_MS,
            session_ms: None,
        }
    }
}

/// Resolved rig settings.
#[derive(Debug, Clone)]
pub struct Rig {
    pub keypad_id: DeviceIdentity,
    pub door_id: DeviceIdentity,
    pub rfid_id: DeviceIdentity,
    pub pin: String,
    pub cards: Vec<String>,
    pub topics: TopicConfig,
    pub keypad: KeypadConfig,
    pub doorlock: DoorLockConfig,
    pub rfid: RfidConfig,
    pub loop_config: LoopConfig,
    pub state_duration: Duration,
    pub grant_duration: Duration,
    pub session_timeout: Duration,
}

impl RigFile {
    /// Read a rig file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading rig file {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing rig file {}", path.display()))
    }

    /// Fill in identities from board serials and build device configs.
    pub fn resolve(self) -> Result<Rig> {
        let keypad_id = resolve_id(self.keypad_id, KEYPAD_SERIAL)?;
        let door_id = resolve_id(self.door_id, DOOR_SERIAL)?;
        let rfid_id = resolve_id(self.rfid_id, RFID_SERIAL)?;

        if self.pin.is_empty() || !self.pin.chars().all(|c| c.is_ascii_digit()) {
            anyhow::bail!("pin must be one or more digits, got '{}'", self.pin);
        }

        let mut keypad = KeypadConfig::new(door_id.clone())
            .with_debounce_window(Duration::from_millis(self.debounce_ms))
            .with_blink_interval(Duration::from_millis(self.blink_interval_ms))
            .with_alert_threshold(Duration::from_millis(self.alert_threshold_ms));
        if self.any_door {
            keypad = keypad.with_any_door();
        }

        Ok(Rig {
            keypad_id,
            door_id,
            rfid_id,
            pin: self.pin,
            cards: self.cards,
            topics: self.topics,
            keypad,
            doorlock: DoorLockConfig::default()
                .with_debounce_window(Duration::from_millis(self.debounce_ms)),
            rfid: RfidConfig::default()
                .with_dedupe_window(Duration::from_millis(self.dedupe_window_ms)),
            loop_config: LoopConfig::default(),
            state_duration: Duration::from_millis(self.state_ms),
            grant_duration: Duration::from_millis(self.grant_ms),
            session_timeout: Duration::from_millis(self.session_ms.unwrap_or(self.state_ms)),
        })
    }
}

impl Rig {
    pub fn authority_config(&self) -> AuthorityConfig {
        AuthorityConfig {
            pin: self.pin.clone(),
            cards: self.cards.clone(),
            keypad: self.keypad_id.clone(),
            door: self.door_id.clone(),
            state_duration: self.state_duration,
            grant_duration: self.grant_duration,
            session_timeout: self.session_timeout,
        }
    }
}

fn resolve_id(configured: Option<DeviceIdentity>, serial: &[u8]) -> Result<DeviceIdentity> {
    match configured {
        Some(id) => Ok(id),
        None => identity_from(&FixedSerial(serial.to_vec())).context("deriving device identity"),
    }
}
