use latchkey_core::{DeviceIdentity, Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::topics::ChannelRole;

/// Door transition reported by the door-lock device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DoorAction {
    Open,
    Close,
}

impl DoorAction {
    pub fn as_str(self) -> &'static str {
        match self {
            DoorAction::Open => "open",
            DoorAction::Close => "close",
        }
    }
}

impl fmt::Display for DoorAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DoorAction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "open" => Ok(DoorAction::Open),
            "close" => Ok(DoorAction::Close),
            other => Err(Error::InvalidDoorAction(other.to_string())),
        }
    }
}

/// State name carried by a keypad-state record.
///
/// Names the keypad does not know are kept verbatim and produce no reaction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeypadState {
    AwaitingPassword,
    IncorrectPassword,
    IncorrectKeycard,
    AccessGranted,
    Unrecognized(String),
}

impl KeypadState {
    pub fn as_str(&self) -> &str {
        match self {
            KeypadState::AwaitingPassword => "AwaitingPassword",
            KeypadState::IncorrectPassword => "IncorrectPassword",
            KeypadState::IncorrectKeycard => "IncorrectKeycard",
            KeypadState::AccessGranted => "AccessGranted",
            KeypadState::Unrecognized(name) => name,
        }
    }

    /// `IncorrectPassword` or `IncorrectKeycard`.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            KeypadState::IncorrectPassword | KeypadState::IncorrectKeycard
        )
    }
}

impl From<&str> for KeypadState {
    fn from(name: &str) -> Self {
        match name {
            "AwaitingPassword" => KeypadState::AwaitingPassword,
            "IncorrectPassword" => KeypadState::IncorrectPassword,
            "IncorrectKeycard" => KeypadState::IncorrectKeycard,
            "AccessGranted" => KeypadState::AccessGranted,
            other => KeypadState::Unrecognized(other.to_string()),
        }
    }
}

impl fmt::Display for KeypadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `{deviceId, status}` on the device-status channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusRecord {
    pub device_id: DeviceIdentity,
    pub status: String,
}

/// `{deviceId, input}` on the key-submission channel; `input` is base64.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeySubmission {
    pub device_id: DeviceIdentity,
    pub input: String,
}

/// `{deviceId, action}` on the door-action channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DoorActionRecord {
    pub device_id: DeviceIdentity,
    pub action: DoorAction,
}

/// `{deviceId, state, time}` on the keypad-state channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeypadStateRecord {
    pub device_id: DeviceIdentity,
    pub state: KeypadState,
    /// Indicator duration requested by the authority.
    pub duration: Duration,
}

/// `{deviceId, time}` on the door-control channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DoorControlRecord {
    pub device_id: DeviceIdentity,
    pub duration: Duration,
}

/// `{deviceId, rfidUid}` on the rfid-uid channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardRecord {
    pub device_id: DeviceIdentity,
    pub rfid_uid: String,
}

/// Record a device may react to, tagged by channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundMessage {
    Status(StatusRecord),
    KeySubmission(KeySubmission),
    DoorAction(DoorActionRecord),
    KeypadState(KeypadStateRecord),
    DoorControl(DoorControlRecord),
    Card(CardRecord),
}

impl InboundMessage {
    /// Channel the record arrived on.
    pub fn role(&self) -> ChannelRole {
        match self {
            InboundMessage::Status(_) => ChannelRole::DeviceStatus,
            InboundMessage::KeySubmission(_) => ChannelRole::KeySubmission,
            InboundMessage::DoorAction(_) => ChannelRole::DoorAction,
            InboundMessage::KeypadState(_) => ChannelRole::KeypadState,
            InboundMessage::DoorControl(_) => ChannelRole::DoorControl,
            InboundMessage::Card(_) => ChannelRole::RfidUid,
        }
    }

    /// Identity field of the record.
    pub fn device_id(&self) -> &DeviceIdentity {
        match self {
            InboundMessage::Status(r) => &r.device_id,
            InboundMessage::KeySubmission(r) => &r.device_id,
            InboundMessage::DoorAction(r) => &r.device_id,
            InboundMessage::KeypadState(r) => &r.device_id,
            InboundMessage::DoorControl(r) => &r.device_id,
            InboundMessage::Card(r) => &r.device_id,
        }
    }
}

/// Record a device publishes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundRecord {
    Status(StatusRecord),
    KeySubmission(KeySubmission),
    DoorAction(DoorActionRecord),
    Card(CardRecord),
    /// Only published by an authority; devices never emit it.
    KeypadState(KeypadStateRecord),
    /// Only published by an authority; devices never emit it.
    DoorControl(DoorControlRecord),
}

impl OutboundRecord {
    pub fn role(&self) -> ChannelRole {
        match self {
            OutboundRecord::Status(_) => ChannelRole::DeviceStatus,
            OutboundRecord::KeySubmission(_) => ChannelRole::KeySubmission,
            OutboundRecord::DoorAction(_) => ChannelRole::DoorAction,
            OutboundRecord::Card(_) => ChannelRole::RfidUid,
            OutboundRecord::KeypadState(_) => ChannelRole::KeypadState,
            OutboundRecord::DoorControl(_) => ChannelRole::DoorControl,
        }
    }

    /// Online status record for `device_id`.
    pub fn online(device_id: DeviceIdentity) -> Self {
        OutboundRecord::Status(StatusRecord {
            device_id,
            status: latchkey_core::constants::STATUS_ONLINE.to_string(),
        })
    }
}
