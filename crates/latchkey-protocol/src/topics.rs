//! Topic layout.
//!
//! Topic names are configuration, not protocol: the rig only agrees on the
//! *roles* listed in [`ChannelRole`]. [`TopicConfig`] maps each role to the
//! concrete topic string used on a given broker.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Logical channel of the rig protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChannelRole {
    /// `{deviceId, status}` published retained by every device on connect.
    DeviceStatus,
    /// `{deviceId, input}` published retained by the keypad on submit.
    KeySubmission,
    /// `{deviceId, action}` published by the door lock on sensor edges.
    DoorAction,
    /// `{deviceId, state, time}` published by the authority for a keypad.
    KeypadState,
    /// `{deviceId, time}` published by the authority to light a door lock.
    DoorControl,
    /// `{deviceId, rfidUid}` published retained by the RFID reader.
    RfidUid,
}

impl ChannelRole {
    /// Whether records on this channel are published with the retain flag.
    #[must_use]
    pub fn is_retained(self) -> bool {
        matches!(
            self,
            ChannelRole::DeviceStatus | ChannelRole::KeySubmission | ChannelRole::RfidUid
        )
    }
}

impl fmt::Display for ChannelRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChannelRole::DeviceStatus => "device-status",
            ChannelRole::KeySubmission => "key-submission",
            ChannelRole::DoorAction => "door-action",
            ChannelRole::KeypadState => "keypad-state",
            ChannelRole::DoorControl => "door-control",
            ChannelRole::RfidUid => "rfid-uid",
        };
        write!(f, "{name}")
    }
}

/// Concrete topic names for each channel role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TopicConfig {
    pub device_status: String,
    pub key_submission: String,
    pub door_action: String,
    pub keypad_state: String,
    pub door_control: String,
    pub rfid_uid: String,
}

impl Default for TopicConfig {
    fn default() -> Self {
        Self {
            device_status: "device-status".to_string(),
            key_submission: "keypad/key".to_string(),
            door_action: "doorlock/action".to_string(),
            keypad_state: "keypad/state".to_string(),
            door_control: "doorlock/open".to_string(),
            rfid_uid: "rfid/uid".to_string(),
        }
    }
}

impl TopicConfig {
    /// Topic configured for `role`.
    #[must_use]
    pub fn topic(&self, role: ChannelRole) -> &str {
        match role {
            ChannelRole::DeviceStatus => &self.device_status,
            ChannelRole::KeySubmission => &self.key_submission,
            ChannelRole::DoorAction => &self.door_action,
            ChannelRole::KeypadState => &self.keypad_state,
            ChannelRole::DoorControl => &self.door_control,
            ChannelRole::RfidUid => &self.rfid_uid,
        }
    }

    /// Role bound to `topic`, if any.
    ///
    /// When two roles share a topic string the first one in declaration order
    /// wins.
    #[must_use]
    pub fn role_of(&self, topic: &str) -> Option<ChannelRole> {
        [
            ChannelRole::DeviceStatus,
            ChannelRole::KeySubmission,
            ChannelRole::DoorAction,
            ChannelRole::KeypadState,
            ChannelRole::DoorControl,
            ChannelRole::RfidUid,
        ]
        .into_iter()
        .find(|role| self.topic(*role) == topic)
    }

    /// Set the door-action topic.
    pub fn door_action(mut self, topic: impl Into<String>) -> Self {
        self.door_action = topic.into();
        self
    }

    /// Set the keypad-state topic.
    pub fn keypad_state(mut self, topic: impl Into<String>) -> Self {
        self.keypad_state = topic.into();
        self
    }

    /// Set the key-submission topic.
    pub fn key_submission(mut self, topic: impl Into<String>) -> Self {
        self.key_submission = topic.into();
        self
    }
}
