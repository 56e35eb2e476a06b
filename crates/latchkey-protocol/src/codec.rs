//! JSON codec between bus envelopes and typed records.
//!
//! Each channel carries a flat JSON object of string keys to string or number
//! values. Decoding is strict about the fields a channel requires and lenient
//! about extra fields. A keypad-state `time` that is not a non-negative
//! integer is treated as absent and falls back to the default. Outgoing payloads are pretty-printed with two-space
//! indentation, matching what the firmware emits.
//!
//! ```
//! use latchkey_core::DeviceIdentity;
//! use latchkey_protocol::{Delivery, InboundMessage, RecordCodec, TopicConfig};
//!
//! let codec = RecordCodec::new(TopicConfig::default());
//! let delivery = Delivery::new(
//!     "doorlock/action",
//!     r#"{"deviceId": "304242375241C9033432", "action": "open"}"#,
//! );
//!
//! match codec.decode(&delivery).unwrap() {
//!     InboundMessage::DoorAction(record) => {
//!         assert_eq!(record.device_id.as_str(), "304242375241C9033432");
//!     }
//!     other => panic!("unexpected record {other:?}"),
//! }
//! ```

use latchkey_core::constants::DEFAULT_STATE_DURATION_MS;
use latchkey_core::{DeviceIdentity, Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::envelope::{Delivery, Publication};
use crate::message::{
    DoorControlRecord, InboundMessage, KeypadState, KeypadStateRecord, OutboundRecord,
};
use crate::topics::{ChannelRole, TopicConfig};

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireKeypadState {
    device_id: DeviceIdentity,
    state: String,
    #[serde(
        default,
        deserialize_with = "lenient_millis",
        skip_serializing_if = "Option::is_none"
    )]
    time: Option<u64>,
}

/// Accept only a non-negative integer; anything else reads as absent.
fn lenient_millis<'de, D>(deserializer: D) -> std::result::Result<Option<u64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(serde_json::Value::as_u64))
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireDoorControl {
    device_id: DeviceIdentity,
    time: u64,
}

/// Encoder/decoder bound to one topic layout.
#[derive(Debug, Clone, Default)]
pub struct RecordCodec {
    topics: TopicConfig,
}

impl RecordCodec {
    pub fn new(topics: TopicConfig) -> Self {
        Self { topics }
    }

    pub fn topics(&self) -> &TopicConfig {
        &self.topics
    }

    /// Decode a delivery into a typed record.
    ///
    /// # Errors
    /// - `Error::UnknownTopic` if the topic is not bound to any channel.
    /// - `Error::MalformedRecord` if the payload is not a UTF-8 JSON object,
    ///   a required field is missing or has the wrong type, or the identity
    ///   field is not a valid identity token.
    pub fn decode(&self, delivery: &Delivery) -> Result<InboundMessage> {
        let topic = delivery.topic.as_str();
        let role = self
            .topics
            .role_of(topic)
            .ok_or_else(|| Error::UnknownTopic(topic.to_string()))?;

        let value: serde_json::Value = serde_json::from_slice(&delivery.payload)
            .map_err(|e| Error::malformed(topic, e.to_string()))?;
        if !value.is_object() {
            return Err(Error::malformed(topic, "expected a JSON object"));
        }

        let message = match role {
            ChannelRole::DeviceStatus => InboundMessage::Status(from_value(topic, value)?),
            ChannelRole::KeySubmission => {
                InboundMessage::KeySubmission(from_value(topic, value)?)
            }
            ChannelRole::DoorAction => InboundMessage::DoorAction(from_value(topic, value)?),
            ChannelRole::RfidUid => InboundMessage::Card(from_value(topic, value)?),
            ChannelRole::KeypadState => {
                let wire: WireKeypadState = from_value(topic, value)?;
                InboundMessage::KeypadState(KeypadStateRecord {
                    device_id: wire.device_id,
                    state: KeypadState::from(wire.state.as_str()),
                    duration: Duration::from_millis(
                        wire.time.unwrap_or(DEFAULT_STATE_DURATION_MS),
                    ),
                })
            }
            ChannelRole::DoorControl => {
                let wire: WireDoorControl = from_value(topic, value)?;
                InboundMessage::DoorControl(DoorControlRecord {
                    device_id: wire.device_id,
                    duration: Duration::from_millis(wire.time),
                })
            }
        };

        Ok(message)
    }

    /// Encode a record into a publication on its channel's topic.
    ///
    /// The retain flag follows [`ChannelRole::is_retained`].
    ///
    /// # Errors
    /// Returns `Error::Encoding` if serialization fails.
    pub fn encode(&self, record: &OutboundRecord) -> Result<Publication> {
        let role = record.role();
        let payload = match record {
            OutboundRecord::Status(r) => to_payload(r)?,
            OutboundRecord::KeySubmission(r) => to_payload(r)?,
            OutboundRecord::DoorAction(r) => to_payload(r)?,
            OutboundRecord::Card(r) => to_payload(r)?,
            OutboundRecord::KeypadState(r) => to_payload(&WireKeypadState {
                device_id: r.device_id.clone(),
                state: r.state.as_str().to_string(),
                time: Some(millis(r.duration)),
            })?,
            OutboundRecord::DoorControl(r) => to_payload(&WireDoorControl {
                device_id: r.device_id.clone(),
                time: millis(r.duration),
            })?,
        };

        Ok(Publication::new(
            self.topics.topic(role),
            payload,
            role.is_retained(),
        ))
    }
}

fn from_value<T: DeserializeOwned>(topic: &str, value: serde_json::Value) -> Result<T> {
    serde_json::from_value(value).map_err(|e| Error::malformed(topic, e.to_string()))
}

fn to_payload<T: Serialize>(record: &T) -> Result<Vec<u8>> {
    serde_json::to_vec_pretty(record).map_err(|e| Error::Encoding(e.to_string()))
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{DoorAction, DoorActionRecord, KeySubmission};
    use rstest::rstest;

    fn codec() -> RecordCodec {
        RecordCodec::new(TopicConfig::default())
    }

    fn id(s: &str) -> DeviceIdentity {
        DeviceIdentity::new(s).unwrap()
    }

    #[test]
    fn test_decode_keypad_state_with_time() {
        let delivery = Delivery::new(
            "keypad/state",
            r#"{"deviceId": "K1", "state": "AwaitingPassword", "time": 3000}"#,
        );
        let msg = codec().decode(&delivery).unwrap();
        assert_eq!(
            msg,
            InboundMessage::KeypadState(KeypadStateRecord {
                device_id: id("K1"),
                state: KeypadState::AwaitingPassword,
                duration: Duration::from_millis(3000),
            })
        );
    }

    #[test]
    fn test_decode_keypad_state_defaults_time() {
        let delivery = Delivery::new(
            "keypad/state",
            r#"{"deviceId": "K1", "state": "AccessGranted"}"#,
        );
        let InboundMessage::KeypadState(record) = codec().decode(&delivery).unwrap() else {
            panic!("expected keypad state");
        };
        assert_eq!(
            record.duration,
            Duration::from_millis(DEFAULT_STATE_DURATION_MS)
        );
    }

    #[rstest]
    #[case(r#""1500""#, DEFAULT_STATE_DURATION_MS)]
    #[case("4000.5", DEFAULT_STATE_DURATION_MS)]
    #[case("3000.0", DEFAULT_STATE_DURATION_MS)]
    #[case("-20", DEFAULT_STATE_DURATION_MS)]
    #[case("null", DEFAULT_STATE_DURATION_MS)]
    #[case("true", DEFAULT_STATE_DURATION_MS)]
    #[case("1500", 1500)]
    #[case("0", 0)]
    fn test_decode_keypad_state_time_falls_back(#[case] time: &str, #[case] expected_ms: u64) {
        let payload = format!(r#"{{"deviceId": "K1", "state": "AccessGranted", "time": {time}}}"#);
        let InboundMessage::KeypadState(record) =
            codec().decode(&Delivery::new("keypad/state", payload)).unwrap()
        else {
            panic!("expected keypad state");
        };
        assert_eq!(record.duration, Duration::from_millis(expected_ms));
    }

    #[test]
    fn test_decode_unknown_state_is_kept() {
        let delivery = Delivery::new("keypad/state", r#"{"deviceId": "K1", "state": "Reboot"}"#);
        let InboundMessage::KeypadState(record) = codec().decode(&delivery).unwrap() else {
            panic!("expected keypad state");
        };
        assert_eq!(record.state, KeypadState::Unrecognized("Reboot".to_string()));
    }

    #[test]
    fn test_decode_door_action() {
        let delivery = Delivery::new("doorlock/action", r#"{"deviceId":"D1","action":"close"}"#);
        let InboundMessage::DoorAction(record) = codec().decode(&delivery).unwrap() else {
            panic!("expected door action");
        };
        assert_eq!(record.action, DoorAction::Close);
    }

    #[test]
    fn test_decode_door_control_requires_time() {
        let delivery = Delivery::new("doorlock/open", r#"{"deviceId":"D1"}"#);
        let err = codec().decode(&delivery).unwrap_err();
        assert!(matches!(err, Error::MalformedRecord { .. }));
    }

    #[test]
    fn test_decode_unknown_topic() {
        let delivery = Delivery::new("elsewhere", r#"{"deviceId":"D1"}"#);
        assert!(matches!(
            codec().decode(&delivery),
            Err(Error::UnknownTopic(_))
        ));
    }

    #[test]
    fn test_decode_rejects_non_object() {
        let delivery = Delivery::new("doorlock/action", r#"["D1", "open"]"#);
        assert!(matches!(
            codec().decode(&delivery),
            Err(Error::MalformedRecord { .. })
        ));
    }

    #[test]
    fn test_encode_submission_is_retained_and_pretty() {
        let record = OutboundRecord::KeySubmission(KeySubmission {
            device_id: id("K1"),
            input: "MTIzNA==".to_string(),
        });
        let publication = codec().encode(&record).unwrap();

        assert_eq!(publication.topic, "keypad/key");
        assert!(publication.retain);
        assert_eq!(
            std::str::from_utf8(&publication.payload).unwrap(),
            "{\n  \"deviceId\": \"K1\",\n  \"input\": \"MTIzNA==\"\n}"
        );
    }

    #[test]
    fn test_encode_door_action_not_retained() {
        let record = OutboundRecord::DoorAction(DoorActionRecord {
            device_id: id("D1"),
            action: DoorAction::Open,
        });
        let publication = codec().encode(&record).unwrap();
        assert_eq!(publication.topic, "doorlock/action");
        assert!(!publication.retain);
    }
}
