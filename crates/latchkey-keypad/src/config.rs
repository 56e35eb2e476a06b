use latchkey_core::DeviceIdentity;
use latchkey_core::constants::{
    DOOR_ALERT_THRESHOLD_MS, KEYPAD_DEBOUNCE_MS, LED_BLINK_INTERVAL_MS,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Which door-action publishers the keypad listens to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PeerFilter {
    /// Only the door lock with this identity.
    Only(DeviceIdentity),
    /// Any publisher on the door-action channel.
    Any,
}

impl PeerFilter {
    pub fn accepts(&self, device_id: &DeviceIdentity) -> bool {
        match self {
            PeerFilter::Only(peer) => peer == device_id,
            PeerFilter::Any => true,
        }
    }
}

/// Keypad device configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeypadConfig {
    /// Door locks whose actions are supervised.
    pub door_peer: PeerFilter,

    /// Stable time before a key press is trusted.
    pub debounce_window: Duration,

    /// Half-period of a blinking indicator.
    pub blink_interval: Duration,

    /// How long the door may stay open before the alarm glows.
    pub alert_threshold: Duration,
}

impl KeypadConfig {
    /// Configuration supervising the door lock `door_peer`.
    pub fn new(door_peer: DeviceIdentity) -> Self {
        Self {
            door_peer: PeerFilter::Only(door_peer),
            debounce_window: Duration::from_millis(KEYPAD_DEBOUNCE_MS),
            blink_interval: Duration::from_millis(LED_BLINK_INTERVAL_MS),
            alert_threshold: Duration::from_millis(DOOR_ALERT_THRESHOLD_MS),
        }
    }

    /// Accept door actions from any publisher.
    pub fn with_any_door(mut self) -> Self {
        self.door_peer = PeerFilter::Any;
        self
    }

    pub fn with_debounce_window(mut self, window: Duration) -> Self {
        self.debounce_window = window;
        self
    }

    pub fn with_blink_interval(mut self, interval: Duration) -> Self {
        self.blink_interval = interval;
        self
    }

    pub fn with_alert_threshold(mut self, threshold: Duration) -> Self {
        self.alert_threshold = threshold;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> DeviceIdentity {
        DeviceIdentity::new(s).unwrap()
    }

    #[test]
    fn test_default_values() {
        let config = KeypadConfig::new(id("D1"));
        assert_eq!(config.door_peer, PeerFilter::Only(id("D1")));
        assert_eq!(config.debounce_window, Duration::from_millis(40));
        assert_eq!(config.blink_interval, Duration::from_millis(500));
        assert_eq!(config.alert_threshold, Duration::from_millis(5000));
    }

    #[test]
    fn test_peer_filter() {
        assert!(PeerFilter::Only(id("D1")).accepts(&id("D1")));
        assert!(!PeerFilter::Only(id("D1")).accepts(&id("D2")));
        assert!(PeerFilter::Any.accepts(&id("D2")));
    }

    #[test]
    fn test_peer_filter_serde() {
        let filter: PeerFilter = serde_json::from_str(r#"{"only":"D1"}"#).unwrap();
        assert_eq!(filter, PeerFilter::Only(id("D1")));
        let filter: PeerFilter = serde_json::from_str(r#""any""#).unwrap();
        assert_eq!(filter, PeerFilter::Any);
    }
}
