use latchkey_core::constants::DOOR_SENSOR_DEBOUNCE_MS;
use latchkey_core::{DeviceIdentity, Timestamp};
use latchkey_fsm::{DoorSensor, Indicator, SensorEdge};
use latchkey_protocol::{DoorAction, DoorActionRecord, InboundMessage, OutboundRecord};
use std::time::Duration;
use tracing::{info, trace};

/// Door-lock configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DoorLockConfig {
    /// Stable time before a contact change is trusted.
    pub debounce_window: Duration,
}

impl Default for DoorLockConfig {
    fn default() -> Self {
        Self {
            debounce_window: Duration::from_millis(DOOR_SENSOR_DEBOUNCE_MS),
        }
    }
}

impl DoorLockConfig {
    pub fn with_debounce_window(mut self, window: Duration) -> Self {
        self.debounce_window = window;
        self
    }
}

/// Door-lock state: debounced contact and unlock indicator.
#[derive(Debug, Clone)]
pub struct DoorLockCore {
    identity: DeviceIdentity,
    sensor: DoorSensor,
    unlock: Indicator,
    outbox: Vec<OutboundRecord>,
}

impl DoorLockCore {
    pub fn new(identity: DeviceIdentity, config: DoorLockConfig) -> Self {
        Self {
            identity,
            sensor: DoorSensor::with_window(config.debounce_window),
            unlock: Indicator::new(),
            outbox: Vec::new(),
        }
    }

    pub fn identity(&self) -> &DeviceIdentity {
        &self.identity
    }

    pub fn unlock(&self) -> &Indicator {
        &self.unlock
    }

    /// Debounced contact level; pressed means the door is closed.
    pub fn is_closed(&self) -> bool {
        self.sensor.is_pressed()
    }

    /// Feed one raw contact sample.
    pub fn sample(&mut self, now: Timestamp, pressed: bool) {
        let action = match self.sensor.sample(now, pressed) {
            Some(SensorEdge::Pressed) => DoorAction::Close,
            Some(SensorEdge::Released) => DoorAction::Open,
            None => return,
        };

        info!(door = %self.identity, action = %action, "Door sensor changed");
        self.outbox.push(OutboundRecord::DoorAction(DoorActionRecord {
            device_id: self.identity.clone(),
            action,
        }));
    }

    #[must_use]
    pub fn react(mut self, message: InboundMessage, now: Timestamp) -> Self {
        self.apply(message, now);
        self
    }

    /// Light the unlock indicator when a door-control record names this lock.
    pub fn apply(&mut self, message: InboundMessage, now: Timestamp) {
        match message {
            InboundMessage::DoorControl(record) if record.device_id == self.identity => {
                self.unlock.start_glow(now, record.duration);
                info!(
                    door = %self.identity,
                    duration_ms = record.duration.as_millis() as u64,
                    "Unlock indicator on"
                );
            }
            InboundMessage::DoorControl(record) => {
                trace!(target_id = %record.device_id, "Door control for another lock");
            }
            other => {
                trace!(channel = %other.role(), "Record not handled by door lock");
            }
        }
    }

    pub fn tick(&mut self, now: Timestamp) {
        if self.unlock.tick(now) && !self.unlock.is_lit() {
            info!(door = %self.identity, "Unlock indicator off");
        }
    }

    pub fn take_outbox(&mut self) -> Vec<OutboundRecord> {
        std::mem::take(&mut self.outbox)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use latchkey_protocol::DoorControlRecord;

    fn id(s: &str) -> DeviceIdentity {
        DeviceIdentity::new(s).unwrap()
    }

    fn t(ms: u64) -> Timestamp {
        Timestamp::from_millis(ms)
    }

    fn lock() -> DoorLockCore {
        DoorLockCore::new(id("D1"), DoorLockConfig::default())
    }

    fn actions(core: &mut DoorLockCore) -> Vec<DoorAction> {
        core.take_outbox()
            .into_iter()
            .filter_map(|record| match record {
                OutboundRecord::DoorAction(r) => Some(r.action),
                _ => None,
            })
            .collect()
    }

    fn control(target: &str, ms: u64) -> InboundMessage {
        InboundMessage::DoorControl(DoorControlRecord {
            device_id: id(target),
            duration: Duration::from_millis(ms),
        })
    }

    #[test]
    fn test_closed_at_boot_publishes_close_once() {
        let mut core = lock();
        for ms in (0..=200).step_by(50) {
            core.sample(t(ms), true);
        }
        assert_eq!(actions(&mut core), vec![DoorAction::Close]);
        assert!(core.is_closed());
    }

    #[test]
    fn test_open_at_boot_publishes_nothing() {
        let mut core = lock();
        for ms in (0..=200).step_by(50) {
            core.sample(t(ms), false);
        }
        assert!(actions(&mut core).is_empty());
    }

    #[test]
    fn test_open_after_close() {
        let mut core = lock();
        core.sample(t(0), true);
        core.sample(t(50), true);
        core.sample(t(100), false);
        core.sample(t(150), false);
        assert_eq!(actions(&mut core), vec![DoorAction::Close, DoorAction::Open]);
    }

    #[test]
    fn test_contact_bounce_is_filtered() {
        let mut core = lock();
        for (ms, level) in [(0, true), (10, false), (20, true), (30, false), (40, false)] {
            core.sample(t(ms), level);
        }
        assert!(actions(&mut core).is_empty());
    }

    #[test]
    fn test_door_control_lights_for_duration() {
        let core = lock().react(control("D1", 3000), t(100));
        assert!(core.unlock().is_lit());

        let mut core = core;
        core.tick(t(3099));
        assert!(core.unlock().is_lit());
        core.tick(t(3100));
        assert!(!core.unlock().is_lit());
    }

    #[test]
    fn test_door_control_for_other_lock_ignored() {
        let core = lock().react(control("D2", 3000), t(0));
        assert!(core.unlock().is_idle());
    }
}
