use latchkey_core::{DeviceIdentity, Timestamp};
use latchkey_hardware::{ContactSensor, IndicatorPin};
use latchkey_network::Device;
use latchkey_protocol::{ChannelRole, InboundMessage, OutboundRecord};
use tracing::warn;

use crate::state::{DoorLockConfig, DoorLockCore};

/// Door lock bound to its contact sensor and unlock LED.
pub struct DoorLock<S, P> {
    core: DoorLockCore,
    sensor: S,
    led: P,
}

impl<S: ContactSensor, P: IndicatorPin> DoorLock<S, P> {
    pub fn new(identity: DeviceIdentity, config: DoorLockConfig, sensor: S, led: P) -> Self {
        Self {
            core: DoorLockCore::new(identity, config),
            sensor,
            led,
        }
    }

    pub fn core(&self) -> &DoorLockCore {
        &self.core
    }
}

impl<S: ContactSensor, P: IndicatorPin> Device for DoorLock<S, P> {
    fn identity(&self) -> &DeviceIdentity {
        self.core.identity()
    }

    fn subscriptions(&self) -> &[ChannelRole] {
        &[ChannelRole::DoorControl]
    }

    fn sample_inputs(&mut self, now: Timestamp) {
        match self.sensor.is_pressed() {
            Ok(pressed) => self.core.sample(now, pressed),
            Err(e) => warn!(error = %e, "Reading door sensor failed"),
        }
    }

    fn tick(&mut self, now: Timestamp) {
        self.core.tick(now);
    }

    fn react(&mut self, message: InboundMessage, now: Timestamp) {
        self.core.apply(message, now);
    }

    fn sync_outputs(&mut self) {
        if let Err(e) = self.led.set_lit(self.core.unlock().is_lit()) {
            warn!(error = %e, "Driving unlock indicator failed");
        }
    }

    fn take_outbox(&mut self) -> Vec<OutboundRecord> {
        self.core.take_outbox()
    }
}
