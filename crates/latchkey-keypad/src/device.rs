use latchkey_core::{DeviceIdentity, Timestamp};
use latchkey_fsm::KeyScanner;
use latchkey_hardware::{IndicatorPin, KeyMatrix};
use latchkey_network::Device;
use latchkey_protocol::{ChannelRole, InboundMessage, OutboundRecord};
use tracing::warn;

use crate::config::KeypadConfig;
use crate::state::KeypadCore;

const SUBSCRIPTIONS: &[ChannelRole] = &[ChannelRole::KeypadState, ChannelRole::DoorAction];

/// Keypad bound to its key matrix and indicator pins.
pub struct Keypad<M, P> {
    core: KeypadCore,
    scanner: KeyScanner,
    matrix: M,
    primary_pin: P,
    secondary_pin: P,
}

impl<M: KeyMatrix, P: IndicatorPin> Keypad<M, P> {
    pub fn new(
        identity: DeviceIdentity,
        config: KeypadConfig,
        matrix: M,
        primary_pin: P,
        secondary_pin: P,
    ) -> Self {
        Self {
            scanner: KeyScanner::with_window(config.debounce_window),
            core: KeypadCore::new(identity, config),
            matrix,
            primary_pin,
            secondary_pin,
        }
    }

    pub fn core(&self) -> &KeypadCore {
        &self.core
    }
}

impl<M: KeyMatrix, P: IndicatorPin> Device for Keypad<M, P> {
    fn identity(&self) -> &DeviceIdentity {
        self.core.identity()
    }

    fn subscriptions(&self) -> &[ChannelRole] {
        SUBSCRIPTIONS
    }

    fn sample_inputs(&mut self, now: Timestamp) {
        let raw = match self.matrix.scan() {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "Key matrix scan failed");
                return;
            }
        };

        if let Some(key) = self.scanner.sample(now, raw) {
            self.core.press(key);
        }
    }

    fn tick(&mut self, now: Timestamp) {
        self.core.tick(now);
    }

    fn react(&mut self, message: InboundMessage, now: Timestamp) {
        self.core.apply(message, now);
    }

    fn sync_outputs(&mut self) {
        let levels = [
            (&mut self.primary_pin, self.core.primary().is_lit()),
            (&mut self.secondary_pin, self.core.secondary().is_lit()),
        ];
        for (pin, lit) in levels {
            if let Err(e) = pin.set_lit(lit) {
                warn!(error = %e, "Driving indicator failed");
            }
        }
    }

    fn take_outbox(&mut self) -> Vec<OutboundRecord> {
        self.core.take_outbox()
    }
}
