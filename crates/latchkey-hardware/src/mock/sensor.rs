//! Mock contact sensor.

use crate::{Result, traits::ContactSensor};
use std::sync::Arc;
use tokio::sync::watch;

/// Contact sensor whose level is set through a [`MockContactSensorHandle`].
///
/// Starts released.
#[derive(Debug)]
pub struct MockContactSensor {
    pressed_rx: watch::Receiver<bool>,
}

impl MockContactSensor {
    pub fn new() -> (Self, MockContactSensorHandle) {
        let (pressed_tx, pressed_rx) = watch::channel(false);
        (
            Self { pressed_rx },
            MockContactSensorHandle {
                pressed_tx: Arc::new(pressed_tx),
            },
        )
    }
}

impl ContactSensor for MockContactSensor {
    fn is_pressed(&mut self) -> Result<bool> {
        Ok(*self.pressed_rx.borrow())
    }
}

#[derive(Debug, Clone)]
pub struct MockContactSensorHandle {
    pressed_tx: Arc<watch::Sender<bool>>,
}

impl MockContactSensorHandle {
    pub fn press(&self) {
        self.pressed_tx.send_replace(true);
    }

    pub fn release(&self) {
        self.pressed_tx.send_replace(false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_sensor_levels() {
        let (mut sensor, handle) = MockContactSensor::new();
        assert!(!sensor.is_pressed().unwrap());

        handle.press();
        assert!(sensor.is_pressed().unwrap());

        handle.release();
        assert!(!sensor.is_pressed().unwrap());
    }
}
