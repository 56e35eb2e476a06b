//! Stable-window debouncing.
//!
//! A raw sample is trusted once it has stayed unchanged for strictly longer
//! than the window. Each trusted value is reported once; it is reported again
//! only after a different value has been trusted in between.

use latchkey_core::Timestamp;
use latchkey_core::constants::{DOOR_SENSOR_DEBOUNCE_MS, KEYPAD_DEBOUNCE_MS};
use latchkey_hardware::KeySymbol;
use std::time::Duration;

/// Generic stable-window debouncer over sampled values.
#[derive(Debug, Clone)]
pub struct Debouncer<T> {
    window: Duration,
    last_raw: T,
    last_change: Timestamp,
    reported: T,
}

impl<T: Copy + PartialEq> Debouncer<T> {
    /// Create a debouncer whose line is assumed to rest at `initial`.
    pub fn new(window: Duration, initial: T) -> Self {
        Self {
            window,
            last_raw: initial,
            last_change: Timestamp::ZERO,
            reported: initial,
        }
    }

    /// Feed one raw sample taken at `now`.
    ///
    /// Returns the newly trusted value when the stable value differs from the
    /// last one reported.
    pub fn sample(&mut self, now: Timestamp, raw: T) -> Option<T> {
        if raw != self.last_raw {
            self.last_raw = raw;
            self.last_change = now;
            return None;
        }

        if now.saturating_since(self.last_change) > self.window && raw != self.reported {
            self.reported = raw;
            return Some(raw);
        }

        None
    }

    /// Last value reported.
    pub fn reported(&self) -> T {
        self.reported
    }

    pub fn window(&self) -> Duration {
        self.window
    }
}

/// Debounced key scanner emitting one key event per stable press.
///
/// Releasing all keys clears the reported symbol, so pressing the same key
/// again produces a new event.
///
/// # Examples
///
/// ```
/// use latchkey_core::Timestamp;
/// use latchkey_fsm::KeyScanner;
/// use latchkey_hardware::KeySymbol;
///
/// let mut scanner = KeyScanner::new();
/// let one = KeySymbol::digit(1).unwrap();
/// let key = Some(one);
///
/// assert_eq!(scanner.sample(Timestamp::from_millis(0), key), None);
/// assert_eq!(scanner.sample(Timestamp::from_millis(20), key), None);
/// assert_eq!(scanner.sample(Timestamp::from_millis(41), key), Some(one));
/// assert_eq!(scanner.sample(Timestamp::from_millis(80), key), None);
/// ```
#[derive(Debug, Clone)]
pub struct KeyScanner {
    inner: Debouncer<Option<KeySymbol>>,
}

impl KeyScanner {
    pub fn new() -> Self {
        Self::with_window(Duration::from_millis(KEYPAD_DEBOUNCE_MS))
    }

    pub fn with_window(window: Duration) -> Self {
        Self {
            inner: Debouncer::new(window, None),
        }
    }

    /// Feed the matrix scan result taken at `now`.
    pub fn sample(&mut self, now: Timestamp, raw: Option<KeySymbol>) -> Option<KeySymbol> {
        self.inner.sample(now, raw).flatten()
    }
}

impl Default for KeyScanner {
    fn default() -> Self {
        Self::new()
    }
}

/// Debounced edge of a contact sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorEdge {
    Pressed,
    Released,
}

/// Door contact debouncer. Starts in the released state.
#[derive(Debug, Clone)]
pub struct DoorSensor {
    inner: Debouncer<bool>,
}

impl DoorSensor {
    pub fn new() -> Self {
        Self::with_window(Duration::from_millis(DOOR_SENSOR_DEBOUNCE_MS))
    }

    pub fn with_window(window: Duration) -> Self {
        Self {
            inner: Debouncer::new(window, false),
        }
    }

    pub fn sample(&mut self, now: Timestamp, pressed: bool) -> Option<SensorEdge> {
        self.inner.sample(now, pressed).map(|pressed| {
            if pressed {
                SensorEdge::Pressed
            } else {
                SensorEdge::Released
            }
        })
    }

    /// Debounced level.
    pub fn is_pressed(&self) -> bool {
        self.inner.reported()
    }
}

impl Default for DoorSensor {
    fn default() -> Self {
        Self::new()
    }
}
