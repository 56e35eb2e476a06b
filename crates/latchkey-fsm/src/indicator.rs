//! LED indicator timer.
//!
//! The machine only tracks the desired level; the owning device copies
//! [`Indicator::is_lit`] onto the physical pin after every iteration.

use latchkey_core::Timestamp;
use latchkey_core::constants::LED_BLINK_INTERVAL_MS;
use serde::Serialize;
use std::time::Duration;

/// Activation of an indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum IndicatorMode {
    Idle,
    Blinking { deadline: u64 },
    Glowing { deadline: u64 },
}

/// Idle / Blinking / Glowing LED state machine.
///
/// A new activation always supersedes the current one.
///
/// # Examples
///
/// ```
/// use latchkey_core::Timestamp;
/// use latchkey_fsm::Indicator;
/// use std::time::Duration;
///
/// let mut led = Indicator::new();
/// led.start_blink(Timestamp::from_millis(0), Duration::from_millis(1200));
/// assert!(!led.is_lit());
///
/// led.tick(Timestamp::from_millis(500));
/// assert!(led.is_lit());
/// led.tick(Timestamp::from_millis(1000));
/// assert!(!led.is_lit());
/// led.tick(Timestamp::from_millis(1200));
/// assert!(led.is_idle());
/// ```
#[derive(Debug, Clone)]
pub struct Indicator {
    mode: IndicatorMode,
    lit: bool,
    last_toggle: Timestamp,
    blink_interval: Duration,
}

impl Indicator {
    pub fn new() -> Self {
        Self::with_blink_interval(Duration::from_millis(LED_BLINK_INTERVAL_MS))
    }

    pub fn with_blink_interval(blink_interval: Duration) -> Self {
        Self {
            mode: IndicatorMode::Idle,
            lit: false,
            last_toggle: Timestamp::ZERO,
            blink_interval,
        }
    }

    /// Blink for `duration`, starting dark.
    pub fn start_blink(&mut self, now: Timestamp, duration: Duration) {
        self.mode = IndicatorMode::Blinking {
            deadline: (now + duration).as_millis(),
        };
        self.lit = false;
        self.last_toggle = now;
    }

    /// Stay lit for `duration`.
    pub fn start_glow(&mut self, now: Timestamp, duration: Duration) {
        self.mode = IndicatorMode::Glowing {
            deadline: (now + duration).as_millis(),
        };
        self.lit = true;
    }

    /// Go idle and dark, dropping any pending deadline.
    pub fn force_off(&mut self) {
        self.mode = IndicatorMode::Idle;
        self.lit = false;
    }

    /// Advance to `now`.
    ///
    /// Returns `true` if the level changed.
    pub fn tick(&mut self, now: Timestamp) -> bool {
        let before = self.lit;
        match self.mode {
            IndicatorMode::Idle => {}
            IndicatorMode::Blinking { deadline } | IndicatorMode::Glowing { deadline }
                if now.as_millis() >= deadline =>
            {
                self.force_off();
            }
            IndicatorMode::Blinking { .. } => {
                if now.saturating_since(self.last_toggle) >= self.blink_interval {
                    self.lit = !self.lit;
                    self.last_toggle = now;
                }
            }
            IndicatorMode::Glowing { .. } => {}
        }
        before != self.lit
    }

    pub fn mode(&self) -> IndicatorMode {
        self.mode
    }

    pub fn is_lit(&self) -> bool {
        self.lit
    }

    pub fn is_idle(&self) -> bool {
        self.mode == IndicatorMode::Idle
    }

    pub fn is_blinking(&self) -> bool {
        matches!(self.mode, IndicatorMode::Blinking { .. })
    }

    pub fn is_glowing(&self) -> bool {
        matches!(self.mode, IndicatorMode::Glowing { .. })
    }

    /// End of the current activation, if any.
    pub fn deadline(&self) -> Option<Timestamp> {
        match self.mode {
            IndicatorMode::Idle => None,
            IndicatorMode::Blinking { deadline } | IndicatorMode::Glowing { deadline } => {
                Some(Timestamp::from_millis(deadline))
            }
        }
    }
}

impl Default for Indicator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    fn t(ms: u64) -> Timestamp {
        Timestamp::from_millis(ms)
    }

    fn ms(ms: u64) -> Duration {
        Duration::from_millis(ms)
    }

    #[test]
    fn test_new_indicator_is_idle_and_dark() {
        let led = Indicator::new();
        assert!(led.is_idle());
        assert!(!led.is_lit());
        assert_eq!(led.deadline(), None);
    }

    #[test]
    fn test_glow_lights_immediately_and_expires() {
        let mut led = Indicator::new();
        led.start_glow(t(100), ms(3000));
        assert!(led.is_lit());
        assert_eq!(led.deadline(), Some(t(3100)));

        assert!(!led.tick(t(1600)));
        assert!(led.is_lit());

        assert!(led.tick(t(3100)));
        assert!(led.is_idle());
        assert!(!led.is_lit());
    }

    #[rstest]
    #[case::blinking(true)]
    #[case::glowing(false)]
    fn test_force_off_cancels_activation(#[case] blink: bool) {
        let mut led = Indicator::new();
        if blink {
            led.start_blink(t(0), ms(10_000));
            led.tick(t(500));
        } else {
            led.start_glow(t(0), ms(10_000));
        }
        led.force_off();

        assert_eq!(led.mode(), IndicatorMode::Idle);
        assert!(!led.is_lit());
        assert!(!led.tick(t(600)));
    }

    #[test]
    fn test_blink_replaces_glow() {
        let mut led = Indicator::new();
        led.start_glow(t(0), ms(3000));
        led.start_blink(t(1000), ms(3000));

        assert!(led.is_blinking());
        assert!(!led.is_lit());
        assert_eq!(led.deadline(), Some(t(4000)));
    }

    #[test]
    fn test_late_tick_toggles_once() {
        let mut led = Indicator::new();
        led.start_blink(t(0), ms(5000));
        assert!(led.tick(t(1700)));
        assert!(led.is_lit());
        assert!(!led.tick(t(2100)));
        assert!(led.tick(t(2200)));
    }

    #[test]
    fn test_zero_duration_glow_ends_on_next_tick() {
        let mut led = Indicator::new();
        led.start_glow(t(50), Duration::ZERO);
        assert!(led.is_lit());
        led.tick(t(50));
        assert!(led.is_idle());
    }

    proptest! {
        #[test]
        fn prop_blink_toggles_every_interval(
            start in 0u64..1_000_000,
            intervals in 1u64..40,
            extra in 0u64..500,
        ) {
            let interval = LED_BLINK_INTERVAL_MS;
            let duration = intervals * interval + extra;
            let mut led = Indicator::new();
            led.start_blink(t(start), ms(duration));

            let mut expected = false;
            let mut k = 1;
            while k * interval < duration {
                prop_assert!(led.tick(t(start + k * interval)));
                expected = !expected;
                prop_assert_eq!(led.is_lit(), expected);
                prop_assert!(led.is_blinking());
                k += 1;
            }

            led.tick(t(start + k * interval));
            prop_assert!(led.is_idle());
            prop_assert!(!led.is_lit());
        }
    }
}
