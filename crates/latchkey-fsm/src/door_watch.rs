//! Door-open timeout monitor.

use latchkey_core::Timestamp;
use latchkey_core::constants::DOOR_ALERT_THRESHOLD_MS;
use std::time::Duration;

use crate::indicator::Indicator;

/// Watches a peer door and raises an alert while it stays open too long.
///
/// While the door is watched, the alert indicator is restarted for another
/// threshold period every time it is found not glowing, so the alarm keeps
/// renewing until a close arrives.
///
/// # Examples
///
/// ```
/// use latchkey_core::Timestamp;
/// use latchkey_fsm::{DoorWatch, Indicator};
///
/// let mut watch = DoorWatch::new();
/// let mut alert = Indicator::new();
///
/// watch.on_open(Timestamp::from_millis(0));
/// watch.tick(Timestamp::from_millis(5001), &mut alert);
/// assert!(alert.is_glowing());
///
/// watch.on_close(&mut alert);
/// assert!(!alert.is_lit());
/// ```
#[derive(Debug, Clone)]
pub struct DoorWatch {
    opened_at: Option<Timestamp>,
    threshold: Duration,
}

impl DoorWatch {
    pub fn new() -> Self {
        Self::with_threshold(Duration::from_millis(DOOR_ALERT_THRESHOLD_MS))
    }

    pub fn with_threshold(threshold: Duration) -> Self {
        Self {
            opened_at: None,
            threshold,
        }
    }

    /// Door reported open at `now`. A repeated open restarts the timer.
    pub fn on_open(&mut self, now: Timestamp) {
        self.opened_at = Some(now);
    }

    /// Door reported closed: stop watching and silence the alert.
    pub fn on_close(&mut self, alert: &mut Indicator) {
        self.opened_at = None;
        alert.force_off();
    }

    /// Advance to `now`, restarting the alert glow when due.
    ///
    /// Returns `true` if the alert was (re)started.
    pub fn tick(&mut self, now: Timestamp, alert: &mut Indicator) -> bool {
        let Some(opened_at) = self.opened_at else {
            return false;
        };

        if now.saturating_since(opened_at) > self.threshold && !alert.is_glowing() {
            alert.start_glow(now, self.threshold);
            return true;
        }

        false
    }

    pub fn is_watching(&self) -> bool {
        self.opened_at.is_some()
    }

    pub fn opened_at(&self) -> Option<Timestamp> {
        self.opened_at
    }

    pub fn threshold(&self) -> Duration {
        self.threshold
    }
}

impl Default for DoorWatch {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(ms: u64) -> Timestamp {
        Timestamp::from_millis(ms)
    }

    #[test]
    fn test_not_watching_never_alerts() {
        let mut watch = DoorWatch::new();
        let mut alert = Indicator::new();
        assert!(!watch.tick(t(60_000), &mut alert));
        assert!(alert.is_idle());
    }

    #[test]
    fn test_threshold_is_strict() {
        let mut watch = DoorWatch::new();
        let mut alert = Indicator::new();
        watch.on_open(t(1000));
        assert!(!watch.tick(t(6000), &mut alert));
        assert!(watch.tick(t(6001), &mut alert));
        assert_eq!(alert.deadline(), Some(t(11_001)));
    }

    #[test]
    fn test_close_while_glowing_forces_off() {
        let mut watch = DoorWatch::new();
        let mut alert = Indicator::new();
        watch.on_open(t(0));
        watch.tick(t(5001), &mut alert);
        assert!(alert.is_glowing());

        watch.on_close(&mut alert);
        assert!(!watch.is_watching());
        assert!(alert.is_idle());
        assert!(!alert.is_lit());
    }

    #[test]
    fn test_alert_renews_until_close() {
        let mut watch = DoorWatch::new();
        let mut alert = Indicator::new();
        watch.on_open(t(0));

        let mut starts = Vec::new();
        for now in (0..=40_000).step_by(10) {
            let now = t(now);
            alert.tick(now);
            if watch.tick(now, &mut alert) {
                starts.push(now.as_millis());
            }
        }

        assert_eq!(starts, vec![5010, 10_010, 15_010, 20_010, 25_010, 30_010, 35_010]);
    }

    #[test]
    fn test_reopen_restarts_timer() {
        let mut watch = DoorWatch::new();
        let mut alert = Indicator::new();
        watch.on_open(t(0));
        watch.on_open(t(4000));
        assert!(!watch.tick(t(8000), &mut alert));
        assert!(watch.tick(t(9001), &mut alert));
    }
}
