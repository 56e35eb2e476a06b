use latchkey_core::Timestamp;
use latchkey_core::constants::RFID_DEDUPE_WINDOW_MS;
use std::time::Duration;

/// Suppresses repeated reads of the card that was published last.
#[derive(Debug, Clone)]
pub struct CardDedupe {
    window: Duration,
    last: Option<(Vec<u8>, Timestamp)>,
}

impl CardDedupe {
    pub fn new() -> Self {
        Self::with_window(Duration::from_millis(RFID_DEDUPE_WINDOW_MS))
    }

    pub fn with_window(window: Duration) -> Self {
        Self { window, last: None }
    }

    /// Whether a read of `uid` at `now` should be published.
    ///
    /// An admitted read becomes the new reference; a suppressed one does not
    /// extend the window.
    pub fn admit(&mut self, uid: &[u8], now: Timestamp) -> bool {
        if let Some((last_uid, published_at)) = &self.last
            && last_uid.as_slice() == uid
            && now.saturating_since(*published_at) < self.window
        {
            return false;
        }

        self.last = Some((uid.to_vec(), now));
        true
    }
}

impl Default for CardDedupe {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const CARD: &[u8] = &[0x04, 0xAB, 0xCD, 0xEF];
    const OTHER: &[u8] = &[0x11, 0x22, 0x33, 0x44];

    fn t(ms: u64) -> Timestamp {
        Timestamp::from_millis(ms)
    }

    #[rstest]
    #[case(CARD, 1499, false)]
    #[case(CARD, 1500, true)]
    #[case(OTHER, 10, true)]
    fn test_second_read(#[case] uid: &[u8], #[case] at: u64, #[case] admitted: bool) {
        let mut dedupe = CardDedupe::new();
        assert!(dedupe.admit(CARD, t(0)));
        assert_eq!(dedupe.admit(uid, t(at)), admitted);
    }

    #[test]
    fn test_suppressed_reads_do_not_extend_window() {
        let mut dedupe = CardDedupe::new();
        assert!(dedupe.admit(CARD, t(0)));
        assert!(!dedupe.admit(CARD, t(1000)));
        assert!(!dedupe.admit(CARD, t(1400)));
        assert!(dedupe.admit(CARD, t(1600)));
    }

    #[test]
    fn test_alternating_cards_always_admitted() {
        let mut dedupe = CardDedupe::new();
        assert!(dedupe.admit(CARD, t(0)));
        assert!(dedupe.admit(OTHER, t(100)));
        assert!(dedupe.admit(CARD, t(200)));
    }
}
