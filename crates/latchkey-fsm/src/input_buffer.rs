//! Keypad input buffer.
//!
//! Arming and disarming are driven only by protocol records; key events never
//! change the arm state except through a successful submit.

use latchkey_hardware::KeySymbol;

/// Effect of one key event on a [`KeyEntry`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyOutcome {
    /// The entry is disarmed; the key was dropped.
    Dropped,
    /// Digit appended.
    Appended,
    /// Last digit removed.
    Deleted,
    /// Buffer emptied.
    Cleared,
    /// Buffer submitted and the entry disarmed. Carries the raw digits.
    Submitted(String),
    /// Armed, but the key has no effect (function key, delete or submit on an
    /// empty buffer).
    Ignored,
}

/// Armed/disarmed digit buffer.
///
/// # Examples
///
/// ```
/// use latchkey_fsm::{KeyEntry, KeyOutcome};
/// use latchkey_hardware::KeySymbol;
///
/// let mut entry = KeyEntry::new();
/// entry.arm();
/// entry.press(KeySymbol::digit(4).unwrap());
/// entry.press(KeySymbol::digit(2).unwrap());
///
/// assert_eq!(entry.press(KeySymbol::Enter), KeyOutcome::Submitted("42".to_string()));
/// assert!(!entry.is_armed());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyEntry {
    armed: bool,
    buffer: String,
}

impl KeyEntry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start accepting input with an empty buffer.
    pub fn arm(&mut self) {
        self.armed = true;
        self.buffer.clear();
    }

    /// Stop accepting input and discard the buffer.
    pub fn disarm(&mut self) {
        self.armed = false;
        self.buffer.clear();
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    /// Apply one debounced key event.
    pub fn press(&mut self, key: KeySymbol) -> KeyOutcome {
        if !self.armed {
            return KeyOutcome::Dropped;
        }

        match key {
            KeySymbol::Digit(d) => {
                self.buffer.push(d.as_char());
                KeyOutcome::Appended
            }
            KeySymbol::Delete => match self.buffer.pop() {
                Some(_) => KeyOutcome::Deleted,
                None => KeyOutcome::Ignored,
            },
            KeySymbol::Clear => {
                self.buffer.clear();
                KeyOutcome::Cleared
            }
            KeySymbol::Enter if self.buffer.is_empty() => KeyOutcome::Ignored,
            KeySymbol::Enter => {
                let digits = std::mem::take(&mut self.buffer);
                self.armed = false;
                KeyOutcome::Submitted(digits)
            }
            KeySymbol::Function(_) => KeyOutcome::Ignored,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use latchkey_hardware::FunctionKey;
    use proptest::prelude::*;

    fn armed() -> KeyEntry {
        let mut entry = KeyEntry::new();
        entry.arm();
        entry
    }

    #[test]
    fn test_delete_clear_and_disarmed_digit() {
        let mut entry = armed();
        entry.press(KeySymbol::digit(1).unwrap());
        entry.press(KeySymbol::digit(2).unwrap());
        assert_eq!(entry.buffer(), "12");

        assert_eq!(entry.press(KeySymbol::Delete), KeyOutcome::Deleted);
        assert_eq!(entry.buffer(), "1");

        assert_eq!(entry.press(KeySymbol::Clear), KeyOutcome::Cleared);
        assert_eq!(entry.buffer(), "");

        entry.disarm();
        assert_eq!(entry.press(KeySymbol::digit(9).unwrap()), KeyOutcome::Dropped);
        assert_eq!(entry.buffer(), "");
    }

    #[test]
    fn test_delete_on_empty_is_noop() {
        let mut entry = armed();
        assert_eq!(entry.press(KeySymbol::Delete), KeyOutcome::Ignored);
        assert!(entry.is_armed());
    }

    #[test]
    fn test_submit_empty_keeps_armed() {
        let mut entry = armed();
        assert_eq!(entry.press(KeySymbol::Enter), KeyOutcome::Ignored);
        assert!(entry.is_armed());
    }

    #[test]
    fn test_function_keys_ignored() {
        let mut entry = armed();
        entry.press(KeySymbol::digit(3).unwrap());
        for key in [FunctionKey::A, FunctionKey::B, FunctionKey::F] {
            assert_eq!(entry.press(KeySymbol::Function(key)), KeyOutcome::Ignored);
        }
        assert_eq!(entry.buffer(), "3");
    }

    #[test]
    fn test_submit_clears_and_disarms() {
        let mut entry = armed();
        entry.press(KeySymbol::digit(7).unwrap());
        assert_eq!(
            entry.press(KeySymbol::Enter),
            KeyOutcome::Submitted("7".to_string())
        );
        assert_eq!(entry.buffer(), "");
        assert_eq!(entry.press(KeySymbol::digit(1).unwrap()), KeyOutcome::Dropped);
    }

    #[test]
    fn test_buffer_holds_only_decimal_digits() {
        let mut entry = armed();
        for c in "0123456789".chars() {
            entry.press(KeySymbol::from_char(c).unwrap());
        }
        assert_eq!(entry.buffer(), "0123456789");
        assert!(KeySymbol::digit(12).is_err());
    }

    #[test]
    fn test_arm_discards_stale_buffer() {
        let mut entry = armed();
        entry.press(KeySymbol::digit(5).unwrap());
        entry.arm();
        assert_eq!(entry.buffer(), "");
    }

    fn any_key() -> impl Strategy<Value = KeySymbol> {
        prop_oneof![
            (0u8..=9).prop_map(|d| KeySymbol::digit(d).unwrap()),
            Just(KeySymbol::Enter),
            Just(KeySymbol::Delete),
            Just(KeySymbol::Clear),
            prop::sample::select(vec![FunctionKey::A, FunctionKey::B, FunctionKey::F])
                .prop_map(KeySymbol::Function),
        ]
    }

    proptest! {
        #[test]
        fn prop_disarmed_entry_never_changes(keys in prop::collection::vec(any_key(), 0..64)) {
            let mut entry = KeyEntry::new();
            for key in keys {
                prop_assert_eq!(entry.press(key), KeyOutcome::Dropped);
                prop_assert_eq!(entry.buffer(), "");
                prop_assert!(!entry.is_armed());
            }
        }

        #[test]
        fn prop_buffer_only_holds_digits(keys in prop::collection::vec(any_key(), 0..64)) {
            let mut entry = armed();
            for key in keys {
                if let KeyOutcome::Submitted(digits) = entry.press(key) {
                    prop_assert!(!digits.is_empty());
                    prop_assert!(digits.chars().all(|c| c.is_ascii_digit()));
                    entry.arm();
                }
                prop_assert!(entry.buffer().chars().all(|c| c.is_ascii_digit()));
            }
        }
    }
}
