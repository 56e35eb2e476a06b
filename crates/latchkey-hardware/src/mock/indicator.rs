//! Mock LED output.

use crate::{Result, traits::IndicatorPin};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::watch;

/// LED pin whose level is observed through a [`MockIndicatorHandle`].
///
/// # Examples
///
/// ```
/// use latchkey_hardware::IndicatorPin;
/// use latchkey_hardware::mock::MockIndicatorPin;
///
/// let (mut led, handle) = MockIndicatorPin::new("red");
/// led.set_lit(true).unwrap();
/// assert!(handle.is_lit());
/// assert_eq!(handle.transitions(), 1);
/// ```
#[derive(Debug)]
pub struct MockIndicatorPin {
    lit_tx: watch::Sender<bool>,
    transitions: Arc<AtomicUsize>,
}

impl MockIndicatorPin {
    pub fn new(name: impl Into<String>) -> (Self, MockIndicatorHandle) {
        let (lit_tx, lit_rx) = watch::channel(false);
        let transitions = Arc::new(AtomicUsize::new(0));
        (
            Self {
                lit_tx,
                transitions: Arc::clone(&transitions),
            },
            MockIndicatorHandle {
                name: name.into(),
                lit_rx,
                transitions,
            },
        )
    }
}

impl IndicatorPin for MockIndicatorPin {
    fn set_lit(&mut self, lit: bool) -> Result<()> {
        let previous = self.lit_tx.send_replace(lit);
        if previous != lit {
            self.transitions.fetch_add(1, Ordering::Relaxed);
        }
        Ok(())
    }
}

/// Read-only view of a [`MockIndicatorPin`].
#[derive(Debug, Clone)]
pub struct MockIndicatorHandle {
    name: String,
    lit_rx: watch::Receiver<bool>,
    transitions: Arc<AtomicUsize>,
}

impl MockIndicatorHandle {
    pub fn is_lit(&self) -> bool {
        *self.lit_rx.borrow()
    }

    /// Number of on/off level changes driven so far.
    pub fn transitions(&self) -> usize {
        self.transitions.load(Ordering::Relaxed)
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeated_level_is_not_a_transition() {
        let (mut led, handle) = MockIndicatorPin::new("green");
        led.set_lit(false).unwrap();
        assert_eq!(handle.transitions(), 0);

        led.set_lit(true).unwrap();
        led.set_lit(true).unwrap();
        led.set_lit(false).unwrap();
        assert_eq!(handle.transitions(), 2);
        assert!(!handle.is_lit());
        assert_eq!(handle.name(), "green");
    }
}
