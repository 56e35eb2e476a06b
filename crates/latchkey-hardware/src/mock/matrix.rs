//! Mock key matrix.

use crate::{Result, traits::KeyMatrix, types::KeySymbol};
use std::sync::Arc;
use tokio::sync::watch;

/// Key matrix whose held key is set through a [`MockKeyMatrixHandle`].
///
/// # Examples
///
/// ```
/// use latchkey_hardware::mock::MockKeyMatrix;
/// use latchkey_hardware::{KeyMatrix, KeySymbol};
///
/// let (mut matrix, handle) = MockKeyMatrix::new();
/// assert_eq!(matrix.scan().unwrap(), None);
///
/// handle.press(KeySymbol::digit(7).unwrap());
/// assert_eq!(matrix.scan().unwrap(), Some(KeySymbol::digit(7).unwrap()));
///
/// handle.release();
/// assert_eq!(matrix.scan().unwrap(), None);
/// ```
#[derive(Debug)]
pub struct MockKeyMatrix {
    held_rx: watch::Receiver<Option<KeySymbol>>,
}

impl MockKeyMatrix {
    pub fn new() -> (Self, MockKeyMatrixHandle) {
        let (held_tx, held_rx) = watch::channel(None);
        (
            Self { held_rx },
            MockKeyMatrixHandle {
                held_tx: Arc::new(held_tx),
            },
        )
    }
}

impl KeyMatrix for MockKeyMatrix {
    fn scan(&mut self) -> Result<Option<KeySymbol>> {
        Ok(*self.held_rx.borrow())
    }
}

/// Handle for holding and releasing keys on a [`MockKeyMatrix`].
#[derive(Debug, Clone)]
pub struct MockKeyMatrixHandle {
    held_tx: Arc<watch::Sender<Option<KeySymbol>>>,
}

impl MockKeyMatrixHandle {
    /// Hold `key` down until [`release`](Self::release) is called.
    pub fn press(&self, key: KeySymbol) {
        self.held_tx.send_replace(Some(key));
    }

    pub fn release(&self) {
        self.held_tx.send_replace(None);
    }

    /// Key currently held.
    pub fn held(&self) -> Option<KeySymbol> {
        *self.held_tx.borrow()
    }
}
