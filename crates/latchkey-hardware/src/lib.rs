//! Hardware abstraction layer for the latchkey access-control rig.
//!
//! Peripherals are modelled as small synchronous traits that a device loop
//! samples once per iteration:
//!
//! - [`KeyMatrix`]: 4x4 keypad matrix, row-major tie-break.
//! - [`IndicatorPin`]: single LED output.
//! - [`ContactSensor`]: door sensor button.
//! - [`CardReader`]: RFID/NFC reader.
//! - [`SerialSource`]: factory serial used to derive the device identity.
//!
//! The [`mock`] module provides in-memory implementations controlled through
//! handles, used by tests and the simulator.
//!
//! ```
//! use latchkey_hardware::mock::MockKeyMatrix;
//! use latchkey_hardware::{KeyMatrix, KeySymbol, Result};
//!
//! fn held_digit<M: KeyMatrix>(matrix: &mut M) -> Result<Option<u8>> {
//!     Ok(match matrix.scan()? {
//!         Some(KeySymbol::Digit(d)) => Some(d.value()),
//!         _ => None,
//!     })
//! }
//!
//! let (mut matrix, handle) = MockKeyMatrix::new();
//! handle.press(KeySymbol::from_char('4')?);
//! assert_eq!(held_digit(&mut matrix)?, Some(4));
//! # Ok::<(), latchkey_hardware::HardwareError>(())
//! ```

pub mod error;
pub mod matrix;
pub mod mock;
pub mod traits;
pub mod types;

pub use error::{HardwareError, Result};
pub use matrix::{MatrixLines, ScanningMatrix};
pub use traits::{CardReader, ContactSensor, IndicatorPin, KeyMatrix, SerialSource};
pub use types::{
    CardData, CardType, Digit, FunctionKey, KEYMAP, KeySymbol, MAX_UID_LENGTH, MIN_UID_LENGTH,
};

use latchkey_core::DeviceIdentity;

/// Derive the device identity from a board's serial number.
///
/// # Errors
///
/// Returns an error if the serial cannot be read or is empty.
pub fn identity_from<S: SerialSource + ?Sized>(source: &S) -> Result<DeviceIdentity> {
    let serial = source.serial_number()?;
    DeviceIdentity::from_serial(&serial).map_err(|e| HardwareError::invalid_data(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::FixedSerial;

    #[test]
    fn test_identity_from_serial() {
        let id = identity_from(&FixedSerial(vec![0x30, 0x42, 0xC9])).unwrap();
        assert_eq!(id.as_str(), "3042C9");
    }
}
