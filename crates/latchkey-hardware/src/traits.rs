//! Hardware device trait definitions.
//!
//! Devices on the rig run a cooperative sampling loop, so every peripheral is
//! polled rather than awaited: each method reads or drives the current level
//! and returns immediately. Implementations must never block.

use crate::error::Result;
use crate::types::{CardData, KeySymbol};

/// 4x4 key matrix sampled once per loop iteration.
pub trait KeyMatrix: Send {
    /// Key currently held, if any.
    ///
    /// When several keys are held the first one in row-major order of
    /// [`crate::KEYMAP`] is reported.
    fn scan(&mut self) -> Result<Option<KeySymbol>>;
}

/// Single-color LED output.
pub trait IndicatorPin: Send {
    /// Drive the pin on or off.
    fn set_lit(&mut self, lit: bool) -> Result<()>;
}

/// Momentary contact input, such as the door sensor button.
pub trait ContactSensor: Send {
    /// Raw, undebounced contact level.
    fn is_pressed(&mut self) -> Result<bool>;
}

/// RFID/NFC card reader.
pub trait CardReader: Send {
    /// Card read since the last poll, if any.
    fn poll_card(&mut self) -> Result<Option<CardData>>;
}

/// Source of the board's factory serial number.
pub trait SerialSource {
    fn serial_number(&self) -> Result<Vec<u8>>;
}

impl<T: KeyMatrix + ?Sized> KeyMatrix for Box<T> {
    fn scan(&mut self) -> Result<Option<KeySymbol>> {
        (**self).scan()
    }
}

impl<T: IndicatorPin + ?Sized> IndicatorPin for Box<T> {
    fn set_lit(&mut self, lit: bool) -> Result<()> {
        (**self).set_lit(lit)
    }
}

impl<T: ContactSensor + ?Sized> ContactSensor for Box<T> {
    fn is_pressed(&mut self) -> Result<bool> {
        (**self).is_pressed()
    }
}

impl<T: CardReader + ?Sized> CardReader for Box<T> {
    fn poll_card(&mut self) -> Result<Option<CardData>> {
        (**self).poll_card()
    }
}
