//! Value types shared by hardware traits.

use crate::error::{HardwareError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A decimal digit, 0 through 9.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Digit(u8);

impl Digit {
    /// # Errors
    ///
    /// Returns an error if `value` is greater than 9.
    pub fn new(value: u8) -> Result<Self> {
        if value > 9 {
            return Err(HardwareError::invalid_data(format!(
                "Digit must be 0-9, got {value}"
            )));
        }
        Ok(Self(value))
    }

    pub fn value(self) -> u8 {
        self.0
    }

    pub fn as_char(self) -> char {
        char::from(b'0' + self.0)
    }
}

impl TryFrom<u8> for Digit {
    type Error = HardwareError;

    fn try_from(value: u8) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Digit> for u8 {
    fn from(digit: Digit) -> Self {
        digit.0
    }
}

/// Keys with no assigned meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FunctionKey {
    A,
    B,
    F,
}

impl FunctionKey {
    pub fn as_char(self) -> char {
        match self {
            Self::A => 'A',
            Self::B => 'B',
            Self::F => 'F',
        }
    }
}

/// Symbol reported by the 4x4 key matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeySymbol {
    Digit(Digit),

    /// Submit the buffered input (`E`).
    Enter,

    /// Remove the last buffered character (`D`).
    Delete,

    /// Discard the whole buffer (`C`).
    Clear,

    Function(FunctionKey),
}

/// Symbols of the key matrix, indexed by `[row][column]`.
pub const KEYMAP: [[char; 4]; 4] = [
    ['1', '2', '3', 'A'],
    ['4', '5', '6', 'B'],
    ['7', '8', '9', 'C'],
    ['0', 'F', 'E', 'D'],
];

impl KeySymbol {
    /// Create a digit symbol.
    ///
    /// # Errors
    ///
    /// Returns an error if the digit is greater than 9.
    pub fn digit(d: u8) -> Result<Self> {
        Digit::new(d).map(Self::Digit)
    }

    /// Map a keymap character to its symbol.
    ///
    /// # Errors
    ///
    /// Returns an error for characters that are not printed on the matrix.
    ///
    /// # Examples
    ///
    /// ```
    /// use latchkey_hardware::KeySymbol;
    ///
    /// assert_eq!(KeySymbol::from_char('7').unwrap(), KeySymbol::digit(7).unwrap());
    /// assert_eq!(KeySymbol::from_char('E').unwrap(), KeySymbol::Enter);
    /// assert!(KeySymbol::from_char('#').is_err());
    /// ```
    pub fn from_char(c: char) -> Result<Self> {
        match c {
            '0'..='9' => Self::digit(c as u8 - b'0'),
            'E' => Ok(Self::Enter),
            'D' => Ok(Self::Delete),
            'C' => Ok(Self::Clear),
            'A' => Ok(Self::Function(FunctionKey::A)),
            'B' => Ok(Self::Function(FunctionKey::B)),
            'F' => Ok(Self::Function(FunctionKey::F)),
            other => Err(HardwareError::invalid_data(format!(
                "'{other}' is not a key on the matrix"
            ))),
        }
    }

    /// Symbol at `row`, `column` of [`KEYMAP`].
    pub fn at(row: usize, column: usize) -> Option<Self> {
        let c = *KEYMAP.get(row)?.get(column)?;
        Self::from_char(c).ok()
    }

    /// Character printed on the key.
    pub fn as_char(self) -> char {
        match self {
            Self::Digit(d) => d.as_char(),
            Self::Enter => 'E',
            Self::Delete => 'D',
            Self::Clear => 'C',
            Self::Function(key) => key.as_char(),
        }
    }
}

impl fmt::Display for KeySymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// RFID card type identification.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CardType {
    /// Mifare Classic 1K.
    MifareClassic1K,

    /// Mifare Ultralight.
    MifareUltralight,

    /// Card whose SAK byte is not recognised.
    Unknown(u8),
}

impl CardType {
    pub fn name(&self) -> &str {
        match self {
            Self::MifareClassic1K => "Mifare Classic 1K",
            Self::MifareUltralight => "Mifare Ultralight",
            Self::Unknown(_) => "Unknown",
        }
    }
}

/// Minimum UID length in bytes (ISO 14443).
pub const MIN_UID_LENGTH: usize = 4;

/// Maximum UID length in bytes (ISO 14443).
pub const MAX_UID_LENGTH: usize = 10;

/// Card read by an RFID reader.
#[derive(Debug, Clone)]
pub struct CardData {
    /// Card unique identifier (4-10 bytes).
    pub uid: Vec<u8>,

    pub card_type: CardType,
}

impl CardData {
    /// Create card data from a raw UID.
    ///
    /// # Errors
    ///
    /// Returns an error if the UID length is outside
    /// `MIN_UID_LENGTH..=MAX_UID_LENGTH`.
    pub fn new(uid: Vec<u8>, card_type: CardType) -> Result<Self> {
        if !(MIN_UID_LENGTH..=MAX_UID_LENGTH).contains(&uid.len()) {
            return Err(HardwareError::invalid_data(format!(
                "UID length must be {}-{} bytes, got {}",
                MIN_UID_LENGTH,
                MAX_UID_LENGTH,
                uid.len()
            )));
        }
        Ok(Self { uid, card_type })
    }

    /// UID as uppercase hex pairs separated by colons.
    ///
    /// # Examples
    ///
    /// ```
    /// use latchkey_hardware::{CardData, CardType};
    ///
    /// let card = CardData::new(vec![0x04, 0xAB, 0x0C, 0xEF], CardType::MifareClassic1K).unwrap();
    /// assert_eq!(card.uid_colon_hex(), "04:AB:0C:EF");
    /// ```
    pub fn uid_colon_hex(&self) -> String {
        self.uid
            .iter()
            .map(|b| format!("{b:02X}"))
            .collect::<Vec<_>>()
            .join(":")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case('0', KeySymbol::digit(0).unwrap())]
    #[case('9', KeySymbol::digit(9).unwrap())]
    #[case('E', KeySymbol::Enter)]
    #[case('D', KeySymbol::Delete)]
    #[case('C', KeySymbol::Clear)]
    #[case('A', KeySymbol::Function(FunctionKey::A))]
    #[case('F', KeySymbol::Function(FunctionKey::F))]
    fn test_key_symbol_from_char(#[case] c: char, #[case] expected: KeySymbol) {
        let symbol = KeySymbol::from_char(c).unwrap();
        assert_eq!(symbol, expected);
        assert_eq!(symbol.as_char(), c);
    }

    #[test]
    fn test_keymap_positions() {
        assert_eq!(KeySymbol::at(0, 0), KeySymbol::digit(1).ok());
        assert_eq!(KeySymbol::at(3, 0), KeySymbol::digit(0).ok());
        assert_eq!(KeySymbol::at(3, 2), Some(KeySymbol::Enter));
        assert_eq!(KeySymbol::at(3, 3), Some(KeySymbol::Delete));
        assert_eq!(KeySymbol::at(2, 3), Some(KeySymbol::Clear));
        assert_eq!(KeySymbol::at(4, 0), None);
    }

    #[test]
    fn test_every_keymap_char_is_a_symbol() {
        for row in KEYMAP {
            for c in row {
                assert!(KeySymbol::from_char(c).is_ok(), "{c}");
            }
        }
    }

    #[rstest]
    #[case(10)]
    #[case(12)]
    #[case(250)]
    fn test_digit_out_of_range_rejected(#[case] value: u8) {
        assert!(Digit::new(value).is_err());
        assert!(KeySymbol::digit(value).is_err());
    }

    #[test]
    fn test_digit_chars() {
        for value in 0..=9u8 {
            let digit = Digit::new(value).unwrap();
            assert_eq!(digit.value(), value);
            assert!(digit.as_char().is_ascii_digit());
        }
    }

    #[rstest]
    #[case('<')]
    #[case('G')]
    #[case('a')]
    fn test_off_matrix_chars_rejected(#[case] c: char) {
        assert!(KeySymbol::from_char(c).is_err());
    }

    #[test]
    fn test_digit_deserialize_checks_range() {
        let ok: KeySymbol = serde_json::from_str(r#"{"Digit":7}"#).unwrap();
        assert_eq!(ok, KeySymbol::digit(7).unwrap());
        assert!(serde_json::from_str::<KeySymbol>(r#"{"Digit":12}"#).is_err());
        assert!(serde_json::from_str::<KeySymbol>(r#"{"Function":"Z"}"#).is_err());
    }

    #[rstest]
    #[case(vec![0x01, 0x02, 0x03])]
    #[case(vec![0u8; 11])]
    fn test_card_uid_length_rejected(#[case] uid: Vec<u8>) {
        assert!(CardData::new(uid, CardType::MifareClassic1K).is_err());
    }

    #[test]
    fn test_uid_colon_hex_seven_bytes() {
        let card = CardData::new(
            vec![0x04, 0x5A, 0x1B, 0x22, 0x9F, 0x61, 0x80],
            CardType::MifareUltralight,
        )
        .unwrap();
        assert_eq!(card.uid_colon_hex(), "04:5A:1B:22:9F:61:80");
    }
}
