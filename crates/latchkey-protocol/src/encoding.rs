//! Transport-safe text encoding for submitted keypad input.
//!
//! Submitted digits are base64-encoded (RFC 4648 standard alphabet, `=`
//! padding to a multiple of four characters). This is not a security measure.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use latchkey_core::{Error, Result};

/// Encode keypad input for the key-submission record.
///
/// # Examples
///
/// ```
/// use latchkey_protocol::encode_input;
///
/// assert_eq!(encode_input("1234"), "MTIzNA==");
/// ```
pub fn encode_input(input: &str) -> String {
    STANDARD.encode(input.as_bytes())
}

/// Reverse [`encode_input`].
///
/// # Errors
/// Returns `Error::Encoding` if `encoded` is not valid padded base64 or does
/// not decode to UTF-8.
pub fn decode_input(encoded: &str) -> Result<String> {
    let bytes = STANDARD
        .decode(encoded)
        .map_err(|e| Error::Encoding(format!("invalid base64 '{encoded}': {e}")))?;
    String::from_utf8(bytes).map_err(|e| Error::Encoding(format!("input is not UTF-8: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("", "")]
    #[case("1", "MQ==")]
    #[case("12", "MTI=")]
    #[case("123", "MTIz")]
    #[case("1234", "MTIzNA==")]
    #[case("0000000000", "MDAwMDAwMDAwMA==")]
    fn test_encode_padding(#[case] input: &str, #[case] expected: &str) {
        let encoded = encode_input(input);
        assert_eq!(encoded, expected);
        assert_eq!(encoded.len() % 4, 0);
    }

    #[test]
    fn test_decode_reverses_encode() {
        assert_eq!(decode_input("OTg3NjU0").unwrap(), "987654");
    }

    #[rstest]
    #[case("MTI")]
    #[case("!!!!")]
    fn test_decode_rejects_invalid(#[case] input: &str) {
        assert!(decode_input(input).is_err());
    }
}
