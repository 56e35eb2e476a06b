use crate::{Result, constants::MAX_IDENTITY_LENGTH, error::Error};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable per-device identity token.
///
/// The token doubles as the transport client identifier and as the
/// `deviceId` field of every record a device publishes or accepts. On real
/// hardware it is derived from the microcontroller serial number and rendered
/// as uppercase hexadecimal (e.g. `304242375241C9033432`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DeviceIdentity(String);

impl DeviceIdentity {
    /// Create an identity from an existing token.
    ///
    /// The token is trimmed before validation.
    ///
    /// # Errors
    /// Returns `Error::InvalidIdentity` if the token is empty, longer than
    /// [`MAX_IDENTITY_LENGTH`], or contains anything other than ASCII
    /// alphanumerics, `-` and `_`.
    pub fn new(token: &str) -> Result<Self> {
        let token = token.trim();

        if token.is_empty() {
            return Err(Error::InvalidIdentity {
                message: "identity must not be empty".to_string(),
            });
        }

        if token.len() > MAX_IDENTITY_LENGTH {
            return Err(Error::InvalidIdentity {
                message: format!(
                    "identity must be at most {MAX_IDENTITY_LENGTH} chars, got {}",
                    token.len()
                ),
            });
        }

        if !token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(Error::InvalidIdentity {
                message: format!("identity contains invalid characters: {token}"),
            });
        }

        Ok(DeviceIdentity(token.to_string()))
    }

    /// Derive an identity from raw hardware serial bytes.
    ///
    /// Each byte becomes two uppercase hex digits, in order.
    ///
    /// # Errors
    /// Returns `Error::InvalidIdentity` if `serial` is empty or too long to
    /// fit in [`MAX_IDENTITY_LENGTH`] hex characters.
    ///
    /// # Examples
    ///
    /// ```
    /// use latchkey_core::DeviceIdentity;
    ///
    /// let id = DeviceIdentity::from_serial(&[0x30, 0x42, 0x0A]).unwrap();
    /// assert_eq!(id.as_str(), "30420A");
    /// ```
    pub fn from_serial(serial: &[u8]) -> Result<Self> {
        let hex: String = serial.iter().map(|b| format!("{b:02X}")).collect();
        DeviceIdentity::new(&hex)
    }

    /// Get the identity as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for DeviceIdentity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        DeviceIdentity::new(s)
    }
}

impl TryFrom<String> for DeviceIdentity {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        DeviceIdentity::new(&value)
    }
}

impl From<DeviceIdentity> for String {
    fn from(id: DeviceIdentity) -> Self {
        id.0
    }
}

impl PartialEq<str> for DeviceIdentity {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}
