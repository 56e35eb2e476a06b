//! Hardware error type.
//!
//! Device loops log these and keep their last-known-good state; none of them
//! stop a loop.

pub type Result<T> = std::result::Result<T, HardwareError>;

#[derive(Debug, thiserror::Error)]
pub enum HardwareError {
    /// The peripheral (or the mock feeding it) went away.
    #[error("{device} is disconnected")]
    Disconnected { device: String },

    /// A read produced a value outside what the rig understands.
    #[error("Invalid data: {message}")]
    InvalidData { message: String },

    /// Driving or reading a GPIO line failed.
    #[error("Line {line} fault: {message}")]
    LineFault { line: String, message: String },
}

impl HardwareError {
    pub fn disconnected(device: impl Into<String>) -> Self {
        Self::Disconnected {
            device: device.into(),
        }
    }

    pub fn invalid_data(message: impl Into<String>) -> Self {
        Self::InvalidData {
            message: message.into(),
        }
    }

    pub fn line_fault(line: impl Into<String>, message: impl Into<String>) -> Self {
        Self::LineFault {
            line: line.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(
            HardwareError::disconnected("Card reader").to_string(),
            "Card reader is disconnected"
        );
        assert_eq!(
            HardwareError::invalid_data("UID too short").to_string(),
            "Invalid data: UID too short"
        );
        assert_eq!(
            HardwareError::line_fault("row 2", "pin not configured").to_string(),
            "Line row 2 fault: pin not configured"
        );
    }
}
