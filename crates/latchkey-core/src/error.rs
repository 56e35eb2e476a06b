use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    // Protocol errors
    #[error("Malformed record on '{topic}': {reason}")]
    MalformedRecord { topic: String, reason: String },

    #[error("No channel is configured for topic '{0}'")]
    UnknownTopic(String),

    #[error("Invalid door action: {0}")]
    InvalidDoorAction(String),

    #[error("Encoding error: {0}")]
    Encoding(String),

    // Identity errors
    #[error("Invalid device identity: {message}")]
    InvalidIdentity { message: String },
}

impl Error {
    /// Create a malformed record error for the given topic.
    pub fn malformed(topic: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedRecord {
            topic: topic.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_display() {
        let error = Error::malformed("keypad/state", "expected a JSON object");
        assert_eq!(
            error.to_string(),
            "Malformed record on 'keypad/state': expected a JSON object"
        );
    }
}
