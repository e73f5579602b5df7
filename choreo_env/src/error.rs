//! Error types shared by the engine and its collaborators.

use thiserror::Error;

/// Errors that can occur while driving a choreography.
#[derive(Debug, Error)]
pub enum ChoreoError {
    /// Scenario payload was not well-formed
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// A tuning parameter was rejected (non-finite or out of range)
    #[error("Invalid {name}: {value}")]
    InvalidParameter { name: &'static str, value: f64 },

    /// Reading or writing a scenario file failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A notification channel was closed before delivery
    #[error("Channel error: {0}")]
    Channel(String),
}

impl ChoreoError {
    /// Creates an invalid-parameter error.
    pub fn invalid(name: &'static str, value: f64) -> Self {
        Self::InvalidParameter { name, value }
    }

    /// Creates a channel error.
    pub fn channel(msg: impl Into<String>) -> Self {
        Self::Channel(msg.into())
    }

    /// Returns true if this is a payload parse failure.
    pub fn is_parse(&self) -> bool {
        matches!(self, Self::Parse(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_from_serde() {
        let err: ChoreoError = serde_json::from_str::<serde_json::Value>("{not json")
            .unwrap_err()
            .into();
        assert!(err.is_parse());
        assert!(err.to_string().starts_with("Parse error"));
    }

    #[test]
    fn test_invalid_parameter_display() {
        let err = ChoreoError::invalid("speed", f64::NAN);
        assert_eq!(err.to_string(), "Invalid speed: NaN");
        assert!(!err.is_parse());
    }
}
