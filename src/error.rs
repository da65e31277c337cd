// Moderation error taxonomy.
//
// Everything inside the engine (parsing, tokenizing, rule evaluation,
// formatting) is infallible. Only the two classifier calls and request
// decoding can fail, and those failures reach the caller unchanged. A failed
// moderation call is never reported as "allowed".

use thiserror::Error;

/// Which external classifier failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    Sentiment,
    EntityRecognition,
}

impl std::fmt::Display for Service {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Service::Sentiment => write!(f, "sentiment classifier"),
            Service::EntityRecognition => write!(f, "entity recognizer"),
        }
    }
}

#[derive(Error, Debug)]
pub enum ModerationError {
    /// A classifier failed or returned a value outside its contract.
    /// Evaluation is aborted; no partial verdict is produced.
    #[error("{service} unavailable: {source:#}")]
    ServiceUnavailable {
        service: Service,
        #[source]
        source: anyhow::Error,
    },

    /// The request itself was malformed. Raised before any classifier call.
    #[error("invalid input for `{field}`: {reason}")]
    InvalidInput { field: &'static str, reason: String },
}

impl ModerationError {
    pub fn unavailable(service: Service, source: anyhow::Error) -> Self {
        Self::ServiceUnavailable { service, source }
    }

    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            field,
            reason: reason.into(),
        }
    }

    pub fn is_service_unavailable(&self) -> bool {
        matches!(self, Self::ServiceUnavailable { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_unavailable_message_names_service() {
        let err = ModerationError::unavailable(
            Service::Sentiment,
            anyhow::anyhow!("connection refused"),
        );
        let msg = err.to_string();
        assert!(msg.contains("sentiment classifier"), "got: {msg}");
        assert!(msg.contains("connection refused"), "got: {msg}");
        assert!(err.is_service_unavailable());
    }

    #[test]
    fn test_invalid_input_message_names_field() {
        let err = ModerationError::invalid("message", "expected a string");
        assert_eq!(
            err.to_string(),
            "invalid input for `message`: expected a string"
        );
        assert!(!err.is_service_unavailable());
    }
}
