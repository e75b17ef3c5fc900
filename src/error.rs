//! Error types for driftwatch.
//!
//! All errors are strongly typed using thiserror. This enables pattern
//! matching on specific error conditions and provides clear error messages.

use thiserror::Error;

/// Validation errors that occur when configuration is constructed.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Alert threshold {value} is out of range [0.0, 1.0]")]
    ThresholdOutOfRange {
        value: f64,
    },

    #[error("Topic name cannot be empty")]
    EmptyTopicName,

    #[error("Smoothing factor {value} must be positive")]
    NonPositiveSmoothing {
        value: f64,
    },

    #[error("Queue capacity must be at least 1")]
    ZeroCapacity,
}

/// Transport errors raised by the event bus.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Topic not found: {topic}")]
    TopicNotFound {
        topic: String,
    },

    #[error("Queue full on path '{path}' (capacity: {capacity})")]
    QueueFull {
        path: String,
        capacity: usize,
    },

    #[error("Channel disconnected on path '{path}'")]
    Disconnected {
        path: String,
    },

    #[error("Receive timed out after {duration_ms}ms")]
    Timeout {
        duration_ms: u64,
    },
}

/// Codec errors raised while encoding or decoding event payloads.
///
/// Decoding a malformed event is recoverable: consume loops log the failure
/// and skip the event rather than terminating.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("Unexpected mimetype: expected {expected}, got {actual}")]
    UnexpectedMimetype {
        expected: String,
        actual: String,
    },

    #[error("Failed to serialize payload: {message}")]
    SerializationFailed {
        message: String,
    },

    #[error("Failed to deserialize payload: {message}")]
    DeserializationFailed {
        message: String,
    },

    #[error("Sentiment label {value} is outside the label set {{0, 1}}")]
    LabelOutOfRange {
        value: u8,
    },
}

/// Top-level error type for driftwatch.
#[derive(Debug, Error)]
pub enum DriftError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("Record source error: {0}")]
    Source(#[from] std::io::Error),

    #[error("Internal error: {message}")]
    Internal {
        message: String,
    },
}

impl DriftError {
    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns true if this is a transport error.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// Returns true if this error can be handled by skipping the offending
    /// event and continuing the consume loop.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Codec(_))
    }
}

/// Result type alias for driftwatch operations.
pub type DriftResult<T> = Result<T, DriftError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_threshold() {
        let err = ValidationError::ThresholdOutOfRange { value: 1.5 };
        let msg = format!("{err}");
        assert!(msg.contains("1.5"));
        assert!(msg.contains("out of range"));
    }

    #[test]
    fn test_transport_error_queue_full() {
        let err = TransportError::QueueFull {
            path: "publish".to_string(),
            capacity: 1024,
        };
        let msg = format!("{err}");
        assert!(msg.contains("publish"));
        assert!(msg.contains("1024"));
    }

    #[test]
    fn test_codec_error_label() {
        let err = CodecError::LabelOutOfRange { value: 7 };
        let msg = format!("{err}");
        assert!(msg.contains('7'));
    }

    #[test]
    fn test_drift_error_from_codec_is_recoverable() {
        let codec_err = CodecError::DeserializationFailed {
            message: "truncated".to_string(),
        };
        let err: DriftError = codec_err.into();
        assert!(err.is_recoverable());
        assert!(!err.is_transport());
    }

    #[test]
    fn test_drift_error_from_transport_is_not_recoverable() {
        let transport_err = TransportError::Disconnected {
            path: "topic_stream".to_string(),
        };
        let err: DriftError = transport_err.into();
        assert!(err.is_transport());
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_drift_error_internal() {
        let err = DriftError::internal("unexpected state");
        let msg = format!("{err}");
        assert!(msg.contains("unexpected state"));
    }
}
