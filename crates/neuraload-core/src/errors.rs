//! Error types for the publication engine
//!
//! `PublishError` covers everything that can go wrong between a Value Source
//! and the Transport Adapter. Only `DuplicateIdentity` and
//! `InvalidConfiguration` are meant to be fatal; the rest are reported and
//! recovered from by the scheduler.

use thiserror::Error;
use uuid::Uuid;

// ----------------------------------------------------------------------------
// Payload Errors
// ----------------------------------------------------------------------------

/// Errors raised while decoding a characteristic payload
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PayloadError {
    #[error("Invalid payload length: expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("Payload length {actual} is not a multiple of the {width}-byte sample width")]
    MisalignedLength { width: usize, actual: usize },

    #[error("Identity payload is not valid UTF-8")]
    InvalidUtf8,
}

// ----------------------------------------------------------------------------
// Publication Errors
// ----------------------------------------------------------------------------

/// Errors produced by characteristics, the scheduler and the service registry
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PublishError {
    #[error("Value source unavailable: {reason}")]
    SourceUnavailable { reason: String },

    #[error("Delivery failed for characteristic {uuid}: {reason}")]
    DeliveryFailed { uuid: Uuid, reason: String },

    #[error("Characteristic {uuid} is already registered in this service")]
    DuplicateIdentity { uuid: Uuid },

    #[error("Characteristic {uuid} does not permit {operation}")]
    NotPermitted { uuid: Uuid, operation: &'static str },

    #[error("Publisher for characteristic {uuid} has stopped")]
    SchedulerStopped { uuid: Uuid },

    #[error("Invalid configuration: {reason}")]
    InvalidConfiguration { reason: String },

    #[error("Payload error: {0}")]
    Payload(#[from] PayloadError),
}

impl PublishError {
    /// Shorthand for a `SourceUnavailable` error
    pub fn source_unavailable(reason: impl Into<String>) -> Self {
        Self::SourceUnavailable {
            reason: reason.into(),
        }
    }

    /// Shorthand for a `DeliveryFailed` error
    pub fn delivery_failed(uuid: Uuid, reason: impl Into<String>) -> Self {
        Self::DeliveryFailed {
            uuid,
            reason: reason.into(),
        }
    }

    /// Whether this error should abort startup rather than be logged and skipped
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::DuplicateIdentity { .. } | Self::InvalidConfiguration { .. }
        )
    }
}

/// Result type for publication operations
pub type Result<T> = std::result::Result<T, PublishError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatality_classification() {
        let uuid = Uuid::from_u128(1);
        assert!(PublishError::DuplicateIdentity { uuid }.is_fatal());
        assert!(PublishError::InvalidConfiguration {
            reason: "zero interval".into()
        }
        .is_fatal());
        assert!(!PublishError::source_unavailable("sensor bus").is_fatal());
        assert!(!PublishError::delivery_failed(uuid, "no subscriber").is_fatal());
    }

    #[test]
    fn test_payload_error_conversion() {
        let err: PublishError = PayloadError::InvalidUtf8.into();
        assert_eq!(err, PublishError::Payload(PayloadError::InvalidUtf8));
    }
}
