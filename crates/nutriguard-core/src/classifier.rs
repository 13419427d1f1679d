//! Failure classification.
//!
//! Maps every failure that can occur around an LLM call (validation,
//! transport, upstream status, missing credential) onto an [`ErrorRecord`]
//! with a fixed severity and retryability. Pure and deterministic.

use thiserror::Error;

use crate::record::{ErrorKind, ErrorRecord, Severity, StatusCategory, TransportFailure};
use crate::validator::{Rejection, RejectionKind};

/// Any failure observed at a boundary, before classification.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Failure {
    #[error("No API credential configured")]
    MissingCredential,

    #[error("LLM response rejected: {0}")]
    Rejected(#[from] Rejection),

    #[error("Transport failure: {0}")]
    Transport(TransportFailure),

    #[error("Upstream service returned status {status}")]
    Upstream { status: u16 },

    #[error("{0}")]
    Unrecognized(String),
}

impl From<TransportFailure> for Failure {
    fn from(kind: TransportFailure) -> Self {
        Failure::Transport(kind)
    }
}

/// Conversion into a classified record.
///
/// Lets retry wrappers accept either raw failures or already-classified
/// records from the operations they run.
pub trait IntoErrorRecord {
    fn into_error_record(self, classifier: &ErrorClassifier, context: &str) -> ErrorRecord;
}

impl IntoErrorRecord for ErrorRecord {
    fn into_error_record(self, _classifier: &ErrorClassifier, _context: &str) -> ErrorRecord {
        self
    }
}

impl IntoErrorRecord for Failure {
    fn into_error_record(self, classifier: &ErrorClassifier, context: &str) -> ErrorRecord {
        classifier.classify(&self, context)
    }
}

impl IntoErrorRecord for Rejection {
    fn into_error_record(self, classifier: &ErrorClassifier, context: &str) -> ErrorRecord {
        classifier.classify(&Failure::Rejected(self), context)
    }
}

/// Classifies failures into display-ready [`ErrorRecord`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorClassifier;

impl ErrorClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Classify `failure` raised by the operation labelled `context`.
    pub fn classify(&self, failure: &Failure, context: &str) -> ErrorRecord {
        match failure {
            Failure::MissingCredential => ErrorRecord::new(
                ErrorKind::NoCredential,
                "API Key Required",
                format!("{} needs an API key. Add your key in Settings and try again.", context),
                context,
                Severity::High,
                false,
            ),
            Failure::Rejected(rejection) => classify_rejection(rejection, context),
            Failure::Transport(kind) => classify_transport(*kind, context),
            Failure::Upstream { status } => classify_status(*status, context),
            Failure::Unrecognized(detail) => {
                tracing::debug!(context, detail = %detail, "Classifying unrecognized failure");
                ErrorRecord::new(
                    ErrorKind::UnknownError,
                    "Something Went Wrong",
                    format!("{} failed unexpectedly. Please try again.", context),
                    context,
                    Severity::Medium,
                    true,
                )
            }
        }
    }
}

fn classify_rejection(rejection: &Rejection, context: &str) -> ErrorRecord {
    let kind = ErrorKind::MalformedOutput {
        stage: rejection.kind,
    };

    match rejection.kind {
        RejectionKind::StructuralMismatch | RejectionKind::DecodeFailure => ErrorRecord::new(
            kind,
            "Unexpected Response",
            format!(
                "The response for {} was not in the expected format. Please try again.",
                context
            ),
            context,
            Severity::Medium,
            true,
        ),
        RejectionKind::OutOfRange => ErrorRecord::new(
            kind,
            "Implausible Values",
            format!(
                "The response for {} contained an implausible value for '{}'. Please try again.",
                context, rejection.detail
            ),
            context,
            Severity::Low,
            true,
        ),
        RejectionKind::EmptyField => ErrorRecord::new(
            kind,
            "Incomplete Response",
            format!(
                "The response for {} left '{}' empty. Please try again.",
                context, rejection.detail
            ),
            context,
            Severity::Low,
            true,
        ),
    }
}

fn classify_transport(failure: TransportFailure, context: &str) -> ErrorRecord {
    let kind = ErrorKind::TransportError { kind: failure };

    let (title, message, severity, retryable) = match failure {
        TransportFailure::Offline => (
            "No Internet Connection",
            format!("{} requires an internet connection. Check your connection and try again.", context),
            Severity::High,
            true,
        ),
        TransportFailure::TimedOut => (
            "Request Timed Out",
            format!("{} took too long to respond. Please try again.", context),
            Severity::Medium,
            true,
        ),
        TransportFailure::HostUnreachable => (
            "Service Unreachable",
            format!("{} could not reach the nutrition service. Please try again later.", context),
            Severity::Medium,
            true,
        ),
        TransportFailure::Cancelled => (
            "Request Cancelled",
            format!("{} was cancelled.", context),
            Severity::Medium,
            false,
        ),
    };

    ErrorRecord::new(kind, title, message, context, severity, retryable)
}

fn classify_status(status: u16, context: &str) -> ErrorRecord {
    let category = StatusCategory::from_status(status);
    let kind = ErrorKind::UpstreamError {
        status_category: category,
    };

    let (title, message, severity, retryable) = match category {
        StatusCategory::InvalidCredential => (
            "Invalid API Key",
            format!(
                "The nutrition service rejected your API key (status {}) during {}. Update your key in Settings.",
                status, context
            ),
            Severity::High,
            false,
        ),
        StatusCategory::Throttled => (
            "Too Many Requests",
            format!(
                "The nutrition service is busy (status {}) during {}. Please wait a moment and try again.",
                status, context
            ),
            Severity::Medium,
            true,
        ),
        StatusCategory::Other => (
            "Service Error",
            format!(
                "The nutrition service returned an error (status {}) during {}. Please try again.",
                status, context
            ),
            Severity::Medium,
            true,
        ),
    };

    ErrorRecord::new(kind, title, message, context, severity, retryable)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(failure: Failure) -> ErrorRecord {
        ErrorClassifier::new().classify(&failure, "Goal estimate")
    }

    fn assert_row(record: &ErrorRecord, kind: ErrorKind, severity: Severity, retryable: bool) {
        assert_eq!(record.kind(), kind);
        assert_eq!(record.severity(), severity);
        assert_eq!(record.is_retryable(), retryable);
        assert_eq!(record.context(), "Goal estimate");
        assert!(!record.title().is_empty());
        assert!(!record.message().is_empty());
    }

    #[test]
    fn test_missing_credential() {
        let record = classify(Failure::MissingCredential);
        assert_row(&record, ErrorKind::NoCredential, Severity::High, false);
        assert!(record.message().contains("Goal estimate"));
    }

    #[test]
    fn test_structural_and_decode_are_medium() {
        for stage in [RejectionKind::StructuralMismatch, RejectionKind::DecodeFailure] {
            let record = classify(Rejection::new(stage, "goal").into());
            assert_row(
                &record,
                ErrorKind::MalformedOutput { stage },
                Severity::Medium,
                true,
            );
        }
    }

    #[test]
    fn test_out_of_range_is_low_and_names_field() {
        let record = classify(Rejection::new(RejectionKind::OutOfRange, "servings").into());
        assert_row(
            &record,
            ErrorKind::MalformedOutput {
                stage: RejectionKind::OutOfRange,
            },
            Severity::Low,
            true,
        );
        assert!(record.message().contains("servings"));
    }

    #[test]
    fn test_empty_field_is_low() {
        let record = classify(Rejection::new(RejectionKind::EmptyField, "name").into());
        assert_eq!(record.severity(), Severity::Low);
        assert!(record.is_retryable());
    }

    #[test]
    fn test_transport_rows() {
        let rows = [
            (TransportFailure::Offline, Severity::High, true),
            (TransportFailure::TimedOut, Severity::Medium, true),
            (TransportFailure::HostUnreachable, Severity::Medium, true),
            (TransportFailure::Cancelled, Severity::Medium, false),
        ];
        for (kind, severity, retryable) in rows {
            let record = classify(kind.into());
            assert_row(&record, ErrorKind::TransportError { kind }, severity, retryable);
        }
    }

    #[test]
    fn test_timed_out_scenario() {
        let record = classify(Failure::Transport(TransportFailure::TimedOut));
        assert!(matches!(
            record.kind(),
            ErrorKind::TransportError {
                kind: TransportFailure::TimedOut
            }
        ));
        assert_eq!(record.severity(), Severity::Medium);
        assert!(record.is_retryable());
    }

    #[test]
    fn test_upstream_rows() {
        let rows = [
            (401, StatusCategory::InvalidCredential, Severity::High, false),
            (403, StatusCategory::InvalidCredential, Severity::High, false),
            (429, StatusCategory::Throttled, Severity::Medium, true),
            (500, StatusCategory::Other, Severity::Medium, true),
            (503, StatusCategory::Other, Severity::Medium, true),
        ];
        for (status, category, severity, retryable) in rows {
            let record = classify(Failure::Upstream { status });
            assert_row(
                &record,
                ErrorKind::UpstreamError {
                    status_category: category,
                },
                severity,
                retryable,
            );
            assert!(record.message().contains(&status.to_string()));
        }
    }

    #[test]
    fn test_unrecognized() {
        let record = classify(Failure::Unrecognized("segfault in the cloud".to_string()));
        assert_row(&record, ErrorKind::UnknownError, Severity::Medium, true);
        // raw technical detail never reaches the display text
        assert!(!record.message().contains("segfault"));
    }

    #[test]
    fn test_deterministic() {
        let a = classify(Failure::Upstream { status: 429 });
        let b = classify(Failure::Upstream { status: 429 });
        assert_eq!(a, b);
    }

    #[test]
    fn test_into_error_record_identity() {
        let classifier = ErrorClassifier::new();
        let record = classify(Failure::MissingCredential);
        let same = record.clone().into_error_record(&classifier, "other context");
        assert_eq!(same, record);

        let from_rejection = Rejection::new(RejectionKind::OutOfRange, "fat_g")
            .into_error_record(&classifier, "Food analysis");
        assert_eq!(from_rejection.context(), "Food analysis");
        assert_eq!(from_rejection.severity(), Severity::Low);
    }
}
