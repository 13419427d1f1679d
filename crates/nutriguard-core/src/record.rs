//! Classified error records.
//!
//! An [`ErrorRecord`] is the only error shape that reaches the display layer.
//! Records are produced by the [`ErrorClassifier`](crate::ErrorClassifier)
//! and are immutable once built.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::validator::RejectionKind;

/// How serious a failure is from the user's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Low => write!(f, "low"),
            Severity::Medium => write!(f, "medium"),
            Severity::High => write!(f, "high"),
        }
    }
}

/// Network-level failure reported by the LLM client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportFailure {
    Offline,
    TimedOut,
    HostUnreachable,
    Cancelled,
}

impl fmt::Display for TransportFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TransportFailure::Offline => "offline",
            TransportFailure::TimedOut => "timed out",
            TransportFailure::HostUnreachable => "host unreachable",
            TransportFailure::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// Coarse category of a non-success upstream status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusCategory {
    /// 401/403: the credential was rejected
    InvalidCredential,

    /// 429: the provider is throttling us
    Throttled,

    /// Any other non-success status
    Other,
}

impl StatusCategory {
    pub fn from_status(status: u16) -> Self {
        match status {
            401 | 403 => StatusCategory::InvalidCredential,
            429 => StatusCategory::Throttled,
            _ => StatusCategory::Other,
        }
    }
}

/// Closed taxonomy of classified failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ErrorKind {
    NoCredential,
    MalformedOutput { stage: RejectionKind },
    TransportError { kind: TransportFailure },
    UpstreamError { status_category: StatusCategory },
    UnknownError,
}

/// A classified, display-ready failure.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[error("{title}: {message}")]
pub struct ErrorRecord {
    kind: ErrorKind,
    title: String,
    message: String,
    context: String,
    severity: Severity,
    retryable: bool,
}

impl ErrorRecord {
    pub(crate) fn new(
        kind: ErrorKind,
        title: impl Into<String>,
        message: impl Into<String>,
        context: impl Into<String>,
        severity: Severity,
        retryable: bool,
    ) -> Self {
        Self {
            kind,
            title: title.into(),
            message: message.into(),
            context: context.into(),
            severity,
            retryable,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Short heading suitable for an alert title.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Full sentence suitable for an alert body.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Label of the operation that failed.
    pub fn context(&self) -> &str {
        &self.context
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn is_retryable(&self) -> bool {
        self.retryable
    }
}
