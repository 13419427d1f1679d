//! Response validation for raw LLM text.
//!
//! LLM output is untrusted. A reply is accepted only if it survives every
//! stage, in order:
//!
//! 1. Cleansing: strip markdown code fences and surrounding whitespace
//! 2. Structural check against the schema's ordered key/kind pattern
//! 3. Decode: JSON parse, type check, projection into the typed payload
//! 4. Bounds: numeric ranges and non-empty strings, in schema order
//!
//! Each stage short-circuits with a [`Rejection`]. Nothing is retried here;
//! retrying is the caller's decision.

use std::fmt;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::payload::SchemaPayload;
use crate::schema::{SchemaDescriptor, ValueKind};

lazy_static! {
    /// Opening fence with an optional language tag, e.g. ```` ```json ````
    static ref FENCE_OPEN: Regex = Regex::new(r"^```[A-Za-z0-9_+-]*[ \t]*").unwrap();

    /// Closing fence at the very end of the text
    static ref FENCE_CLOSE: Regex = Regex::new(r"```$").unwrap();
}

/// Stage at which a reply was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionKind {
    /// Key order, key names or literal kinds do not match the schema
    StructuralMismatch,

    /// JSON parse, type or projection error
    DecodeFailure,

    /// A numeric field lies outside its declared bounds
    OutOfRange,

    /// A string field is blank
    EmptyField,
}

impl fmt::Display for RejectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RejectionKind::StructuralMismatch => "structural mismatch",
            RejectionKind::DecodeFailure => "decode failure",
            RejectionKind::OutOfRange => "out of range",
            RejectionKind::EmptyField => "empty field",
        };
        f.write_str(s)
    }
}

/// Why a reply was rejected.
///
/// `detail` is the schema name for structural mismatches, the decoder message
/// for decode failures, and the field key for bound violations.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{kind}: {detail}")]
pub struct Rejection {
    pub kind: RejectionKind,
    pub detail: String,
}

impl Rejection {
    pub fn new(kind: RejectionKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }

    fn structural(schema: &SchemaDescriptor) -> Self {
        Self::new(RejectionKind::StructuralMismatch, schema.name())
    }

    fn decode(message: impl Into<String>) -> Self {
        Self::new(RejectionKind::DecodeFailure, message)
    }
}

/// Result of validating one reply. Exactly one variant is populated.
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub enum ValidationOutcome<T> {
    Decoded(T),
    Rejected(Rejection),
}

impl<T> ValidationOutcome<T> {
    pub fn is_decoded(&self) -> bool {
        matches!(self, ValidationOutcome::Decoded(_))
    }

    /// The rejection, if any.
    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            ValidationOutcome::Decoded(_) => None,
            ValidationOutcome::Rejected(r) => Some(r),
        }
    }

    /// The decoded payload, if any.
    pub fn decoded(self) -> Option<T> {
        match self {
            ValidationOutcome::Decoded(v) => Some(v),
            ValidationOutcome::Rejected(_) => None,
        }
    }

    pub fn into_result(self) -> Result<T, Rejection> {
        match self {
            ValidationOutcome::Decoded(v) => Ok(v),
            ValidationOutcome::Rejected(r) => Err(r),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ValidationOutcome<U> {
        match self {
            ValidationOutcome::Decoded(v) => ValidationOutcome::Decoded(f(v)),
            ValidationOutcome::Rejected(r) => ValidationOutcome::Rejected(r),
        }
    }
}

impl<T> From<Result<T, Rejection>> for ValidationOutcome<T> {
    fn from(result: Result<T, Rejection>) -> Self {
        match result {
            Ok(v) => ValidationOutcome::Decoded(v),
            Err(r) => ValidationOutcome::Rejected(r),
        }
    }
}

/// Strip code fences and surrounding whitespace.
///
/// Fences are stripped repeatedly until the text is stable, so cleansing an
/// already-cleansed string returns it unchanged.
pub fn cleanse(raw: &str) -> String {
    let mut current = raw.trim();

    loop {
        let before = current.len();

        if let Some(m) = FENCE_OPEN.find(current) {
            current = current[m.end()..].trim();
        }
        if let Some(m) = FENCE_CLOSE.find(current) {
            current = current[..m.start()].trim();
        }

        if current.len() == before {
            break;
        }
    }

    current.to_string()
}

/// Validates raw LLM replies against a [`SchemaDescriptor`].
///
/// Stateless; safe to share across any number of concurrent tasks.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseValidator;

impl ResponseValidator {
    pub fn new() -> Self {
        Self
    }

    /// Validate a reply and project it into `T`.
    pub fn validate<T: SchemaPayload>(&self, raw: &str) -> ValidationOutcome<T> {
        let schema = T::schema();
        let outcome = self.run::<T>(raw, schema);
        log_outcome(schema, &outcome);
        outcome.into()
    }

    /// Validate a reply against any schema, keeping the decoded object untyped.
    pub fn validate_value(
        &self,
        raw: &str,
        schema: &SchemaDescriptor,
    ) -> ValidationOutcome<Map<String, Value>> {
        let outcome = self.run::<Map<String, Value>>(raw, schema);
        log_outcome(schema, &outcome);
        outcome.into()
    }

    fn run<T>(&self, raw: &str, schema: &SchemaDescriptor) -> Result<T, Rejection>
    where
        T: serde::de::DeserializeOwned,
    {
        let cleansed = cleanse(raw);

        let matcher = schema
            .structural_matcher()
            .map_err(|e| Rejection::decode(e.to_string()))?;
        if !matcher.is_match(&cleansed) {
            return Err(Rejection::structural(schema));
        }

        let value: Value =
            serde_json::from_str(&cleansed).map_err(|e| Rejection::decode(e.to_string()))?;
        schema
            .check_types(&value)
            .map_err(|errors| Rejection::decode(errors.join("; ")))?;
        let payload = T::deserialize(&value).map_err(|e| Rejection::decode(e.to_string()))?;

        check_bounds(&value, schema)?;

        Ok(payload)
    }
}

/// Check ranges and non-empty strings, reporting the first violation in
/// schema order.
fn check_bounds(value: &Value, schema: &SchemaDescriptor) -> Result<(), Rejection> {
    for field in schema.fields() {
        let field_value = value.get(field.key);

        match field.kind {
            ValueKind::String => {
                let blank = field_value
                    .and_then(Value::as_str)
                    .map_or(true, |s| s.trim().is_empty());
                if blank {
                    return Err(Rejection::new(RejectionKind::EmptyField, field.key));
                }
            }
            ValueKind::Number => {
                let Some(range) = field.range else {
                    continue;
                };
                let number = field_value.and_then(Value::as_f64).ok_or_else(|| {
                    Rejection::decode(format!("'{}' is not a number", field.key))
                })?;
                if !range.contains(number) {
                    return Err(Rejection::new(RejectionKind::OutOfRange, field.key));
                }
            }
        }
    }

    Ok(())
}

fn log_outcome<T>(schema: &SchemaDescriptor, outcome: &Result<T, Rejection>) {
    match outcome {
        Ok(_) => tracing::trace!(schema = schema.name(), "Response decoded"),
        Err(rejection) => tracing::debug!(
            schema = schema.name(),
            kind = %rejection.kind,
            detail = %rejection.detail,
            "Response rejected"
        ),
    }
}
