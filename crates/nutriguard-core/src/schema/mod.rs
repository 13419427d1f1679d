//! Schema descriptors for the payload shapes the LLM is asked to produce.
//!
//! A [`SchemaDescriptor`] is an ordered list of [`FieldSpec`]s. Everything the
//! validator needs is derived from that list: the structural pattern used to
//! reject near-misses, the JSON Schema used to report type errors, and the
//! numeric bounds checked after decoding. Adding a field is a data change.
//!
//! Field order matters: it is the exact key order the prompt instructs the
//! model to emit, and the structural check enforces it.

mod json_schema;
mod matcher;

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

/// Errors from deriving schema artifacts.
#[derive(Error, Debug, Clone)]
pub enum SchemaError {
    #[error("Failed to build structural pattern for '{schema}': {reason}")]
    PatternError { schema: &'static str, reason: String },

    #[error("Failed to compile JSON schema for '{schema}': {reason}")]
    CompileError { schema: &'static str, reason: String },
}

/// Literal kind a field value must have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// A quoted JSON string
    String,

    /// An integer or decimal literal, optionally negative
    Number,
}

impl ValueKind {
    /// JSON Schema `type` keyword for this kind.
    pub fn json_type(self) -> &'static str {
        match self {
            ValueKind::String => "string",
            ValueKind::Number => "number",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.json_type())
    }
}

/// Bounds for a numeric field. The upper bound is always inclusive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NumericRange {
    pub min: f64,
    pub max: f64,

    /// When set, a value equal to `min` is rejected.
    pub min_exclusive: bool,
}

impl NumericRange {
    /// `[min, max]`
    pub const fn inclusive(min: f64, max: f64) -> Self {
        Self {
            min,
            max,
            min_exclusive: false,
        }
    }

    /// `(min, max]`
    pub const fn exclusive_min(min: f64, max: f64) -> Self {
        Self {
            min,
            max,
            min_exclusive: true,
        }
    }

    /// Check whether `value` lies within the range.
    pub fn contains(&self, value: f64) -> bool {
        let above_min = if self.min_exclusive {
            value > self.min
        } else {
            value >= self.min
        };
        above_min && value <= self.max
    }
}

impl fmt::Display for NumericRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let open = if self.min_exclusive { '(' } else { '[' };
        write!(f, "{}{}, {}]", open, self.min, self.max)
    }
}

/// One expected key in a payload.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldSpec {
    pub key: &'static str,
    pub kind: ValueKind,
    pub range: Option<NumericRange>,
}

impl FieldSpec {
    /// A free-text field. Must be non-empty after decoding.
    pub const fn text(key: &'static str) -> Self {
        Self {
            key,
            kind: ValueKind::String,
            range: None,
        }
    }

    /// A numeric field with bounds.
    pub const fn number(key: &'static str, range: NumericRange) -> Self {
        Self {
            key,
            kind: ValueKind::Number,
            range: Some(range),
        }
    }
}

/// An immutable, ordered description of one payload shape.
///
/// Derived artifacts (structural pattern, compiled JSON Schema) are built on
/// first use and cached for the lifetime of the descriptor.
pub struct SchemaDescriptor {
    name: &'static str,
    fields: &'static [FieldSpec],
    pattern: OnceLock<Result<Regex, SchemaError>>,
    compiled: OnceLock<Result<jsonschema::Validator, SchemaError>>,
}

impl SchemaDescriptor {
    pub const fn new(name: &'static str, fields: &'static [FieldSpec]) -> Self {
        Self {
            name,
            fields,
            pattern: OnceLock::new(),
            compiled: OnceLock::new(),
        }
    }

    /// Shape name, e.g. `"goal"`.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Fields in declared order.
    pub fn fields(&self) -> &'static [FieldSpec] {
        self.fields
    }

    /// Keys in declared order.
    pub fn keys(&self) -> impl Iterator<Item = &'static str> {
        self.fields.iter().map(|f| f.key)
    }

    /// Look up a field by key.
    pub fn field(&self, key: &str) -> Option<&'static FieldSpec> {
        self.fields.iter().find(|f| f.key == key)
    }

    /// Anchored pattern matching exactly one object with this schema's keys,
    /// in order, each followed by a literal of the declared kind.
    pub fn structural_matcher(&self) -> Result<&Regex, SchemaError> {
        self.pattern
            .get_or_init(|| {
                Regex::new(&matcher::structural_pattern(self.fields)).map_err(|e| {
                    SchemaError::PatternError {
                        schema: self.name,
                        reason: e.to_string(),
                    }
                })
            })
            .as_ref()
            .map_err(Clone::clone)
    }
}

impl fmt::Debug for SchemaDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaDescriptor")
            .field("name", &self.name)
            .field("fields", &self.fields)
            .finish()
    }
}

impl PartialEq for SchemaDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.fields == other.fields
    }
}

const K_CALS: FieldSpec = FieldSpec::number("k_cals", NumericRange::inclusive(0.0, 5000.0));
const PROTEIN: FieldSpec = FieldSpec::number("protein_g", NumericRange::inclusive(0.0, 500.0));
const CARBS: FieldSpec = FieldSpec::number("carbs_g", NumericRange::inclusive(0.0, 1000.0));
const FAT: FieldSpec = FieldSpec::number("fat_g", NumericRange::inclusive(0.0, 500.0));
const FIBER: FieldSpec = FieldSpec::number("fiber_g", NumericRange::inclusive(0.0, 200.0));

static GOAL_FIELDS: [FieldSpec; 6] = [
    FieldSpec::text("date"),
    K_CALS,
    PROTEIN,
    CARBS,
    FAT,
    FIBER,
];

static FOOD_FIELDS: [FieldSpec; 7] = [
    FieldSpec::text("name"),
    // zero servings is not a meal
    FieldSpec::number("servings", NumericRange::exclusive_min(0.0, 50.0)),
    K_CALS,
    PROTEIN,
    CARBS,
    FAT,
    FIBER,
];

/// Daily nutrition goal returned for a user's description of themselves.
pub static GOAL_SCHEMA: SchemaDescriptor = SchemaDescriptor::new("goal", &GOAL_FIELDS);

/// Nutrition facts for one logged food entry.
pub static FOOD_SCHEMA: SchemaDescriptor = SchemaDescriptor::new("food", &FOOD_FIELDS);
