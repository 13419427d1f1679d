//! # nutriguard-core
//!
//! Deterministic validation and error classification for LLM nutrition
//! responses.
//!
//! An LLM reply is untrusted text that should be a flat JSON object. This
//! crate answers two questions about it:
//! - Does the reply conform to the expected shape and sensible bounds?
//! - If anything failed along the way, what should the user be told, and is
//!   it worth retrying?
//!
//! ## Key Guarantees
//!
//! 1. **Deterministic**: Same input always produces same output
//! 2. **No I/O**: No network, no clock, no shared state
//! 3. **Explicit outcomes**: Rejections and errors are values, never panics
//!
//! ## Example
//!
//! ```rust
//! use nutriguard_core::{ErrorClassifier, GoalResponse, ResponseValidator, ValidationOutcome};
//!
//! let raw = "```json\n{\"date\":\"2024-01-01\",\"k_cals\":2200,\"protein_g\":150,\
//!            \"carbs_g\":250,\"fat_g\":80,\"fiber_g\":30}\n```";
//!
//! match ResponseValidator::new().validate::<GoalResponse>(raw) {
//!     ValidationOutcome::Decoded(goal) => assert_eq!(goal.k_cals, 2200.0),
//!     ValidationOutcome::Rejected(rejection) => {
//!         let record = ErrorClassifier::new().classify(&rejection.into(), "Goal estimate");
//!         println!("{}", record.message());
//!     }
//! }
//! ```

pub mod classifier;
pub mod payload;
pub mod record;
pub mod schema;
pub mod validator;

// Re-export main types at crate root
pub use classifier::{ErrorClassifier, Failure, IntoErrorRecord};
pub use payload::{FoodResponse, GoalResponse, NutritionTotals, SchemaPayload};
pub use record::{ErrorKind, ErrorRecord, Severity, StatusCategory, TransportFailure};
pub use schema::{
    FieldSpec, NumericRange, SchemaDescriptor, SchemaError, ValueKind, FOOD_SCHEMA, GOAL_SCHEMA,
};
pub use validator::{cleanse, Rejection, RejectionKind, ResponseValidator, ValidationOutcome};
