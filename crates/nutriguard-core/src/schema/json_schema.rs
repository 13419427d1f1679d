//! JSON Schema derivation and validation for payload shapes.
//!
//! The derived schema pins types, required keys and forbids extra keys. It
//! deliberately carries no numeric bounds: bounds are checked after decoding
//! so the first violating field can be named.

use serde_json::{json, Map, Value};

use super::{SchemaDescriptor, SchemaError};

const DRAFT: &str = "https://json-schema.org/draft/2020-12/schema";

impl SchemaDescriptor {
    /// JSON Schema document for this shape.
    pub fn to_json_schema(&self) -> Value {
        let mut properties = Map::new();
        for field in self.fields {
            properties.insert(
                field.key.to_string(),
                json!({ "type": field.kind.json_type() }),
            );
        }

        json!({
            "$schema": DRAFT,
            "title": self.name,
            "type": "object",
            "properties": properties,
            "required": self.keys().collect::<Vec<_>>(),
            "additionalProperties": false,
        })
    }

    /// Get or compile the JSON Schema validator.
    fn compiled(&self) -> Result<&jsonschema::Validator, SchemaError> {
        self.compiled
            .get_or_init(|| {
                jsonschema::options()
                    .build(&self.to_json_schema())
                    .map_err(|e| SchemaError::CompileError {
                        schema: self.name,
                        reason: e.to_string(),
                    })
            })
            .as_ref()
            .map_err(Clone::clone)
    }

    /// Validate a decoded value against the derived schema.
    ///
    /// Returns every violation as `"<message> at <path>"`.
    pub fn check_types(&self, value: &Value) -> Result<(), Vec<String>> {
        let validator = self.compiled().map_err(|e| vec![e.to_string()])?;

        let errors: Vec<String> = validator
            .iter_errors(value)
            .map(|e| format!("{} at {}", e, e.instance_path))
            .collect();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
