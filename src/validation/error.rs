//! Field-level validation errors.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Error tag carried by every rejection payload.
pub const INVALID_PAYLOAD: &str = "Invalid payload";

/// A single problem found while validating a payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Dotted path of the offending field (`$` for the payload itself).
    pub field: String,
    /// Human readable description of the problem.
    pub problem: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, problem: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            problem: problem.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.problem)
    }
}

/// Ordered, non-empty list of field errors for one payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    pub(crate) fn new(errors: Vec<FieldError>) -> Self {
        debug_assert!(!errors.is_empty());
        Self(errors)
    }

    /// Errors in the order they were found.
    pub fn errors(&self) -> &[FieldError] {
        &self.0
    }

    /// Number of errors.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false for a value produced by validation.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether any error names the given field path.
    pub fn mentions(&self, field: &str) -> bool {
        self.0.iter().any(|e| e.field == field)
    }

    /// Build the rejection payload returned to the caller.
    ///
    /// ```
    /// use quickstart_worker::validation::validate;
    ///
    /// #[derive(serde::Deserialize, schemars::JsonSchema)]
    /// struct Input { data: serde_json::Map<String, serde_json::Value> }
    ///
    /// let err = validate::<Input>(&serde_json::json!({})).err().unwrap();
    /// let payload = err.to_payload();
    /// assert_eq!(payload["error"], "Invalid payload");
    /// assert_eq!(payload["details"][0]["field"], "data");
    /// ```
    pub fn to_payload(&self) -> Value {
        json!({
            "error": INVALID_PAYLOAD,
            "details": self.0,
        })
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}", err)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}
