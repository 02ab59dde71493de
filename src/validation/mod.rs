//! Validation module - typed deserialization with field diagnostics.
//!
//! Provides:
//! - [`Validate`] - input types that derive `Deserialize` and `JsonSchema`
//! - [`input_schema`] - the draft-07 schema advertised for an input type
//! - [`validate`] - raw `Value` to typed input, or an ordered error list
//!
//! # Example
//!
//! ```
//! use quickstart_worker::validation::validate;
//! use schemars::JsonSchema;
//! use serde::Deserialize;
//! use serde_json::json;
//!
//! #[derive(Deserialize, JsonSchema)]
//! struct Input {
//!     extra: String,
//! }
//!
//! let input: Input = validate(&json!({ "extra": "hello" })).unwrap();
//! assert_eq!(input.extra, "hello");
//!
//! let errors = validate::<Input>(&json!({ "extra": 5 })).err().unwrap();
//! assert!(errors.mentions("extra"));
//! ```

mod error;
mod schema;

pub use error::{FieldError, ValidationErrors, INVALID_PAYLOAD};
pub use schema::{check, field_path, input_schema, ROOT};

use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// A handler input type: deserializable and described by a JSON Schema.
pub trait Validate: DeserializeOwned + JsonSchema + Send + 'static {}

impl<T> Validate for T where T: DeserializeOwned + JsonSchema + Send + 'static {}

/// Validate a raw payload and construct the typed input.
///
/// The schema check runs first and reports every problem. Deserialization
/// only runs on payloads that passed; if the type is stricter than its
/// schema, the serde error is reported against `$`.
pub fn validate<T: Validate>(raw: &Value) -> std::result::Result<T, ValidationErrors> {
    check(&input_schema::<T>(), raw)?;

    serde_json::from_value(raw.clone())
        .map_err(|e| ValidationErrors::new(vec![FieldError::new(ROOT, e.to_string())]))
}
