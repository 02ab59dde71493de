//! JSON Schema generation and payload checking.
//!
//! Input types derive [`schemars::JsonSchema`]; the generated draft-07
//! schema is what the engine sees as a function's `request_format` and what
//! payloads are checked against before they are deserialized.

use jsonschema::error::ValidationErrorKind;
use jsonschema::ValidationError;
use schemars::gen::SchemaSettings;
use schemars::JsonSchema;
use serde_json::Value;

use super::{FieldError, ValidationErrors};

/// Field path used for problems with the payload as a whole.
pub const ROOT: &str = "$";

/// Draft-07 JSON Schema for `T`.
pub fn input_schema<T: JsonSchema>() -> Value {
    let schema = SchemaSettings::draft07()
        .into_generator()
        .into_root_schema_for::<T>();
    serde_json::to_value(schema).unwrap_or(Value::Bool(true))
}

/// Check `raw` against `schema`, collecting every problem.
pub fn check(schema: &Value, raw: &Value) -> Result<(), ValidationErrors> {
    let validator = jsonschema::validator_for(schema).map_err(|e| {
        ValidationErrors::new(vec![FieldError::new(ROOT, format!("invalid schema: {}", e))])
    })?;

    let errors: Vec<FieldError> = validator.iter_errors(raw).map(|e| field_error(&e)).collect();
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidationErrors::new(errors))
    }
}

fn field_error(error: &ValidationError<'_>) -> FieldError {
    let location = field_path(&error.instance_path.to_string());

    match &error.kind {
        // Reported against the missing field, not its parent object.
        ValidationErrorKind::Required { property } => {
            let name = property
                .as_str()
                .map(str::to_string)
                .unwrap_or_else(|| property.to_string());
            FieldError::new(child_path(&location, &name), "field required")
        }
        _ => FieldError::new(location, error.to_string()),
    }
}

/// Convert a JSON pointer into a dotted field path.
///
/// `""` becomes `$`, `/data/items/0` becomes `data.items[0]`.
pub fn field_path(pointer: &str) -> String {
    let mut path = String::new();

    for segment in pointer.split('/').skip(1) {
        let segment = segment.replace("~1", "/").replace("~0", "~");
        if !path.is_empty() && segment.parse::<usize>().is_ok() {
            path.push('[');
            path.push_str(&segment);
            path.push(']');
        } else {
            path = child_path(&path, &segment);
        }
    }

    if path.is_empty() {
        ROOT.to_string()
    } else {
        path
    }
}

fn child_path(parent: &str, name: &str) -> String {
    if parent.is_empty() || parent == ROOT {
        name.to_string()
    } else {
        format!("{}.{}", parent, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::{json, Map};

    #[derive(Deserialize, JsonSchema)]
    #[allow(dead_code)]
    struct TransformInput {
        data: Map<String, Value>,
    }

    #[derive(Deserialize, JsonSchema)]
    #[allow(dead_code)]
    struct Nested {
        name: String,
        items: Vec<Item>,
    }

    #[derive(Deserialize, JsonSchema)]
    #[allow(dead_code)]
    struct Item {
        id: u32,
    }

    #[test]
    fn test_field_path() {
        assert_eq!(field_path(""), "$");
        assert_eq!(field_path("/data"), "data");
        assert_eq!(field_path("/data/items/0/id"), "data.items[0].id");
        assert_eq!(field_path("/a~1b/c~0d"), "a/b.c~d");
    }

    #[test]
    fn test_schema_shape() {
        let schema = input_schema::<TransformInput>();
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["required"], json!(["data"]));
        assert_eq!(schema["properties"]["data"]["type"], "object");
    }

    #[test]
    fn test_missing_field_named_by_path() {
        let schema = input_schema::<TransformInput>();
        let errors = check(&schema, &json!({})).unwrap_err();
        assert_eq!(errors.errors(), &[FieldError::new("data", "field required")]);
    }

    #[test]
    fn test_wrong_type_named_by_path() {
        let schema = input_schema::<TransformInput>();
        let errors = check(&schema, &json!({ "data": [1, 2] })).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.errors()[0].field, "data");
        assert!(errors.errors()[0].problem.contains("object"));
    }

    #[test]
    fn test_non_object_payload_reported_at_root() {
        let schema = input_schema::<TransformInput>();
        for raw in [Value::Null, json!([]), json!("x")] {
            let errors = check(&schema, &raw).unwrap_err();
            assert!(errors.mentions("$"), "{}", errors);
        }
    }

    #[test]
    fn test_nested_problems_collected() {
        let schema = input_schema::<Nested>();
        let errors = check(
            &schema,
            &json!({ "name": 5, "items": [{ "id": 1 }, { "id": "two" }, {}] }),
        )
        .unwrap_err();

        assert!(errors.mentions("name"));
        assert!(errors.mentions("items[1].id"));
        assert!(errors.mentions("items[2].id"));
    }

    #[test]
    fn test_valid_payload() {
        let schema = input_schema::<TransformInput>();
        assert!(check(&schema, &json!({ "data": { "a": 1 } })).is_ok());
    }

    #[test]
    fn test_invalid_schema_reported_at_root() {
        let errors = check(&json!({ "type": 12 }), &json!({})).unwrap_err();
        assert_eq!(errors.errors()[0].field, "$");
        assert!(errors.errors()[0].problem.starts_with("invalid schema"));
    }
}
