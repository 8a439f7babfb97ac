//! Schema validation helpers.
//!
//! Validates a resource configuration (`serde_json::Value`) against its
//! [`Schema`] before anything is sent to the API: presence of required
//! attributes, value types, block cardinality and attribute validators.
//!
//! # Example
//!
//! ```
//! use basistheory_provider::schema::{Attribute, Schema, Validator};
//! use basistheory_provider::validation::validate;
//! use serde_json::json;
//!
//! let schema = Schema::v0().with_attribute(
//!     "type",
//!     Attribute::required_string().with_validator(Validator::one_of(["public", "private"])),
//! );
//!
//! assert!(validate(&schema, &json!({"type": "private"})).is_empty());
//!
//! let diagnostics = validate(&schema, &json!({"type": "secret"}));
//! assert_eq!(diagnostics.len(), 1);
//! assert_eq!(diagnostics[0].attribute, Some("type".to_string()));
//! ```

use crate::schema::{
    Attribute, AttributeType, Block, BlockNestingMode, Diagnostic, DiagnosticSeverity, NestedBlock,
    Schema,
};
use serde_json::Value;

/// Validate a JSON value against a schema.
///
/// Returns a list of diagnostics for any validation errors found.
/// An empty list means the value is valid.
///
/// # Validation Rules
///
/// - Required attributes must be present and non-null
/// - Optional attributes may be absent or null
/// - Computed attributes are skipped (provider sets these)
/// - Attribute types must match the schema
/// - Attribute validators run on every present scalar value
/// - Nested blocks are validated recursively with min/max item constraints
pub fn validate(schema: &Schema, value: &Value) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    validate_block(&schema.block, value, "", &mut diagnostics);
    diagnostics
}

/// Validate a JSON value against a schema, returning Ok if valid or Err with diagnostics.
pub fn validate_result(schema: &Schema, value: &Value) -> Result<(), Vec<Diagnostic>> {
    let diagnostics = validate(schema, value);
    if diagnostics.is_empty() {
        Ok(())
    } else {
        Err(diagnostics)
    }
}

/// Check if a JSON value is valid against a schema.
pub fn is_valid(schema: &Schema, value: &Value) -> bool {
    validate(schema, value).is_empty()
}

fn validate_block(block: &Block, value: &Value, path: &str, diagnostics: &mut Vec<Diagnostic>) {
    let obj = match value {
        Value::Object(map) => map,
        Value::Null => return,
        _ => {
            let mut diag =
                Diagnostic::error("Expected object").with_detail(format!("Got {}", value_type_name(value)));
            if !path.is_empty() {
                diag = diag.with_attribute(path);
            }
            diagnostics.push(diag);
            return;
        },
    };

    for (name, attr) in &block.attributes {
        let attr_path = join_path(path, name);
        validate_attribute(name, attr, obj.get(name), &attr_path, diagnostics);
    }

    for (name, nested_block) in &block.blocks {
        let block_path = join_path(path, name);
        validate_nested_block(nested_block, obj.get(name), &block_path, diagnostics);
    }
}

fn validate_attribute(
    name: &str,
    attr: &Attribute,
    value: Option<&Value>,
    path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    if attr.flags.is_computed_only() {
        return;
    }

    match value {
        None | Some(Value::Null) => {
            if attr.flags.required {
                diagnostics.push(
                    Diagnostic::error(format!("Missing required attribute '{}'", path))
                        .with_detail("This attribute is required and must be provided")
                        .with_attribute(path),
                );
            }
        },
        Some(v) => {
            let before = diagnostics.len();
            validate_attribute_type(&attr.attr_type, v, path, diagnostics);
            if diagnostics.len() == before {
                for validator in &attr.validators {
                    if let Err(message) = validator.check(name, v) {
                        diagnostics.push(Diagnostic::error(message).with_attribute(path));
                    }
                }
            }
        },
    }
}

fn validate_attribute_type(
    attr_type: &AttributeType,
    value: &Value,
    path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    match attr_type {
        AttributeType::String => {
            if !value.is_string() {
                diagnostics.push(type_error(path, "string", value));
            }
        },
        AttributeType::Int64 => {
            if !is_int64(value) {
                diagnostics.push(type_error(path, "int64", value));
            }
        },
        AttributeType::Bool => {
            if !value.is_boolean() {
                diagnostics.push(type_error(path, "bool", value));
            }
        },
        AttributeType::List(element_type) | AttributeType::Set(element_type) => {
            if let Some(arr) = value.as_array() {
                for (i, elem) in arr.iter().enumerate() {
                    let elem_path = format!("{}.{}", path, i);
                    validate_attribute_type(element_type, elem, &elem_path, diagnostics);
                }
            } else {
                let expected = if attr_type.is_set() { "set" } else { "list" };
                diagnostics.push(type_error(path, expected, value));
            }
        },
        AttributeType::Map(value_type) => {
            if let Some(obj) = value.as_object() {
                for (key, val) in obj {
                    let key_path = format!("{}.{}", path, key);
                    validate_attribute_type(value_type, val, &key_path, diagnostics);
                }
            } else {
                diagnostics.push(type_error(path, "map", value));
            }
        },
    }
}

fn validate_nested_block(
    nested: &NestedBlock,
    value: Option<&Value>,
    path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    match nested.nesting_mode {
        BlockNestingMode::Single => match value {
            None | Some(Value::Null) => {
                if nested.min_items > 0 {
                    diagnostics.push(
                        Diagnostic::error(format!("Missing required block '{}'", path))
                            .with_detail("At least one block is required")
                            .with_attribute(path),
                    );
                }
            },
            Some(v) => validate_block(&nested.block, v, path, diagnostics),
        },
        // Sets are validated the same as lists; uniqueness is the host's concern.
        BlockNestingMode::List | BlockNestingMode::Set => {
            validate_list_block(nested, value, path, diagnostics);
        },
    }
}

fn validate_list_block(
    nested: &NestedBlock,
    value: Option<&Value>,
    path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let items: &[Value] = match value {
        None | Some(Value::Null) => &[],
        Some(Value::Array(arr)) => arr,
        Some(v) => {
            diagnostics.push(
                Diagnostic::error(format!("Expected list for block '{}'", path))
                    .with_detail(format!("Got {}", value_type_name(v)))
                    .with_attribute(path),
            );
            return;
        },
    };

    let len = items.len() as u32;
    if len < nested.min_items {
        diagnostics.push(
            Diagnostic::error(format!(
                "Block '{}' requires at least {} item(s), got {}",
                path, nested.min_items, len
            ))
            .with_attribute(path),
        );
    }

    // max_items of 0 means unlimited
    if nested.max_items > 0 && len > nested.max_items {
        diagnostics.push(
            Diagnostic::error(format!(
                "Block '{}' allows at most {} item(s), got {}",
                path, nested.max_items, len
            ))
            .with_attribute(path),
        );
    }

    for (i, item) in items.iter().enumerate() {
        let item_path = format!("{}.{}", path, i);
        validate_block(&nested.block, item, &item_path, diagnostics);
    }
}

fn join_path(base: &str, name: &str) -> String {
    if base.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", base, name)
    }
}

fn value_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn is_int64(value: &Value) -> bool {
    match value {
        Value::Number(n) => {
            if n.as_i64().is_some() {
                true
            } else if let Some(f) = n.as_f64() {
                f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64
            } else {
                false
            }
        },
        _ => false,
    }
}

fn type_error(path: &str, expected: &str, got: &Value) -> Diagnostic {
    Diagnostic {
        severity: DiagnosticSeverity::Error,
        summary: format!("Invalid type for attribute '{}'", path),
        detail: Some(format!(
            "Expected {}, got {}",
            expected,
            value_type_name(got)
        )),
        attribute: Some(path.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Attribute, AttributeFlags, Block, NestedBlock, Schema, Validator};
    use serde_json::json;

    fn rule_schema() -> Schema {
        Schema::v0().with_block(
            "rule",
            NestedBlock::set(
                Block::new()
                    .with_attribute(
                        "description",
                        Attribute::required_string()
                            .with_validator(Validator::uppercase_with("^[A-Z-_]+", "-_")),
                    )
                    .with_attribute(
                        "priority",
                        Attribute::required_int64().with_validator(Validator::at_least(1)),
                    )
                    .with_attribute(
                        "transform",
                        Attribute::required_string()
                            .with_validator(Validator::one_of(["mask", "redact", "reveal"])),
                    ),
            ),
        )
    }

    #[test]
    fn test_validate_required_string() {
        let schema = Schema::v0().with_attribute("name", Attribute::required_string());

        assert!(validate(&schema, &json!({"name": "test"})).is_empty());

        let diagnostics = validate(&schema, &json!({}));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].attribute, Some("name".to_string()));

        let diagnostics = validate(&schema, &json!({"name": null}));
        assert_eq!(diagnostics.len(), 1);

        let diagnostics = validate(&schema, &json!({"name": 123}));
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].summary.contains("Invalid type"));
    }

    #[test]
    fn test_validate_computed_attribute_skipped() {
        let schema = Schema::v0().with_attribute("id", Attribute::computed_string());

        assert!(validate(&schema, &json!({})).is_empty());
        assert!(validate(&schema, &json!({"id": 123})).is_empty());
    }

    #[test]
    fn test_validate_int64() {
        let schema = Schema::v0().with_attribute("priority", Attribute::required_int64());

        assert!(validate(&schema, &json!({"priority": 42})).is_empty());
        assert!(validate(&schema, &json!({"priority": 42.0})).is_empty());
        assert_eq!(validate(&schema, &json!({"priority": 42.5})).len(), 1);
        assert_eq!(validate(&schema, &json!({"priority": "42"})).len(), 1);
    }

    #[test]
    fn test_validate_string_set() {
        let schema = Schema::v0().with_attribute("permissions", Attribute::optional_string_set());

        assert!(validate(&schema, &json!({"permissions": ["token:read"]})).is_empty());
        assert!(validate(&schema, &json!({"permissions": []})).is_empty());

        let diagnostics = validate(&schema, &json!({"permissions": ["token:read", 5]}));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].attribute, Some("permissions.1".to_string()));

        let diagnostics = validate(&schema, &json!({"permissions": "token:read"}));
        assert_eq!(diagnostics[0].detail, Some("Expected set, got string".to_string()));
    }

    #[test]
    fn test_validate_string_map() {
        let schema = Schema::v0().with_attribute("configuration", Attribute::optional_string_map());

        assert!(validate(&schema, &json!({"configuration": {"KEY": "value"}})).is_empty());

        let diagnostics = validate(&schema, &json!({"configuration": {"KEY": 1}}));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(
            diagnostics[0].attribute,
            Some("configuration.KEY".to_string())
        );
    }

    #[test]
    fn test_validators_on_top_level_attribute() {
        let schema = Schema::v0().with_attribute(
            "type",
            Attribute::new(AttributeType::String, AttributeFlags::required())
                .with_validator(Validator::one_of(["public", "private", "management"])),
        );

        assert!(validate(&schema, &json!({"type": "management"})).is_empty());

        let diagnostics = validate(&schema, &json!({"type": "elevated"}));
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].summary.starts_with("expected type to be one of"));
    }

    #[test]
    fn test_validators_inside_set_block() {
        let schema = rule_schema();

        let valid = json!({"rule": [
            {"description": "REVEAL_ALL", "priority": 1, "transform": "reveal"}
        ]});
        assert!(validate(&schema, &valid).is_empty());

        let invalid = json!({"rule": [
            {"description": "lower", "priority": 0, "transform": "encrypt"}
        ]});
        let diagnostics = validate(&schema, &invalid);
        assert_eq!(diagnostics.len(), 3);
        let paths: Vec<_> = diagnostics
            .iter()
            .filter_map(|d| d.attribute.clone())
            .collect();
        assert!(paths.contains(&"rule.0.description".to_string()));
        assert!(paths.contains(&"rule.0.priority".to_string()));
        assert!(paths.contains(&"rule.0.transform".to_string()));
    }

    #[test]
    fn test_validator_skipped_on_type_error() {
        let schema = rule_schema();
        let diagnostics = validate(
            &schema,
            &json!({"rule": [{"description": "OK", "priority": "high", "transform": "mask"}]}),
        );
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].summary.contains("Invalid type"));
    }

    #[test]
    fn test_validate_block_max_items() {
        let schema = Schema::v0().with_block(
            "response_transform",
            NestedBlock::set(Block::new().with_attribute("code", Attribute::optional_string()))
                .with_max_items(1),
        );

        assert!(validate(&schema, &json!({"response_transform": [{"code": "x"}]})).is_empty());

        let diagnostics = validate(
            &schema,
            &json!({"response_transform": [{"code": "a"}, {"code": "b"}]}),
        );
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].summary.contains("at most 1"));
    }

    #[test]
    fn test_validate_block_min_items() {
        let schema = Schema::v0().with_block(
            "rule",
            NestedBlock::list(Block::new()).with_min_items(1),
        );

        let diagnostics = validate(&schema, &json!({}));
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].summary.contains("at least 1"));
    }

    #[test]
    fn test_is_valid_helper() {
        let schema = Schema::v0().with_attribute("name", Attribute::required_string());

        assert!(is_valid(&schema, &json!({"name": "test"})));
        assert!(!is_valid(&schema, &json!({})));
    }

    #[test]
    fn test_validate_result_helper() {
        let schema = Schema::v0().with_attribute("name", Attribute::required_string());

        assert!(validate_result(&schema, &json!({"name": "test"})).is_ok());
        assert_eq!(validate_result(&schema, &json!({})).unwrap_err().len(), 1);
    }

    #[test]
    fn test_validate_root_not_object() {
        let schema = Schema::v0().with_attribute("name", Attribute::required_string());

        let diagnostics = validate(&schema, &json!("not an object"));
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].summary.contains("Expected object"));
    }
}
