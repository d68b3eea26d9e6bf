//! Validation System - Runtime Prop Shapes
//!
//! A prop's value is checked against a type tag, or against a structural
//! schema of nested tags. Unknown keys are ignored, missing keys fail.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::token::PropType;

impl PropType {
    /// `object` accepts mappings and sequences. `null` is not structured.
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            PropType::Any => true,
            PropType::String => value.is_string(),
            PropType::Number => value.is_number(),
            PropType::Boolean => value.is_boolean(),
            PropType::Object => value.is_object() || value.is_array(),
        }
    }
}

/// A type tag, or a mapping of keys to nested schemas.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Schema {
    Tag(PropType),
    Object(BTreeMap<String, Schema>),
}

impl From<PropType> for Schema {
    fn from(tag: PropType) -> Self {
        Schema::Tag(tag)
    }
}

/// Where and why a value failed its schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaViolation {
    /// Dotted key path from the validated root, empty for the root itself
    pub path: String,
    pub expected: String,
    pub missing: bool,
}

pub fn validate(schema: &Schema, value: &Value) -> bool {
    check(schema, value).is_ok()
}

/// Like [`validate`], but reports the first offending key.
pub fn check(schema: &Schema, value: &Value) -> Result<(), SchemaViolation> {
    check_layer(schema, value, "")
}

fn check_layer(schema: &Schema, value: &Value, path: &str) -> Result<(), SchemaViolation> {
    match schema {
        Schema::Tag(tag) => {
            if tag.matches(value) {
                Ok(())
            } else {
                Err(SchemaViolation {
                    path: path.to_string(),
                    expected: tag.to_string(),
                    missing: false,
                })
            }
        }
        Schema::Object(fields) => {
            let Some(map) = value.as_object() else {
                return Err(SchemaViolation {
                    path: path.to_string(),
                    expected: PropType::Object.to_string(),
                    missing: false,
                });
            };
            for (key, field_schema) in fields {
                let field_path = if path.is_empty() {
                    key.clone()
                } else {
                    format!("{}.{}", path, key)
                };
                match map.get(key) {
                    Some(field) => check_layer(field_schema, field, &field_path)?,
                    None => {
                        return Err(SchemaViolation {
                            path: field_path,
                            expected: describe(field_schema),
                            missing: true,
                        })
                    }
                }
            }
            Ok(())
        }
    }
}

fn describe(schema: &Schema) -> String {
    match schema {
        Schema::Tag(tag) => tag.to_string(),
        Schema::Object(_) => PropType::Object.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scalar_tags_match_exactly() {
        assert!(PropType::String.matches(&json!("12")));
        assert!(!PropType::Number.matches(&json!("12")));
        assert!(PropType::Number.matches(&json!(12.5)));
        assert!(PropType::Boolean.matches(&json!(false)));
        assert!(!PropType::Boolean.matches(&json!(0)));
        assert!(PropType::Any.matches(&Value::Null));
    }

    #[test]
    fn test_object_tag_accepts_structures() {
        assert!(PropType::Object.matches(&json!({"a": 1})));
        assert!(PropType::Object.matches(&json!([1, 2])));
        assert!(!PropType::Object.matches(&Value::Null));
        assert!(!PropType::Object.matches(&json!("{}")));
    }

    #[test]
    fn test_structural_schema() {
        let schema: Schema = serde_json::from_value(json!({
            "title": "string",
            "author": { "name": "string", "age": "number" },
            "tags": "object"
        }))
        .unwrap();

        let ok = json!({
            "title": "Post",
            "author": { "name": "Ann", "age": 31, "extra": true },
            "tags": ["a"],
            "unknown": 1
        });
        assert!(validate(&schema, &ok));

        let missing = json!({ "title": "Post", "author": { "name": "Ann" }, "tags": [] });
        let violation = check(&schema, &missing).unwrap_err();
        assert_eq!(violation.path, "author.age");
        assert!(violation.missing);

        let wrong = json!({ "title": 1, "author": { "name": "Ann", "age": 3 }, "tags": [] });
        let violation = check(&schema, &wrong).unwrap_err();
        assert_eq!(violation.path, "title");
        assert_eq!(violation.expected, "string");
    }

    #[test]
    fn test_nested_schema_rejects_scalar() {
        let schema: Schema = serde_json::from_value(json!({ "inner": { "x": "any" } })).unwrap();
        assert!(!validate(&schema, &json!({ "inner": 5 })));
        assert!(validate(&schema, &json!({ "inner": { "x": null } })));
    }
}
