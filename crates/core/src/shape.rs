//! Structural validation for generated JSON.
//!
//! The generative provider is a non-deterministic black box, so every
//! structured response passes through [`validate`] before anything trusts
//! it. The descriptor tree mirrors the handful of shapes this system asks
//! for: required-field objects, enumerated strings, string arrays, and the
//! content-block rule used by sectioned summaries. Validation stops at the
//! first violated constraint and reports it with the path that failed.

use serde_json::Value;
use thiserror::Error;

/// Block kinds accepted inside a sectioned summary.
pub const BLOCK_KINDS: [&str; 5] = ["h1", "h2", "h3", "paragraph", "list"];

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("{path}: {constraint}")]
pub struct ShapeViolation {
    pub path: String,
    pub constraint: String,
}

impl ShapeViolation {
    fn new(path: &str, constraint: impl Into<String>) -> Self {
        Self { path: path.to_string(), constraint: constraint.into() }
    }
}

#[derive(Clone, Debug)]
pub enum Shape {
    /// Object carrying at least the named fields. Extra fields pass.
    Object(Vec<(String, Shape)>),
    Text,
    Integer,
    TextArray,
    /// String drawn from a fixed enumeration.
    OneOf(Vec<String>),
    Array(Box<Shape>),
    /// Ordered content blocks: each needs a `type` from [`BLOCK_KINDS`] and
    /// a `text`; `list` blocks additionally need a non-empty `items` array.
    Blocks,
}

impl Shape {
    pub fn object(fields: Vec<(&str, Shape)>) -> Self {
        Self::Object(fields.into_iter().map(|(name, shape)| (name.to_string(), shape)).collect())
    }

    /// Derive a shape from the subset of JSON Schema this system exchanges
    /// with callers: `object`/`properties`/`required`, `array`/`items`,
    /// `string` (optionally with `enum`), and `number`/`integer`.
    /// Only `required` properties become constraints; the rest stay loose.
    pub fn from_json_schema(schema: &Value) -> Option<Self> {
        let schema_type = schema.get("type")?.as_str()?;
        match schema_type {
            "object" => {
                let properties = schema.get("properties")?.as_object()?;
                let required: Vec<&str> = schema
                    .get("required")
                    .and_then(Value::as_array)
                    .map(|names| names.iter().filter_map(Value::as_str).collect())
                    .unwrap_or_default();

                let mut fields = Vec::with_capacity(required.len());
                for name in required {
                    let property = properties.get(name)?;
                    fields.push((name.to_string(), Self::from_json_schema(property)?));
                }
                Some(Self::Object(fields))
            }
            "array" => {
                let items = Self::from_json_schema(schema.get("items")?)?;
                if matches!(items, Self::Text) {
                    Some(Self::TextArray)
                } else {
                    Some(Self::Array(Box::new(items)))
                }
            }
            "string" => match schema.get("enum").and_then(Value::as_array) {
                Some(allowed) => Some(Self::OneOf(
                    allowed.iter().filter_map(Value::as_str).map(str::to_string).collect(),
                )),
                None => Some(Self::Text),
            },
            "number" | "integer" => Some(Self::Integer),
            _ => None,
        }
    }
}

/// Check `value` against `shape`, reporting the first violated constraint.
pub fn validate(value: &Value, shape: &Shape) -> Result<(), ShapeViolation> {
    validate_at(value, shape, "$")
}

fn validate_at(value: &Value, shape: &Shape, path: &str) -> Result<(), ShapeViolation> {
    match shape {
        Shape::Object(fields) => {
            let object = value
                .as_object()
                .ok_or_else(|| ShapeViolation::new(path, "expected an object"))?;
            for (name, field_shape) in fields {
                let child = object.get(name).ok_or_else(|| {
                    ShapeViolation::new(path, format!("missing required field `{name}`"))
                })?;
                validate_at(child, field_shape, &format!("{path}.{name}"))?;
            }
            Ok(())
        }
        Shape::Text => {
            if value.is_string() {
                Ok(())
            } else {
                Err(ShapeViolation::new(path, "expected a string"))
            }
        }
        Shape::Integer => {
            if value.is_i64() || value.is_u64() {
                Ok(())
            } else {
                Err(ShapeViolation::new(path, "expected an integer"))
            }
        }
        Shape::TextArray => {
            let items = value
                .as_array()
                .ok_or_else(|| ShapeViolation::new(path, "expected an array of strings"))?;
            for (index, item) in items.iter().enumerate() {
                if !item.is_string() {
                    return Err(ShapeViolation::new(
                        &format!("{path}[{index}]"),
                        "expected a string",
                    ));
                }
            }
            Ok(())
        }
        Shape::OneOf(allowed) => {
            let text = value
                .as_str()
                .ok_or_else(|| ShapeViolation::new(path, "expected a string"))?;
            if allowed.iter().any(|candidate| candidate == text) {
                Ok(())
            } else {
                Err(ShapeViolation::new(
                    path,
                    format!("value `{text}` not in enumeration [{}]", allowed.join(", ")),
                ))
            }
        }
        Shape::Array(item_shape) => {
            let items =
                value.as_array().ok_or_else(|| ShapeViolation::new(path, "expected an array"))?;
            for (index, item) in items.iter().enumerate() {
                validate_at(item, item_shape, &format!("{path}[{index}]"))?;
            }
            Ok(())
        }
        Shape::Blocks => {
            let blocks = value
                .as_array()
                .ok_or_else(|| ShapeViolation::new(path, "expected a content array"))?;
            for (index, block) in blocks.iter().enumerate() {
                validate_block(block, &format!("{path}[{index}]"))?;
            }
            Ok(())
        }
    }
}

fn validate_block(block: &Value, path: &str) -> Result<(), ShapeViolation> {
    let object =
        block.as_object().ok_or_else(|| ShapeViolation::new(path, "expected a content block"))?;

    let kind = object
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| ShapeViolation::new(path, "missing required field `type`"))?;
    if !BLOCK_KINDS.contains(&kind) {
        return Err(ShapeViolation::new(
            path,
            format!("content type `{kind}` not in enumeration [{}]", BLOCK_KINDS.join(", ")),
        ));
    }

    if !object.get("text").map(Value::is_string).unwrap_or(false) {
        return Err(ShapeViolation::new(path, "missing required field `text`"));
    }

    if kind == "list" {
        let items = object
            .get("items")
            .and_then(Value::as_array)
            .ok_or_else(|| ShapeViolation::new(path, "list block missing items array"))?;
        if items.is_empty() {
            return Err(ShapeViolation::new(path, "list block items must not be empty"));
        }
        for (index, item) in items.iter().enumerate() {
            if !item.is_string() {
                return Err(ShapeViolation::new(
                    &format!("{path}.items[{index}]"),
                    "expected a string",
                ));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{validate, Shape};

    fn sections_shape() -> Shape {
        Shape::object(vec![(
            "sections",
            Shape::Array(Box::new(Shape::object(vec![
                ("title", Shape::Text),
                ("content", Shape::Blocks),
            ]))),
        )])
    }

    #[test]
    fn accepts_well_formed_sections() {
        let value = json!({
            "sections": [{
                "title": "Ideal Customer Profile",
                "content": [
                    { "type": "h2", "text": "Who they are" },
                    { "type": "paragraph", "text": "Urban professionals." },
                    { "type": "list", "text": "Key traits", "items": ["age 25-40", "college educated"] }
                ]
            }]
        });

        assert!(validate(&value, &sections_shape()).is_ok());
    }

    #[test]
    fn rejects_unknown_content_type() {
        let value = json!({
            "sections": [{
                "title": "Profile",
                "content": [{ "type": "h4", "text": "oops" }]
            }]
        });

        let violation = validate(&value, &sections_shape()).expect_err("h4 is not a block kind");
        assert!(violation.constraint.contains("content type `h4` not in enumeration"));
        assert_eq!(violation.path, "$.sections[0].content[0]");
    }

    #[test]
    fn rejects_list_without_items() {
        let value = json!({
            "sections": [{
                "title": "Profile",
                "content": [{ "type": "list", "text": "traits" }]
            }]
        });

        let violation = validate(&value, &sections_shape()).expect_err("list needs items");
        assert!(violation.constraint.contains("list block missing items array"));
    }

    #[test]
    fn rejects_list_with_empty_items() {
        let value = json!({
            "sections": [{
                "title": "Profile",
                "content": [{ "type": "list", "text": "traits", "items": [] }]
            }]
        });

        let violation = validate(&value, &sections_shape()).expect_err("empty items");
        assert!(violation.constraint.contains("must not be empty"));
    }

    #[test]
    fn reports_first_missing_field() {
        let value = json!({ "sections": [{ "content": [] }] });

        let violation = validate(&value, &sections_shape()).expect_err("title missing");
        assert!(violation.constraint.contains("missing required field `title`"));
    }

    #[test]
    fn extra_fields_are_tolerated() {
        let shape = Shape::object(vec![("overview", Shape::Text)]);
        let value = json!({ "overview": "text", "surplus": 42 });

        assert!(validate(&value, &shape).is_ok());
    }

    #[test]
    fn derives_shapes_from_json_schema() {
        let schema = json!({
            "type": "object",
            "properties": {
                "name": { "type": "string" },
                "age": { "type": "number" },
                "tags": { "type": "array", "items": { "type": "string" } },
                "optional_note": { "type": "string" }
            },
            "required": ["name", "age", "tags"]
        });

        let shape = Shape::from_json_schema(&schema).expect("supported schema");
        assert!(validate(&json!({ "name": "A", "age": 30, "tags": ["x"] }), &shape).is_ok());

        let violation = validate(&json!({ "name": "A", "age": "thirty", "tags": [] }), &shape)
            .expect_err("age must be numeric");
        assert_eq!(violation.path, "$.age");
    }

    #[test]
    fn enum_strings_round_trip_from_schema() {
        let schema = json!({ "type": "string", "enum": ["draft", "final"] });
        let shape = Shape::from_json_schema(&schema).expect("enum schema");

        assert!(validate(&json!("draft"), &shape).is_ok());
        let violation = validate(&json!("archived"), &shape).expect_err("not enumerated");
        assert!(violation.constraint.contains("not in enumeration"));
    }
}
