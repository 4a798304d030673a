//! Schema validation for persisted state
//!
//! A `Schema` describes the JSON shape a slice is allowed to restore from
//! durable storage. It covers the subset of JSON Schema that persisted state
//! actually uses: primitive types, arrays, objects with required and
//! optional properties, string-keyed maps, nullable values and unions.
//!
//! Validation never coerces. A value either matches or is rejected with a
//! [`ValidationError`] naming the first offending location.

use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Schema validation failure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("at {path}: expected {expected}, found {found}")]
pub struct ValidationError {
    /// Location of the failure, e.g. `$.items[0].slug`
    pub path: String,
    /// What the schema required there
    pub expected: String,
    /// What was actually present
    pub found: String,
}

impl ValidationError {
    /// Create a validation error at `path`.
    pub fn new(
        path: impl Into<String>,
        expected: impl Into<String>,
        found: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            expected: expected.into(),
            found: found.into(),
        }
    }
}

/// Object shape: declared properties, which of them are required, and
/// whether undeclared properties are tolerated.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectSchema {
    properties: BTreeMap<String, Schema>,
    required: Vec<String>,
    additional: bool,
}

impl ObjectSchema {
    /// Declare an optional property.
    pub fn property(mut self, name: impl Into<String>, schema: Schema) -> Self {
        self.properties.insert(name.into(), schema);
        self
    }

    /// Declare a required property.
    pub fn required(mut self, name: impl Into<String>, schema: Schema) -> Self {
        let name = name.into();
        if !self.required.contains(&name) {
            self.required.push(name.clone());
        }
        self.properties.insert(name, schema);
        self
    }

    /// Reject properties that were not declared.
    pub fn deny_additional(mut self) -> Self {
        self.additional = false;
        self
    }

    /// Finish the object schema.
    pub fn build(self) -> Schema {
        Schema::Object(self)
    }
}

/// Shape of a persisted JSON value.
#[derive(Debug, Clone, PartialEq)]
pub enum Schema {
    /// Any value
    Any,
    /// `null`
    Null,
    /// `true` / `false`
    Boolean,
    /// Integral number
    Integer,
    /// Any number
    Number,
    /// String
    String,
    /// Array whose every element matches the inner schema
    Array(Box<Schema>),
    /// Object with declared properties
    Object(ObjectSchema),
    /// Object with arbitrary keys whose every value matches the inner schema
    Map(Box<Schema>),
    /// `null` or the inner schema
    Nullable(Box<Schema>),
    /// At least one of the alternatives
    OneOf(Vec<Schema>),
}

impl Schema {
    /// Array of `items`.
    pub fn array(items: Schema) -> Self {
        Schema::Array(Box::new(items))
    }

    /// Start an object schema. Undeclared properties are allowed unless
    /// [`ObjectSchema::deny_additional`] is called.
    pub fn object() -> ObjectSchema {
        ObjectSchema {
            properties: BTreeMap::new(),
            required: Vec::new(),
            additional: true,
        }
    }

    /// String-keyed map of `values`. Keyed slices persist in this shape.
    pub fn map(values: Schema) -> Self {
        Schema::Map(Box::new(values))
    }

    /// `null` or `inner`.
    pub fn nullable(inner: Schema) -> Self {
        Schema::Nullable(Box::new(inner))
    }

    /// Validate `value` against this schema.
    pub fn validate(&self, value: &Value) -> Result<(), ValidationError> {
        self.check(value, &mut String::from("$"))
    }

    /// True if `value` matches.
    pub fn is_valid(&self, value: &Value) -> bool {
        self.validate(value).is_ok()
    }

    fn check(&self, value: &Value, path: &mut String) -> Result<(), ValidationError> {
        match (self, value) {
            (Schema::Any, _) => Ok(()),
            (Schema::Null, Value::Null) => Ok(()),
            (Schema::Boolean, Value::Bool(_)) => Ok(()),
            (Schema::Integer, Value::Number(n)) if n.is_i64() || n.is_u64() => Ok(()),
            (Schema::Number, Value::Number(_)) => Ok(()),
            (Schema::String, Value::String(_)) => Ok(()),
            (Schema::Nullable(_), Value::Null) => Ok(()),
            (Schema::Nullable(inner), other) => inner.check(other, path),
            (Schema::Array(items), Value::Array(elements)) => {
                for (i, element) in elements.iter().enumerate() {
                    let len = path.len();
                    path.push_str(&format!("[{}]", i));
                    items.check(element, path)?;
                    path.truncate(len);
                }
                Ok(())
            }
            (Schema::Map(values), Value::Object(map)) => {
                for (key, element) in map {
                    let len = path.len();
                    push_property(path, key);
                    values.check(element, path)?;
                    path.truncate(len);
                }
                Ok(())
            }
            (Schema::Object(shape), Value::Object(map)) => {
                for name in &shape.required {
                    if !map.contains_key(name) {
                        let mut at = path.clone();
                        push_property(&mut at, name);
                        return Err(ValidationError::new(at, "required property", "nothing"));
                    }
                }
                for (key, element) in map {
                    let len = path.len();
                    push_property(path, key);
                    match shape.properties.get(key) {
                        Some(schema) => schema.check(element, path)?,
                        None if shape.additional => {}
                        None => {
                            return Err(ValidationError::new(
                                path.clone(),
                                "no property",
                                describe(element),
                            ))
                        }
                    }
                    path.truncate(len);
                }
                Ok(())
            }
            (Schema::OneOf(alternatives), other) => {
                if alternatives
                    .iter()
                    .any(|alt| alt.check(other, &mut path.clone()).is_ok())
                {
                    Ok(())
                } else {
                    Err(ValidationError::new(
                        path.clone(),
                        self.to_string(),
                        describe(other),
                    ))
                }
            }
            (expected, found) => Err(ValidationError::new(
                path.clone(),
                expected.to_string(),
                describe(found),
            )),
        }
    }
}

fn push_property(path: &mut String, key: &str) {
    path.push('.');
    path.push_str(key);
}

fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Schema::Any => f.write_str("any"),
            Schema::Null => f.write_str("null"),
            Schema::Boolean => f.write_str("boolean"),
            Schema::Integer => f.write_str("integer"),
            Schema::Number => f.write_str("number"),
            Schema::String => f.write_str("string"),
            Schema::Array(items) => write!(f, "array of {}", items),
            Schema::Object(_) => f.write_str("object"),
            Schema::Map(values) => write!(f, "map of {}", values),
            Schema::Nullable(inner) => write!(f, "{} or null", inner),
            Schema::OneOf(alternatives) => {
                let names: Vec<String> = alternatives.iter().map(|s| s.to_string()).collect();
                write!(f, "one of [{}]", names.join(", "))
            }
        }
    }
}
