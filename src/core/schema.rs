/// Declarative argument schemas for tools.
///
/// Every tool declares its fields once as an `ArgumentSchema`. The same value
/// is used to validate untrusted `tools/call` arguments and to render the JSON
/// Schema advertised through `tools/list`, so the two can never disagree.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};

use crate::core::error::{ToolError, ValidationError, Violation};

/// Type and bounds of a single field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    /// String with inclusive length bounds, counted in characters
    String {
        min_len: Option<usize>,
        max_len: Option<usize>,
    },
    /// String of exactly `len` characters (e.g. a 2-letter language code)
    FixedString { len: usize },
    /// Integer with inclusive bounds
    Integer { min: Option<i64>, max: Option<i64> },
}

/// Constraints for one named field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    pub default: Option<Value>,
}

impl FieldSpec {
    pub fn string(name: &'static str, description: &'static str) -> Self {
        Self {
            name,
            description,
            kind: FieldKind::String {
                min_len: None,
                max_len: None,
            },
            required: true,
            default: None,
        }
    }

    pub fn fixed_string(name: &'static str, description: &'static str, len: usize) -> Self {
        Self {
            name,
            description,
            kind: FieldKind::FixedString { len },
            required: true,
            default: None,
        }
    }

    pub fn integer(name: &'static str, description: &'static str) -> Self {
        Self {
            name,
            description,
            kind: FieldKind::Integer {
                min: None,
                max: None,
            },
            required: true,
            default: None,
        }
    }

    /// Set inclusive length bounds. Only meaningful for `FieldKind::String`.
    pub fn length(mut self, min: usize, max: usize) -> Self {
        if let FieldKind::String { min_len, max_len } = &mut self.kind {
            *min_len = Some(min);
            *max_len = Some(max);
        }
        self
    }

    /// Set inclusive numeric bounds. Only meaningful for `FieldKind::Integer`.
    pub fn range(mut self, lo: i64, hi: i64) -> Self {
        if let FieldKind::Integer { min, max } = &mut self.kind {
            *min = Some(lo);
            *max = Some(hi);
        }
        self
    }

    /// Make the field optional, filled with `value` when omitted.
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.required = false;
        self.default = Some(value.into());
        self
    }

    fn json_schema(&self) -> Value {
        let mut schema = Map::new();
        match &self.kind {
            FieldKind::String { min_len, max_len } => {
                schema.insert("type".into(), json!("string"));
                if let Some(min) = min_len {
                    schema.insert("minLength".into(), json!(min));
                }
                if let Some(max) = max_len {
                    schema.insert("maxLength".into(), json!(max));
                }
            }
            FieldKind::FixedString { len } => {
                schema.insert("type".into(), json!("string"));
                schema.insert("minLength".into(), json!(len));
                schema.insert("maxLength".into(), json!(len));
            }
            FieldKind::Integer { min, max } => {
                schema.insert("type".into(), json!("integer"));
                if let Some(min) = min {
                    schema.insert("minimum".into(), json!(min));
                }
                if let Some(max) = max {
                    schema.insert("maximum".into(), json!(max));
                }
            }
        }
        schema.insert("description".into(), json!(self.description));
        if let Some(default) = &self.default {
            schema.insert("default".into(), default.clone());
        }
        Value::Object(schema)
    }

    /// Check one present value, returning the coerced value or a violation.
    fn check(&self, value: &Value) -> Result<Value, Violation> {
        match &self.kind {
            FieldKind::String { min_len, max_len } => {
                let s = value
                    .as_str()
                    .ok_or_else(|| Violation::new(self.name, "expected a string"))?;
                let len = s.chars().count();
                if let Some(min) = min_len {
                    if len < *min {
                        return Err(Violation::new(
                            self.name,
                            format!("must be at least {min} characters"),
                        ));
                    }
                }
                if let Some(max) = max_len {
                    if len > *max {
                        return Err(Violation::new(
                            self.name,
                            format!("must be at most {max} characters"),
                        ));
                    }
                }
                Ok(value.clone())
            }
            FieldKind::FixedString { len } => {
                let s = value
                    .as_str()
                    .ok_or_else(|| Violation::new(self.name, "expected a string"))?;
                if s.chars().count() != *len {
                    return Err(Violation::new(
                        self.name,
                        format!("must be exactly {len} characters"),
                    ));
                }
                Ok(value.clone())
            }
            FieldKind::Integer { min, max } => {
                let n = as_integer(value)
                    .ok_or_else(|| Violation::new(self.name, "expected an integer"))?;
                if let Some(min) = min {
                    if n < *min {
                        return Err(Violation::new(
                            self.name,
                            format!("must be greater than or equal to {min}"),
                        ));
                    }
                }
                if let Some(max) = max {
                    if n > *max {
                        return Err(Violation::new(
                            self.name,
                            format!("must be less than or equal to {max}"),
                        ));
                    }
                }
                Ok(json!(n))
            }
        }
    }
}

/// Integers arrive as JSON numbers; `30.0` is accepted as `30`, `2.5` is not.
fn as_integer(value: &Value) -> Option<i64> {
    if let Some(n) = value.as_i64() {
        return Some(n);
    }
    let f = value.as_f64()?;
    if f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

/// Field-level contract for one tool's arguments.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ArgumentSchema {
    fields: Vec<FieldSpec>,
}

impl ArgumentSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, spec: FieldSpec) -> Self {
        self.fields.push(spec);
        self
    }

    /// Render as a JSON Schema object for `tools/list`.
    pub fn to_json_schema(&self) -> Value {
        let properties: Map<String, Value> = self
            .fields
            .iter()
            .map(|f| (f.name.to_string(), f.json_schema()))
            .collect();
        let required: Vec<&str> = self
            .fields
            .iter()
            .filter(|f| f.required)
            .map(|f| f.name)
            .collect();
        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    /// Validate a raw argument object.
    ///
    /// Absent or `null` arguments are treated as `{}`. Unknown fields are
    /// dropped, defaults are applied, and every violation is reported.
    pub fn validate(&self, raw: &Value) -> Result<ValidatedArgs, ValidationError> {
        let empty = Map::new();
        let input = match raw {
            Value::Null => &empty,
            Value::Object(map) => map,
            _ => {
                return Err(ValidationError {
                    violations: vec![Violation::new("", "arguments must be an object")],
                });
            }
        };

        let mut values = Map::new();
        let mut violations = Vec::new();
        for spec in &self.fields {
            match input.get(spec.name) {
                Some(value) if !value.is_null() => match spec.check(value) {
                    Ok(v) => {
                        values.insert(spec.name.to_string(), v);
                    }
                    Err(violation) => violations.push(violation),
                },
                _ => {
                    if let Some(default) = &spec.default {
                        values.insert(spec.name.to_string(), default.clone());
                    } else if spec.required {
                        violations.push(Violation::new(spec.name, "is required"));
                    }
                }
            }
        }

        if violations.is_empty() {
            Ok(ValidatedArgs(values))
        } else {
            Err(ValidationError { violations })
        }
    }
}

/// Arguments that passed schema validation, with defaults applied.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedArgs(Map<String, Value>);

impl ValidatedArgs {
    #[cfg(test)]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Deserialize into a tool's typed argument struct.
    pub fn into_typed<T: DeserializeOwned>(self) -> Result<T, ToolError> {
        serde_json::from_value(Value::Object(self.0))
            .map_err(|e| ToolError::Arguments(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> ArgumentSchema {
        ArgumentSchema::new()
            .field(FieldSpec::string("text", "Text").length(1, 5))
            .field(FieldSpec::fixed_string("lang", "Language", 2))
            .field(
                FieldSpec::integer("steps", "Steps")
                    .range(1, 100)
                    .default_value(30),
            )
    }

    #[test]
    fn applies_defaults_and_drops_unknown_fields() {
        let args = schema()
            .validate(&json!({"text": "hi", "lang": "de", "extra": true}))
            .unwrap();
        assert_eq!(args.get("steps"), Some(&json!(30)));
        assert_eq!(args.get("extra"), None);
    }

    #[test]
    fn rejects_empty_string_below_min_length() {
        let err = schema()
            .validate(&json!({"text": "", "lang": "de"}))
            .unwrap_err();
        assert_eq!(
            err.violations,
            vec![Violation::new("text", "must be at least 1 characters")]
        );
    }

    #[test]
    fn counts_characters_not_bytes() {
        assert!(schema().validate(&json!({"text": "ééééé", "lang": "de"})).is_ok());
        assert!(schema().validate(&json!({"text": "éééééé", "lang": "de"})).is_err());
    }

    #[test]
    fn rejects_fixed_string_of_wrong_length() {
        let err = schema()
            .validate(&json!({"text": "hi", "lang": "eng"}))
            .unwrap_err();
        assert_eq!(err.violations[0].field, "lang");
    }

    #[test]
    fn integer_bounds_and_coercion() {
        let s = schema();
        assert!(s.validate(&json!({"text": "a", "lang": "de", "steps": 150})).is_err());
        assert!(s.validate(&json!({"text": "a", "lang": "de", "steps": 0})).is_err());
        assert!(s.validate(&json!({"text": "a", "lang": "de", "steps": 2.5})).is_err());
        let args = s
            .validate(&json!({"text": "a", "lang": "de", "steps": 40.0}))
            .unwrap();
        assert_eq!(args.get("steps"), Some(&json!(40)));
    }

    #[test]
    fn collects_every_violation() {
        let err = schema().validate(&json!({"steps": "ten"})).unwrap_err();
        let fields: Vec<_> = err.violations.iter().map(|v| v.field.as_str()).collect();
        assert_eq!(fields, vec!["text", "lang", "steps"]);
    }

    #[test]
    fn null_arguments_mean_empty_object() {
        let err = schema().validate(&Value::Null).unwrap_err();
        assert_eq!(err.violations.len(), 2);
        assert!(schema().validate(&json!([1, 2])).is_err());
    }

    #[test]
    fn renders_json_schema() {
        let rendered = schema().to_json_schema();
        assert_eq!(rendered["required"], json!(["text", "lang"]));
        assert_eq!(rendered["properties"]["lang"]["minLength"], json!(2));
        assert_eq!(rendered["properties"]["lang"]["maxLength"], json!(2));
        assert_eq!(rendered["properties"]["steps"]["default"], json!(30));
        assert_eq!(rendered["properties"]["steps"]["type"], json!("integer"));
    }
}
