//! Argument validation against generated input schemas
//!
//! A tool's input schema is generated once from its request type. The same
//! schema is advertised to clients and read back here into per-parameter
//! checks, so a rejected call always names the offending parameter.

use desktop_mcp_protocol::{Arguments, KEY_NAME_FORMAT, Key, ToolError};
use rmcp::handler::server::tool::schema_for_type;
use rmcp::model::JsonObject;
use rmcp::schemars::JsonSchema;
use serde_json::Value;
use std::sync::Arc;

/// Semantic type of a parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    Integer,
    Number,
    String,
    /// A single recognized key name
    KeyName,
    /// An ordered list of recognized key names
    KeyList,
    /// Anything else; left to deserialization
    Any,
}

/// Checks for one property of an input schema
#[derive(Debug, Clone)]
pub struct Param {
    name: String,
    param_type: ParamType,
    required: bool,
    default: Option<Value>,
    minimum: Option<f64>,
    maximum: Option<f64>,
    min_items: Option<u64>,
    allowed: Option<Vec<String>>,
}

impl Param {
    fn from_property(name: &str, property: &Value, required: bool) -> Self {
        let format = property.get("format").and_then(Value::as_str);
        let param_type = match property.get("type").and_then(Value::as_str) {
            Some("integer") => ParamType::Integer,
            Some("number") => ParamType::Number,
            Some("string") if format == Some(KEY_NAME_FORMAT) => ParamType::KeyName,
            Some("string") => ParamType::String,
            Some("array") if property["items"]["format"] == KEY_NAME_FORMAT => ParamType::KeyList,
            _ => ParamType::Any,
        };

        let mut minimum = property.get("minimum").and_then(Value::as_f64);
        let mut maximum = property.get("maximum").and_then(Value::as_f64);
        if let Some((low, high)) = format.and_then(integer_range) {
            minimum = Some(minimum.map_or(low, |m| m.max(low)));
            maximum = Some(maximum.map_or(high, |m| m.min(high)));
        }

        Self {
            name: name.to_string(),
            param_type,
            required,
            default: property.get("default").cloned(),
            minimum,
            maximum,
            min_items: property.get("minItems").and_then(Value::as_u64),
            allowed: property.get("enum").and_then(Value::as_array).map(|values| {
                values
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            }),
        }
    }

    fn invalid(&self, reason: impl Into<String>) -> ToolError {
        ToolError::invalid_argument(self.name.as_str(), reason)
    }

    /// Check (and coerce) one supplied value
    fn check(&self, value: Value) -> Result<Value, ToolError> {
        match self.param_type {
            ParamType::Integer => {
                let int = as_integer(&value).ok_or_else(|| self.invalid("must be an integer"))?;
                self.check_bounds(int as f64)?;
                Ok(Value::from(int))
            }
            ParamType::Number => {
                let number = match &value {
                    Value::Number(n) => n.as_f64(),
                    _ => None,
                }
                .filter(|n| n.is_finite())
                .ok_or_else(|| self.invalid("must be a number"))?;
                self.check_bounds(number)?;
                Ok(Value::from(number))
            }
            ParamType::String => {
                let Value::String(s) = &value else {
                    return Err(self.invalid("must be a string"));
                };
                if let Some(allowed) = self.allowed.as_ref().filter(|a| !a.contains(s)) {
                    return Err(self.invalid(format!("must be one of: {}", allowed.join(", "))));
                }
                Ok(value)
            }
            ParamType::KeyName => {
                let Value::String(s) = &value else {
                    return Err(self.invalid("must be a string"));
                };
                s.parse::<Key>().map_err(|e| self.invalid(e.to_string()))?;
                Ok(value)
            }
            ParamType::KeyList => {
                let Value::Array(items) = &value else {
                    return Err(self.invalid("must be an array of key names"));
                };
                if let Some(min) = self.min_items.filter(|&min| (items.len() as u64) < min) {
                    return Err(self.invalid(match min {
                        1 => "must contain at least one key".to_string(),
                        n => format!("must contain at least {} keys", n),
                    }));
                }
                for (i, item) in items.iter().enumerate() {
                    let Value::String(s) = item else {
                        return Err(self.invalid(format!("element {} must be a string", i)));
                    };
                    s.parse::<Key>()
                        .map_err(|e| self.invalid(format!("element {}: {}", i, e)))?;
                }
                Ok(value)
            }
            ParamType::Any => Ok(value),
        }
    }

    fn check_bounds(&self, value: f64) -> Result<(), ToolError> {
        if let Some(minimum) = self.minimum.filter(|&minimum| value < minimum) {
            return Err(self.invalid(format!("must be >= {}", minimum)));
        }
        if let Some(maximum) = self.maximum.filter(|&maximum| value > maximum) {
            return Err(self.invalid(format!("must be <= {}", maximum)));
        }
        Ok(())
    }
}

/// Value range implied by a sized integer `format`
fn integer_range(format: &str) -> Option<(f64, f64)> {
    let range = match format {
        "int8" => (i8::MIN as f64, i8::MAX as f64),
        "int16" => (i16::MIN as f64, i16::MAX as f64),
        "int32" => (i32::MIN as f64, i32::MAX as f64),
        "uint8" => (0.0, u8::MAX as f64),
        "uint16" => (0.0, u16::MAX as f64),
        "uint32" => (0.0, u32::MAX as f64),
        _ => return None,
    };
    Some(range)
}

/// Accept JSON integers and integral floats such as `3.0`
fn as_integer(value: &Value) -> Option<i64> {
    let Value::Number(n) = value else {
        return None;
    };
    if let Some(i) = n.as_i64() {
        return Some(i);
    }
    let f = n.as_f64()?;
    if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

/// Input schema of one tool plus the checks read from it
#[derive(Debug, Clone)]
pub struct ParamSchema {
    json: Arc<JsonObject>,
    params: Vec<Param>,
    closed: bool,
}

impl ParamSchema {
    /// Schema generated from a request type
    pub fn of<T: JsonSchema + 'static>() -> Self {
        Self::from_json(schema_for_type::<T>())
    }

    pub fn from_json(json: Arc<JsonObject>) -> Self {
        let required: Vec<&str> = json
            .get("required")
            .and_then(Value::as_array)
            .map(|names| names.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default();
        let params: Vec<Param> = json
            .get("properties")
            .and_then(Value::as_object)
            .map(|properties| {
                properties
                    .iter()
                    .map(|(name, property)| {
                        Param::from_property(name, property, required.contains(&name.as_str()))
                    })
                    .collect()
            })
            .unwrap_or_default();
        let closed = json.get("additionalProperties") == Some(&Value::Bool(false));
        Self {
            json,
            params,
            closed,
        }
    }

    /// The JSON Schema advertised to clients
    pub fn json_schema(&self) -> Arc<JsonObject> {
        self.json.clone()
    }

    /// Validate arguments, returning them with defaults filled in
    ///
    /// `null` for an optional parameter selects its default.
    pub fn validate(&self, mut arguments: Arguments) -> Result<Arguments, ToolError> {
        let mut validated = Arguments::new();
        for param in &self.params {
            let value = match arguments.remove(param.name.as_str()) {
                Some(Value::Null) | None => match (&param.default, param.required) {
                    (Some(default), _) => default.clone(),
                    (None, true) => return Err(param.invalid("is required")),
                    (None, false) => continue,
                },
                Some(value) => value,
            };
            validated.insert(param.name.clone(), param.check(value)?);
        }

        if let Some(unexpected) = arguments.keys().next().filter(|_| self.closed) {
            return Err(ToolError::invalid_argument(
                unexpected.as_str(),
                "is not a parameter of this tool",
            ));
        }
        validated.extend(arguments);
        Ok(validated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use desktop_mcp_protocol::ErrorKind;
    use serde_json::json;

    fn args(value: Value) -> Arguments {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    fn from_value(value: Value) -> ParamSchema {
        ParamSchema::from_json(Arc::new(args(value)))
    }

    fn click_schema() -> ParamSchema {
        from_value(json!({
            "type": "object",
            "properties": {
                "x": {"type": "integer", "format": "int32"},
                "y": {"type": "integer", "format": "int32"},
                "button": {
                    "type": "string",
                    "enum": ["left", "right", "middle"],
                    "default": "left"
                },
                "clicks": {"type": "integer", "format": "uint32", "minimum": 1, "default": 1}
            },
            "required": ["x", "y"],
            "additionalProperties": false
        }))
    }

    fn invalid_param(result: Result<Arguments, ToolError>) -> String {
        match result {
            Err(ToolError::InvalidArgument { param, .. }) => param,
            other => panic!("expected InvalidArgument, got {:?}", other),
        }
    }

    #[test]
    fn test_defaults_are_filled() {
        let validated = click_schema().validate(args(json!({"x": 5, "y": 6}))).unwrap();
        assert_eq!(validated["button"], "left");
        assert_eq!(validated["clicks"], 1);
    }

    #[test]
    fn test_null_selects_default() {
        let validated = click_schema()
            .validate(args(json!({"x": 5, "y": 6, "clicks": null})))
            .unwrap();
        assert_eq!(validated["clicks"], 1);
    }

    #[test]
    fn test_missing_required() {
        let err = click_schema().validate(args(json!({"x": 5}))).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert_eq!(err.to_string(), "Invalid argument 'y': is required");
    }

    #[test]
    fn test_integral_float_is_coerced() {
        let validated = click_schema()
            .validate(args(json!({"x": 5.0, "y": -3})))
            .unwrap();
        assert_eq!(validated["x"], json!(5));
        assert!(validated["x"].is_i64());
    }

    #[test]
    fn test_type_mismatches() {
        let schema = click_schema();
        assert_eq!(invalid_param(schema.validate(args(json!({"x": 1.5, "y": 0})))), "x");
        assert_eq!(invalid_param(schema.validate(args(json!({"x": "1", "y": 0})))), "x");
        assert_eq!(invalid_param(schema.validate(args(json!({"x": true, "y": 0})))), "x");
        assert_eq!(
            invalid_param(schema.validate(args(json!({"x": 1, "y": 0, "button": 2})))),
            "button"
        );
    }

    #[test]
    fn test_minimum_rejects_zero_and_negative_clicks() {
        let schema = click_schema();
        for clicks in [0, -1] {
            let err = schema
                .validate(args(json!({"x": 1, "y": 1, "clicks": clicks})))
                .unwrap_err();
            assert_eq!(err.to_string(), "Invalid argument 'clicks': must be >= 1");
        }
    }

    #[test]
    fn test_enum_rejects_unknown_value() {
        let err = click_schema()
            .validate(args(json!({"x": 1, "y": 1, "button": "back"})))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid argument 'button': must be one of: left, right, middle"
        );
    }

    #[test]
    fn test_unknown_parameter_rejected() {
        let err = click_schema()
            .validate(args(json!({"x": 1, "y": 1, "speed": 3})))
            .unwrap_err();
        assert_eq!(invalid_param(Err(err)), "speed");
    }

    #[test]
    fn test_number_bounds() {
        let schema = from_value(json!({
            "type": "object",
            "properties": {
                "confidence": {"type": "number", "minimum": 0.0, "maximum": 1.0, "default": 0.9}
            }
        }));
        assert!(schema.validate(args(json!({"confidence": 0}))).is_ok());
        assert!(schema.validate(args(json!({"confidence": 1}))).is_ok());
        let err = schema.validate(args(json!({"confidence": 1.01}))).unwrap_err();
        assert_eq!(err.to_string(), "Invalid argument 'confidence': must be <= 1");
        let err = schema.validate(args(json!({"confidence": -0.1}))).unwrap_err();
        assert_eq!(err.to_string(), "Invalid argument 'confidence': must be >= 0");
    }

    #[test]
    fn test_key_name_and_list() {
        let schema = from_value(json!({
            "type": "object",
            "properties": {
                "keys": {
                    "type": "array",
                    "items": {"type": "string", "format": "key-name"},
                    "minItems": 1
                }
            },
            "required": ["keys"]
        }));
        assert!(schema.validate(args(json!({"keys": ["ctrl", "c"]}))).is_ok());

        let err = schema.validate(args(json!({"keys": []}))).unwrap_err();
        assert!(err.to_string().contains("at least one key"));

        let err = schema
            .validate(args(json!({"keys": ["ctrl", "hyper"]})))
            .unwrap_err();
        assert!(err.to_string().contains("element 1"));

        let single = from_value(json!({
            "type": "object",
            "properties": {"key": {"type": "string", "format": "key-name"}},
            "required": ["key"]
        }));
        assert!(single.validate(args(json!({"key": "F5"}))).is_ok());
        assert_eq!(invalid_param(single.validate(args(json!({"key": "enterr"})))), "key");
    }

    #[test]
    fn test_integer_format_bounds_name_the_parameter() {
        let schema = click_schema();
        let err = schema
            .validate(args(json!({"x": 5_000_000_000i64, "y": 0})))
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid argument 'x': must be <= 2147483647");

        let err = schema
            .validate(args(json!({"x": 0, "y": -5_000_000_000i64})))
            .unwrap_err();
        assert_eq!(invalid_param(Err(err)), "y");

        let err = schema
            .validate(args(json!({"x": 0, "y": 0, "clicks": 5_000_000_000i64})))
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid argument 'clicks': must be <= 4294967295");
    }

    #[test]
    fn test_open_schema_passes_extra_arguments() {
        let schema = from_value(json!({
            "type": "object",
            "properties": {"name": {"type": "string"}, "tag": {"type": "string"}},
            "required": ["name"]
        }));
        let validated = schema
            .validate(args(json!({"name": "a", "extra": 1})))
            .unwrap();
        assert_eq!(validated, args(json!({"name": "a", "extra": 1})));
    }

    #[test]
    fn test_reads_generated_schema() {
        #[derive(rmcp::schemars::JsonSchema)]
        #[serde(deny_unknown_fields)]
        #[allow(dead_code)]
        struct Request {
            #[schemars(range(min = 2))]
            count: u8,
            #[serde(default)]
            keys: Vec<Key>,
        }

        let schema = ParamSchema::of::<Request>();
        assert_eq!(schema.json_schema()["additionalProperties"], json!(false));
        let err = schema.validate(args(json!({"count": 1}))).unwrap_err();
        assert_eq!(err.to_string(), "Invalid argument 'count': must be >= 2");
        let err = schema.validate(args(json!({"count": 300}))).unwrap_err();
        assert_eq!(err.to_string(), "Invalid argument 'count': must be <= 255");
        let err = schema
            .validate(args(json!({"count": 3, "keys": ["nope"]})))
            .unwrap_err();
        assert_eq!(invalid_param(Err(err)), "keys");
        assert!(schema.validate(args(json!({"count": 3}))).is_ok());
    }
}
