//! Built-in named transforms for field mappings.

use serde_json::{Number, Value as JsonValue};

use crate::error::TransformError;
use crate::types::{value_kind, Transform};

type Builtin = fn(JsonValue) -> Result<JsonValue, TransformError>;

static TABLE: &[(&str, Builtin)] = &[
    ("upcase", upcase),
    ("uppercase", upcase),
    ("downcase", downcase),
    ("lowercase", downcase),
    ("capitalize", capitalize),
    ("strip", strip),
    ("trim", strip),
    ("to_s", to_string),
    ("string", to_string),
    ("to_i", to_integer),
    ("integer", to_integer),
    ("to_f", to_float),
    ("float", to_float),
    ("number", to_number),
    ("abs", abs),
    ("round", round),
    ("boolean", to_boolean),
];

/// Names accepted by [`apply_named`].
pub fn builtin_names() -> impl Iterator<Item = &'static str> {
    TABLE.iter().map(|(name, _)| *name)
}

pub fn is_builtin(name: &str) -> bool {
    lookup(name).is_some()
}

fn lookup(name: &str) -> Option<Builtin> {
    TABLE
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, f)| *f)
}

pub fn apply_named(name: &str, value: JsonValue) -> Result<JsonValue, TransformError> {
    let f = lookup(name).ok_or_else(|| TransformError::Unknown(name.to_string()))?;
    f(value)
}

pub fn apply(transform: &Transform, value: JsonValue) -> Result<JsonValue, TransformError> {
    match transform {
        Transform::Named(name) => apply_named(name, value),
        Transform::Function(f) => f(value).map_err(TransformError::Custom),
    }
}

fn expect_string(name: &'static str, value: JsonValue) -> Result<String, TransformError> {
    match value {
        JsonValue::String(s) => Ok(s),
        other => Err(TransformError::Type {
            name,
            expected: "a string",
            found: value_kind(&other),
        }),
    }
}

fn upcase(value: JsonValue) -> Result<JsonValue, TransformError> {
    Ok(JsonValue::String(expect_string("upcase", value)?.to_uppercase()))
}

fn downcase(value: JsonValue) -> Result<JsonValue, TransformError> {
    Ok(JsonValue::String(expect_string("downcase", value)?.to_lowercase()))
}

fn capitalize(value: JsonValue) -> Result<JsonValue, TransformError> {
    let s = expect_string("capitalize", value)?;
    let mut chars = s.chars();
    let out = match chars.next() {
        Some(first) => {
            let rest = chars.as_str().to_lowercase();
            first.to_uppercase().chain(rest.chars()).collect()
        }
        None => String::new(),
    };
    Ok(JsonValue::String(out))
}

fn strip(value: JsonValue) -> Result<JsonValue, TransformError> {
    Ok(JsonValue::String(expect_string("strip", value)?.trim().to_string()))
}

fn to_string(value: JsonValue) -> Result<JsonValue, TransformError> {
    Ok(JsonValue::String(match value {
        JsonValue::Null => String::new(),
        JsonValue::String(s) => s,
        other => other.to_string(),
    }))
}

fn to_integer(value: JsonValue) -> Result<JsonValue, TransformError> {
    match value {
        JsonValue::Null => Ok(JsonValue::from(0)),
        JsonValue::Bool(b) => Ok(JsonValue::from(i64::from(b))),
        JsonValue::Number(n) => {
            if n.is_i64() || n.is_u64() {
                return Ok(JsonValue::Number(n));
            }
            truncate(n.as_f64().unwrap_or(0.0), || n.to_string())
        }
        JsonValue::String(s) => {
            let t = s.trim();
            if let Ok(i) = t.parse::<i64>() {
                return Ok(JsonValue::from(i));
            }
            if let Ok(u) = t.parse::<u64>() {
                return Ok(JsonValue::from(u));
            }
            match t.parse::<f64>() {
                Ok(f) => truncate(f, || s.clone()),
                Err(_) => Err(TransformError::Parse {
                    name: "to_i",
                    input: s,
                }),
            }
        }
        other => Err(TransformError::Type {
            name: "to_i",
            expected: "a string or number",
            found: value_kind(&other),
        }),
    }
}

// Integral part of `f`, refused when it does not fit an i64 or u64.
fn truncate(f: f64, input: impl FnOnce() -> String) -> Result<JsonValue, TransformError> {
    let t = f.trunc();
    if t >= i64::MIN as f64 && t < i64::MAX as f64 {
        return Ok(JsonValue::from(t as i64));
    }
    if t >= 0.0 && t < u64::MAX as f64 {
        return Ok(JsonValue::from(t as u64));
    }
    Err(TransformError::Parse {
        name: "to_i",
        input: input(),
    })
}

fn round(value: JsonValue) -> Result<JsonValue, TransformError> {
    let n = expect_number("round", value)?;
    if n.is_i64() || n.is_u64() {
        return Ok(JsonValue::Number(n));
    }
    float_value("round", round_to(n.as_f64().unwrap_or(0.0), 2))
}

/// Round half away from zero to `places` decimal places.
pub fn round_to(value: f64, places: u32) -> f64 {
    let factor = 10f64.powi(i32::try_from(places).unwrap_or(i32::MAX));
    let scaled = value * factor;
    if !scaled.is_finite() {
        // Already finer than `places` can express.
        return value;
    }
    scaled.round() / factor
}

fn to_boolean(value: JsonValue) -> Result<JsonValue, TransformError> {
    match value {
        JsonValue::Bool(b) => Ok(JsonValue::Bool(b)),
        JsonValue::Number(n) => Ok(JsonValue::Bool(n.as_f64().map(|f| f != 0.0).unwrap_or(true))),
        JsonValue::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "1" => Ok(JsonValue::Bool(true)),
            "false" | "no" | "0" => Ok(JsonValue::Bool(false)),
            _ => Err(TransformError::Parse {
                name: "boolean",
                input: s,
            }),
        },
        other => Err(TransformError::Type {
            name: "boolean",
            expected: "a string, number or boolean",
            found: value_kind(&other),
        }),
    }
}
