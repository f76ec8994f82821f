use std::cmp::Ordering;

use serde_json::Value as JsonValue;

use crate::error::TransformError;

/// The key/value data threaded through a run.
pub type Record = serde_json::Map<String, JsonValue>;

pub fn value_kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "sequence",
        JsonValue::Object(_) => "record",
    }
}

/// Resolve a field reference against a record.
///
/// Accepts a plain key, a dotted path (`debtor.account`) or a JSON pointer (`/debtor/account`).
/// An exact key match wins over dotted-path interpretation.
pub fn lookup<'a>(record: &'a Record, field: &str) -> Option<&'a JsonValue> {
    if let Some(pointer) = field.strip_prefix('/') {
        let segments: Vec<String> = pointer
            .split('/')
            .map(|s| s.replace("~1", "/").replace("~0", "~"))
            .collect();
        return walk(record, segments.iter().map(String::as_str));
    }
    if let Some(v) = record.get(field) {
        return Some(v);
    }
    if field.contains('.') {
        return walk(record, field.split('.'));
    }
    None
}

fn walk<'a, 'b>(record: &'a Record, mut segments: impl Iterator<Item = &'b str>) -> Option<&'a JsonValue> {
    let first = segments.next()?;
    let mut current = record.get(first)?;
    for seg in segments {
        current = match current {
            JsonValue::Object(map) => map.get(seg)?,
            JsonValue::Array(items) => items.get(seg.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Write `value` at `path`, creating intermediate records for every segment but the last.
pub fn insert_path(record: &mut Record, path: &[String], value: JsonValue) -> Result<(), TransformError> {
    let Some((leaf, parents)) = path.split_last() else {
        return Err(TransformError::EmptyPath);
    };
    let mut current = record;
    for key in parents {
        let slot = current
            .entry(key.clone())
            .or_insert_with(|| JsonValue::Object(Record::new()));
        // A present-but-null segment is treated like an absent one.
        if slot.is_null() {
            *slot = JsonValue::Object(Record::new());
        }
        current = match slot {
            JsonValue::Object(map) => map,
            _ => return Err(TransformError::NotARecord(key.clone())),
        };
    }
    current.insert(leaf.clone(), value);
    Ok(())
}

/// Equality used for branch matching: numbers compare by value, so `1` matches `1.0`.
pub fn values_match(a: &JsonValue, b: &JsonValue) -> bool {
    match (a, b) {
        (JsonValue::Null, JsonValue::Null) => true,
        (JsonValue::Bool(a), JsonValue::Bool(b)) => a == b,
        (JsonValue::Number(a), JsonValue::Number(b)) => a.as_f64() == b.as_f64(),
        (JsonValue::String(a), JsonValue::String(b)) => a == b,
        (JsonValue::Array(a), JsonValue::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| values_match(x, y))
        }
        (JsonValue::Object(a), JsonValue::Object(b)) => {
            a.len() == b.len()
                && a
                    .iter()
                    .all(|(k, v)| b.get(k).map(|bv| values_match(v, bv)).unwrap_or(false))
        }
        _ => false,
    }
}

pub fn compare_values(a: &JsonValue, b: &JsonValue) -> Option<Ordering> {
    match (a, b) {
        (JsonValue::Number(a), JsonValue::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (JsonValue::String(a), JsonValue::String(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

pub fn is_truthy(value: &JsonValue) -> bool {
    match value {
        JsonValue::Null => false,
        JsonValue::Bool(b) => *b,
        JsonValue::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        JsonValue::String(s) => !s.is_empty(),
        JsonValue::Array(_) | JsonValue::Object(_) => true,
    }
}
