use async_trait::async_trait;
use serde_json::{Number, Value as JsonValue};

use crate::context::StepContext;
use crate::document::{AppendSpec, CopySpec, DocErrorHandler, DocStep, IncrementSpec, RoundSpec};
use crate::error::{BoxError, TransformError, WorkflowError};
use crate::transforms::round_to;
use crate::types::{insert_path, lookup, value_kind, Action, ErrorHandler, Record};

#[derive(Debug, thiserror::Error)]
pub enum OpError {
    #[error("field '{field}' holds {found}, expected {expected}")]
    Type {
        field: String,
        expected: &'static str,
        found: &'static str,
    },
    #[error("field '{0}' is missing")]
    Missing(String),
    #[error("result for field '{0}' is not a finite number")]
    NotFinite(String),
    #[error(transparent)]
    Path(#[from] TransformError),
}

/// The built-in operations a document step can carry.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    Set(Record),
    Remove(Vec<String>),
    Copy(CopySpec),
    Increment(IncrementSpec),
    Append(AppendSpec),
    Round(RoundSpec),
}

impl Operation {
    /// The single operation on `step`, if it has exactly one.
    pub fn from_step(step: &DocStep) -> Option<Self> {
        if step.operation_count() != 1 {
            return None;
        }
        if let Some(v) = &step.set {
            return Some(Operation::Set(v.clone()));
        }
        if let Some(v) = &step.remove {
            return Some(Operation::Remove(v.clone()));
        }
        if let Some(v) = &step.copy {
            return Some(Operation::Copy(v.clone()));
        }
        if let Some(v) = &step.increment {
            return Some(Operation::Increment(v.clone()));
        }
        if let Some(v) = &step.append {
            return Some(Operation::Append(v.clone()));
        }
        step.round.clone().map(Operation::Round)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Operation::Set(_) => "set",
            Operation::Remove(_) => "remove",
            Operation::Copy(_) => "copy",
            Operation::Increment(_) => "increment",
            Operation::Append(_) => "append",
            Operation::Round(_) => "round",
        }
    }

    pub fn apply(&self, mut record: Record) -> Result<Record, OpError> {
        match self {
            Operation::Set(fields) => {
                for (k, v) in fields {
                    record.insert(k.clone(), v.clone());
                }
            }
            Operation::Remove(keys) => {
                for k in keys {
                    record.remove(k);
                }
            }
            Operation::Copy(spec) => {
                let value = lookup(&record, &spec.from).cloned().unwrap_or(JsonValue::Null);
                insert_path(&mut record, &spec.to.segments(), value)?;
            }
            Operation::Increment(spec) => {
                let next = match record.get(&spec.field) {
                    None | Some(JsonValue::Null) => number_from(&spec.field, spec.by)?,
                    Some(JsonValue::Number(n)) => add(&spec.field, n, spec.by)?,
                    Some(other) => {
                        return Err(OpError::Type {
                            field: spec.field.clone(),
                            expected: "a number",
                            found: value_kind(other),
                        })
                    }
                };
                record.insert(spec.field.clone(), next);
            }
            Operation::Append(spec) => match record.get_mut(&spec.field) {
                Some(JsonValue::Array(items)) => items.push(spec.value.clone()),
                None | Some(JsonValue::Null) => {
                    record.insert(spec.field.clone(), JsonValue::Array(vec![spec.value.clone()]));
                }
                Some(other) => {
                    return Err(OpError::Type {
                        field: spec.field.clone(),
                        expected: "a sequence",
                        found: value_kind(other),
                    })
                }
            },
            Operation::Round(spec) => {
                let rounded = match record.get(&spec.field) {
                    None | Some(JsonValue::Null) => return Err(OpError::Missing(spec.field.clone())),
                    Some(JsonValue::Number(n)) if n.is_f64() => {
                        let f = round_to(n.as_f64().unwrap_or(0.0), spec.places);
                        number_from(&spec.field, f)?
                    }
                    Some(JsonValue::Number(n)) => JsonValue::Number(n.clone()),
                    Some(other) => {
                        return Err(OpError::Type {
                            field: spec.field.clone(),
                            expected: "a number",
                            found: value_kind(other),
                        })
                    }
                };
                record.insert(spec.field.clone(), rounded);
            }
        }
        Ok(record)
    }
}

fn number_from(field: &str, f: f64) -> Result<JsonValue, OpError> {
    if f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
        return Ok(JsonValue::from(f as i64));
    }
    Number::from_f64(f)
        .map(JsonValue::Number)
        .ok_or_else(|| OpError::NotFinite(field.to_string()))
}

fn add(field: &str, n: &Number, by: f64) -> Result<JsonValue, OpError> {
    if let Some(i) = n.as_i64() {
        if by.fract() == 0.0 && by.abs() < i64::MAX as f64 {
            if let Some(sum) = i.checked_add(by as i64) {
                return Ok(JsonValue::from(sum));
            }
        }
    }
    let sum = n.as_f64().unwrap_or(0.0) + by;
    Number::from_f64(sum)
        .map(JsonValue::Number)
        .ok_or_else(|| OpError::NotFinite(field.to_string()))
}

/// An [`Action`] that applies one [`Operation`].
#[derive(Debug, Clone)]
pub struct OpAction {
    op: Operation,
}

impl OpAction {
    pub fn new(op: Operation) -> Self {
        Self { op }
    }

    pub fn operation(&self) -> &Operation {
        &self.op
    }
}

#[async_trait]
impl Action for OpAction {
    async fn call(&self, record: Record, _ctx: &StepContext) -> Result<Option<Record>, BoxError> {
        Ok(Some(self.op.apply(record)?))
    }
}

/// Error handler compiled from a document's `on_error` block.
#[derive(Debug, Clone)]
pub struct DocumentErrorHandler {
    spec: DocErrorHandler,
}

impl DocumentErrorHandler {
    pub fn new(spec: DocErrorHandler) -> Self {
        Self { spec }
    }
}

#[async_trait]
impl ErrorHandler for DocumentErrorHandler {
    async fn handle(
        &self,
        error: WorkflowError,
        mut record: Record,
        _ctx: &StepContext,
    ) -> Result<Record, WorkflowError> {
        if self.spec.propagate {
            return Err(error);
        }
        if let Some(fields) = &self.spec.set {
            for (k, v) in fields {
                record.insert(k.clone(), v.clone());
            }
        }
        if let Some(key) = &self.spec.error_field {
            record.insert(key.clone(), JsonValue::String(error.to_string()));
        }
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::DocTarget;
    use serde_json::json;

    fn record(v: JsonValue) -> Record {
        v.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn increment_missing_starts_at_zero() {
        let op = Operation::Increment(IncrementSpec {
            field: "counter".into(),
            by: 1.0,
        });
        let out = op.apply(Record::new()).unwrap();
        assert_eq!(out.get("counter"), Some(&json!(1)));
        let out = op.apply(out).unwrap();
        assert_eq!(out.get("counter"), Some(&json!(2)));
    }

    #[test]
    fn huge_increment_falls_back_to_float() {
        let op = Operation::Increment(IncrementSpec {
            field: "counter".into(),
            by: 1e30,
        });
        let out = op.apply(record(json!({"counter": -1}))).unwrap();
        assert_eq!(out.get("counter"), Some(&json!(1e30)));
    }

    #[test]
    fn increment_rejects_strings() {
        let op = Operation::Increment(IncrementSpec {
            field: "counter".into(),
            by: 1.0,
        });
        let err = op.apply(record(json!({"counter": "x"}))).unwrap_err();
        assert!(matches!(err, OpError::Type { .. }));
    }

    #[test]
    fn append_creates_list() {
        let op = Operation::Append(AppendSpec {
            field: "log".into(),
            value: json!("a"),
        });
        let out = op.apply(Record::new()).unwrap();
        assert_eq!(out.get("log"), Some(&json!(["a"])));
    }

    #[test]
    fn round_two_places() {
        let op = Operation::Round(RoundSpec {
            field: "amount".into(),
            places: 2,
        });
        let out = op.apply(record(json!({"amount": 10.456}))).unwrap();
        assert_eq!(out.get("amount"), Some(&json!(10.46)));
    }

    #[test]
    fn copy_into_nested_path() {
        let op = Operation::Copy(CopySpec {
            from: "iban".into(),
            to: DocTarget::Path(vec!["creditor".into(), "iban".into()]),
        });
        let out = op.apply(record(json!({"iban": "EE12"}))).unwrap();
        assert_eq!(out.get("creditor"), Some(&json!({"iban": "EE12"})));
    }
}
