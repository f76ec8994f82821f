use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value as JsonValue;

use crate::types::{compare_values, is_truthy, lookup, values_match, Record};

static COMPARISON_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([^\s=!<>]+)\s*(==|!=|<=|>=|<|>)\s*(.+?)\s*$").expect("valid regex")
});

static FIELD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*([^\s=!<>]+)\s*$").expect("valid regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CompareOp {
    fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "==" => CompareOp::Eq,
            "!=" => CompareOp::Ne,
            "<" => CompareOp::Lt,
            "<=" => CompareOp::Le,
            ">" => CompareOp::Gt,
            ">=" => CompareOp::Ge,
            _ => return None,
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CompareOp::Eq => "==",
            CompareOp::Ne => "!=",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
        }
    }
}

/// `<field> <op> <literal>`, or a bare `<field>` tested for truthiness.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub field: String,
    pub comparison: Option<(CompareOp, JsonValue)>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConditionError {
    #[error("condition is empty")]
    Empty,
    #[error("cannot parse condition {0:?} (expected `<field> <op> <literal>` or `<field>`)")]
    Syntax(String),
}

impl Condition {
    pub fn parse(input: &str) -> Result<Self, ConditionError> {
        if input.trim().is_empty() {
            return Err(ConditionError::Empty);
        }
        if let Some(caps) = COMPARISON_RE.captures(input) {
            let op = CompareOp::parse(&caps[2]).ok_or_else(|| ConditionError::Syntax(input.to_string()))?;
            return Ok(Self {
                field: caps[1].to_string(),
                comparison: Some((op, parse_literal(&caps[3]))),
            });
        }
        if let Some(caps) = FIELD_RE.captures(input) {
            return Ok(Self {
                field: caps[1].to_string(),
                comparison: None,
            });
        }
        Err(ConditionError::Syntax(input.to_string()))
    }

    /// A missing field compares as `null`. Ordering between incomparable values is false.
    pub fn evaluate(&self, record: &Record) -> bool {
        let actual = lookup(record, &self.field).unwrap_or(&JsonValue::Null);
        match &self.comparison {
            None => is_truthy(actual),
            Some((op, expected)) => match op {
                CompareOp::Eq => values_match(actual, expected),
                CompareOp::Ne => !values_match(actual, expected),
                CompareOp::Lt => compare_values(actual, expected).is_some_and(|o| o.is_lt()),
                CompareOp::Le => compare_values(actual, expected).is_some_and(|o| o.is_le()),
                CompareOp::Gt => compare_values(actual, expected).is_some_and(|o| o.is_gt()),
                CompareOp::Ge => compare_values(actual, expected).is_some_and(|o| o.is_ge()),
            },
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.comparison {
            None => f.write_str(&self.field),
            Some((op, value)) => write!(f, "{} {} {}", self.field, op.as_str(), value),
        }
    }
}

fn parse_literal(s: &str) -> JsonValue {
    let s = s.trim();

    if let Ok(v) = serde_json::from_str::<JsonValue>(s) {
        return v;
    }

    if s.len() >= 2
        && ((s.starts_with('"') && s.ends_with('"')) || (s.starts_with('\'') && s.ends_with('\'')))
    {
        return JsonValue::String(s[1..s.len() - 1].to_string());
    }

    JsonValue::String(s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(v: JsonValue) -> Record {
        v.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn parses_comparison_without_spaces() {
        let c = Condition::parse("amount>0").unwrap();
        assert_eq!(c.field, "amount");
        assert_eq!(c.comparison, Some((CompareOp::Gt, json!(0))));
    }

    #[test]
    fn two_char_operators_win_over_one_char() {
        let c = Condition::parse("amount <= 10").unwrap();
        assert_eq!(c.comparison, Some((CompareOp::Le, json!(10))));
    }

    #[test]
    fn single_quoted_literal() {
        let c = Condition::parse("status == 'pending'").unwrap();
        assert!(c.evaluate(&record(json!({"status": "pending"}))));
    }

    #[test]
    fn bare_literal_is_a_string() {
        let c = Condition::parse("status != failed").unwrap();
        assert!(c.evaluate(&record(json!({"status": "pending"}))));
    }

    #[test]
    fn missing_field_is_null() {
        let c = Condition::parse("amount > 0").unwrap();
        assert!(!c.evaluate(&record(json!({}))));
        let c = Condition::parse("amount == null").unwrap();
        assert!(c.evaluate(&record(json!({}))));
    }

    #[test]
    fn bare_field_is_truthiness() {
        let c = Condition::parse("approved").unwrap();
        assert!(c.evaluate(&record(json!({"approved": true}))));
        assert!(!c.evaluate(&record(json!({"approved": 0}))));
    }

    #[test]
    fn nested_field() {
        let c = Condition::parse("debtor.account == \"A123\"").unwrap();
        assert!(c.evaluate(&record(json!({"debtor": {"account": "A123"}}))));
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(Condition::parse("  "), Err(ConditionError::Empty));
        assert!(matches!(Condition::parse("a b c"), Err(ConditionError::Syntax(_))));
    }
}
