use serde_json::Value as JsonValue;

use crate::types::ActionStep;

/// What a branch action returning nothing does to the working record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BranchNothing {
    /// The record becomes nothing, unlike linear steps.
    #[default]
    Replace,
    /// Keep the previous record, the same as linear steps.
    Retain,
}

#[derive(Debug, Clone)]
pub struct BranchRule {
    pub attribute: String,
    pub value: JsonValue,
    pub steps: Vec<ActionStep>,
}

impl BranchRule {
    pub fn new(attribute: impl Into<String>, value: impl Into<JsonValue>, steps: Vec<ActionStep>) -> Self {
        Self {
            attribute: attribute.into(),
            value: value.into(),
            steps,
        }
    }
}
