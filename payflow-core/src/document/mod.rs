//! Declarative workflow documents (YAML or JSON) built from a fixed set of operations.

mod compile;
mod condition;
mod ops;

use std::collections::BTreeMap;

use indexmap::IndexMap;
use serde_json::Value as JsonValue;

use crate::types::{BranchNothing, Format, Record};

pub use compile::{compile_document, compile_workflow};
pub use condition::{CompareOp, Condition, ConditionError};
pub use ops::{DocumentErrorHandler, OpAction, OpError, Operation};

/// Unknown fields captured from the document; only `x-` keys pass validation.
pub type Extensions = BTreeMap<String, JsonValue>;

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct WorkflowDocument {
    pub workflows: Vec<DocWorkflow>,

    #[serde(flatten, default)]
    pub extensions: Extensions,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DocWorkflow {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<Format>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mappings: Vec<DocMapping>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub steps: Vec<DocStep>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub branches: IndexMap<String, Vec<DocRule>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_error: Option<DocErrorHandler>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch_nothing: Option<BranchNothing>,

    #[serde(flatten, default)]
    pub extensions: Extensions,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DocMapping {
    pub from: String,

    pub to: DocTarget,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transform: Option<String>,

    #[serde(flatten, default)]
    pub extensions: Extensions,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum DocTarget {
    Key(String),
    Path(Vec<String>),
}

impl DocTarget {
    pub fn segments(&self) -> Vec<String> {
        match self {
            DocTarget::Key(k) => vec![k.clone()],
            DocTarget::Path(p) => p.clone(),
        }
    }
}

/// A check (`check` + `message`) or a named action carrying exactly one operation.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DocStep {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub set: Option<Record>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remove: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub copy: Option<CopySpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub increment: Option<IncrementSpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub append: Option<AppendSpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub round: Option<RoundSpec>,

    #[serde(flatten, default)]
    pub extensions: Extensions,
}

impl DocStep {
    pub fn operation_count(&self) -> usize {
        [
            self.set.is_some(),
            self.remove.is_some(),
            self.copy.is_some(),
            self.increment.is_some(),
            self.append.is_some(),
            self.round.is_some(),
        ]
        .into_iter()
        .filter(|v| *v)
        .count()
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CopySpec {
    pub from: String,
    pub to: DocTarget,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct IncrementSpec {
    pub field: String,
    #[serde(default = "default_increment")]
    pub by: f64,
}

fn default_increment() -> f64 {
    1.0
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AppendSpec {
    pub field: String,
    pub value: JsonValue,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RoundSpec {
    pub field: String,
    #[serde(default = "default_places")]
    pub places: u32,
}

fn default_places() -> u32 {
    2
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DocRule {
    pub when: JsonValue,

    pub steps: Vec<DocStep>,

    #[serde(flatten, default)]
    pub extensions: Extensions,
}

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DocErrorHandler {
    /// Fields merged into the record at failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub set: Option<Record>,

    /// When present, the error message is written under this key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_field: Option<String>,

    #[serde(default)]
    pub propagate: bool,

    #[serde(flatten, default)]
    pub extensions: Extensions,
}
