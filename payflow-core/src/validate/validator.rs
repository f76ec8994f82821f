use crate::document::{Extensions, WorkflowDocument};
use crate::error::{DefinitionError, Violation};
use crate::types::WorkflowDefinition;

use super::rules;

pub struct Validator {
    violations: Vec<Violation>,
}

impl Validator {
    pub fn new() -> Self {
        Self {
            violations: Vec::new(),
        }
    }

    pub fn finish(self) -> Result<(), DefinitionError> {
        if self.violations.is_empty() {
            Ok(())
        } else {
            Err(DefinitionError::new(self.violations))
        }
    }

    pub fn validate_definition(&mut self, def: &WorkflowDefinition) {
        rules::definition::validate_definition(self, def);
    }

    pub fn validate_document(&mut self, doc: &WorkflowDocument) {
        rules::document::validate_document(self, doc);
    }

    pub(crate) fn push(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.violations.push(Violation::new(path, message));
    }

    pub(crate) fn require_non_empty(&mut self, path: impl Into<String>, value: &str) {
        if value.trim().is_empty() {
            self.push(path, "must not be empty");
        }
    }

    pub(crate) fn validate_target(&mut self, path: &str, segments: &[String]) {
        if segments.is_empty() {
            self.push(path, "must have at least one key");
        }
        for (idx, seg) in segments.iter().enumerate() {
            if seg.trim().is_empty() {
                self.push(format!("{path}[{idx}]"), "must not be empty");
            }
        }
    }

    pub(crate) fn validate_extensions(&mut self, path: &str, ext: &Extensions) {
        for key in ext.keys() {
            if !key.starts_with("x-") {
                self.push(
                    format!("{path}.{key}"),
                    "unknown field (only x-* extensions are allowed)",
                );
            }
        }
    }
}
