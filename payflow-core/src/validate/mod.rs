mod rules;
mod validator;

use crate::document::WorkflowDocument;
use crate::error::DefinitionError;
use crate::types::WorkflowDefinition;
use validator::Validator;

pub trait Validate {
    fn validate(&self) -> Result<(), DefinitionError>;
}

impl Validate for WorkflowDefinition {
    fn validate(&self) -> Result<(), DefinitionError> {
        validate_definition(self)
    }
}

impl Validate for WorkflowDocument {
    fn validate(&self) -> Result<(), DefinitionError> {
        validate_workflow_document(self)
    }
}

/// Lint a built definition. Registration never calls this; it is opt-in.
pub fn validate_definition(def: &WorkflowDefinition) -> Result<(), DefinitionError> {
    let mut v = Validator::new();
    v.validate_definition(def);
    v.finish()
}

pub fn validate_workflow_document(doc: &WorkflowDocument) -> Result<(), DefinitionError> {
    let mut v = Validator::new();
    v.validate_document(doc);
    v.finish()
}
