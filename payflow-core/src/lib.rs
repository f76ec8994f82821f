#![forbid(unsafe_code)]

//! Workflow definition model for payflow: records, field mappings, checks, actions,
//! value-keyed branches and error handlers, assembled through [`WorkflowBuilder`].
//!
//! Execution lives in `payflow-exec`.

pub mod builder;
pub mod context;
pub mod document;
pub mod error;
pub mod parser;
pub mod transforms;
pub mod types;
pub mod validate;

pub use crate::builder::{BranchBuilder, RuleBuilder, WorkflowBuilder};
pub use crate::context::{MissingService, Services, StepContext};
pub use crate::document::{compile_document, WorkflowDocument};
pub use crate::error::{
    BoxError, DefinitionError, PanicError, ParseError, PayflowError, RegistryError, RunError,
    TransformError, Violation, WorkflowError,
};
pub use crate::parser::{parse_document_str, DocumentFormat, ParsedDocument};
pub use crate::types::{
    Action, ActionStep, BranchNothing, BranchRule, Check, ErrorHandler, FieldMapping, Format,
    Record, Step, Target, Transform, WorkflowDefinition,
};
pub use crate::validate::{validate_definition, validate_workflow_document, Validate};
