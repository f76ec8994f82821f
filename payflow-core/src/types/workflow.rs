use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use indexmap::IndexMap;

use crate::context::StepContext;
use crate::error::WorkflowError;
use crate::types::{BranchNothing, BranchRule, FieldMapping, Format, Record, Step};

/// Receives a failed run's error and the record at the point of failure.
///
/// The returned record becomes the run's result. Returning an error (typically the one
/// received) makes the run fail.
#[async_trait]
pub trait ErrorHandler: Send + Sync {
    async fn handle(
        &self,
        error: WorkflowError,
        record: Record,
        ctx: &StepContext,
    ) -> Result<Record, WorkflowError>;
}

pub struct FnErrorHandler<F>(pub F);

#[async_trait]
impl<F> ErrorHandler for FnErrorHandler<F>
where
    F: Fn(WorkflowError, Record) -> Result<Record, WorkflowError> + Send + Sync,
{
    async fn handle(
        &self,
        error: WorkflowError,
        record: Record,
        _ctx: &StepContext,
    ) -> Result<Record, WorkflowError> {
        (self.0)(error, record)
    }
}

/// Immutable description of a named pipeline. Built with [`crate::WorkflowBuilder`].
#[derive(Clone)]
pub struct WorkflowDefinition {
    pub(crate) name: String,
    pub(crate) format: Format,
    pub(crate) source: Option<String>,
    pub(crate) mappings: Vec<FieldMapping>,
    pub(crate) steps: Vec<Step>,
    pub(crate) branches: IndexMap<String, Vec<BranchRule>>,
    pub(crate) error_handler: Option<Arc<dyn ErrorHandler>>,
    pub(crate) branch_nothing: BranchNothing,
}

impl WorkflowDefinition {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn format(&self) -> Format {
        self.format
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    pub fn mappings(&self) -> &[FieldMapping] {
        &self.mappings
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Branch rules keyed by attribute, in registration order.
    pub fn branches(&self) -> &IndexMap<String, Vec<BranchRule>> {
        &self.branches
    }

    pub fn error_handler(&self) -> Option<&Arc<dyn ErrorHandler>> {
        self.error_handler.as_ref()
    }

    pub fn has_error_handler(&self) -> bool {
        self.error_handler.is_some()
    }

    pub fn branch_nothing(&self) -> BranchNothing {
        self.branch_nothing
    }
}

impl fmt::Debug for WorkflowDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkflowDefinition")
            .field("name", &self.name)
            .field("format", &self.format)
            .field("source", &self.source)
            .field("mappings", &self.mappings)
            .field("steps", &self.steps)
            .field("branches", &self.branches)
            .field("error_handler", &self.error_handler.is_some())
            .field("branch_nothing", &self.branch_nothing)
            .finish()
    }
}
