use payflow_core::{Record, WorkflowError};

/// Error and record-at-failure handed from a phase to the error boundary.
///
/// `record` is `None` when a branch action had already discarded it.
#[derive(Debug)]
pub(crate) struct Failure {
    pub error: WorkflowError,
    pub record: Option<Record>,
}

impl Failure {
    pub fn new(error: WorkflowError, record: Option<Record>) -> Self {
        Self { error, record }
    }
}

/// Source of a branch error raised when a later branch needs a record that an earlier
/// branch action replaced with nothing.
#[derive(Debug, thiserror::Error)]
#[error("record was discarded by branch step '{step}'")]
pub struct RecordDiscarded {
    pub step: String,
}
