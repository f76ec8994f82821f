use thiserror::Error;

use crate::types::Record;

/// Error type produced by user code (actions, transforms, handlers).
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum PayflowError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Definition(#[from] DefinitionError),
}

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("failed to parse as JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to parse as YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("unable to auto-detect document format (neither valid JSON nor valid YAML)")]
    UnknownFormat,
}

#[derive(Debug, Error)]
#[error("workflow definition failed validation ({violations_len} violations)")]
pub struct DefinitionError {
    pub violations: Vec<Violation>,
    violations_len: usize,
}

impl DefinitionError {
    pub fn new(violations: Vec<Violation>) -> Self {
        let violations_len = violations.len();
        Self {
            violations,
            violations_len,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub path: String,
    pub message: String,
}

impl Violation {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("workflow not found: {name}")]
    NotFound { name: String },
}

/// Failure raised while applying a single field mapping.
#[derive(Debug, Error)]
pub enum TransformError {
    #[error("unknown transform '{0}'")]
    Unknown(String),
    #[error("transform '{name}' expects {expected}, got {found}")]
    Type {
        name: &'static str,
        expected: &'static str,
        found: &'static str,
    },
    #[error("transform '{name}' cannot parse {input:?}")]
    Parse { name: &'static str, input: String },
    #[error("target path is empty")]
    EmptyPath,
    #[error("path segment '{0}' holds a non-record value")]
    NotARecord(String),
    #[error(transparent)]
    Custom(BoxError),
}

/// Failure raised inside a run and seen by the error boundary.
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("mapping failed for field '{field}': {source}")]
    Mapping {
        field: String,
        #[source]
        source: TransformError,
    },
    #[error("validation failed: {message}")]
    Validation { message: String, record: Record },
    #[error("check '{message}' raised: {source}")]
    Check {
        message: String,
        #[source]
        source: BoxError,
    },
    #[error("step '{step}' failed: {source}")]
    Step {
        step: String,
        #[source]
        source: BoxError,
    },
    #[error("branch step '{step}' on '{attribute}' failed: {source}")]
    Branch {
        attribute: String,
        step: String,
        #[source]
        source: BoxError,
    },
    #[error("error handler failed: {source}")]
    Handler {
        #[source]
        source: BoxError,
    },
}

impl WorkflowError {
    /// Short machine-friendly name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            WorkflowError::Mapping { .. } => "mapping",
            WorkflowError::Validation { .. } => "validation",
            WorkflowError::Check { .. } => "check",
            WorkflowError::Step { .. } => "step",
            WorkflowError::Branch { .. } => "branch",
            WorkflowError::Handler { .. } => "handler",
        }
    }

    pub fn handler(source: impl Into<BoxError>) -> Self {
        WorkflowError::Handler {
            source: source.into(),
        }
    }
}

/// Outcome of `Registry::run` when no final record can be produced.
#[derive(Debug, Error)]
pub enum RunError {
    /// The caller's record is handed back untouched.
    #[error("{source}")]
    Registry {
        #[source]
        source: RegistryError,
        data: Record,
    },
    #[error(transparent)]
    Workflow(#[from] WorkflowError),
}

impl RunError {
    pub fn into_data(self) -> Option<Record> {
        match self {
            RunError::Registry { data, .. } => Some(data),
            RunError::Workflow(_) => None,
        }
    }
}

/// Panic payload captured from user code.
#[derive(Debug, Error)]
#[error("panicked: {0}")]
pub struct PanicError(pub String);

impl PanicError {
    pub fn from_payload(payload: Box<dyn std::any::Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_string()
        };
        PanicError(message)
    }
}
