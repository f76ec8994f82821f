use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::context::StepContext;
use crate::error::BoxError;
use crate::types::Record;

pub type Predicate = Arc<dyn Fn(&Record) -> bool + Send + Sync>;

/// A unit of pipeline work that produces the next record.
///
/// Returning `Ok(None)` means "nothing". Linear steps keep the previous record when that
/// happens; branch steps follow the definition's [`crate::types::BranchNothing`] policy.
#[async_trait]
pub trait Action: Send + Sync {
    async fn call(&self, record: Record, ctx: &StepContext) -> Result<Option<Record>, BoxError>;
}

/// Adapts a synchronous closure into an [`Action`].
pub struct FnAction<F>(pub F);

#[async_trait]
impl<F> Action for FnAction<F>
where
    F: Fn(Record, &StepContext) -> Result<Option<Record>, BoxError> + Send + Sync,
{
    async fn call(&self, record: Record, ctx: &StepContext) -> Result<Option<Record>, BoxError> {
        (self.0)(record, ctx)
    }
}

#[derive(Clone)]
pub struct Check {
    pub message: String,
    pub predicate: Predicate,
}

#[derive(Clone)]
pub struct ActionStep {
    pub name: String,
    pub action: Arc<dyn Action>,
}

impl ActionStep {
    pub fn new(name: impl Into<String>, action: impl Action + 'static) -> Self {
        Self {
            name: name.into(),
            action: Arc::new(action),
        }
    }

    pub fn from_fn<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(Record, &StepContext) -> Result<Option<Record>, BoxError> + Send + Sync + 'static,
    {
        Self::new(name, FnAction(f))
    }
}

#[derive(Clone)]
pub enum Step {
    Check(Check),
    Action(ActionStep),
}

impl Step {
    /// Label used in logs and events: the action name or the check message.
    pub fn label(&self) -> &str {
        match self {
            Step::Check(c) => &c.message,
            Step::Action(a) => &a.name,
        }
    }

    pub fn is_check(&self) -> bool {
        matches!(self, Step::Check(_))
    }
}

impl fmt::Debug for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Check").field("message", &self.message).finish_non_exhaustive()
    }
}

impl fmt::Debug for ActionStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionStep").field("name", &self.name).finish_non_exhaustive()
    }
}

impl fmt::Debug for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Check(c) => c.fmt(f),
            Step::Action(a) => a.fmt(f),
        }
    }
}
