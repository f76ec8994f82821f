use std::sync::Arc;

use payflow_core::types::WorkflowDefinition;
use payflow_core::{Record, Services, StepContext, WorkflowError};
use tracing::{debug, error, info, Instrument};
use uuid::Uuid;

use crate::executor::branch::dispatch;
use crate::executor::events::{Event, EventSink, TracingEventSink};
use crate::executor::guard::call_handler;
use crate::executor::mapper::apply_mappings;
use crate::executor::result::Failure;
use crate::executor::steps::run_linear;
use crate::executor::types::{ExecutorConfig, RunStatus};

/// Runs workflow definitions: mapping, linear steps and branches inside one error boundary.
///
/// An `Executor` holds no per-run state; it can run any number of workflows concurrently.
#[derive(Clone)]
pub struct Executor {
    config: ExecutorConfig,
    services: Arc<Services>,
    event_sink: Arc<dyn EventSink>,
}

impl Default for Executor {
    fn default() -> Self {
        Self::new(
            ExecutorConfig::default(),
            Arc::new(Services::new()),
            Arc::new(TracingEventSink),
        )
    }
}

impl Executor {
    pub fn new(config: ExecutorConfig, services: Arc<Services>, event_sink: Arc<dyn EventSink>) -> Self {
        Self {
            config,
            services,
            event_sink,
        }
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    pub fn services(&self) -> &Arc<Services> {
        &self.services
    }

    pub fn event_sink(&self) -> &Arc<dyn EventSink> {
        &self.event_sink
    }

    /// Run `definition` against `data`.
    ///
    /// Returns the final record (also on the handled-error path), `None` when a branch
    /// action discarded the record, or the error when no handler recovered it.
    pub async fn run(
        &self,
        definition: &WorkflowDefinition,
        data: Record,
    ) -> Result<Option<Record>, WorkflowError> {
        let ctx = StepContext::new(definition.name(), definition.format(), self.services.clone());
        let span = tracing::debug_span!(
            "workflow",
            run_id = %ctx.run_id(),
            workflow = %definition.name()
        );
        self.run_in_context(definition, data, &ctx).instrument(span).await
    }

    async fn run_in_context(
        &self,
        definition: &WorkflowDefinition,
        data: Record,
        ctx: &StepContext,
    ) -> Result<Option<Record>, WorkflowError> {
        let scope = RunScope {
            ctx,
            sink: self.event_sink.as_ref(),
            config: &self.config,
        };
        scope
            .emit(Event::RunStarted {
                run_id: ctx.run_id(),
                workflow: definition.name().to_string(),
            })
            .await;

        match execute(&scope, definition, data).await {
            Ok(record) => {
                debug!("workflow succeeded");
                scope.finish(RunStatus::Succeeded).await;
                Ok(record)
            }
            Err(failure) => recover(&scope, definition, failure).await,
        }
    }
}

/// MAPPING, LINEAR_STEPS, BRANCHING. Any failure leaves with the record at that point.
async fn execute(
    scope: &RunScope<'_>,
    definition: &WorkflowDefinition,
    mut record: Record,
) -> Result<Option<Record>, Failure> {
    debug!(count = definition.mappings().len(), "applying field mappings");
    if let Err(error) = apply_mappings(definition.mappings(), &mut record, scope.config.catch_panics) {
        return Err(Failure::new(error, Some(record)));
    }
    scope
        .emit(Event::MappingsApplied {
            run_id: scope.run_id(),
            count: definition.mappings().len(),
        })
        .await;
    scope.trace_keys("mapping", Some(&record));

    debug!(count = definition.steps().len(), "running linear steps");
    let record = run_linear(scope, definition.steps(), record).await?;
    scope.trace_keys("steps", Some(&record));

    debug!(attributes = definition.branches().len(), "dispatching branches");
    let record = dispatch(scope, definition, record).await?;
    scope.trace_keys("branches", record.as_ref());
    Ok(record)
}

async fn recover(
    scope: &RunScope<'_>,
    definition: &WorkflowDefinition,
    failure: Failure,
) -> Result<Option<Record>, WorkflowError> {
    let Failure { error, record } = failure;
    let kind = error.kind();

    let Some(handler) = definition.error_handler() else {
        error!(kind, error = %error, "workflow failed");
        scope.finish(RunStatus::Failed).await;
        return Err(error);
    };

    info!(kind, error = %error, "handing workflow error to its handler");
    let record = record.unwrap_or_default();
    match call_handler(handler.as_ref(), error, record, scope.ctx, scope.config.catch_panics).await {
        Ok(record) => {
            scope
                .emit(Event::ErrorHandled {
                    run_id: scope.run_id(),
                    kind,
                })
                .await;
            scope.finish(RunStatus::Handled).await;
            Ok(Some(record))
        }
        Err(error) => {
            error!(kind = error.kind(), error = %error, "error handler re-raised");
            scope.finish(RunStatus::Failed).await;
            Err(error)
        }
    }
}

/// Borrowed view of one run shared by the phases.
pub(crate) struct RunScope<'a> {
    pub ctx: &'a StepContext,
    pub sink: &'a dyn EventSink,
    pub config: &'a ExecutorConfig,
}

impl RunScope<'_> {
    pub fn run_id(&self) -> Uuid {
        self.ctx.run_id()
    }

    pub async fn emit(&self, event: Event) {
        self.sink.emit(event).await;
    }

    pub async fn step_succeeded(&self, step: &str) {
        self.emit(Event::StepSucceeded {
            run_id: self.run_id(),
            step: step.to_string(),
        })
        .await;
    }

    pub async fn step_failed(&self, step: &str, error: String) {
        debug!(step, error = %error, "step failed");
        self.emit(Event::StepFailed {
            run_id: self.run_id(),
            step: step.to_string(),
            error,
        })
        .await;
    }

    async fn finish(&self, status: RunStatus) {
        self.emit(Event::RunFinished {
            run_id: self.run_id(),
            workflow: self.ctx.workflow().to_string(),
            status,
        })
        .await;
    }

    fn trace_keys(&self, phase: &str, record: Option<&Record>) {
        if !self.config.trace_record_keys {
            return;
        }
        match record {
            Some(record) => {
                let keys: Vec<&str> = record.keys().map(String::as_str).collect();
                debug!(phase, ?keys, "record keys");
            }
            None => debug!(phase, "record discarded"),
        }
    }
}
