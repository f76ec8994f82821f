use payflow_core::types::{ActionStep, Check, Step};
use payflow_core::{Record, WorkflowError};
use tracing::{debug, warn};

use crate::executor::boundary::RunScope;
use crate::executor::events::Event;
use crate::executor::guard::{call_action, call_predicate};
use crate::executor::result::Failure;

/// Run the linear steps in order, stopping at the first failure.
pub(crate) async fn run_linear(
    scope: &RunScope<'_>,
    steps: &[Step],
    mut record: Record,
) -> Result<Record, Failure> {
    for step in steps {
        match step {
            Step::Check(check) => {
                if let Err(error) = run_check(scope, check, &record).await {
                    return Err(Failure::new(error, Some(record)));
                }
            }
            Step::Action(step) => record = run_action(scope, step, record).await?,
        }
    }
    Ok(record)
}

async fn run_check(scope: &RunScope<'_>, check: &Check, record: &Record) -> Result<(), WorkflowError> {
    match call_predicate(&check.predicate, record, scope.config.catch_panics) {
        Ok(true) => {
            debug!(check = %check.message, "check passed");
            Ok(())
        }
        Ok(false) => {
            debug!(check = %check.message, "check failed");
            scope
                .emit(Event::CheckFailed {
                    run_id: scope.run_id(),
                    message: check.message.clone(),
                })
                .await;
            Err(WorkflowError::Validation {
                message: check.message.clone(),
                record: record.clone(),
            })
        }
        Err(source) => Err(WorkflowError::Check {
            message: check.message.clone(),
            source,
        }),
    }
}

async fn run_action(scope: &RunScope<'_>, step: &ActionStep, record: Record) -> Result<Record, Failure> {
    let run_id = scope.run_id();
    let ctx = scope.ctx.for_step(&step.name);
    scope
        .emit(Event::StepStarted {
            run_id,
            step: step.name.clone(),
        })
        .await;

    let previous = record.clone();
    match call_action(step.action.as_ref(), record, &ctx, scope.config.catch_panics).await {
        Ok(Some(next)) => {
            debug!(step = %step.name, "step succeeded");
            scope.step_succeeded(&step.name).await;
            Ok(next)
        }
        Ok(None) => {
            warn!(
                run_id = %run_id,
                step = %step.name,
                "step returned nothing; keeping the previous record"
            );
            scope
                .emit(Event::StepReturnedNothing {
                    run_id,
                    step: step.name.clone(),
                    retained: true,
                })
                .await;
            scope.step_succeeded(&step.name).await;
            Ok(previous)
        }
        Err(source) => {
            scope.step_failed(&step.name, source.to_string()).await;
            Err(Failure::new(
                WorkflowError::Step {
                    step: step.name.clone(),
                    source,
                },
                Some(previous),
            ))
        }
    }
}
