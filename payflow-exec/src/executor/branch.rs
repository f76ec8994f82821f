use payflow_core::types::{values_match, ActionStep, BranchNothing, WorkflowDefinition};
use payflow_core::{Record, WorkflowError};
use serde_json::Value as JsonValue;
use tracing::{debug, warn};

use crate::executor::boundary::RunScope;
use crate::executor::events::Event;
use crate::executor::guard::call_action;
use crate::executor::result::{Failure, RecordDiscarded};

/// Run every rule whose value matches its attribute, attributes in registration order.
///
/// Each attribute is a literal top-level key, read once before its rules run. Under
/// [`BranchNothing::Replace`] an action returning nothing discards the record; the dispatch
/// then ends with `None`, or fails if another attribute or action still needs the record.
pub(crate) async fn dispatch(
    scope: &RunScope<'_>,
    definition: &WorkflowDefinition,
    record: Record,
) -> Result<Option<Record>, Failure> {
    let policy = definition.branch_nothing();
    let mut current = Some(record);
    let mut discarded_by = String::new();

    for (attribute, rules) in definition.branches() {
        let value = match &current {
            Some(record) => record.get(attribute).cloned().unwrap_or(JsonValue::Null),
            None => return Err(discarded(attribute, &discarded_by)),
        };

        for (idx, rule) in rules.iter().enumerate() {
            if !values_match(&value, &rule.value) {
                continue;
            }
            debug!(attribute = %attribute, value = %value, rule = idx, "branch rule matched");
            scope
                .emit(Event::BranchMatched {
                    run_id: scope.run_id(),
                    attribute: attribute.clone(),
                    value: value.clone(),
                    rule: idx,
                })
                .await;

            for step in &rule.steps {
                let Some(record) = current.take() else {
                    return Err(discarded(attribute, &discarded_by));
                };
                current = run_branch_action(scope, attribute, step, record, policy).await?;
                if current.is_none() {
                    discarded_by = step.name.clone();
                }
            }
        }
    }

    Ok(current)
}

fn discarded(attribute: &str, step: &str) -> Failure {
    Failure::new(
        WorkflowError::Branch {
            attribute: attribute.to_string(),
            step: step.to_string(),
            source: Box::new(RecordDiscarded {
                step: step.to_string(),
            }),
        },
        None,
    )
}

async fn run_branch_action(
    scope: &RunScope<'_>,
    attribute: &str,
    step: &ActionStep,
    record: Record,
    policy: BranchNothing,
) -> Result<Option<Record>, Failure> {
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
            scope.step_succeeded(&step.name).await;
            Ok(Some(next))
        }
        Ok(None) => {
            let retained = policy == BranchNothing::Retain;
            if retained {
                warn!(
                    run_id = %run_id,
                    step = %step.name,
                    "branch step returned nothing; keeping the previous record"
                );
            } else {
                warn!(
                    run_id = %run_id,
                    step = %step.name,
                    "branch step returned nothing; record discarded"
                );
            }
            scope
                .emit(Event::StepReturnedNothing {
                    run_id,
                    step: step.name.clone(),
                    retained,
                })
                .await;
            scope.step_succeeded(&step.name).await;
            Ok(retained.then_some(previous))
        }
        Err(source) => {
            scope.step_failed(&step.name, source.to_string()).await;
            Err(Failure::new(
                WorkflowError::Branch {
                    attribute: attribute.to_string(),
                    step: step.name.clone(),
                    source,
                },
                Some(previous),
            ))
        }
    }
}
