//! Calls into user code, optionally converting panics into errors.

use std::panic::{catch_unwind, AssertUnwindSafe};

use futures_util::FutureExt;
use payflow_core::transforms;
use payflow_core::types::{Action, ErrorHandler, Predicate, Transform};
use payflow_core::{BoxError, PanicError, Record, StepContext, TransformError, WorkflowError};
use serde_json::Value as JsonValue;

pub(crate) async fn call_action(
    action: &dyn Action,
    record: Record,
    ctx: &StepContext,
    catch_panics: bool,
) -> Result<Option<Record>, BoxError> {
    if !catch_panics {
        return action.call(record, ctx).await;
    }
    match AssertUnwindSafe(action.call(record, ctx)).catch_unwind().await {
        Ok(result) => result,
        Err(payload) => Err(PanicError::from_payload(payload).into()),
    }
}

pub(crate) fn call_predicate(
    predicate: &Predicate,
    record: &Record,
    catch_panics: bool,
) -> Result<bool, BoxError> {
    if !catch_panics {
        return Ok(predicate(record));
    }
    catch_unwind(AssertUnwindSafe(|| predicate(record)))
        .map_err(|payload| PanicError::from_payload(payload).into())
}

pub(crate) async fn call_handler(
    handler: &dyn ErrorHandler,
    error: WorkflowError,
    record: Record,
    ctx: &StepContext,
    catch_panics: bool,
) -> Result<Record, WorkflowError> {
    if !catch_panics {
        return handler.handle(error, record, ctx).await;
    }
    match AssertUnwindSafe(handler.handle(error, record, ctx))
        .catch_unwind()
        .await
    {
        Ok(result) => result,
        Err(payload) => Err(WorkflowError::handler(PanicError::from_payload(payload))),
    }
}

pub(crate) fn call_transform(
    transform: &Transform,
    value: JsonValue,
    catch_panics: bool,
) -> Result<JsonValue, TransformError> {
    if !catch_panics {
        return transforms::apply(transform, value);
    }
    catch_unwind(AssertUnwindSafe(|| transforms::apply(transform, value))).unwrap_or_else(|payload| {
        Err(TransformError::Custom(PanicError::from_payload(payload).into()))
    })
}
