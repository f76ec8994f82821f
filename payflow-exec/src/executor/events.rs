use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value as JsonValue};
use uuid::Uuid;

use crate::executor::types::RunStatus;

#[derive(Debug, Clone)]
pub enum Event {
    RunStarted {
        run_id: Uuid,
        workflow: String,
    },
    RunFinished {
        run_id: Uuid,
        workflow: String,
        status: RunStatus,
    },
    MappingsApplied {
        run_id: Uuid,
        count: usize,
    },
    StepStarted {
        run_id: Uuid,
        step: String,
    },
    StepSucceeded {
        run_id: Uuid,
        step: String,
    },
    /// An action returned nothing. `retained` tells whether the previous record was kept.
    StepReturnedNothing {
        run_id: Uuid,
        step: String,
        retained: bool,
    },
    StepFailed {
        run_id: Uuid,
        step: String,
        error: String,
    },
    CheckFailed {
        run_id: Uuid,
        message: String,
    },
    BranchMatched {
        run_id: Uuid,
        attribute: String,
        value: JsonValue,
        rule: usize,
    },
    ErrorHandled {
        run_id: Uuid,
        kind: &'static str,
    },
}

impl Event {
    pub fn run_id(&self) -> Uuid {
        match self {
            Event::RunStarted { run_id, .. }
            | Event::RunFinished { run_id, .. }
            | Event::MappingsApplied { run_id, .. }
            | Event::StepStarted { run_id, .. }
            | Event::StepSucceeded { run_id, .. }
            | Event::StepReturnedNothing { run_id, .. }
            | Event::StepFailed { run_id, .. }
            | Event::CheckFailed { run_id, .. }
            | Event::BranchMatched { run_id, .. }
            | Event::ErrorHandled { run_id, .. } => *run_id,
        }
    }

    /// Dotted event type, e.g. `step.succeeded`.
    pub fn kind(&self) -> &'static str {
        match self {
            Event::RunStarted { .. } => "run.started",
            Event::RunFinished { .. } => "run.finished",
            Event::MappingsApplied { .. } => "mappings.applied",
            Event::StepStarted { .. } => "step.started",
            Event::StepSucceeded { .. } => "step.succeeded",
            Event::StepReturnedNothing { .. } => "step.returned_nothing",
            Event::StepFailed { .. } => "step.failed",
            Event::CheckFailed { .. } => "check.failed",
            Event::BranchMatched { .. } => "branch.matched",
            Event::ErrorHandled { .. } => "error.handled",
        }
    }

    pub fn to_json(&self) -> JsonValue {
        let run_id = self.run_id().to_string();
        let kind = self.kind();
        match self {
            Event::RunStarted { workflow, .. } => {
                json!({ "type": kind, "run_id": run_id, "workflow": workflow })
            }
            Event::RunFinished { workflow, status, .. } => {
                json!({ "type": kind, "run_id": run_id, "workflow": workflow, "status": status.as_str() })
            }
            Event::MappingsApplied { count, .. } => {
                json!({ "type": kind, "run_id": run_id, "count": count })
            }
            Event::StepStarted { step, .. } | Event::StepSucceeded { step, .. } => {
                json!({ "type": kind, "run_id": run_id, "step": step })
            }
            Event::StepReturnedNothing { step, retained, .. } => {
                json!({ "type": kind, "run_id": run_id, "step": step, "retained": retained })
            }
            Event::StepFailed { step, error, .. } => {
                json!({ "type": kind, "run_id": run_id, "step": step, "error": error })
            }
            Event::CheckFailed { message, .. } => {
                json!({ "type": kind, "run_id": run_id, "message": message })
            }
            Event::BranchMatched { attribute, value, rule, .. } => {
                json!({ "type": kind, "run_id": run_id, "attribute": attribute, "value": value, "rule": rule })
            }
            Event::ErrorHandled { kind: error_kind, .. } => {
                json!({ "type": kind, "run_id": run_id, "error_kind": error_kind })
            }
        }
    }
}

#[async_trait]
pub trait EventSink: Send + Sync {
    async fn emit(&self, event: Event);
}

#[async_trait]
impl<T: EventSink + ?Sized> EventSink for Arc<T> {
    async fn emit(&self, event: Event) {
        (**self).emit(event).await;
    }
}

pub struct CompositeEventSink {
    sinks: Vec<Box<dyn EventSink>>,
}

impl Default for CompositeEventSink {
    fn default() -> Self {
        Self::new()
    }
}

impl CompositeEventSink {
    pub fn new() -> Self {
        Self { sinks: Vec::new() }
    }

    pub fn add(&mut self, sink: Box<dyn EventSink>) {
        self.sinks.push(sink);
    }

    pub fn with(mut self, sink: impl EventSink + 'static) -> Self {
        self.add(Box::new(sink));
        self
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

#[async_trait]
impl EventSink for CompositeEventSink {
    async fn emit(&self, event: Event) {
        for sink in &self.sinks {
            sink.emit(event.clone()).await;
        }
    }
}

/// Writes each event as one JSON line on stdout.
pub struct StdoutEventSink;

#[async_trait]
impl EventSink for StdoutEventSink {
    async fn emit(&self, event: Event) {
        println!("{}", serde_json::to_string(&event.to_json()).unwrap_or_default());
    }
}

/// Forwards events to `tracing` at debug level under the `payflow::events` target.
pub struct TracingEventSink;

#[async_trait]
impl EventSink for TracingEventSink {
    async fn emit(&self, event: Event) {
        tracing::debug!(
            target: "payflow::events",
            event = event.kind(),
            run_id = %event.run_id(),
            payload = %event.to_json(),
            "workflow event"
        );
    }
}

pub struct NoOpEventSink;

#[async_trait]
impl EventSink for NoOpEventSink {
    async fn emit(&self, _event: Event) {}
}
