#![forbid(unsafe_code)]

//! Runtime engine for payflow workflows.
//!
//! Definitions are modelled in `payflow-core`; this crate applies their field mappings,
//! runs their steps and branches, and recovers failures through their error handler.

pub mod executor;
pub mod registry;

pub use crate::executor::{
    CompositeEventSink, Event, EventSink, Executor, ExecutorConfig, MetricsCollector,
    MetricsEventSink, NoOpEventSink, RecordDiscarded, RunMetrics, RunStatus, StdoutEventSink,
    TracingEventSink,
};
pub use crate::registry::Registry;
