mod boundary;
mod branch;
pub mod events;
mod guard;
pub mod mapper;
pub mod metrics;
mod result;
mod steps;
mod types;

pub use boundary::Executor;
pub use events::{
    CompositeEventSink, Event, EventSink, NoOpEventSink, StdoutEventSink, TracingEventSink,
};
pub use metrics::{MetricsCollector, MetricsEventSink, RunMetrics};
pub use result::RecordDiscarded;
pub use types::{ExecutorConfig, RunStatus};
