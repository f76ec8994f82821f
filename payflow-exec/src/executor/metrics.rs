use crate::executor::{Event, EventSink, RunStatus};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use uuid::Uuid;

#[derive(Debug, Clone, Default)]
pub struct RunMetrics {
    pub run_id: Uuid,
    pub workflow: String,
    pub status: String,
    pub started_at: Option<Instant>,
    pub finished_at: Option<Instant>,
    pub total_duration: Option<Duration>,
    pub mappings_applied: usize,
    pub steps_total: usize,
    pub steps_succeeded: usize,
    pub steps_failed: usize,
    pub steps_returned_nothing: usize,
    pub checks_failed: usize,
    pub branch_matches: usize,
    pub errors_handled: usize,
}

impl RunMetrics {
    pub fn new(run_id: Uuid, workflow: String) -> Self {
        Self {
            run_id,
            workflow,
            started_at: Some(Instant::now()),
            ..Default::default()
        }
    }

    pub fn record_step_success(&mut self) {
        self.steps_succeeded += 1;
        self.steps_total += 1;
    }

    pub fn record_step_failure(&mut self) {
        self.steps_failed += 1;
        self.steps_total += 1;
    }

    /// Counted in addition to the success recorded for the same step.
    pub fn record_step_nothing(&mut self) {
        self.steps_returned_nothing += 1;
    }

    pub fn record_check_failure(&mut self) {
        self.checks_failed += 1;
    }

    pub fn record_branch_match(&mut self) {
        self.branch_matches += 1;
    }

    pub fn record_error_handled(&mut self) {
        self.errors_handled += 1;
    }

    pub fn finish(&mut self, status: RunStatus) {
        self.status = status.as_str().to_string();
        self.finished_at = Some(Instant::now());
        if let (Some(started), Some(finished)) = (self.started_at, self.finished_at) {
            self.total_duration = Some(finished.duration_since(started));
        }
    }

    pub fn is_finished(&self) -> bool {
        self.finished_at.is_some()
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "run_id": self.run_id.to_string(),
            "workflow": self.workflow,
            "status": self.status,
            "duration_ms": self.total_duration.map(|d| d.as_millis() as u64),
            "mappings_applied": self.mappings_applied,
            "steps": {
                "total": self.steps_total,
                "succeeded": self.steps_succeeded,
                "failed": self.steps_failed,
                "returned_nothing": self.steps_returned_nothing,
            },
            "checks_failed": self.checks_failed,
            "branch_matches": self.branch_matches,
            "errors_handled": self.errors_handled,
        })
    }
}

/// Event sink that keeps one [`RunMetrics`] per run id.
#[derive(Default)]
pub struct MetricsCollector {
    runs: Mutex<HashMap<Uuid, RunMetrics>>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get_metrics(&self, run_id: Uuid) -> Option<RunMetrics> {
        self.runs.lock().await.get(&run_id).cloned()
    }

    /// Every tracked run, oldest first.
    pub async fn runs(&self) -> Vec<RunMetrics> {
        let mut runs: Vec<RunMetrics> = self.runs.lock().await.values().cloned().collect();
        runs.sort_by_key(|m| m.started_at);
        runs
    }

    pub async fn clear(&self) {
        self.runs.lock().await.clear();
    }

    async fn record(&self, event: &Event) {
        let mut runs = self.runs.lock().await;
        if let Event::RunStarted { run_id, workflow } = event {
            runs.insert(*run_id, RunMetrics::new(*run_id, workflow.clone()));
            return;
        }
        let Some(metrics) = runs.get_mut(&event.run_id()) else {
            return;
        };
        match event {
            Event::MappingsApplied { count, .. } => metrics.mappings_applied += count,
            Event::StepSucceeded { .. } => metrics.record_step_success(),
            Event::StepFailed { .. } => metrics.record_step_failure(),
            Event::StepReturnedNothing { .. } => metrics.record_step_nothing(),
            Event::CheckFailed { .. } => metrics.record_check_failure(),
            Event::BranchMatched { .. } => metrics.record_branch_match(),
            Event::ErrorHandled { .. } => metrics.record_error_handled(),
            Event::RunFinished { status, .. } => metrics.finish(*status),
            Event::RunStarted { .. } | Event::StepStarted { .. } => {}
        }
    }
}

#[async_trait]
impl EventSink for MetricsCollector {
    async fn emit(&self, event: Event) {
        self.record(&event).await;
    }
}

/// Records metrics, then forwards every event to `base`.
pub struct MetricsEventSink {
    collector: Arc<MetricsCollector>,
    base: Arc<dyn EventSink>,
}

impl MetricsEventSink {
    pub fn new(collector: Arc<MetricsCollector>, base: Arc<dyn EventSink>) -> Self {
        Self { collector, base }
    }

    pub fn collector(&self) -> &Arc<MetricsCollector> {
        &self.collector
    }
}

#[async_trait]
impl EventSink for MetricsEventSink {
    async fn emit(&self, event: Event) {
        self.collector.record(&event).await;
        self.base.emit(event).await;
    }
}
