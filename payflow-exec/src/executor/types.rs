use serde::Serialize;

#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Convert panics in actions, checks, transforms and handlers into workflow errors.
    pub catch_panics: bool,
    /// Log the record's keys after every phase at `debug` level.
    pub trace_record_keys: bool,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            catch_panics: true,
            trace_record_keys: false,
        }
    }
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Succeeded,
    /// An error occurred and the workflow's handler produced the result.
    Handled,
    Failed,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Succeeded => "succeeded",
            RunStatus::Handled => "handled",
            RunStatus::Failed => "failed",
        }
    }
}
