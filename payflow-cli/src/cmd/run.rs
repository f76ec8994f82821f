use std::path::Path;
use std::sync::Arc;

use payflow_core::{Record, RunError};
use payflow_exec::{
    EventSink, ExecutorConfig, MetricsCollector, MetricsEventSink, NoOpEventSink, Registry,
    StdoutEventSink, TracingEventSink,
};
use serde::Serialize;
use tracing::debug;

use crate::exit_codes;
use crate::output::{print_error, print_result, OutputFormat};
use crate::utils::{load_inputs, merge_set_inputs, read_document};
use crate::{EngineArgs, EventsMode, OutputArgs};

#[derive(Serialize)]
struct RunResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    run_id: Option<String>,
    workflow: String,
    status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    steps_succeeded: usize,
    steps_failed: usize,
    record: Option<Record>,
}

pub async fn run_cmd(
    path: &Path,
    workflow: Option<&str>,
    inputs_path: Option<&Path>,
    set_inputs: &[String],
    events: EventsMode,
    engine: EngineArgs,
    output: OutputArgs,
) -> i32 {
    let parsed = match read_document(path, &output) {
        Ok(p) => p,
        Err(code) => return code,
    };

    let name = match (workflow, parsed.document.workflows.as_slice()) {
        (Some(name), _) => name.to_string(),
        (None, [only]) => only.name.clone(),
        (None, all) => {
            let names: Vec<&str> = all.iter().map(|w| w.name.as_str()).collect();
            print_error(
                output.format,
                output.quiet,
                &format!(
                    "--workflow is required when a document defines {} workflows ({})",
                    names.len(),
                    names.join(", ")
                ),
            );
            return exit_codes::VALIDATION_FAILED;
        }
    };

    let mut inputs = match load_inputs(inputs_path, &output) {
        Ok(v) => v,
        Err(code) => return code,
    };
    merge_set_inputs(&mut inputs, set_inputs);

    let base: Arc<dyn EventSink> = match events {
        EventsMode::None => Arc::new(NoOpEventSink),
        EventsMode::Tracing => Arc::new(TracingEventSink),
        EventsMode::Stdout => Arc::new(StdoutEventSink),
    };
    let collector = Arc::new(MetricsCollector::new());
    let registry = Registry::new()
        .with_config(ExecutorConfig {
            catch_panics: !engine.no_catch_panics,
            trace_record_keys: engine.trace_record_keys,
        })
        .with_event_sink(Arc::new(MetricsEventSink::new(collector.clone(), base)));

    if let Err(err) = registry.define_document(&parsed.document) {
        if output.format == OutputFormat::Text && !output.quiet {
            eprintln!("error: validation failed");
            for v in &err.violations {
                eprintln!("- {}: {}", v.path, v.message);
            }
        } else {
            print_error(output.format, output.quiet, &err.to_string());
        }
        return exit_codes::VALIDATION_FAILED;
    }

    debug!(workflow = %name, path = %path.display(), "running workflow");
    let outcome = registry.run(&name, inputs).await;
    let metrics = collector.runs().await.into_iter().next();

    let mut result = RunResult {
        run_id: metrics.as_ref().map(|m| m.run_id.to_string()),
        workflow: name,
        status: metrics
            .as_ref()
            .map(|m| m.status.clone())
            .unwrap_or_else(|| "failed".to_string()),
        error: None,
        steps_succeeded: metrics.as_ref().map_or(0, |m| m.steps_succeeded),
        steps_failed: metrics.as_ref().map_or(0, |m| m.steps_failed),
        record: None,
    };

    let code = match outcome {
        Ok(record) => {
            result.record = record;
            exit_codes::SUCCESS
        }
        Err(e @ RunError::Registry { .. }) => {
            result.error = Some(e.to_string());
            exit_codes::VALIDATION_FAILED
        }
        Err(e @ RunError::Workflow(_)) => {
            result.error = Some(e.to_string());
            exit_codes::RUN_FAILED
        }
    };

    if output.format == OutputFormat::Text && !output.quiet {
        match &result.run_id {
            Some(id) => println!("Run {id} {} ({})", result.status, result.workflow),
            None => println!("Run {} ({})", result.status, result.workflow),
        }
        println!("  Steps succeeded: {}", result.steps_succeeded);
        println!("  Steps failed: {}", result.steps_failed);
        if let Some(e) = &result.error {
            eprintln!("error: {e}");
        } else {
            print_result(output.format, output.quiet, &result.record);
        }
    } else {
        print_result(output.format, output.quiet, &result);
    }

    code
}
