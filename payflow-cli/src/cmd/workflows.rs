use std::path::Path;

use payflow_core::Format;
use serde::Serialize;

use crate::exit_codes;
use crate::output::{print_result, OutputFormat};
use crate::utils::read_document;
use crate::OutputArgs;

#[derive(Serialize)]
struct WorkflowInfo {
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    format: Format,
    #[serde(skip_serializing_if = "Option::is_none")]
    source: Option<String>,
    mapping_count: usize,
    step_count: usize,
    branches: Vec<String>,
    handles_errors: bool,
}

#[derive(Serialize)]
struct WorkflowsResult {
    workflows: Vec<WorkflowInfo>,
}

pub async fn workflows_cmd(path: &Path, output: OutputArgs) -> i32 {
    let parsed = match read_document(path, &output) {
        Ok(p) => p,
        Err(code) => return code,
    };

    let workflows: Vec<WorkflowInfo> = parsed
        .document
        .workflows
        .iter()
        .map(|w| WorkflowInfo {
            name: w.name.clone(),
            description: w.description.clone(),
            format: w.format.unwrap_or_default(),
            source: w.source.clone(),
            mapping_count: w.mappings.len(),
            step_count: w.steps.len(),
            branches: w.branches.keys().cloned().collect(),
            handles_errors: w.on_error.is_some(),
        })
        .collect();

    let result = WorkflowsResult { workflows };

    if output.format == OutputFormat::Text && !output.quiet {
        println!("Workflows in {}:", path.display());
        for w in &result.workflows {
            println!("  - {} ({} steps)", w.name, w.step_count);
            if let Some(d) = &w.description {
                println!("    {d}");
            }
            if !w.branches.is_empty() {
                println!("    branches on: {}", w.branches.join(", "));
            }
        }
    } else {
        print_result(output.format, output.quiet, &result);
    }

    exit_codes::SUCCESS
}
