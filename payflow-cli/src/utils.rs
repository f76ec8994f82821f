use std::path::Path;

use payflow_core::{parse_document_str, DocumentFormat, ParseError, ParsedDocument, Record};

use crate::exit_codes;
use crate::output::print_error;
use crate::OutputArgs;

/// Read and parse a workflow document, reporting failures and returning the exit code.
pub fn read_document(path: &Path, output: &OutputArgs) -> Result<ParsedDocument, i32> {
    let content = match std::fs::read_to_string(path) {
        Ok(v) => v,
        Err(e) => {
            print_error(
                output.format,
                output.quiet,
                &format!("failed to read {}: {e}", path.display()),
            );
            return Err(exit_codes::RUNTIME_ERROR);
        }
    };

    parse_document_str(&content, DocumentFormat::Auto).map_err(|e| {
        let message = match e {
            ParseError::Json(e) => format!("JSON parse failed: {e}"),
            ParseError::Yaml(e) => format!("YAML parse failed: {e}"),
            ParseError::UnknownFormat => "input is neither valid JSON nor valid YAML".to_string(),
        };
        print_error(output.format, output.quiet, &message);
        exit_codes::VALIDATION_FAILED
    })
}

/// Load the input record from a JSON or YAML file. It must be a mapping.
pub fn load_inputs(path: Option<&Path>, output: &OutputArgs) -> Result<Record, i32> {
    let Some(path) = path else {
        return Ok(Record::new());
    };
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            print_error(output.format, output.quiet, &format!("failed to read inputs: {e}"));
            return Err(exit_codes::RUNTIME_ERROR);
        }
    };
    let value: Option<serde_json::Value> = serde_json::from_str(&content)
        .ok()
        .or_else(|| serde_yaml::from_str(&content).ok());
    match value {
        Some(serde_json::Value::Object(map)) => Ok(map),
        Some(_) => {
            print_error(output.format, output.quiet, "inputs file must hold a mapping");
            Err(exit_codes::RUNTIME_ERROR)
        }
        None => {
            print_error(
                output.format,
                output.quiet,
                "inputs file is neither valid JSON nor YAML",
            );
            Err(exit_codes::RUNTIME_ERROR)
        }
    }
}

/// Apply `KEY=VALUE` overrides as string fields. Entries without `=` are ignored.
pub fn merge_set_inputs(inputs: &mut Record, set_inputs: &[String]) {
    for s in set_inputs {
        if let Some((k, v)) = s.split_once('=') {
            inputs.insert(k.to_string(), serde_json::Value::String(v.to_string()));
        }
    }
}
