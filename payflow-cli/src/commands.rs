use std::path::PathBuf;

use clap::Subcommand;

use crate::args::*;

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Parse and validate a workflow document.
    Validate {
        path: PathBuf,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// List the workflows a document defines.
    Workflows {
        path: PathBuf,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Run one workflow from a document against an input record.
    Run {
        path: PathBuf,
        #[arg(long)]
        workflow: Option<String>,
        #[arg(long)]
        inputs: Option<PathBuf>,
        #[arg(long = "set", value_name = "KEY=VALUE")]
        set_inputs: Vec<String>,
        #[arg(long, value_enum, default_value_t = EventsMode::Tracing)]
        events: EventsMode,
        #[command(flatten)]
        engine: EngineArgs,
        #[command(flatten)]
        output: OutputArgs,
    },
}
