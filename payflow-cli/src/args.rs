use clap::Args;

use crate::output::OutputFormat;

#[derive(Debug, Args, Clone)]
pub struct OutputArgs {
    #[arg(long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    pub format: OutputFormat,
    #[arg(long, short, global = true)]
    pub quiet: bool,
}

/// Where run events go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum EventsMode {
    None,
    Tracing,
    Stdout,
}

#[derive(Debug, Args, Clone)]
pub struct EngineArgs {
    /// Let panics in steps, checks, transforms and handlers unwind instead of failing the run.
    #[arg(long)]
    pub no_catch_panics: bool,
    /// Log the record's keys at debug level after each phase.
    #[arg(long)]
    pub trace_record_keys: bool,
}
