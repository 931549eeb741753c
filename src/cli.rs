use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Compare streamed responses from up to three LLM endpoints
#[derive(Debug, Parser)]
#[command(name = "llm-cmp")]
#[command(version)]
#[command(about = "Compare streamed LLM responses side by side", long_about = None)]
pub struct Args {
    /// System prompt (default: config system_prompt or empty)
    #[arg(short = 's', long = "system")]
    pub system: Option<String>,

    /// Model to compare; repeat up to three times. Replaces configured slots.
    #[arg(short = 'm', long = "model")]
    pub models: Vec<String>,

    /// Provider for --model slots
    #[arg(long = "provider", default_value = "openai")]
    pub provider: String,

    /// Config file (default: <config dir>/config.toml)
    #[arg(long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Stop every panel after this many seconds
    #[arg(long = "timeout", value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Print provider, model details and the combined prompt per panel
    #[arg(long = "debug")]
    pub debug: bool,

    #[command(subcommand)]
    pub cmd: Option<Command>,

    /// User prompt (positional) (used when no subcommand is given)
    #[arg(value_name = "PROMPT")]
    pub prompt: Vec<String>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List known providers and models
    Providers,

    /// Run the three-panel terminal UI
    #[cfg(feature = "tui")]
    Tui,
}
