//! CLI command definitions

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// rwdemo - interactive reader-writer lock demonstration
#[derive(Parser, Debug)]
#[command(
    name = "rwdemo",
    about = "Spawn readers and writers on demand and watch them contend for one lock",
    version = env!("GIT_DESCRIBE"),
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Subcommand to execute; the interactive TUI when omitted
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Feed a string of keys to the controller and print every event
    Script {
        /// Keys to replay, e.g. "rwxq"
        keys: String,

        /// Pause between keys in milliseconds (overrides config)
        #[arg(short, long)]
        settle_ms: Option<u64>,

        /// Treat unmapped keys as no-ops instead of exiting
        #[arg(long)]
        ignore_invalid: bool,
    },

    /// Print the instruction banner
    Banner,
}
