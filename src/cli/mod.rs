//! CLI module - Command-line interface definitions and handlers
//!
//! Uses clap v4 with derive macros for argument parsing.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use output::OutputFormat;

pub mod commands;
pub mod output;

/// skillz - serve Agent Skills from a directory over MCP
#[derive(Parser, Debug)]
#[command(name = "skillz")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Skills root directory (default: $SKILLZ_ROOT or ~/.skillz)
    #[arg(long, global = true, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Config file layered over .skillz-config.json in the skills root
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Default script timeout in seconds
    #[arg(long, global = true, value_name = "SECONDS")]
    pub timeout: Option<f64>,

    /// Output format (human, json)
    #[arg(long, short = 'O', global = true, value_enum, default_value_t)]
    pub output: OutputFormat,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Also write logs to a file in the temp directory
    #[arg(long, global = true)]
    pub log: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// The subcommand to run; `serve` when none was given.
    #[must_use]
    pub fn command(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Serve)
    }
}

/// Available commands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run as MCP (Model Context Protocol) server on stdio
    Serve,

    /// List discovered skills
    List(commands::list::ListArgs),

    /// Show one skill's metadata, or its instructions for a task
    Show(commands::show::ShowArgs),

    /// Read a resource by URI
    Read(commands::read::ReadArgs),

    /// Run a skill script in a temporary workspace
    Run(commands::run::RunArgs),
}
