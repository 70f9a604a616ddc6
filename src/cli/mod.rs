//! CLI module for wiregen
//!
//! A thin debugging front-end over [`crate::backend::ComponentCodegen`]: it loads resolved graphs from JSON (as the
//! resolution phase would hand them over) and prints or checks the generated code.
//!
//! ## Commands
//!
//! - `emit <graph.json>` - Print the generated module of every graph in the file
//! - `check <graph.json>` - Validate and emit without printing
//!
//! ## Design
//!
//! The CLI uses clap for argument parsing with derive macros.
//! Command functions return `CliResult<T>` instead of calling `process::exit`.
//! Only the top-level `run()` function handles errors and exits.

// Enforce explicit error handling - no panicking in production code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod commands;

use std::fmt;
use std::path::PathBuf;
use std::process;

use clap::{Args, Parser, Subcommand};

use crate::backend::{EmitOptions, ThreadSafety};

// ============================================================================
// CLI Error handling
// ============================================================================

/// Exit code for CLI operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(pub i32);

impl ExitCode {
    pub const SUCCESS: ExitCode = ExitCode(0);
    pub const FAILURE: ExitCode = ExitCode(1);
}

/// Error type for CLI operations.
///
/// Contains a user-facing message and an exit code. The CLI entry point
/// catches these errors, prints the message, and exits with the code.
#[derive(Debug)]
pub struct CliError {
    /// User-facing error message (already formatted for display)
    pub message: String,
    /// Exit code to return to the shell
    pub exit_code: ExitCode,
}

impl CliError {
    pub fn new(message: impl Into<String>, exit_code: ExitCode) -> Self {
        Self {
            message: message.into(),
            exit_code,
        }
    }

    /// Create a failure error (exit code 1).
    pub fn failure(message: impl Into<String>) -> Self {
        Self::new(message, ExitCode::FAILURE)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

// ============================================================================
// Clap CLI definition
// ============================================================================

/// Generate dependency-injection containers from resolved binding graphs
#[derive(Parser, Debug)]
#[command(name = "wiregen")]
#[command(version = crate::version::WIREGEN_VERSION)]
#[command(about = "Generate dependency-injection containers from resolved binding graphs", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the generated module for every graph in a file
    Emit {
        /// JSON file holding one graph or an array of graphs
        #[arg(value_name = "GRAPH")]
        file: PathBuf,
        #[command(flatten)]
        flags: EmitFlags,
        /// Omit the generated-file header
        #[arg(long)]
        no_header: bool,
    },

    /// Validate and emit every graph without printing
    Check {
        /// JSON file holding one graph or an array of graphs
        #[arg(value_name = "GRAPH")]
        file: PathBuf,
        #[command(flatten)]
        flags: EmitFlags,
    },
}

/// Emission flags shared by `emit` and `check`.
#[derive(Args, Debug, Clone, Copy, Default)]
pub struct EmitFlags {
    /// Generate thread-safe scoped accessors (`OnceLock`, `SyncReleasableCell`)
    #[arg(long)]
    pub synchronized: bool,
    /// Memoize releasable bindings instead of emitting release methods
    #[arg(long)]
    pub no_release_manager: bool,
    /// Reject subcomponent bindings that shadow an ancestor binding
    #[arg(long)]
    pub strict: bool,
}

impl EmitFlags {
    pub fn options(self) -> EmitOptions {
        let policy = if self.synchronized {
            ThreadSafety::Synchronized
        } else {
            ThreadSafety::SingleThreaded
        };
        EmitOptions::new()
            .with_thread_safety(policy)
            .with_release_manager(!self.no_release_manager)
            .with_strict_validation(self.strict)
    }
}

// ============================================================================
// CLI entry point
// ============================================================================

/// Main CLI entry point.
///
/// This is the only place where `process::exit` is called. All command
/// implementations return `CliResult` and errors are handled here.
pub fn run() {
    let cli = Cli::parse();

    match execute(cli) {
        Ok(exit_code) => {
            if exit_code.0 != 0 {
                process::exit(exit_code.0);
            }
        }
        Err(e) => {
            if !e.message.is_empty() {
                eprintln!("{}", e.message);
            }
            process::exit(e.exit_code.0);
        }
    }
}

/// Execute the CLI command and return result.
fn execute(cli: Cli) -> CliResult<ExitCode> {
    match cli.command {
        Command::Emit { file, flags, no_header } => {
            let options = flags.options();
            let options = if no_header { options.without_header() } else { options };
            commands::emit_file(&file, options)
        }
        Command::Check { file, flags } => commands::check_file(&file, flags.options()),
    }
}

// ============================================================================
// Tests
// ============================================================================
