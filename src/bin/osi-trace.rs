// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! # osi-trace CLI
//!
//! Command-line tool for ASAM OSI trace files.
//!
//! ## Usage
//!
//! ```sh
//! # Convert a binary trace to MCAP
//! osi-trace convert 20240131T120000Z_sv_370_3000_100_run.osi run.mcap
//!
//! # Show what a trace contains
//! osi-trace info run.mcap --json
//!
//! # List supported message kinds
//! osi-trace kinds
//! ```

mod cmd;
mod common;

use std::process;

use clap::{Parser, Subcommand};
use cmd::{ConvertCmd, InfoCmd, KindsCmd};
use common::{LogLevel, Result};

/// osi-trace - ASAM OSI trace toolkit
///
/// Read, write, and convert OSI traces stored as length-framed binary
/// (.osi), protobuf text (.txth), or MCAP (.mcap).
#[derive(Parser, Clone)]
#[command(name = "osi-trace")]
#[command(about = "Convert and inspect ASAM OSI trace files", long_about = None)]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(author = "ArcheBase")]
struct Cli {
    /// Log verbosity on stderr
    #[arg(long, global = true, value_enum, default_value_t = LogLevel::Warn)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand, Clone)]
enum Commands {
    /// Convert a trace between .osi, .txth and .mcap
    Convert(ConvertCmd),

    /// Show message counts, channels and metadata of a trace
    Info(InfoCmd),

    /// List supported message kinds
    Kinds(KindsCmd),
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    common::init_logging(cli.log_level);

    match cli.command {
        Commands::Convert(cmd) => cmd.run(),
        Commands::Info(cmd) => cmd.run(),
        Commands::Kinds(cmd) => cmd.run(),
    }
}

fn main() {
    let result = run();

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
