//! Command-line argument surface.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "dta-learn", about = "Active learning for deterministic timed automata", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Load a target DTA from a JSON file and learn it from scratch.
    Learn {
        /// Path to the target's JSON persistence file.
        path: PathBuf,
    },
}
