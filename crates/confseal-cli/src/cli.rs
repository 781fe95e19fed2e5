//! CLI argument definitions for confseal.
//!
//! All `clap` structures live here so that `main.rs` stays focused on
//! dispatching subcommands.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// confseal -- resolve configuration secrets without leaking them.
#[derive(Parser)]
#[command(
    name = "confseal",
    version,
    about = "confseal -- resolve configuration secrets without leaking them",
    long_about = "Loads a schema of secret fields, resolves each one from its INI file, \
                  environment variable or secrets directory, and prints the resulting \
                  configuration with every secret censored."
)]
pub struct Cli {
    /// Path to the TOML schema file.
    #[arg(long, short, global = true, default_value = "confseal.toml")]
    pub schema: PathBuf,

    /// Load variables from a dotenv file before resolving.
    #[arg(long, global = true)]
    pub env_file: Option<PathBuf>,

    /// Increase log verbosity (`-v` debug, `-vv` trace).
    #[arg(long, short, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Resolve every secret and print the censored configuration.
    Resolve {
        /// Print the configuration as JSON.
        #[arg(long)]
        json: bool,
    },

    /// List every declared secret and where it is read from.
    Describe,

    /// Print the value of a single field (e.g. `db.password`).
    Reveal {
        /// Dotted path of the field.
        path: String,
    },
}
