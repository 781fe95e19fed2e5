//! CLI entry point for confseal.
//!
//! This binary provides the `confseal` command with subcommands for resolving
//! a schema of secrets, describing where each secret is read from, and
//! revealing a single value on request.

mod cli;
mod helpers;
mod schema_file;

use std::path::Path;

use anyhow::{Context, Result, bail};
use clap::Parser;
use tracing::info;

use confseal_secrets::{ConfigTree, ConfigValue, ProcessEnv, Schema};

use crate::cli::{Cli, Commands};
use crate::helpers::{init_tracing, load_env_file};
use crate::schema_file::SchemaFile;

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Some(env_file) = &cli.env_file {
        load_env_file(env_file)?;
    }

    let schema = load_schema(&cli.schema)?;

    match cli.command {
        Commands::Resolve { json } => cmd_resolve(&schema, json),
        Commands::Describe => cmd_describe(&schema),
        Commands::Reveal { path } => cmd_reveal(&schema, &path),
    }
}

fn load_schema(path: &Path) -> Result<Schema> {
    let file = SchemaFile::load(path)?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    let schema = file.build(base_dir, &ProcessEnv)?;
    info!(path = %path.display(), schema = schema.name(), "schema loaded");
    Ok(schema)
}

fn resolve(schema: &Schema) -> Result<ConfigTree> {
    schema
        .resolve_from_process_env()
        .with_context(|| format!("failed to resolve secrets for `{}`", schema.name()))
}

// ---------------------------------------------------------------------------
// Subcommands
// ---------------------------------------------------------------------------

fn cmd_resolve(schema: &Schema, json: bool) -> Result<()> {
    let config = resolve(schema)?;
    if json {
        let rendered =
            serde_json::to_string_pretty(&config).context("failed to serialize configuration")?;
        println!("{rendered}");
    } else {
        println!("{config}");
    }
    Ok(())
}

fn cmd_describe(schema: &Schema) -> Result<()> {
    let help = schema.render_help();
    if help.is_empty() {
        println!("{} declares no secrets.", schema.name());
    } else {
        print!("{help}");
    }
    Ok(())
}

fn cmd_reveal(schema: &Schema, path: &str) -> Result<()> {
    let config = resolve(schema)?;
    if let Some(value) = reveal_value(&config, path)? {
        println!("{value}");
    }
    Ok(())
}

/// The plain payload at `path`; `None` for a field resolved to no value.
fn reveal_value(config: &ConfigTree, path: &str) -> Result<Option<String>> {
    match config.get_path(path) {
        Some(ConfigValue::Secret(secret)) => Ok(Some(secret.as_str().to_owned())),
        Some(ConfigValue::Text(text)) => Ok(Some(text.clone())),
        Some(ConfigValue::Null) => Ok(None),
        Some(ConfigValue::Group(_)) => bail!("`{path}` is a group, not a single value"),
        None => bail!("no field `{path}` in `{}`", config.name()),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
