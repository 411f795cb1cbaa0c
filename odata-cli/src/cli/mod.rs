//! Command-line front end

pub mod commands;

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::config::ApiConfig;

#[derive(Parser)]
#[command(name = "odata-cli", version, about = "Decode OData payloads and build resource URLs")]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Decode a response body against a schema
    Decode(commands::decode::DecodeCommands),
    /// Render a resource URL from a schema and path pieces
    Url(commands::url::UrlCommands),
}

/// Load a schema file; `.toml` files are TOML, anything else is JSON
pub fn load_config(path: &Path) -> Result<ApiConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read schema file: {}", path.display()))?;

    let is_toml = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("toml"))
        .unwrap_or(false);

    let config = if is_toml {
        ApiConfig::from_toml_str(&content)
    } else {
        let json: serde_json::Value = serde_json::from_str(&content)
            .with_context(|| format!("Schema file is not valid JSON: {}", path.display()))?;
        ApiConfig::from_json(json)
    }
    .with_context(|| format!("Invalid schema file: {}", path.display()))?;

    log::debug!(
        "Loaded {} schema namespace(s) from {}",
        config.schemas.len(),
        path.display()
    );
    Ok(config)
}
