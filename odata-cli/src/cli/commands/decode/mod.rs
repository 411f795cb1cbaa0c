mod handler;

pub use handler::handle_decode_command;

use std::path::PathBuf;

use clap::{Args, ValueEnum};

#[derive(Args)]
pub struct DecodeCommands {
    /// Schema file (TOML or JSON)
    #[arg(long)]
    pub schema: PathBuf,

    /// Fully-qualified type the payload is expected to carry
    #[arg(long = "type")]
    pub type_name: String,

    /// Response body file
    #[arg(long)]
    pub body: PathBuf,

    /// Which payload shape to extract
    #[arg(long, value_enum, default_value_t = PayloadKind::Entity)]
    pub kind: PayloadKind,

    /// Response header as 'Name: value' (repeatable)
    #[arg(long = "header", short = 'H')]
    pub headers: Vec<String>,

    /// HTTP status the body arrived with
    #[arg(long, default_value_t = 200)]
    pub status: u16,

    /// Print compact JSON
    #[arg(long)]
    pub compact: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PayloadKind {
    Entity,
    Entities,
    Property,
    Value,
}
