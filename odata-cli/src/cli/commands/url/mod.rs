mod handler;

pub use handler::handle_url_command;

use std::path::PathBuf;

use clap::Args;

#[derive(Args)]
pub struct UrlCommands {
    /// Schema file (TOML or JSON)
    #[arg(long)]
    pub schema: PathBuf,

    /// Entity set to start from
    #[arg(long)]
    pub entity_set: String,

    /// Fully-qualified entity type of the set
    #[arg(long = "type")]
    pub type_name: String,

    /// Key value, or `Name=value,...` for composite keys
    #[arg(long)]
    pub key: Option<String>,

    /// Navigation property to follow (repeatable, applied in order)
    #[arg(long = "nav")]
    pub navigation: Vec<String>,

    /// Address a single property of the final resource
    #[arg(long)]
    pub property: Option<String>,

    /// Address the count of the final resource
    #[arg(long)]
    pub count: bool,

    /// Comma-separated fields for $select
    #[arg(long, value_delimiter = ',')]
    pub select: Vec<String>,

    /// Dotted navigation paths expanded into nested $expand options
    #[arg(long, value_delimiter = ',')]
    pub expand: Vec<String>,

    #[arg(long)]
    pub filter: Option<String>,

    #[arg(long)]
    pub orderby: Option<String>,

    #[arg(long)]
    pub top: Option<u64>,

    #[arg(long)]
    pub skip: Option<u64>,

    #[arg(long)]
    pub search: Option<String>,

    /// Request an inline count alongside results
    #[arg(long)]
    pub inline_count: bool,

    #[arg(long)]
    pub format: Option<String>,

    /// Print only the relative path and query
    #[arg(long)]
    pub relative: bool,
}
