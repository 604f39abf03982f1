use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "tozny-provider")]
#[command(about = "Provision Tozny accounts, realms, groups, roles and applications")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// API endpoint (overrides config file and TOZNY_API_ENDPOINT)
    #[arg(short, long, global = true, env = "TOZNY_API_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Config profile name
    #[arg(short, long, global = true, env = "TOZNY_PROFILE", default_value = "default")]
    pub profile: String,

    /// Output format
    #[arg(short, long, global = true)]
    pub format: Option<OutputFormat>,

    /// Provider configuration file (TOML)
    #[arg(short, long, global = true, env = "TOZNY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Account username used to log in when no credentials file is given
    #[arg(long, global = true, env = "TOZNY_ACCOUNT_USERNAME")]
    pub account_username: Option<String>,

    /// Account password
    #[arg(long, global = true, env = "TOZNY_ACCOUNT_PASSWORD", hide_env_values = true)]
    pub account_password: Option<String>,

    /// Client credentials JSON file
    #[arg(long, global = true, env = "TOZNY_CLIENT_CREDENTIALS_FILEPATH")]
    pub credentials: Option<String>,

    /// Log level when RUST_LOG is not set
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,
}

#[derive(Clone, Copy, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Json,
    Yaml,
    Table,
}

impl OutputFormat {
    pub fn parse(value: &str) -> Option<Self> {
        <Self as ValueEnum>::from_str(value, true).ok()
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the provider schema, or the schema of one resource or data source
    Schema(SchemaArgs),
    /// Create a resource from an attribute document
    Create(DocumentArgs),
    /// Refresh a resource from its state document
    Read(DocumentArgs),
    /// Update a resource in place
    Update(UpdateArgs),
    /// Delete a resource
    Delete(DocumentArgs),
    /// Read a data source
    Data(DocumentArgs),
    /// Log in with an account and store its client credentials
    Login(LoginArgs),
    /// Logout (remove stored credentials)
    Logout,
    /// Show the stored credentials for the profile
    Whoami,
    /// Manage CLI configuration
    Config(ConfigArgs),
}

#[derive(clap::Args)]
pub struct SchemaArgs {
    /// Resource or data source type (e.g. tozny_realm)
    pub type_name: Option<String>,
}

#[derive(clap::Args)]
pub struct DocumentArgs {
    /// Resource or data source type (e.g. tozny_realm)
    pub type_name: String,
    /// Path to JSON file (reads from stdin if omitted)
    #[arg(long)]
    pub file: Option<String>,
}

#[derive(clap::Args)]
pub struct UpdateArgs {
    /// Resource type (e.g. tozny_realm_default_groups)
    pub type_name: String,
    /// Prior state document
    #[arg(long)]
    pub prior: String,
    /// Planned document (reads from stdin if omitted)
    #[arg(long)]
    pub file: Option<String>,
}

#[derive(clap::Args)]
pub struct LoginArgs {
    /// Account username
    #[arg(short, long)]
    pub username: Option<String>,
    /// Account password
    #[arg(long)]
    pub password: Option<String>,
}

#[derive(clap::Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show current config
    Show,
    /// Set config value
    Set(ConfigSetArgs),
}

#[derive(clap::Args)]
pub struct ConfigSetArgs {
    /// Key to set (api_endpoint, format)
    pub key: String,
    /// Value
    pub value: String,
}
