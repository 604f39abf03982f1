mod cli;
mod commands;
mod output;
mod profile;

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use tozny_provider::config::loader;
use tozny_provider::{Provider, ProviderConfig};

use cli::{Cli, Commands, OutputFormat};
use output::print_error;

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    if let Err(e) = run().await {
        print_error(&format!("{e:#}"));
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    tozny_provider::observability::init_tracing(&cli.log_level);

    let profile_name = cli.profile.as_str();
    let profile_cfg = profile::load_profile(profile_name)?;
    let format = cli
        .format
        .or_else(|| profile_cfg.format.as_deref().and_then(OutputFormat::parse))
        .unwrap_or_default();

    match &cli.command {
        Commands::Login(args) => {
            let config = resolve_config(&cli, &profile_cfg)?;
            commands::auth::login(&config.api_endpoint, args, profile_name).await?;
        }
        Commands::Logout => {
            commands::auth::logout(profile_name)?;
        }
        Commands::Whoami => {
            commands::auth::whoami(profile_name)?;
        }
        Commands::Config(args) => match &args.command {
            cli::ConfigCommands::Show => {
                println!("{}: {}", "Profile".cyan(), profile_name);
                println!(
                    "{}: {}",
                    "API endpoint".cyan(),
                    profile_cfg.api_endpoint.as_deref().unwrap_or("(not set)")
                );
                println!(
                    "{}: {}",
                    "Format".cyan(),
                    profile_cfg.format.as_deref().unwrap_or("json")
                );
            }
            cli::ConfigCommands::Set(set_args) => {
                let mut cfg = profile_cfg;
                match set_args.key.as_str() {
                    "api_endpoint" => cfg.api_endpoint = Some(set_args.value.clone()),
                    "format" => {
                        if OutputFormat::parse(&set_args.value).is_none() {
                            anyhow::bail!(
                                "Unknown format: {}. Valid formats: json, yaml, table",
                                set_args.value
                            );
                        }
                        cfg.format = Some(set_args.value.clone());
                    }
                    other => {
                        anyhow::bail!("Unknown config key: {other}. Valid keys: api_endpoint, format")
                    }
                }
                profile::save_profile(profile_name, cfg)?;
                output::print_success(&format!("Set {} = {}", set_args.key, set_args.value));
            }
        },
        Commands::Schema(args) => {
            let provider = Provider::new(tozny_provider::Session::unconfigured(
                ProviderConfig::default(),
                "schema only",
            ));
            commands::crud::schema(&provider, args.type_name.as_deref(), format)?;
        }
        Commands::Create(args) => {
            let provider = make_provider(&cli, &profile_cfg).await?;
            commands::crud::create(&provider, &args.type_name, &args.file, format).await?;
        }
        Commands::Read(args) => {
            let provider = make_provider(&cli, &profile_cfg).await?;
            commands::crud::read(&provider, &args.type_name, &args.file, format).await?;
        }
        Commands::Update(args) => {
            let provider = make_provider(&cli, &profile_cfg).await?;
            commands::crud::update(&provider, &args.type_name, &args.prior, &args.file, format)
                .await?;
        }
        Commands::Delete(args) => {
            let provider = make_provider(&cli, &profile_cfg).await?;
            commands::crud::delete(&provider, &args.type_name, &args.file).await?;
        }
        Commands::Data(args) => {
            let provider = make_provider(&cli, &profile_cfg).await?;
            commands::crud::data(&provider, &args.type_name, &args.file, format).await?;
        }
    }

    Ok(())
}

/// Provider configuration from (lowest to highest) the config file and
/// `TOZNY_*` env, the profile, then flags. Stored login credentials are
/// used when nothing else names a way to authenticate.
fn resolve_config(cli: &Cli, profile_cfg: &profile::ProfileConfig) -> Result<ProviderConfig> {
    let mut config = loader::load_config(cli.config.as_deref())?;
    if let Some(endpoint) = &profile_cfg.api_endpoint {
        config.api_endpoint = endpoint.clone();
    }
    let mut config = config.with_overrides(
        cli.endpoint.clone(),
        cli.account_username.clone(),
        cli.account_password.clone(),
        cli.credentials.clone(),
    );
    if config.credentials_filepath().is_none() && config.account_username.is_none() {
        let stored = profile::credentials_path(&cli.profile)?;
        if stored.exists() {
            config.client_credentials_filepath = Some(stored.display().to_string());
        }
    }
    config.validate()?;
    Ok(config)
}

async fn make_provider(cli: &Cli, profile_cfg: &profile::ProfileConfig) -> Result<Provider> {
    let config = resolve_config(cli, profile_cfg)?;
    Ok(Provider::configure(config).await?)
}
