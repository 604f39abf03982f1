use anyhow::{Context, Result};
use colored::Colorize;
use tozny_client::ToznyClient;

use crate::cli::LoginArgs;
use crate::output::print_success;
use crate::profile;

pub async fn login(endpoint: &str, args: &LoginArgs, profile_name: &str) -> Result<()> {
    let username = args
        .username
        .as_deref()
        .context("--username is required")?;
    let password = args
        .password
        .as_deref()
        .context("--password is required")?;

    let client = ToznyClient::anonymous(endpoint)?;
    let session = client
        .login(username, password)
        .await
        .with_context(|| format!("Login to {endpoint} failed"))?;
    let mut credentials = session
        .config
        .context("Login succeeded but the account returned no client credentials")?;
    if credentials.api_url.is_empty() {
        credentials.api_url = endpoint.to_string();
    }

    let path = profile::save_credentials(profile_name, &credentials)?;
    print_success(&format!(
        "Logged in to {} as {} (credentials saved to {})",
        endpoint.cyan(),
        username.cyan(),
        path.display()
    ));
    Ok(())
}

pub fn logout(profile_name: &str) -> Result<()> {
    if profile::remove_credentials(profile_name)? {
        print_success("Logged out (credentials removed)");
    } else {
        println!("No credentials found for profile \"{profile_name}\"");
    }
    Ok(())
}

pub fn whoami(profile_name: &str) -> Result<()> {
    match profile::load_credentials(profile_name)? {
        Some(credentials) => {
            println!("{}: {}", "Profile".cyan(), profile_name);
            println!("{}: {}", "Endpoint".cyan(), credentials.api_url);
            println!("{}: {}", "Client ID".cyan(), credentials.client_id);
            if !credentials.client_email.is_empty() {
                println!("{}: {}", "Email".cyan(), credentials.client_email);
            }
            if !credentials.account_username.is_empty() {
                println!("{}: {}", "Account".cyan(), credentials.account_username);
            }
        }
        None => {
            println!("Not logged in (profile \"{profile_name}\")");
        }
    }
    Ok(())
}
