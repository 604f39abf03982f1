//! Provider level configuration.
//!
//! Values come from (lowest to highest priority) built-in defaults, an
//! optional TOML file, `TOZNY_*` environment variables and finally explicit
//! overrides such as CLI flags.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tozny_client::DEFAULT_API_ENDPOINT;
use tozny_core::{Attribute, Schema};
use url::Url;

use crate::error::{ProviderError, Result};

pub const ENV_PREFIX: &str = "TOZNY";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Network location of the account and identity APIs.
    #[serde(default = "default_api_endpoint")]
    pub api_endpoint: String,
    #[serde(default)]
    pub account_username: Option<String>,
    #[serde(default, skip_serializing)]
    pub account_password: Option<String>,
    /// Client credentials JSON to use instead of an account login.
    #[serde(default, alias = "tozny_credentials_json_filepath")]
    pub client_credentials_filepath: Option<String>,
}

fn default_api_endpoint() -> String {
    DEFAULT_API_ENDPOINT.to_string()
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_endpoint: default_api_endpoint(),
            account_username: None,
            account_password: None,
            client_credentials_filepath: None,
        }
    }
}

impl ProviderConfig {
    /// Attribute schema of the provider block.
    pub fn schema() -> Schema {
        Schema::new("Tozny provider configuration")
            .with_attribute(
                "api_endpoint",
                Attribute::optional_string(
                    "Network location for API management and provisioning of Tozny products and services.",
                )
                .with_default(DEFAULT_API_ENDPOINT),
            )
            .with_attribute(
                "account_username",
                Attribute::optional_string(
                    "Tozny account username. Used to derive client credentials where appropriate.",
                ),
            )
            .with_attribute(
                "account_password",
                Attribute::optional_string(
                    "Tozny account password. Used to derive client credentials where appropriate.",
                )
                .sensitive(),
            )
            .with_attribute(
                "client_credentials_filepath",
                Attribute::optional_string("Filepath to Tozny client credentials in JSON format.")
                    .sensitive(),
            )
    }

    /// Build a configuration from a provider block document.
    pub fn from_document(document: &Value) -> Result<Self> {
        let mut document = document.clone();
        if let Some(object) = document.as_object_mut() {
            if let Some(path) = object.remove("tozny_credentials_json_filepath") {
                object.entry("client_credentials_filepath").or_insert(path);
            }
        }
        let config: Self = Self::schema().decode(&document)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let url = Url::parse(&self.api_endpoint).map_err(|e| {
            ProviderError::Config(format!("api_endpoint {:?} is not a URL: {e}", self.api_endpoint))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ProviderError::Config(format!(
                "api_endpoint must use http or https, got {}",
                url.scheme()
            )));
        }
        if self.account_password.is_some() && self.account_username.is_none() {
            return Err(ProviderError::Config(
                "account_password requires account_username".into(),
            ));
        }
        Ok(())
    }

    /// Apply explicit overrides; `None` keeps the current value.
    pub fn with_overrides(
        mut self,
        api_endpoint: Option<String>,
        account_username: Option<String>,
        account_password: Option<String>,
        client_credentials_filepath: Option<String>,
    ) -> Self {
        if let Some(endpoint) = api_endpoint {
            self.api_endpoint = endpoint;
        }
        if account_username.is_some() {
            self.account_username = account_username;
        }
        if account_password.is_some() {
            self.account_password = account_password;
        }
        if client_credentials_filepath.is_some() {
            self.client_credentials_filepath = client_credentials_filepath;
        }
        self
    }

    pub fn account_username(&self) -> &str {
        self.account_username.as_deref().unwrap_or_default()
    }

    pub fn account_password(&self) -> &str {
        self.account_password.as_deref().unwrap_or_default()
    }

    pub fn credentials_filepath(&self) -> Option<&str> {
        self.client_credentials_filepath
            .as_deref()
            .filter(|path| !path.is_empty())
    }
}

pub mod loader {
    use super::*;
    use config::{Config, Environment, File, FileFormat};

    /// Load configuration from an optional TOML file plus `TOZNY_*` environment variables.
    pub fn load_config(path: Option<&Path>) -> Result<ProviderConfig> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            if !path.exists() {
                return Err(ProviderError::Config(format!(
                    "config file not found: {}",
                    path.display()
                )));
            }
            builder = builder.add_source(File::from(path).format(FileFormat::Toml));
        }
        // e.g. TOZNY_API_ENDPOINT, TOZNY_ACCOUNT_USERNAME
        builder = builder.add_source(Environment::with_prefix(ENV_PREFIX));
        let cfg = builder
            .build()
            .map_err(|e| ProviderError::Config(format!("config build error: {e}")))?;
        let mut merged: ProviderConfig = cfg
            .try_deserialize()
            .map_err(|e| ProviderError::Config(format!("config deserialize error: {e}")))?;
        if merged.api_endpoint.is_empty() {
            merged.api_endpoint = default_api_endpoint();
        }
        merged.validate()?;
        Ok(merged)
    }
}
