//! Credential resolution for the provider and per-resource overrides.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tozny_client::{ClientCredentials, ToznyClient};
use tozny_core::{Attribute, Schema};

use crate::config::ProviderConfig;
use crate::error::{ProviderError, Result};

/// Credential override accepted by every resource except `tozny_account`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialSource {
    #[serde(default)]
    pub client_credentials_filepath: String,
    #[serde(default)]
    pub client_credentials_config: String,
}

impl CredentialSource {
    pub fn is_specified(&self) -> bool {
        !self.client_credentials_filepath.is_empty() || !self.client_credentials_config.is_empty()
    }

    /// Add the two mutually exclusive credential attributes to a schema.
    pub fn extend_schema(schema: Schema) -> Schema {
        schema
            .with_attribute(
                "client_credentials_filepath",
                Attribute::optional_string(
                    "The filepath to Tozny client credentials for the provider to use when provisioning this object.",
                )
                .with_default("")
                .force_new()
                .conflicts_with("client_credentials_config"),
            )
            .with_attribute(
                "client_credentials_config",
                Attribute::optional_string("The Tozny account client configuration as a JSON string.")
                    .with_default("")
                    .force_new()
                    .sensitive()
                    .conflicts_with("client_credentials_filepath"),
            )
    }

    fn load(&self) -> Result<ClientCredentials> {
        if !self.client_credentials_config.is_empty() {
            Ok(ClientCredentials::from_json(&self.client_credentials_config)?)
        } else {
            Ok(ClientCredentials::load(&self.client_credentials_filepath)?)
        }
    }
}

/// Configured provider state shared by every handler invocation.
///
/// A failed account login during [`Session::configure`] does not fail
/// configuration: the error is kept and reported by handlers that need the
/// provider level client.
#[derive(Debug)]
pub struct Session {
    config: ProviderConfig,
    client: std::result::Result<Arc<ToznyClient>, String>,
}

impl Session {
    /// Resolve provider credentials: a credentials file first, otherwise an
    /// account login. Top-level username, password and endpoint override
    /// whatever the credentials carried.
    pub async fn configure(config: ProviderConfig) -> Result<Self> {
        config.validate()?;

        let credentials = match config.credentials_filepath() {
            Some(path) => {
                tracing::debug!(path, "loading client credentials from file");
                ClientCredentials::load(path)?
            }
            None if config.account_username().is_empty() => {
                return Ok(Self::unconfigured(
                    config,
                    "set client_credentials_filepath or account_username and account_password",
                ));
            }
            None => match login(&config).await {
                Ok(credentials) => credentials,
                Err(err) => {
                    tracing::warn!(error = %err, "account login failed; provider level client unavailable");
                    return Ok(Self {
                        config,
                        client: Err(err.to_string()),
                    });
                }
            },
        };

        let credentials = apply_overrides(credentials, &config);
        let client = ToznyClient::new(credentials)?;
        tracing::info!(endpoint = client.base_url(), "provider configured");
        Ok(Self {
            config,
            client: Ok(Arc::new(client)),
        })
    }

    /// Session with an already-built provider client.
    pub fn with_client(config: ProviderConfig, client: ToznyClient) -> Self {
        Self {
            config,
            client: Ok(Arc::new(client)),
        }
    }

    /// Session whose provider level client is unavailable.
    pub fn unconfigured(config: ProviderConfig, reason: impl Into<String>) -> Self {
        Self {
            config,
            client: Err(reason.into()),
        }
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    pub fn is_configured(&self) -> bool {
        self.client.is_ok()
    }

    /// Provider level client, or the deferred configuration error.
    pub fn client(&self) -> Result<Arc<ToznyClient>> {
        self.client
            .clone()
            .map_err(ProviderError::NotConfigured)
    }

    /// Client for a resource: its own credentials when specified, else the provider's.
    pub fn client_for(&self, source: &CredentialSource) -> Result<Arc<ToznyClient>> {
        if !source.is_specified() {
            return self.client();
        }
        let credentials = source.load()?;
        Ok(Arc::new(ToznyClient::new(credentials)?))
    }

    /// Unauthenticated client against the configured endpoint.
    pub fn anonymous(&self) -> Result<ToznyClient> {
        Ok(ToznyClient::anonymous(&self.config.api_endpoint)?)
    }
}

async fn login(config: &ProviderConfig) -> Result<ClientCredentials> {
    let client = ToznyClient::anonymous(&config.api_endpoint)?;
    let session = client
        .login(config.account_username(), config.account_password())
        .await?;
    let credentials = session.config.ok_or_else(|| {
        ProviderError::NotConfigured("account login returned no client credentials".into())
    })?;
    tracing::debug!(account_id = %session.account_id, "account login succeeded");
    Ok(credentials)
}

fn apply_overrides(mut credentials: ClientCredentials, config: &ProviderConfig) -> ClientCredentials {
    if !config.account_username().is_empty() {
        credentials.account_username = config.account_username().to_string();
    }
    if !config.account_password().is_empty() {
        credentials.account_password = config.account_password().to_string();
    }
    if !config.api_endpoint.is_empty() {
        credentials.api_url = config.api_endpoint.clone();
    }
    credentials
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_win_over_file_values() {
        let creds = ClientCredentials {
            api_url: "https://old.example".into(),
            account_username: "file@example.com".into(),
            account_password: "file-pw".into(),
            ..Default::default()
        };
        let config = ProviderConfig {
            api_endpoint: "http://localhost:8000".into(),
            account_password: Some("flag-pw".into()),
            account_username: Some("flag@example.com".into()),
            ..Default::default()
        };
        let merged = apply_overrides(creds, &config);
        assert_eq!(merged.api_url, "http://localhost:8000");
        assert_eq!(merged.account_username, "flag@example.com");
        assert_eq!(merged.account_password, "flag-pw");
    }

    #[test]
    fn test_unconfigured_session_defers_error() {
        let session = Session::unconfigured(ProviderConfig::default(), "login failed");
        assert!(!session.is_configured());
        let err = session.client().unwrap_err();
        assert_eq!(err.to_string(), "Provider is not configured: login failed");
    }

    #[test]
    fn test_resource_credentials_bypass_deferred_error() {
        let session = Session::unconfigured(ProviderConfig::default(), "login failed");
        let source = CredentialSource {
            client_credentials_config: r#"{"api_url":"http://localhost:9000","api_key_id":"k","api_secret":"s"}"#.into(),
            ..Default::default()
        };
        let client = session.client_for(&source).unwrap();
        assert_eq!(client.base_url(), "http://localhost:9000");
    }

    #[test]
    fn test_resource_credentials_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("creds.json");
        std::fs::write(&path, r#"{"api_url":"http://localhost:9001","client_id":"c-9"}"#).unwrap();
        let session = Session::unconfigured(ProviderConfig::default(), "unused");
        let source = CredentialSource {
            client_credentials_filepath: path.display().to_string(),
            ..Default::default()
        };
        let client = session.client_for(&source).unwrap();
        assert_eq!(client.credentials().client_id, "c-9");
    }
}
