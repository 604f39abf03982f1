use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::api::account::{Account, Profile};
use crate::error::{ClientError, Result};

/// Client credentials document, as written by account creation and read back
/// from `client_credentials_filepath` / `client_credentials_config`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientCredentials {
    #[serde(default)]
    pub version: i32,
    #[serde(default)]
    pub api_url: String,
    #[serde(default)]
    pub api_key_id: String,
    #[serde(default)]
    pub api_secret: String,
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub client_email: String,
    #[serde(default)]
    pub public_key: String,
    #[serde(default)]
    pub private_key: String,
    #[serde(default)]
    pub public_signing_key: String,
    #[serde(default)]
    pub private_signing_key: String,
    #[serde(default)]
    pub account_username: String,
    #[serde(default)]
    pub account_password: String,
}

impl ClientCredentials {
    /// Parse credentials from an inline JSON document.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ClientError::CredentialsFile {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&content)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).map_err(|source| ClientError::CredentialsFile {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn has_api_key(&self) -> bool {
        !self.api_key_id.is_empty() && !self.api_secret.is_empty()
    }

    pub fn has_account_login(&self) -> bool {
        !self.account_username.is_empty() && !self.account_password.is_empty()
    }
}

/// Account credentials file used to create an account from pre-generated
/// profile and key material.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccountCredentialsFile {
    #[serde(default, rename = "api_url")]
    pub api_endpoint: String,
    #[serde(default)]
    pub account_username: String,
    #[serde(default)]
    pub account_password: String,
    #[serde(rename = "Account", alias = "account")]
    pub account: Account,
    #[serde(rename = "Profile", alias = "profile")]
    pub profile: Profile,
}

impl AccountCredentialsFile {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ClientError::CredentialsFile {
            path: path.display().to_string(),
            source,
        })?;
        Ok(serde_json::from_str(&content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_partial_credentials() {
        let creds = ClientCredentials::from_json(
            r#"{"api_url":"https://api.e3db.com","api_key_id":"key","api_secret":"secret","client_id":"c-1"}"#,
        )
        .unwrap();
        assert_eq!(creds.api_url, "https://api.e3db.com");
        assert_eq!(creds.client_id, "c-1");
        assert!(creds.has_api_key());
        assert!(!creds.has_account_login());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("creds.json");
        let creds = ClientCredentials {
            version: 2,
            api_url: "http://localhost:8000".into(),
            account_username: "ops@example.com".into(),
            account_password: "pw".into(),
            ..Default::default()
        };
        creds.save(&path).unwrap();
        let loaded = ClientCredentials::load(&path).unwrap();
        assert_eq!(loaded, creds);
    }

    #[test]
    fn test_missing_file_reports_path() {
        let err = ClientCredentials::load("/nonexistent/tozny/creds.json").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/tozny/creds.json"));
    }

    #[test]
    fn test_account_credentials_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("account.json");
        std::fs::write(
            &path,
            r#"{
                "api_url": "https://api.e3db.com",
                "account_username": "ops@example.com",
                "account_password": "",
                "Account": {
                    "company": "Acme",
                    "plan": "free0",
                    "public_key": {"curve25519": "pub"},
                    "signing_key": {"ed25519": "sig"}
                },
                "Profile": {
                    "name": "ops",
                    "email": "ops@example.com",
                    "authentication_salt": "a",
                    "encoding_salt": "e",
                    "signing_key": {"ed25519": "s"},
                    "paper_authentication_salt": "pa",
                    "paper_encoding_salt": "pe",
                    "paper_signing_key": {"ed25519": "ps"}
                }
            }"#,
        )
        .unwrap();
        let file = AccountCredentialsFile::load(&path).unwrap();
        assert_eq!(file.account.company, "Acme");
        assert_eq!(file.profile.signing_key.ed25519, "s");
    }
}
