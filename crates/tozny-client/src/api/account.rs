//! Account service: account creation, login and client registration tokens.

use reqwest::Method;
use serde::{Deserialize, Serialize};

use crate::client::{Auth, ToznyClient};
use crate::credentials::ClientCredentials;
use crate::error::Result;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptionKey {
    #[serde(default)]
    pub ed25519: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientKey {
    #[serde(default)]
    pub curve25519: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub p384: String,
}

/// Account creator's registration profile.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub account_id: String,
    #[serde(default)]
    pub name: String,
    pub email: String,
    pub authentication_salt: String,
    pub encoding_salt: String,
    pub signing_key: EncryptionKey,
    pub paper_authentication_salt: String,
    pub paper_encoding_salt: String,
    pub paper_signing_key: EncryptionKey,
    #[serde(default)]
    pub verified: bool,
}

/// Account wide settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Account {
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub plan: String,
    pub public_key: ClientKey,
    pub signing_key: EncryptionKey,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateAccountRequest {
    pub profile: Profile,
    pub account: Account,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AccountClient {
    pub client_id: String,
    pub api_key_id: String,
    pub api_secret_key: String,
    #[serde(default)]
    pub public_key: ClientKey,
    #[serde(default)]
    pub signing_key: EncryptionKey,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatedAccount {
    pub client: AccountClient,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateAccountResponse {
    pub profile: Profile,
    pub account: CreatedAccount,
}

/// Registration with server side key generation from a username and password.
#[derive(Debug, Clone, Serialize)]
pub struct RegisterAccountRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisteredAccount {
    pub account_id: String,
    pub config: ClientCredentials,
}

#[derive(Debug, Clone, Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
    #[serde(rename = "type")]
    kind: &'a str,
}

/// Result of an account login.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountSession {
    pub token: String,
    #[serde(default)]
    pub account_id: String,
    /// Credentials of the account's primary client.
    #[serde(default)]
    pub config: Option<ClientCredentials>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPermissions {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub one_time_use: bool,
    #[serde(default)]
    pub allowed_types: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateRegistrationTokenRequest {
    pub name: String,
    pub permissions: TokenPermissions,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegistrationToken {
    #[serde(default)]
    pub name: String,
    pub token: String,
    #[serde(default)]
    pub permissions: TokenPermissions,
}

impl ToznyClient {
    pub async fn create_account(
        &self,
        request: &CreateAccountRequest,
    ) -> Result<CreateAccountResponse> {
        self.call_anonymous(Method::POST, &["v1", "account", "profile"], Some(request))
            .await
    }

    pub async fn register_account(
        &self,
        request: &RegisterAccountRequest,
    ) -> Result<RegisteredAccount> {
        self.call_anonymous(Method::POST, &["v1", "account", "register"], Some(request))
            .await
    }

    /// Log in with account credentials. Does not touch the cached session.
    pub async fn login(&self, username: &str, password: &str) -> Result<AccountSession> {
        let request = LoginRequest {
            username,
            password,
            kind: "password",
        };
        self.call_anonymous(Method::POST, &["v1", "account", "login"], Some(&request))
            .await
    }

    pub async fn create_registration_token(
        &self,
        request: &CreateRegistrationTokenRequest,
    ) -> Result<RegistrationToken> {
        self.call(
            Auth::Account,
            Method::POST,
            &["v1", "account", "tokens"],
            Some(request),
        )
        .await
    }

    pub async fn list_registration_tokens(&self) -> Result<Vec<RegistrationToken>> {
        self.call(
            Auth::Account,
            Method::GET,
            &["v1", "account", "tokens"],
            None::<&()>,
        )
        .await
    }

    pub async fn delete_registration_token(&self, token: &str) -> Result<()> {
        self.call_unit(
            Auth::Account,
            Method::DELETE,
            &["v1", "account", "tokens", token],
            None::<&()>,
        )
        .await
    }
}
