//! Async client for the Tozny account and identity management APIs.
//!
//! [`ToznyClient`] wraps a `reqwest` client configured from a
//! [`ClientCredentials`] document. Identity requests are authenticated with a
//! bearer token exchanged for the client's API key; account level requests
//! (registration tokens) use an account login session.
//!
//! ```ignore
//! use tozny_client::{ClientCredentials, ToznyClient};
//!
//! let creds = ClientCredentials::load("tozny_client_credentials.json")?;
//! let client = ToznyClient::new(creds)?;
//! let realm = client.describe_realm("acme").await?;
//! println!("{} is active: {}", realm.name, realm.active);
//! ```

pub mod api;
pub mod client;
pub mod credentials;
pub mod error;

pub use api::account::{
    Account, AccountSession, ClientKey, CreateAccountRequest, CreateAccountResponse,
    CreateRegistrationTokenRequest, EncryptionKey, Profile, RegisterAccountRequest,
    RegisteredAccount, RegistrationToken, TokenPermissions,
};
pub use api::application::{
    AccessControlGroup, AccessControlPolicy, Application, ApplicationList, ApplicationMapper,
    ApplicationSecret, OidcSettings, SamlDescription, SamlSettings,
};
pub use api::federation::{ConnectFederationRequest, FederationConnection};
pub use api::group::{Group, GroupList, RoleMapping};
pub use api::pam::{JiraPlugin, JiraPluginRequest};
pub use api::provider::{ProviderConnectionSettings, ProviderMapper, RealmProvider};
pub use api::realm::{
    CreateRealmRequest, PrivateRealmInfo, Realm, RealmSettingsUpdateRequest, Sovereign,
};
pub use api::role::Role;
pub use client::{DEFAULT_API_ENDPOINT, ToznyClient};
pub use credentials::{AccountCredentialsFile, ClientCredentials};
pub use error::{ClientError, Result};
