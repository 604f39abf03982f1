use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tozny_client::{
    Account, AccountCredentialsFile, ClientCredentials, ClientKey, CreateAccountRequest,
    EncryptionKey, Profile, RegisterAccountRequest,
};
use tozny_core::{Attribute, AttributeType, CoreError, Schema};

use crate::error::{ProviderError, Result};
use crate::provider::Resource;
use crate::session::Session;

pub const DEFAULT_CREDENTIALS_SAVE_FILEPATH: &str = "tozny_client_credentials.json";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KeyBlock {
    pub ed25519_public_key: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientKeyBlock {
    #[serde(default)]
    pub ed25519_public_key: String,
    #[serde(default)]
    pub p384_public_key: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileBlock {
    #[serde(default)]
    pub account_id: String,
    #[serde(default)]
    pub name: String,
    pub email: String,
    pub authentication_salt: String,
    pub encoding_salt: String,
    pub signing_key: Vec<KeyBlock>,
    pub paper_authentication_salt: String,
    pub paper_encoding_salt: String,
    pub paper_signing_key: Vec<KeyBlock>,
    #[serde(default)]
    pub verified: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccountBlock {
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub plan: String,
    pub public_key: Vec<ClientKeyBlock>,
    pub signing_key: Vec<KeyBlock>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccountModel {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub autogenerate_account_credentials: bool,
    #[serde(default)]
    pub account_credentials_filepath: String,
    pub client_credentials_save_filepath: String,
    #[serde(default)]
    pub profile: Vec<ProfileBlock>,
    #[serde(default)]
    pub account: Vec<AccountBlock>,
}

/// `tozny_account`: registers a new account and writes its client credentials to disk.
pub struct AccountResource;

fn encryption_key_schema() -> Schema {
    Schema::new("Public key of a keypair used for encryption or signing.").with_attribute(
        "ed25519_public_key",
        Attribute::required_string("A public key from a keypair based off the Ed25519 curve.")
            .force_new(),
    )
}

fn client_key_schema() -> Schema {
    Schema::new("Public keys of the keypair used for client level operations.")
        .with_attribute(
            "ed25519_public_key",
            Attribute::optional_string("A public key from a keypair based off the Ed25519 curve.")
                .force_new(),
        )
        .with_attribute(
            "p384_public_key",
            Attribute::optional_string("A public key from a keypair based off the P384 curve.")
                .force_new(),
        )
}

fn profile_schema() -> Schema {
    Schema::new("The account creator's profile settings.")
        .with_attribute(
            "account_id",
            Attribute::computed_string("The unique server defined identifier for the account."),
        )
        .with_attribute(
            "name",
            Attribute::optional_string("User defined identifier for the account registration profile.")
                .and_computed(),
        )
        .with_attribute(
            "email",
            Attribute::required_string("The email for the account registration profile.").force_new(),
        )
        .with_attribute(
            "authentication_salt",
            Attribute::required_string("The salt used to generate the authentication keypair.")
                .force_new(),
        )
        .with_attribute(
            "encoding_salt",
            Attribute::required_string("The salt used to generate the encryption keypair.")
                .force_new(),
        )
        .with_attribute(
            "signing_key",
            Attribute::required_block("The public signing key for the profile.", encryption_key_schema())
                .max_items(1)
                .force_new(),
        )
        .with_attribute(
            "paper_authentication_salt",
            Attribute::required_string("The salt used to generate the paper authentication keypair.")
                .force_new(),
        )
        .with_attribute(
            "paper_encoding_salt",
            Attribute::required_string("The salt used to generate the paper encoding keypair.")
                .force_new(),
        )
        .with_attribute(
            "paper_signing_key",
            Attribute::required_block(
                "The paper public signing key for the profile.",
                encryption_key_schema(),
            )
            .max_items(1)
            .force_new(),
        )
        .with_attribute(
            "verified",
            Attribute::computed(
                AttributeType::Bool,
                "Whether or not the email for the account profile has been verified.",
            ),
        )
}

fn account_schema() -> Schema {
    Schema::new("Account wide settings.")
        .with_attribute(
            "company",
            Attribute::optional_string("Billing name of the account holder's organization."),
        )
        .with_attribute(
            "plan",
            Attribute::optional_string("Tozny billing plan associated with the account."),
        )
        .with_attribute(
            "public_key",
            Attribute::required_block(
                "The public key of the keypair used for account level encryption operations.",
                client_key_schema(),
            )
            .max_items(1)
            .force_new(),
        )
        .with_attribute(
            "signing_key",
            Attribute::required_block(
                "The public key of the keypair used for account level signing operations.",
                encryption_key_schema(),
            )
            .max_items(1)
            .force_new(),
        )
}

fn first_key(keys: &[KeyBlock], name: &str) -> Result<EncryptionKey> {
    keys.first()
        .map(|key| EncryptionKey {
            ed25519: key.ed25519_public_key.clone(),
        })
        .ok_or_else(|| CoreError::missing(name).into())
}

impl AccountModel {
    /// Create-account request built from inline `profile` and `account` blocks.
    fn request_from_blocks(&self) -> Result<CreateAccountRequest> {
        let profile = self
            .profile
            .first()
            .ok_or_else(|| CoreError::missing("profile"))?;
        let account = self
            .account
            .first()
            .ok_or_else(|| CoreError::missing("account"))?;
        let public_key = account
            .public_key
            .first()
            .ok_or_else(|| CoreError::missing("account.0.public_key"))?;

        Ok(CreateAccountRequest {
            profile: Profile {
                name: profile.name.clone(),
                email: profile.email.clone(),
                authentication_salt: profile.authentication_salt.clone(),
                encoding_salt: profile.encoding_salt.clone(),
                signing_key: first_key(&profile.signing_key, "profile.0.signing_key")?,
                paper_authentication_salt: profile.paper_authentication_salt.clone(),
                paper_encoding_salt: profile.paper_encoding_salt.clone(),
                paper_signing_key: first_key(
                    &profile.paper_signing_key,
                    "profile.0.paper_signing_key",
                )?,
                ..Default::default()
            },
            account: Account {
                company: account.company.clone(),
                plan: account.plan.clone(),
                public_key: ClientKey {
                    curve25519: public_key.ed25519_public_key.clone(),
                    p384: public_key.p384_public_key.clone(),
                },
                signing_key: first_key(&account.signing_key, "account.0.signing_key")?,
            },
        })
    }
}

impl AccountResource {
    async fn autogenerate(&self, session: &Session) -> Result<(String, ClientCredentials)> {
        let config = session.config();
        let username = config.account_username();
        if username.is_empty() {
            return Err(ProviderError::invalid(
                "account_username",
                "must be set on the provider when autogenerating account credentials",
            ));
        }
        let password = match config.account_password() {
            "" => uuid::Uuid::new_v4().to_string(),
            password => password.to_string(),
        };

        let registered = session
            .anonymous()?
            .register_account(&RegisterAccountRequest {
                name: username.to_string(),
                email: username.to_string(),
                password: password.clone(),
            })
            .await?;

        let credentials = ClientCredentials {
            account_username: username.to_lowercase(),
            account_password: password,
            ..registered.config
        };
        Ok((registered.account_id, credentials))
    }

    async fn create_from_request(
        &self,
        session: &Session,
        state: &mut AccountModel,
    ) -> Result<(String, ClientCredentials)> {
        let (request, username, password) = if state.account_credentials_filepath.is_empty() {
            (state.request_from_blocks()?, String::new(), String::new())
        } else {
            let file = AccountCredentialsFile::load(&state.account_credentials_filepath)?;
            (
                CreateAccountRequest {
                    profile: file.profile,
                    account: file.account,
                },
                file.account_username,
                file.account_password,
            )
        };

        let created = session.anonymous()?.create_account(&request).await?;
        let client = created.account.client;

        if let Some(profile) = state.profile.first_mut() {
            profile.account_id = created.profile.account_id.clone();
            profile.verified = created.profile.verified;
            if profile.name.is_empty() {
                profile.name = created.profile.name.clone();
            }
        }

        let credentials = ClientCredentials {
            version: 2,
            api_url: session.config().api_endpoint.clone(),
            api_key_id: client.api_key_id,
            api_secret: client.api_secret_key,
            client_id: client.client_id,
            client_email: created.profile.email,
            public_key: client.public_key.curve25519,
            public_signing_key: client.signing_key.ed25519,
            account_username: username.to_lowercase(),
            account_password: password,
            ..Default::default()
        };
        Ok((created.profile.account_id, credentials))
    }
}

#[async_trait]
impl Resource for AccountResource {
    type Model = AccountModel;
    const TYPE_NAME: &'static str = "tozny_account";

    fn schema() -> Schema {
        Schema::new("Provisions a Tozny account and persists its client credentials.")
            .with_attribute(
                "autogenerate_account_credentials",
                Attribute::optional_bool(
                    "Whether to generate credentials for the provisioned account from the provider's account username and password.",
                )
                .with_default(false)
                .force_new()
                .conflicts_with("account")
                .conflicts_with("profile")
                .conflicts_with("account_credentials_filepath"),
            )
            .with_attribute(
                "account_credentials_filepath",
                Attribute::optional_string("The filepath where account credentials will be loaded from.")
                    .with_default("")
                    .force_new(),
            )
            .with_attribute(
                "client_credentials_save_filepath",
                Attribute::optional_string("The filepath where client credentials will be persisted.")
                    .with_default(DEFAULT_CREDENTIALS_SAVE_FILEPATH)
                    .force_new(),
            )
            .with_attribute(
                "profile",
                Attribute::optional_block("The account creator's profile settings.", profile_schema())
                    .max_items(1)
                    .force_new(),
            )
            .with_attribute(
                "account",
                Attribute::optional_block("Account wide settings.", account_schema())
                    .max_items(1)
                    .force_new(),
            )
    }

    async fn create(&self, session: &Session, mut planned: AccountModel) -> Result<AccountModel> {
        let (account_id, credentials) = if planned.autogenerate_account_credentials {
            self.autogenerate(session).await?
        } else {
            self.create_from_request(session, &mut planned).await?
        };

        credentials.save(&planned.client_credentials_save_filepath)?;
        tracing::debug!(
            path = %planned.client_credentials_save_filepath,
            client_id = %credentials.client_id,
            "saved client credentials"
        );

        planned.id = account_id;
        Ok(planned)
    }

    async fn read(&self, _session: &Session, state: AccountModel) -> Result<Option<AccountModel>> {
        // Accounts have no read endpoint; state is kept as written.
        Ok(Some(state))
    }

    async fn delete(&self, _session: &Session, state: AccountModel) -> Result<()> {
        // Accounts cannot be deleted through the API, only forgotten.
        tracing::debug!(account_id = %state.id, "removing account from state only");
        Ok(())
    }
}
