use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tozny_core::{Attribute, Schema};

use crate::error::{ProviderError, Result};
use crate::provider::Resource;
use crate::resources::generated_id;
use crate::session::{CredentialSource, Session};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientSecretModel {
    #[serde(default)]
    pub id: String,
    #[serde(flatten)]
    pub credentials: CredentialSource,
    pub realm_name: String,
    pub application_id: String,
    #[serde(default)]
    pub secret: String,
    pub persist_client_secret_to_terraform: bool,
    #[serde(default)]
    pub client_secret_save_filepath: String,
}

/// `tozny_realm_application_client_secret`: exposes an application's generated client secret.
pub struct ClientSecretResource;

impl ClientSecretResource {
    async fn fetch(&self, session: &Session, mut model: ClientSecretModel) -> Result<ClientSecretModel> {
        let client = session.client_for(&model.credentials)?;
        let secret = client
            .fetch_application_secret(&model.realm_name.to_lowercase(), &model.application_id)
            .await?
            .secret;

        if !model.client_secret_save_filepath.is_empty() {
            let path = &model.client_secret_save_filepath;
            tokio::fs::write(path, &secret)
                .await
                .map_err(|err| ProviderError::io(path.clone(), err))?;
            tracing::debug!(path = %path, "wrote client secret");
        }
        model.secret = if model.persist_client_secret_to_terraform {
            secret
        } else {
            String::new()
        };
        if model.id.is_empty() {
            model.id = generated_id();
        }
        Ok(model)
    }
}

#[async_trait]
impl Resource for ClientSecretResource {
    type Model = ClientSecretModel;
    const TYPE_NAME: &'static str = "tozny_realm_application_client_secret";

    fn schema() -> Schema {
        CredentialSource::extend_schema(
            Schema::new("The client secret of a confidential realm application.")
                .with_attribute(
                    "realm_name",
                    Attribute::required_string("Name of the realm the application belongs to.")
                        .force_new(),
                )
                .with_attribute(
                    "application_id",
                    Attribute::required_string("Service defined identifier for the application.")
                        .force_new(),
                )
                .with_attribute(
                    "secret",
                    Attribute::computed_string("The application's client secret.").sensitive(),
                )
                .with_attribute(
                    "persist_client_secret_to_terraform",
                    Attribute::optional_bool("Whether the client secret is kept in state.")
                        .with_default(true)
                        .force_new(),
                )
                .with_attribute(
                    "client_secret_save_filepath",
                    Attribute::optional_string("Filepath the client secret is written to.")
                        .with_default("")
                        .force_new(),
                ),
        )
    }

    async fn create(&self, session: &Session, planned: ClientSecretModel) -> Result<ClientSecretModel> {
        self.fetch(session, planned).await
    }

    async fn read(
        &self,
        session: &Session,
        state: ClientSecretModel,
    ) -> Result<Option<ClientSecretModel>> {
        Ok(Some(self.fetch(session, state).await?))
    }

    async fn delete(&self, _session: &Session, _state: ClientSecretModel) -> Result<()> {
        // The secret lives and dies with its application.
        Ok(())
    }
}
