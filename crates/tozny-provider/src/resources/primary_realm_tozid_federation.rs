use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tozny_core::{Attribute, Schema};

use crate::error::Result;
use crate::provider::Resource;
use crate::session::{CredentialSource, Session};

pub const DEFAULT_FEDERATION_SOURCE: &str = "tozid";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PrimaryRealmFederationModel {
    #[serde(default)]
    pub id: String,
    #[serde(flatten)]
    pub credentials: CredentialSource,
    pub federation_source: String,
    pub realm_name: String,
    #[serde(default)]
    pub connection_id: String,
    #[serde(default)]
    pub api_credential: String,
}

/// `tozny_primary_realm_tozid_federation`: opens a federation connection on the primary realm.
pub struct PrimaryRealmFederationResource;

#[async_trait]
impl Resource for PrimaryRealmFederationResource {
    type Model = PrimaryRealmFederationModel;
    const TYPE_NAME: &'static str = "tozny_primary_realm_tozid_federation";

    fn schema() -> Schema {
        CredentialSource::extend_schema(
            Schema::new("Primary side of a TozID realm federation.")
                .with_attribute(
                    "federation_source",
                    Attribute::optional_string("The federation source for the connection.")
                        .with_default(DEFAULT_FEDERATION_SOURCE)
                        .force_new(),
                )
                .with_attribute(
                    "realm_name",
                    Attribute::required_string("Name of the primary realm.").force_new(),
                )
                .with_attribute(
                    "connection_id",
                    Attribute::computed_string("Server defined identifier for the connection."),
                )
                .with_attribute(
                    "api_credential",
                    Attribute::computed_string("Credential the shadow realm uses to connect.")
                        .sensitive(),
                ),
        )
    }

    async fn create(
        &self,
        session: &Session,
        mut planned: PrimaryRealmFederationModel,
    ) -> Result<PrimaryRealmFederationModel> {
        let client = session.client_for(&planned.credentials)?;
        let connection = client
            .initiate_federation_connection(&planned.realm_name, &planned.federation_source)
            .await?;
        planned.id = connection.connection_id.clone();
        planned.connection_id = connection.connection_id;
        planned.api_credential = connection.api_credential;
        Ok(planned)
    }

    async fn read(
        &self,
        _session: &Session,
        state: PrimaryRealmFederationModel,
    ) -> Result<Option<PrimaryRealmFederationModel>> {
        Ok(Some(state))
    }

    async fn delete(&self, _session: &Session, _state: PrimaryRealmFederationModel) -> Result<()> {
        // No endpoint tears a connection down; only state is dropped.
        Ok(())
    }
}
