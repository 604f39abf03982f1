use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tozny_client::ConnectFederationRequest;
use tozny_core::{Attribute, AttributeType, CoreError, Schema};

use crate::error::Result;
use crate::provider::Resource;
use crate::resources::primary_realm_tozid_federation::DEFAULT_FEDERATION_SOURCE;
use crate::session::{CredentialSource, Session};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShadowRealmFederationModel {
    #[serde(default)]
    pub id: String,
    #[serde(flatten)]
    pub credentials: CredentialSource,
    pub federation_source: String,
    pub realm_name: String,
    #[serde(default)]
    pub primary_realm_name: String,
    pub api_credential: String,
    pub primary_realm_endpoint: String,
    pub active: bool,
    pub sync: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sync_frequency: Option<i64>,
    pub connection_id: String,
}

impl ShadowRealmFederationModel {
    fn request(&self) -> Result<ConnectFederationRequest> {
        let connection_id = uuid::Uuid::parse_str(&self.connection_id)
            .map_err(|err| CoreError::invalid("connection_id", err.to_string()))?;
        let primary_realm_name = if self.primary_realm_name.is_empty() {
            self.realm_name.clone()
        } else {
            self.primary_realm_name.clone()
        };
        Ok(ConnectFederationRequest {
            federation_source: self.federation_source.clone(),
            primary_realm_name,
            primary_realm_endpoint: self.primary_realm_endpoint.clone(),
            connection_id: connection_id.to_string(),
            api_credential: self.api_credential.clone(),
            active: self.active,
            sync: self.sync,
            sync_frequency: self.sync_frequency,
        })
    }
}

/// `tozny_shadow_realm_tozid_federation`: connects a shadow realm to a primary realm.
pub struct ShadowRealmFederationResource;

#[async_trait]
impl Resource for ShadowRealmFederationResource {
    type Model = ShadowRealmFederationModel;
    const TYPE_NAME: &'static str = "tozny_shadow_realm_tozid_federation";

    fn schema() -> Schema {
        CredentialSource::extend_schema(
            Schema::new("Shadow side of a TozID realm federation.")
                .with_attribute(
                    "federation_source",
                    Attribute::optional_string("The federation source for the connection.")
                        .with_default(DEFAULT_FEDERATION_SOURCE)
                        .force_new(),
                )
                .with_attribute(
                    "realm_name",
                    Attribute::required_string("Name of the shadow realm.").force_new(),
                )
                .with_attribute(
                    "primary_realm_name",
                    Attribute::optional_string("Name of the primary realm. Defaults to realm_name.")
                        .and_computed()
                        .force_new(),
                )
                .with_attribute(
                    "api_credential",
                    Attribute::required_string("Credential issued by the primary realm's federation.")
                        .force_new()
                        .sensitive(),
                )
                .with_attribute(
                    "primary_realm_endpoint",
                    Attribute::required_string("API endpoint of the primary realm's deployment.")
                        .force_new(),
                )
                .with_attribute(
                    "active",
                    Attribute::optional_bool("Whether the connection is active.")
                        .with_default(true)
                        .force_new(),
                )
                .with_attribute(
                    "sync",
                    Attribute::optional_bool("Whether identities are synced from the primary realm.")
                        .with_default(true)
                        .force_new(),
                )
                .with_attribute(
                    "sync_frequency",
                    Attribute::optional(AttributeType::Int, "Seconds between identity syncs.")
                        .force_new(),
                )
                .with_attribute(
                    "connection_id",
                    Attribute::required_string(
                        "Connection identifier issued when the primary realm initiated federation.",
                    )
                    .force_new(),
                ),
        )
    }

    async fn create(
        &self,
        session: &Session,
        mut planned: ShadowRealmFederationModel,
    ) -> Result<ShadowRealmFederationModel> {
        let request = planned.request()?;
        let client = session.client_for(&planned.credentials)?;
        client
            .configure_federation_connection(&planned.realm_name, &request)
            .await?;
        planned.primary_realm_name = request.primary_realm_name;
        planned.id = planned.connection_id.clone();
        Ok(planned)
    }

    async fn read(
        &self,
        _session: &Session,
        state: ShadowRealmFederationModel,
    ) -> Result<Option<ShadowRealmFederationModel>> {
        Ok(Some(state))
    }

    async fn delete(&self, _session: &Session, _state: ShadowRealmFederationModel) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn decode(document: serde_json::Value) -> ShadowRealmFederationModel {
        ShadowRealmFederationResource::schema().decode(&document).unwrap()
    }

    #[test]
    fn test_primary_realm_defaults_to_realm_name() {
        let model = decode(json!({
            "realm_name": "shadow",
            "api_credential": "cred",
            "primary_realm_endpoint": "https://primary.example",
            "connection_id": "9b2d9f8e-2c55-4a4e-9a57-0a6f3f8a1c11"
        }));
        let request = model.request().unwrap();
        assert_eq!(request.primary_realm_name, "shadow");
        assert_eq!(request.federation_source, "tozid");
        assert!(request.active && request.sync);
        assert_eq!(request.sync_frequency, None);
    }

    #[test]
    fn test_connection_id_must_be_uuid() {
        let model = decode(json!({
            "realm_name": "shadow",
            "api_credential": "cred",
            "primary_realm_endpoint": "https://primary.example",
            "connection_id": "not-a-uuid",
            "sync_frequency": 300
        }));
        assert_eq!(model.sync_frequency, Some(300));
        let err = model.request().unwrap_err();
        assert!(err.to_string().contains("connection_id"));
    }
}
