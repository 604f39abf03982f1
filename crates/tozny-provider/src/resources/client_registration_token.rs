use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tozny_client::{CreateRegistrationTokenRequest, TokenPermissions};
use tozny_core::{Attribute, AttributeType, CoreError, Schema};

use crate::error::Result;
use crate::provider::Resource;
use crate::session::{CredentialSource, Session};

/// Client types a registration token may be restricted to.
pub const CLIENT_TYPES: [&str; 3] = ["general", "identity", "broker"];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientRegistrationTokenModel {
    #[serde(default)]
    pub id: String,
    #[serde(flatten)]
    pub credentials: CredentialSource,
    pub name: String,
    pub allowed_registration_client_types: Vec<String>,
    pub enabled: bool,
    pub one_time_use: bool,
    #[serde(default)]
    pub token: String,
}

pub struct ClientRegistrationTokenResource;

impl ClientRegistrationTokenModel {
    fn check_client_types(&self) -> Result<()> {
        if self.allowed_registration_client_types.is_empty() {
            return Err(CoreError::invalid(
                "allowed_registration_client_types",
                "at least one client type is required",
            )
            .into());
        }
        if let Some(unknown) = self
            .allowed_registration_client_types
            .iter()
            .find(|kind| !CLIENT_TYPES.contains(&kind.as_str()))
        {
            return Err(CoreError::invalid(
                "allowed_registration_client_types",
                format!("unknown client type {unknown:?}, expected one of {CLIENT_TYPES:?}"),
            )
            .into());
        }
        Ok(())
    }
}

#[async_trait]
impl Resource for ClientRegistrationTokenResource {
    type Model = ClientRegistrationTokenModel;
    const TYPE_NAME: &'static str = "tozny_client_registration_token";

    fn schema() -> Schema {
        CredentialSource::extend_schema(
            Schema::new("Token for registering clients with a Tozny account.")
                .with_attribute(
                    "name",
                    Attribute::required_string("User defined identifier for the token.").force_new(),
                )
                .with_attribute(
                    "allowed_registration_client_types",
                    Attribute::required(
                        AttributeType::StringList,
                        "Types of clients the token may register (general, identity, broker).",
                    )
                    .force_new(),
                )
                .with_attribute(
                    "enabled",
                    Attribute::optional_bool("Whether the token may be used to register clients.")
                        .with_default(true)
                        .force_new(),
                )
                .with_attribute(
                    "one_time_use",
                    Attribute::optional_bool("Whether the token is invalidated after a single use.")
                        .with_default(false)
                        .force_new(),
                )
                .with_attribute(
                    "token",
                    Attribute::computed_string("The registration token value.").sensitive(),
                ),
        )
    }

    async fn create(
        &self,
        session: &Session,
        mut planned: ClientRegistrationTokenModel,
    ) -> Result<ClientRegistrationTokenModel> {
        planned.check_client_types()?;
        let client = session.client_for(&planned.credentials)?;

        let created = client
            .create_registration_token(&CreateRegistrationTokenRequest {
                name: planned.name.clone(),
                permissions: TokenPermissions {
                    enabled: planned.enabled,
                    one_time_use: planned.one_time_use,
                    allowed_types: planned.allowed_registration_client_types.clone(),
                },
            })
            .await?;

        planned.token = created.token;
        planned.id = format!("{}{}", OffsetDateTime::now_utc().unix_timestamp(), planned.name);
        Ok(planned)
    }

    async fn read(
        &self,
        session: &Session,
        mut state: ClientRegistrationTokenModel,
    ) -> Result<Option<ClientRegistrationTokenModel>> {
        let client = session.client_for(&state.credentials)?;
        let tokens = client.list_registration_tokens().await?;

        match tokens
            .into_iter()
            .find(|token| token.name == state.name && token.token == state.token)
        {
            Some(token) => {
                state.enabled = token.permissions.enabled;
                state.one_time_use = token.permissions.one_time_use;
                if !token.permissions.allowed_types.is_empty() {
                    state.allowed_registration_client_types = token.permissions.allowed_types;
                }
            }
            None => {
                // A consumed or revoked token disappears from the listing.
                tracing::debug!(name = %state.name, "registration token no longer listed");
                state.token.clear();
                state.enabled = false;
            }
        }
        Ok(Some(state))
    }

    async fn delete(&self, session: &Session, state: ClientRegistrationTokenModel) -> Result<()> {
        if state.token.is_empty() {
            return Ok(());
        }
        let client = session.client_for(&state.credentials)?;
        match client.delete_registration_token(&state.token).await {
            Err(err) if err.is_not_found() => Ok(()),
            other => Ok(other?),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model(types: &[&str]) -> ClientRegistrationTokenModel {
        ClientRegistrationTokenModel {
            name: "ci".into(),
            allowed_registration_client_types: types.iter().map(|t| t.to_string()).collect(),
            enabled: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_client_types_validated() {
        model(&["general", "broker"]).check_client_types().unwrap();
        assert!(model(&[]).check_client_types().is_err());
        let err = model(&["general", "robot"]).check_client_types().unwrap_err();
        assert!(err.to_string().contains("robot"));
    }

    #[test]
    fn test_schema_defaults() {
        let decoded: ClientRegistrationTokenModel = ClientRegistrationTokenResource::schema()
            .decode(&serde_json::json!({
                "name": "ci",
                "allowed_registration_client_types": ["general"]
            }))
            .unwrap();
        assert!(decoded.enabled);
        assert!(!decoded.one_time_use);
        assert!(decoded.token.is_empty());
        assert!(!decoded.credentials.is_specified());
    }
}
