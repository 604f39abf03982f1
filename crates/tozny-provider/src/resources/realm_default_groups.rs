use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tozny_core::{Attribute, AttributeType, PresenceMap, Schema, reconcile};

use crate::error::Result;
use crate::provider::Resource;
use crate::resources::generated_id;
use crate::session::{CredentialSource, Session};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DefaultGroupsModel {
    #[serde(default)]
    pub id: String,
    #[serde(flatten)]
    pub credentials: CredentialSource,
    pub realm_name: String,
    #[serde(default)]
    pub group_ids: Vec<String>,
}

impl DefaultGroupsModel {
    fn realm(&self) -> String {
        self.realm_name.to_lowercase()
    }
}

/// `tozny_realm_default_groups`: groups every new realm identity joins.
pub struct DefaultGroupsResource;

#[async_trait]
impl Resource for DefaultGroupsResource {
    type Model = DefaultGroupsModel;
    const TYPE_NAME: &'static str = "tozny_realm_default_groups";
    const UPDATABLE: bool = true;

    fn schema() -> Schema {
        CredentialSource::extend_schema(
            Schema::new("The set of default groups for a realm.")
                .with_attribute(
                    "realm_name",
                    Attribute::required_string("Name of the realm whose default groups are managed.")
                        .force_new(),
                )
                .with_attribute(
                    "group_ids",
                    Attribute::required(
                        AttributeType::StringList,
                        "IDs of the groups new identities are added to.",
                    ),
                ),
        )
    }

    async fn create(
        &self,
        session: &Session,
        mut planned: DefaultGroupsModel,
    ) -> Result<DefaultGroupsModel> {
        let client = session.client_for(&planned.credentials)?;
        client
            .replace_realm_default_groups(&planned.realm(), &planned.group_ids)
            .await?;
        planned.id = generated_id();
        Ok(planned)
    }

    async fn read(
        &self,
        session: &Session,
        mut state: DefaultGroupsModel,
    ) -> Result<Option<DefaultGroupsModel>> {
        let client = session.client_for(&state.credentials)?;
        let server = client.list_realm_default_groups(&state.realm()).await?;
        let presence = PresenceMap::new(&state.group_ids, server.ids());
        state.group_ids = presence.observed();
        Ok(Some(state))
    }

    async fn update(
        &self,
        session: &Session,
        _prior: DefaultGroupsModel,
        planned: DefaultGroupsModel,
    ) -> Result<DefaultGroupsModel> {
        let client = session.client_for(&planned.credentials)?;
        let realm = planned.realm();
        let server = client.list_realm_default_groups(&realm).await?;
        let delta = reconcile(&planned.group_ids, server.ids());
        if delta.is_empty() {
            return Ok(planned);
        }
        client
            .replace_realm_default_groups(&realm, &planned.group_ids)
            .await?;
        Ok(planned)
    }

    async fn delete(&self, session: &Session, state: DefaultGroupsModel) -> Result<()> {
        let client = session.client_for(&state.credentials)?;
        client
            .replace_realm_default_groups(&state.realm(), &[])
            .await?;
        Ok(())
    }
}
