use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tozny_client::Group;
use tozny_core::{Attribute, Schema};

use crate::error::Result;
use crate::provider::Resource;
use crate::session::{CredentialSource, Session};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RealmGroupModel {
    #[serde(default)]
    pub id: String,
    #[serde(flatten)]
    pub credentials: CredentialSource,
    pub realm_name: String,
    pub name: String,
    #[serde(default)]
    pub group_id: String,
}

/// `tozny_realm_group`
pub struct RealmGroupResource;

#[async_trait]
impl Resource for RealmGroupResource {
    type Model = RealmGroupModel;
    const TYPE_NAME: &'static str = "tozny_realm_group";

    fn schema() -> Schema {
        CredentialSource::extend_schema(
            Schema::new("A group of identities within a realm.")
                .with_attribute(
                    "realm_name",
                    Attribute::required_string("Name of the realm the group belongs to.").force_new(),
                )
                .with_attribute(
                    "name",
                    Attribute::required_string("Human readable name for the group.").force_new(),
                )
                .with_attribute(
                    "group_id",
                    Attribute::computed_string("Server defined identifier for the group."),
                ),
        )
    }

    async fn create(&self, session: &Session, mut planned: RealmGroupModel) -> Result<RealmGroupModel> {
        let client = session.client_for(&planned.credentials)?;
        let group = client
            .create_realm_group(
                &planned.realm_name,
                &Group {
                    name: planned.name.clone(),
                    ..Default::default()
                },
            )
            .await?;
        planned.group_id = group.id.clone();
        planned.id = group.id;
        Ok(planned)
    }

    async fn read(
        &self,
        session: &Session,
        mut state: RealmGroupModel,
    ) -> Result<Option<RealmGroupModel>> {
        let client = session.client_for(&state.credentials)?;
        let group = client
            .describe_realm_group(&state.realm_name, &state.group_id)
            .await?;
        state.name = group.name;
        Ok(Some(state))
    }

    async fn delete(&self, session: &Session, state: RealmGroupModel) -> Result<()> {
        let client = session.client_for(&state.credentials)?;
        client
            .delete_realm_group(&state.realm_name, &state.group_id)
            .await?;
        Ok(())
    }
}
