use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tozny_core::{Attribute, AttributeType, PresenceMap, Schema, reconcile};

use crate::error::Result;
use crate::provider::Resource;
use crate::resources::generated_id;
use crate::session::{CredentialSource, Session};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdentityGroupMembershipModel {
    #[serde(default)]
    pub id: String,
    #[serde(flatten)]
    pub credentials: CredentialSource,
    pub realm_name: String,
    pub identity_id: String,
    #[serde(default)]
    pub group_ids: Vec<String>,
}

impl IdentityGroupMembershipModel {
    fn realm(&self) -> String {
        self.realm_name.to_lowercase()
    }

    fn identity(&self) -> String {
        self.identity_id.to_lowercase()
    }
}

/// `tozny_identity_group_membership`: the groups a single realm identity belongs to.
pub struct IdentityGroupMembershipResource;

#[async_trait]
impl Resource for IdentityGroupMembershipResource {
    type Model = IdentityGroupMembershipModel;
    const TYPE_NAME: &'static str = "tozny_identity_group_membership";
    const UPDATABLE: bool = true;

    fn schema() -> Schema {
        CredentialSource::extend_schema(
            Schema::new("Group memberships of a realm identity.")
                .with_attribute(
                    "realm_name",
                    Attribute::required_string("The name of the realm the identity is a part of.")
                        .force_new(),
                )
                .with_attribute(
                    "identity_id",
                    Attribute::required_string(
                        "The Tozny ID (client ID) of the identity to join to the groups in group_ids.",
                    )
                    .force_new(),
                )
                .with_attribute(
                    "group_ids",
                    Attribute::required(
                        AttributeType::StringList,
                        "Service defined identifiers of the groups the identity should be joined to.",
                    ),
                ),
        )
    }

    async fn create(
        &self,
        session: &Session,
        mut planned: IdentityGroupMembershipModel,
    ) -> Result<IdentityGroupMembershipModel> {
        let client = session.client_for(&planned.credentials)?;
        client
            .update_group_membership(&planned.realm(), &planned.identity(), &planned.group_ids)
            .await?;
        planned.id = generated_id();
        Ok(planned)
    }

    async fn read(
        &self,
        session: &Session,
        mut state: IdentityGroupMembershipModel,
    ) -> Result<Option<IdentityGroupMembershipModel>> {
        let client = session.client_for(&state.credentials)?;
        let server = client
            .group_membership(&state.realm(), &state.identity())
            .await?;
        state.group_ids = PresenceMap::new(&state.group_ids, server.ids()).observed();
        Ok(Some(state))
    }

    async fn update(
        &self,
        session: &Session,
        _prior: IdentityGroupMembershipModel,
        planned: IdentityGroupMembershipModel,
    ) -> Result<IdentityGroupMembershipModel> {
        let client = session.client_for(&planned.credentials)?;
        let (realm, identity) = (planned.realm(), planned.identity());
        let server = client.group_membership(&realm, &identity).await?;
        if reconcile(&planned.group_ids, server.ids()).is_empty() {
            return Ok(planned);
        }
        client
            .update_group_membership(&realm, &identity, &planned.group_ids)
            .await?;
        Ok(planned)
    }

    async fn delete(&self, session: &Session, state: IdentityGroupMembershipModel) -> Result<()> {
        let client = session.client_for(&state.credentials)?;
        client
            .update_group_membership(&state.realm(), &state.identity(), &[])
            .await?;
        Ok(())
    }
}
