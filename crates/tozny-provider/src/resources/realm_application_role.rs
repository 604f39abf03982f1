use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tozny_client::Role;
use tozny_core::{Attribute, Schema};

use crate::error::Result;
use crate::provider::Resource;
use crate::session::{CredentialSource, Session};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApplicationRoleModel {
    #[serde(default)]
    pub id: String,
    #[serde(flatten)]
    pub credentials: CredentialSource,
    pub realm_name: String,
    pub application_id: String,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub application_role_id: String,
}

impl ApplicationRoleModel {
    fn realm(&self) -> String {
        self.realm_name.to_lowercase()
    }
}

/// `tozny_realm_application_role`: a role scoped to one application. Addressed by name.
pub struct ApplicationRoleResource;

#[async_trait]
impl Resource for ApplicationRoleResource {
    type Model = ApplicationRoleModel;
    const TYPE_NAME: &'static str = "tozny_realm_application_role";

    fn schema() -> Schema {
        CredentialSource::extend_schema(
            Schema::new("A role scoped to a realm application.")
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
                    "name",
                    Attribute::required_string("User defined identifier for the application role.")
                        .force_new(),
                )
                .with_attribute(
                    "description",
                    Attribute::required_string("Human readable description of the role.").force_new(),
                )
                .with_attribute(
                    "application_role_id",
                    Attribute::computed_string("Service defined identifier for the application role."),
                ),
        )
    }

    async fn create(
        &self,
        session: &Session,
        mut planned: ApplicationRoleModel,
    ) -> Result<ApplicationRoleModel> {
        let client = session.client_for(&planned.credentials)?;
        let role = client
            .create_application_role(
                &planned.realm(),
                &planned.application_id,
                &Role {
                    name: planned.name.clone(),
                    description: planned.description.clone(),
                    ..Default::default()
                },
            )
            .await?;
        planned.application_role_id = role.id.clone();
        planned.id = role.id;
        Ok(planned)
    }

    async fn read(
        &self,
        session: &Session,
        mut state: ApplicationRoleModel,
    ) -> Result<Option<ApplicationRoleModel>> {
        let client = session.client_for(&state.credentials)?;
        let role = client
            .describe_application_role(&state.realm(), &state.application_id, &state.name)
            .await?;
        state.name = role.name;
        state.description = role.description;
        Ok(Some(state))
    }

    async fn delete(&self, session: &Session, state: ApplicationRoleModel) -> Result<()> {
        let client = session.client_for(&state.credentials)?;
        client
            .delete_application_role(&state.realm(), &state.application_id, &state.name)
            .await?;
        Ok(())
    }
}
