use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tozny_core::{Attribute, AttributeType, Schema};

use crate::error::Result;
use crate::provider::DataSource;
use crate::session::{CredentialSource, Session};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApplicationRoleLookup {
    #[serde(default)]
    pub id: String,
    #[serde(flatten)]
    pub credentials: CredentialSource,
    pub realm_name: String,
    pub application_id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub composite: bool,
    #[serde(default)]
    pub application_role_id: String,
}

/// `tozny_realm_application_role` data source.
pub struct ApplicationRoleDataSource;

#[async_trait]
impl DataSource for ApplicationRoleDataSource {
    type Model = ApplicationRoleLookup;
    const TYPE_NAME: &'static str = "tozny_realm_application_role";

    fn schema() -> Schema {
        CredentialSource::extend_schema(
            Schema::new("Look up an application role by name.")
                .with_attribute(
                    "realm_name",
                    Attribute::required_string("Name of the realm the application belongs to."),
                )
                .with_attribute(
                    "application_id",
                    Attribute::required_string("Service defined identifier for the application."),
                )
                .with_attribute("name", Attribute::required_string("Name of the application role."))
                .with_attribute(
                    "description",
                    Attribute::computed_string("Human readable description of the role."),
                )
                .with_attribute(
                    "composite",
                    Attribute::computed(AttributeType::Bool, "Whether the role is a composite role."),
                )
                .with_attribute(
                    "application_role_id",
                    Attribute::computed_string("Service defined identifier for the application role."),
                ),
        )
    }

    async fn read(
        &self,
        session: &Session,
        mut lookup: ApplicationRoleLookup,
    ) -> Result<ApplicationRoleLookup> {
        let client = session.client_for(&lookup.credentials)?;
        let role = client
            .describe_application_role(
                &lookup.realm_name.to_lowercase(),
                &lookup.application_id,
                &lookup.name,
            )
            .await?;
        lookup.description = role.description;
        lookup.composite = role.composite;
        lookup.application_role_id = role.id.clone();
        lookup.id = role.id;
        Ok(lookup)
    }
}
