use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tozny_client::{ClientError, Role};
use tozny_core::{Attribute, AttributeType, Schema};

use crate::error::Result;
use crate::provider::DataSource;
use crate::session::{CredentialSource, Session};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RealmRoleLookup {
    #[serde(default)]
    pub id: String,
    #[serde(flatten)]
    pub credentials: CredentialSource,
    pub realm_name: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub composite: bool,
    #[serde(default)]
    pub realm_role_id: String,
}

fn find_role(roles: Vec<Role>, name: &str) -> Option<Role> {
    roles.into_iter().find(|role| role.name == name)
}

/// `tozny_realm_role` data source: looks a realm role up by name.
pub struct RealmRoleDataSource;

#[async_trait]
impl DataSource for RealmRoleDataSource {
    type Model = RealmRoleLookup;
    const TYPE_NAME: &'static str = "tozny_realm_role";

    fn schema() -> Schema {
        CredentialSource::extend_schema(
            Schema::new("Look up a realm role by name.")
                .with_attribute(
                    "realm_name",
                    Attribute::required_string("Name of the realm the role belongs to."),
                )
                .with_attribute("name", Attribute::required_string("Name of the role."))
                .with_attribute(
                    "description",
                    Attribute::computed_string("Human readable description of the role."),
                )
                .with_attribute(
                    "composite",
                    Attribute::computed(AttributeType::Bool, "Whether the role is a composite role."),
                )
                .with_attribute(
                    "realm_role_id",
                    Attribute::computed_string("Service defined identifier for the role."),
                ),
        )
    }

    async fn read(&self, session: &Session, mut lookup: RealmRoleLookup) -> Result<RealmRoleLookup> {
        let client = session.client_for(&lookup.credentials)?;
        let roles = client.list_realm_roles(&lookup.realm_name).await?;
        let role = find_role(roles, &lookup.name).ok_or_else(|| {
            ClientError::NotFound(format!(
                "realm role {:?} in realm {:?}",
                lookup.name, lookup.realm_name
            ))
        })?;

        lookup.description = role.description;
        lookup.composite = role.composite;
        lookup.realm_role_id = role.id.clone();
        lookup.id = role.id;
        Ok(lookup)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_role_by_exact_name() {
        let roles = vec![
            Role {
                id: "1".into(),
                name: "Admin".into(),
                ..Default::default()
            },
            Role {
                id: "2".into(),
                name: "admin".into(),
                ..Default::default()
            },
        ];
        assert_eq!(find_role(roles.clone(), "admin").unwrap().id, "2");
        assert!(find_role(roles, "viewer").is_none());
    }
}
