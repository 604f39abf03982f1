use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tozny_client::Role;
use tozny_core::{Attribute, AttributeType, Schema};

use crate::error::Result;
use crate::provider::Resource;
use crate::session::{CredentialSource, Session};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleAttribute {
    pub key: String,
    #[serde(default)]
    pub values: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RealmRoleModel {
    #[serde(default)]
    pub id: String,
    #[serde(flatten)]
    pub credentials: CredentialSource,
    pub realm_name: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub attribute: Vec<RoleAttribute>,
    #[serde(default)]
    pub realm_role_id: String,
    #[serde(default)]
    pub role_realm_id: String,
}

impl RealmRoleModel {
    fn realm(&self) -> String {
        self.realm_name.to_lowercase()
    }

    fn attributes(&self) -> BTreeMap<String, Vec<String>> {
        self.attribute
            .iter()
            .map(|attr| (attr.key.clone(), attr.values.clone()))
            .collect()
    }

    fn role(&self) -> Role {
        Role {
            id: self.realm_role_id.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            container_id: self.role_realm_id.clone(),
            attributes: self.attributes(),
            ..Default::default()
        }
    }
}

/// Server attributes laid over the declared ones, sorted by key.
fn merge_attributes(
    declared: &[RoleAttribute],
    server: BTreeMap<String, Vec<String>>,
) -> Vec<RoleAttribute> {
    let mut merged: BTreeMap<String, Vec<String>> = declared
        .iter()
        .map(|attr| (attr.key.clone(), attr.values.clone()))
        .collect();
    merged.extend(server);
    merged
        .into_iter()
        .map(|(key, values)| RoleAttribute { key, values })
        .collect()
}

/// `tozny_realm_role`: a role scoped to a realm.
pub struct RealmRoleResource;

#[async_trait]
impl Resource for RealmRoleResource {
    type Model = RealmRoleModel;
    const TYPE_NAME: &'static str = "tozny_realm_role";
    const UPDATABLE: bool = true;

    fn schema() -> Schema {
        let attribute = Schema::new("A key with one or more values attached to the role.")
            .with_attribute("key", Attribute::required_string("Attribute key."))
            .with_attribute(
                "values",
                Attribute::optional(AttributeType::StringList, "Attribute values.")
                    .with_default(serde_json::json!([])),
            );

        CredentialSource::extend_schema(
            Schema::new("A role scoped to a Tozny realm.")
                .with_attribute(
                    "realm_name",
                    Attribute::required_string("Name of the realm the role belongs to.").force_new(),
                )
                .with_attribute(
                    "name",
                    Attribute::required_string("Human readable identifier for the role."),
                )
                .with_attribute(
                    "description",
                    Attribute::optional_string("Human readable description of the role.")
                        .with_default(""),
                )
                .with_attribute(
                    "attribute",
                    Attribute::optional_block("Key/values attached to the role.", attribute),
                )
                .with_attribute(
                    "realm_role_id",
                    Attribute::computed_string("Server defined identifier for the role."),
                )
                .with_attribute(
                    "role_realm_id",
                    Attribute::computed_string("Server defined identifier of the role's realm."),
                ),
        )
    }

    async fn create(&self, session: &Session, mut planned: RealmRoleModel) -> Result<RealmRoleModel> {
        let client = session.client_for(&planned.credentials)?;
        let realm = planned.realm();

        // Attributes are only accepted on update.
        let created = client
            .create_realm_role(
                &realm,
                &Role {
                    name: planned.name.clone(),
                    description: planned.description.clone(),
                    ..Default::default()
                },
            )
            .await?;
        planned.realm_role_id = created.id.clone();
        planned.role_realm_id = created.container_id.clone();
        planned.id = created.id;

        if !planned.attribute.is_empty() {
            client
                .update_realm_role(&realm, &planned.realm_role_id, &planned.role())
                .await?;
        }
        Ok(planned)
    }

    async fn read(
        &self,
        session: &Session,
        mut state: RealmRoleModel,
    ) -> Result<Option<RealmRoleModel>> {
        let client = session.client_for(&state.credentials)?;
        let role = client
            .describe_realm_role(&state.realm(), &state.realm_role_id)
            .await?;
        state.name = role.name;
        state.description = role.description;
        state.role_realm_id = role.container_id;
        state.attribute = merge_attributes(&state.attribute, role.attributes);
        Ok(Some(state))
    }

    async fn update(
        &self,
        session: &Session,
        _prior: RealmRoleModel,
        planned: RealmRoleModel,
    ) -> Result<RealmRoleModel> {
        let client = session.client_for(&planned.credentials)?;
        client
            .update_realm_role(&planned.realm(), &planned.realm_role_id, &planned.role())
            .await?;
        Ok(planned)
    }

    async fn delete(&self, session: &Session, state: RealmRoleModel) -> Result<()> {
        let client = session.client_for(&state.credentials)?;
        client
            .delete_realm_role(&state.realm(), &state.realm_role_id)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_attributes_win_and_sort() {
        let declared = vec![
            RoleAttribute {
                key: "tier".into(),
                values: vec!["gold".into()],
            },
            RoleAttribute {
                key: "dept".into(),
                values: vec!["eng".into()],
            },
        ];
        let server = BTreeMap::from([
            ("tier".to_string(), vec!["silver".to_string()]),
            ("added".to_string(), vec!["x".to_string()]),
        ]);
        let merged = merge_attributes(&declared, server);
        let keys: Vec<_> = merged.iter().map(|a| a.key.as_str()).collect();
        assert_eq!(keys, vec!["added", "dept", "tier"]);
        assert_eq!(merged[2].values, vec!["silver"]);
    }

    #[test]
    fn test_role_payload_uses_lowercase_realm() {
        let model = RealmRoleModel {
            realm_name: "AcmeCorp".into(),
            name: "admin".into(),
            attribute: vec![RoleAttribute {
                key: "k".into(),
                values: vec!["v".into()],
            }],
            ..Default::default()
        };
        assert_eq!(model.realm(), "acmecorp");
        assert_eq!(model.role().attributes["k"], vec!["v"]);
    }
}
