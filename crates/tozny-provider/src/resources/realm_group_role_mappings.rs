use std::collections::BTreeSet;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tozny_client::{Role, RoleMapping};
use tozny_core::{Attribute, PresenceMap, Schema, reconcile};

use crate::error::Result;
use crate::provider::Resource;
use crate::resources::generated_id;
use crate::session::{CredentialSource, Session};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationRoleBlock {
    pub application_id: String,
    pub role_id: String,
    pub role_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RealmRoleBlock {
    pub realm_id: String,
    pub role_id: String,
    pub role_name: String,
}

impl ApplicationRoleBlock {
    fn role(&self) -> Role {
        Role {
            id: self.role_id.clone(),
            name: self.role_name.clone(),
            container_id: self.application_id.clone(),
            client_role: true,
            ..Default::default()
        }
    }
}

impl RealmRoleBlock {
    fn role(&self) -> Role {
        Role {
            id: self.role_id.clone(),
            name: self.role_name.clone(),
            container_id: self.realm_id.clone(),
            client_role: false,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GroupRoleMappingsModel {
    #[serde(default)]
    pub id: String,
    #[serde(flatten)]
    pub credentials: CredentialSource,
    pub realm_name: String,
    pub group_id: String,
    #[serde(default)]
    pub application_role: Vec<ApplicationRoleBlock>,
    #[serde(default)]
    pub realm_role: Vec<RealmRoleBlock>,
}

impl GroupRoleMappingsModel {
    fn realm(&self) -> String {
        self.realm_name.to_lowercase()
    }

    /// Declared mappings in the shape the API expects, each role once.
    fn mapping(&self) -> RoleMapping {
        let mut mapping = RoleMapping::default();
        let mut seen = BTreeSet::new();
        for block in &self.application_role {
            if seen.insert((block.application_id.as_str(), block.role_id.as_str())) {
                mapping
                    .client_roles
                    .entry(block.application_id.clone())
                    .or_default()
                    .push(block.role());
            }
        }
        let mut seen = BTreeSet::new();
        mapping.realm_roles = self
            .realm_role
            .iter()
            .filter(|block| seen.insert(block.role_id.as_str()))
            .map(RealmRoleBlock::role)
            .collect();
        mapping
    }

    /// Keep only declared mappings the server still reports.
    fn narrow_to(&mut self, server: &RoleMapping) {
        let empty = Vec::new();
        self.application_role.retain(|block| {
            let observed = server
                .client_roles
                .get(&block.application_id)
                .unwrap_or(&empty)
                .iter()
                .map(|role| role.id.as_str());
            PresenceMap::new([block.role_id.as_str()], observed).is_observed(&block.role_id)
        });

        let presence = PresenceMap::new(
            self.realm_role.iter().map(|block| block.role_id.as_str()),
            server.realm_roles.iter().map(|role| role.id.as_str()),
        );
        self.realm_role.retain(|block| presence.is_observed(&block.role_id));
    }
}

/// Add and remove mappings needed to move from the server's view to `planned`.
///
/// Only roles this resource declares (before or after the change) are
/// considered observed, so mappings made outside it are left alone.
fn plan_changes(
    prior: &GroupRoleMappingsModel,
    planned: &GroupRoleMappingsModel,
    server: &RoleMapping,
) -> (RoleMapping, RoleMapping) {
    let mut add = RoleMapping::default();
    let mut remove = RoleMapping::default();

    let applications: BTreeSet<&str> = prior
        .application_role
        .iter()
        .chain(&planned.application_role)
        .map(|block| block.application_id.as_str())
        .collect();

    for application_id in applications {
        let for_app = |model: &GroupRoleMappingsModel| -> Vec<ApplicationRoleBlock> {
            model
                .application_role
                .iter()
                .filter(|block| block.application_id == application_id)
                .cloned()
                .collect()
        };
        let desired = for_app(planned);
        let managed: BTreeSet<String> = for_app(prior)
            .iter()
            .chain(&desired)
            .map(|block| block.role_id.clone())
            .collect();
        let observed: Vec<&Role> = server
            .client_roles
            .get(application_id)
            .map(|roles| roles.iter().filter(|role| managed.contains(&role.id)).collect())
            .unwrap_or_default();

        let delta = reconcile(
            desired.iter().map(|block| block.role_id.as_str()),
            observed.iter().map(|role| role.id.as_str()),
        );
        let mut pending = delta.add;
        let to_add: Vec<Role> = desired
            .iter()
            .filter(|block| pending.remove(&block.role_id))
            .map(ApplicationRoleBlock::role)
            .collect();
        let to_remove: Vec<Role> = observed
            .into_iter()
            .filter(|role| delta.remove.contains(&role.id))
            .cloned()
            .collect();
        if !to_add.is_empty() {
            add.client_roles.insert(application_id.to_string(), to_add);
        }
        if !to_remove.is_empty() {
            remove.client_roles.insert(application_id.to_string(), to_remove);
        }
    }

    let managed: BTreeSet<&str> = prior
        .realm_role
        .iter()
        .chain(&planned.realm_role)
        .map(|block| block.role_id.as_str())
        .collect();
    let observed: Vec<&Role> = server
        .realm_roles
        .iter()
        .filter(|role| managed.contains(role.id.as_str()))
        .collect();
    let delta = reconcile(
        planned.realm_role.iter().map(|block| block.role_id.as_str()),
        observed.iter().map(|role| role.id.as_str()),
    );
    let mut pending = delta.add;
    add.realm_roles = planned
        .realm_role
        .iter()
        .filter(|block| pending.remove(&block.role_id))
        .map(RealmRoleBlock::role)
        .collect();
    remove.realm_roles = observed
        .into_iter()
        .filter(|role| delta.remove.contains(&role.id))
        .cloned()
        .collect();

    (add, remove)
}

/// `tozny_realm_group_role_mappings`: application and realm roles granted to a group.
pub struct GroupRoleMappingsResource;

#[async_trait]
impl Resource for GroupRoleMappingsResource {
    type Model = GroupRoleMappingsModel;
    const TYPE_NAME: &'static str = "tozny_realm_group_role_mappings";
    const UPDATABLE: bool = true;

    fn schema() -> Schema {
        let application_role = Schema::new("An application role mapped to members of the group.")
            .with_attribute(
                "application_id",
                Attribute::required_string("The application ID associated with the application role."),
            )
            .with_attribute(
                "role_id",
                Attribute::required_string("Service defined unique identifier for the application role."),
            )
            .with_attribute(
                "role_name",
                Attribute::required_string("User defined identifier for the application scoped role."),
            );
        let realm_role = Schema::new("A realm role mapped to members of the group.")
            .with_attribute(
                "realm_id",
                Attribute::required_string("The realm ID associated with the realm role."),
            )
            .with_attribute(
                "role_id",
                Attribute::required_string("Service defined unique identifier for the realm role."),
            )
            .with_attribute(
                "role_name",
                Attribute::required_string("User defined identifier for the realm scoped role."),
            );

        CredentialSource::extend_schema(
            Schema::new("Role mappings for a realm group.")
                .with_attribute(
                    "realm_name",
                    Attribute::required_string(
                        "The name of the realm associated with the group to provision role mappings for.",
                    )
                    .force_new(),
                )
                .with_attribute(
                    "group_id",
                    Attribute::required_string(
                        "Server defined unique identifier for the group to provision role mappings for.",
                    )
                    .force_new(),
                )
                .with_attribute(
                    "application_role",
                    Attribute::optional_block(
                        "Application roles mapped to members of the group.",
                        application_role,
                    ),
                )
                .with_attribute(
                    "realm_role",
                    Attribute::optional_block("Realm roles mapped to members of the group.", realm_role),
                ),
        )
    }

    async fn create(
        &self,
        session: &Session,
        mut planned: GroupRoleMappingsModel,
    ) -> Result<GroupRoleMappingsModel> {
        let mapping = planned.mapping();
        if !mapping.is_empty() {
            let client = session.client_for(&planned.credentials)?;
            client
                .add_group_role_mappings(&planned.realm(), &planned.group_id, &mapping)
                .await?;
        }
        // The mapping set has no server identity of its own.
        planned.id = generated_id();
        Ok(planned)
    }

    async fn read(
        &self,
        session: &Session,
        mut state: GroupRoleMappingsModel,
    ) -> Result<Option<GroupRoleMappingsModel>> {
        let client = session.client_for(&state.credentials)?;
        let server = client
            .list_group_role_mappings(&state.realm(), &state.group_id)
            .await?;
        state.narrow_to(&server);
        Ok(Some(state))
    }

    async fn update(
        &self,
        session: &Session,
        prior: GroupRoleMappingsModel,
        planned: GroupRoleMappingsModel,
    ) -> Result<GroupRoleMappingsModel> {
        let client = session.client_for(&planned.credentials)?;
        let realm = planned.realm();
        let server = client
            .list_group_role_mappings(&realm, &planned.group_id)
            .await?;

        let (add, remove) = plan_changes(&prior, &planned, &server);
        // Independent calls: a failed removal leaves applied additions in place.
        if !add.is_empty() {
            tracing::debug!(group_id = %planned.group_id, "adding group role mappings");
            client
                .add_group_role_mappings(&realm, &planned.group_id, &add)
                .await?;
        }
        if !remove.is_empty() {
            tracing::debug!(group_id = %planned.group_id, "removing group role mappings");
            client
                .remove_group_role_mappings(&realm, &planned.group_id, &remove)
                .await?;
        }
        Ok(planned)
    }

    async fn delete(&self, session: &Session, state: GroupRoleMappingsModel) -> Result<()> {
        let mapping = state.mapping();
        if mapping.is_empty() {
            return Ok(());
        }
        let client = session.client_for(&state.credentials)?;
        client
            .remove_group_role_mappings(&state.realm(), &state.group_id, &mapping)
            .await?;
        Ok(())
    }
}
