use std::collections::BTreeMap;

use reqwest::Method;
use serde::{Deserialize, Serialize};

use crate::api::role::Role;
use crate::client::{Auth, ToznyClient};
use crate::error::Result;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub path: String,
}

#[derive(Debug, Clone, Serialize)]
struct CreateGroupRequest<'a> {
    group: &'a Group,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GroupList {
    #[serde(default)]
    pub groups: Vec<Group>,
}

impl GroupList {
    pub fn ids(&self) -> Vec<&str> {
        self.groups.iter().map(|g| g.id.as_str()).collect()
    }
}

#[derive(Debug, Clone, Serialize)]
struct GroupIdList<'a> {
    groups: &'a [String],
}

/// Roles mapped onto a group: application roles keyed by application ID,
/// plus realm level roles.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleMapping {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub client_roles: BTreeMap<String, Vec<Role>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub realm_roles: Vec<Role>,
}

impl RoleMapping {
    pub fn is_empty(&self) -> bool {
        self.realm_roles.is_empty() && self.client_roles.values().all(Vec::is_empty)
    }
}

fn group_path<'a>(realm_name: &'a str, group_id: &'a str) -> [&'a str; 6] {
    ["v1", "identity", "realm", realm_name, "group", group_id]
}

impl ToznyClient {
    pub async fn create_realm_group(&self, realm_name: &str, group: &Group) -> Result<Group> {
        self.call(
            Auth::Client,
            Method::POST,
            &["v1", "identity", "realm", realm_name, "group"],
            Some(&CreateGroupRequest { group }),
        )
        .await
    }

    pub async fn describe_realm_group(&self, realm_name: &str, group_id: &str) -> Result<Group> {
        self.get(&group_path(realm_name, group_id)).await
    }

    pub async fn delete_realm_group(&self, realm_name: &str, group_id: &str) -> Result<()> {
        self.delete(&group_path(realm_name, group_id)).await
    }

    pub async fn list_group_role_mappings(
        &self,
        realm_name: &str,
        group_id: &str,
    ) -> Result<RoleMapping> {
        let [v, s, r, realm, g, id] = group_path(realm_name, group_id);
        self.get(&[v, s, r, realm, g, id, "role_mapping"]).await
    }

    pub async fn add_group_role_mappings(
        &self,
        realm_name: &str,
        group_id: &str,
        mapping: &RoleMapping,
    ) -> Result<()> {
        let [v, s, r, realm, g, id] = group_path(realm_name, group_id);
        self.call_unit(
            Auth::Client,
            Method::POST,
            &[v, s, r, realm, g, id, "role_mapping"],
            Some(mapping),
        )
        .await
    }

    pub async fn remove_group_role_mappings(
        &self,
        realm_name: &str,
        group_id: &str,
        mapping: &RoleMapping,
    ) -> Result<()> {
        let [v, s, r, realm, g, id] = group_path(realm_name, group_id);
        self.call_unit(
            Auth::Client,
            Method::DELETE,
            &[v, s, r, realm, g, id, "role_mapping"],
            Some(mapping),
        )
        .await
    }

    pub async fn list_realm_default_groups(&self, realm_name: &str) -> Result<GroupList> {
        self.get(&["v1", "identity", "realm", realm_name, "default_groups"])
            .await
    }

    /// Replace the realm's default groups with exactly `group_ids`.
    pub async fn replace_realm_default_groups(
        &self,
        realm_name: &str,
        group_ids: &[String],
    ) -> Result<()> {
        self.call_unit(
            Auth::Client,
            Method::PUT,
            &["v1", "identity", "realm", realm_name, "default_groups"],
            Some(&GroupIdList { groups: group_ids }),
        )
        .await
    }

    pub async fn group_membership(&self, realm_name: &str, identity_id: &str) -> Result<GroupList> {
        self.get(&[
            "v1",
            "identity",
            "realm",
            realm_name,
            "identity",
            identity_id,
            "groups",
        ])
        .await
    }

    /// Replace the identity's group memberships with exactly `group_ids`.
    pub async fn update_group_membership(
        &self,
        realm_name: &str,
        identity_id: &str,
        group_ids: &[String],
    ) -> Result<()> {
        self.call_unit(
            Auth::Client,
            Method::PUT,
            &[
                "v1",
                "identity",
                "realm",
                realm_name,
                "identity",
                identity_id,
                "groups",
            ],
            Some(&GroupIdList { groups: group_ids }),
        )
        .await
    }
}
