use std::collections::BTreeMap;

use reqwest::Method;
use serde::{Deserialize, Serialize};

use crate::client::{Auth, ToznyClient};
use crate::error::Result;

/// A realm or application scoped role.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub composite: bool,
    #[serde(default)]
    pub client_role: bool,
    /// Realm ID for realm roles, application ID for application roles.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub container_id: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, Vec<String>>,
}

impl ToznyClient {
    pub async fn create_realm_role(&self, realm_name: &str, role: &Role) -> Result<Role> {
        self.call(
            Auth::Client,
            Method::POST,
            &["v1", "identity", "realm", realm_name, "role"],
            Some(role),
        )
        .await
    }

    pub async fn describe_realm_role(&self, realm_name: &str, role_id: &str) -> Result<Role> {
        self.get(&["v1", "identity", "realm", realm_name, "role", role_id])
            .await
    }

    pub async fn update_realm_role(
        &self,
        realm_name: &str,
        role_id: &str,
        role: &Role,
    ) -> Result<Role> {
        self.call(
            Auth::Client,
            Method::PUT,
            &["v1", "identity", "realm", realm_name, "role", role_id],
            Some(role),
        )
        .await
    }

    pub async fn delete_realm_role(&self, realm_name: &str, role_id: &str) -> Result<()> {
        self.delete(&["v1", "identity", "realm", realm_name, "role", role_id])
            .await
    }

    pub async fn list_realm_roles(&self, realm_name: &str) -> Result<Vec<Role>> {
        self.get(&["v1", "identity", "realm", realm_name, "role"])
            .await
    }

    pub async fn create_application_role(
        &self,
        realm_name: &str,
        application_id: &str,
        role: &Role,
    ) -> Result<Role> {
        self.call(
            Auth::Client,
            Method::POST,
            &[
                "v1",
                "identity",
                "realm",
                realm_name,
                "application",
                application_id,
                "role",
            ],
            Some(role),
        )
        .await
    }

    /// Application roles are addressed by name.
    pub async fn describe_application_role(
        &self,
        realm_name: &str,
        application_id: &str,
        role_name: &str,
    ) -> Result<Role> {
        self.get(&[
            "v1",
            "identity",
            "realm",
            realm_name,
            "application",
            application_id,
            "role",
            role_name,
        ])
        .await
    }

    pub async fn delete_application_role(
        &self,
        realm_name: &str,
        application_id: &str,
        role_name: &str,
    ) -> Result<()> {
        self.delete(&[
            "v1",
            "identity",
            "realm",
            realm_name,
            "application",
            application_id,
            "role",
            role_name,
        ])
        .await
    }
}
