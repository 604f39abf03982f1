use reqwest::Method;
use serde::{Deserialize, Serialize};

use crate::client::{Auth, ToznyClient};
use crate::error::Result;

/// How the realm reaches an external LDAP directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConnectionSettings {
    #[serde(rename = "type")]
    pub kind: String,
    pub identity_name_attribute: String,
    pub rdn_attribute: String,
    pub uuid_attribute: String,
    pub identity_object_classes: Vec<String>,
    pub connection_url: String,
    pub identity_dn: String,
    pub authentication_type: String,
    pub bind_dn: String,
    /// The API masks this value on reads.
    pub bind_credential: String,
    pub search_scope: i64,
    pub trust_store_spi_mode: String,
    pub connection_pooling: bool,
    pub pagination: bool,
}

/// An identity provider (LDAP) a realm syncs identities from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RealmProvider {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub import_identities: bool,
    #[serde(default)]
    pub priority: i64,
    #[serde(default)]
    pub connection_settings: ProviderConnectionSettings,
}

/// Maps LDAP groups onto realm groups for one provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderMapper {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
    pub groups_dn: String,
    pub group_name_attribute: String,
    pub group_object_classes: Vec<String>,
    pub preserve_group_inheritance: bool,
    pub ignore_missing_groups: bool,
    pub member_of_attribute: String,
    pub membership_attribute: String,
    pub membership_attribute_type: String,
    pub membership_identity_attribute: String,
    pub mode: String,
    pub identity_groups_retrieval_strategy: String,
    pub drop_missing_groups_on_sync: bool,
}

fn provider_path<'a>(realm_name: &'a str, provider_id: &'a str) -> Vec<&'a str> {
    vec!["v1", "identity", "realm", realm_name, "provider", provider_id]
}

impl ToznyClient {
    pub async fn create_realm_provider(
        &self,
        realm_name: &str,
        provider: &RealmProvider,
    ) -> Result<RealmProvider> {
        self.call(
            Auth::Client,
            Method::POST,
            &["v1", "identity", "realm", realm_name, "provider"],
            Some(provider),
        )
        .await
    }

    pub async fn describe_realm_provider(
        &self,
        realm_name: &str,
        provider_id: &str,
    ) -> Result<RealmProvider> {
        self.get(&provider_path(realm_name, provider_id)).await
    }

    pub async fn delete_realm_provider(&self, realm_name: &str, provider_id: &str) -> Result<()> {
        self.delete(&provider_path(realm_name, provider_id)).await
    }

    pub async fn create_realm_provider_mapper(
        &self,
        realm_name: &str,
        provider_id: &str,
        mapper: &ProviderMapper,
    ) -> Result<ProviderMapper> {
        let mut path = provider_path(realm_name, provider_id);
        path.push("mapper");
        self.call(Auth::Client, Method::POST, &path, Some(mapper))
            .await
    }

    pub async fn describe_realm_provider_mapper(
        &self,
        realm_name: &str,
        provider_id: &str,
        mapper_id: &str,
    ) -> Result<ProviderMapper> {
        let mut path = provider_path(realm_name, provider_id);
        path.extend(["mapper", mapper_id]);
        self.get(&path).await
    }

    pub async fn delete_realm_provider_mapper(
        &self,
        realm_name: &str,
        provider_id: &str,
        mapper_id: &str,
    ) -> Result<()> {
        let mut path = provider_path(realm_name, provider_id);
        path.extend(["mapper", mapper_id]);
        self.delete(&path).await
    }
}
