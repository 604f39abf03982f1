use reqwest::Method;
use serde::{Deserialize, Serialize};

use crate::client::{Auth, ToznyClient};
use crate::error::Result;

#[derive(Debug, Clone, Serialize)]
pub struct CreateRealmRequest {
    pub realm_name: String,
    pub sovereign_name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub registration_token: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sovereign {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Realm {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub domain: String,
    #[serde(default)]
    pub admin_url: String,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub broker_identity_tozny_id: String,
    #[serde(default)]
    pub sovereign: Sovereign,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PrivateRealmInfo {
    #[serde(default)]
    pub mpc_enabled: bool,
    #[serde(default)]
    pub tozid_federation_enabled: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RealmSettingsUpdateRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mpc_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tozid_federation_enabled: Option<bool>,
}

impl ToznyClient {
    pub async fn create_realm(&self, request: &CreateRealmRequest) -> Result<Realm> {
        self.call(
            Auth::Client,
            Method::POST,
            &["v1", "identity", "realm"],
            Some(request),
        )
        .await
    }

    pub async fn describe_realm(&self, realm_name: &str) -> Result<Realm> {
        self.get(&["v1", "identity", "realm", realm_name]).await
    }

    pub async fn delete_realm(&self, realm_name: &str) -> Result<()> {
        self.delete(&["v1", "identity", "realm", realm_name]).await
    }

    pub async fn private_realm_info(&self, realm_name: &str) -> Result<PrivateRealmInfo> {
        self.get(&["v1", "identity", "info", "realm", realm_name, "private"])
            .await
    }

    pub async fn update_realm_settings(
        &self,
        realm_name: &str,
        request: &RealmSettingsUpdateRequest,
    ) -> Result<()> {
        self.call_unit(
            Auth::Client,
            Method::PATCH,
            &["v1", "identity", "realm", realm_name, "settings"],
            Some(request),
        )
        .await
    }
}
