use reqwest::Method;
use serde::{Deserialize, Serialize};

use crate::client::{Auth, ToznyClient};
use crate::error::Result;

#[derive(Debug, Clone, Serialize)]
struct InitiateFederationRequest<'a> {
    federation_source: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FederationConnection {
    pub connection_id: String,
    pub api_credential: String,
}

/// Connects a shadow realm to a primary realm's federation connection.
#[derive(Debug, Clone, Serialize)]
pub struct ConnectFederationRequest {
    pub federation_source: String,
    pub primary_realm_name: String,
    pub primary_realm_endpoint: String,
    pub connection_id: String,
    pub api_credential: String,
    pub active: bool,
    pub sync: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sync_frequency: Option<i64>,
}

impl ToznyClient {
    pub async fn initiate_federation_connection(
        &self,
        realm_name: &str,
        federation_source: &str,
    ) -> Result<FederationConnection> {
        self.call(
            Auth::Client,
            Method::POST,
            &["v1", "identity", "federation", realm_name, "initiate"],
            Some(&InitiateFederationRequest { federation_source }),
        )
        .await
    }

    pub async fn configure_federation_connection(
        &self,
        realm_name: &str,
        request: &ConnectFederationRequest,
    ) -> Result<()> {
        self.call_unit(
            Auth::Client,
            Method::POST,
            &["v1", "identity", "federation", realm_name, "configure"],
            Some(request),
        )
        .await
    }
}
