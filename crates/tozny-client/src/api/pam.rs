use reqwest::Method;
use serde::{Deserialize, Serialize};

use crate::client::{Auth, ToznyClient};
use crate::error::Result;

/// Jira integration for privileged access requests in a realm.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JiraPluginRequest {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub realm_name: String,
    pub jira_host_url: String,
    pub bot_user_email: String,
    pub bot_user_api_key: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct JiraPlugin {
    pub id: i64,
    pub jira_host_url: String,
    pub bot_user_email: String,
    /// Header Jira automations send back to authenticate against the realm.
    pub automation_auth_header: String,
}

impl ToznyClient {
    pub async fn create_pam_jira_plugin(&self, request: &JiraPluginRequest) -> Result<JiraPlugin> {
        self.call(
            Auth::Client,
            Method::POST,
            &["v1", "identity", "pam", "jira"],
            Some(request),
        )
        .await
    }

    pub async fn describe_pam_jira_plugin(&self, plugin_id: i64) -> Result<JiraPlugin> {
        let id = plugin_id.to_string();
        self.get(&["v1", "identity", "pam", "jira", &id]).await
    }

    pub async fn update_pam_jira_plugin(
        &self,
        plugin_id: i64,
        request: &JiraPluginRequest,
    ) -> Result<JiraPlugin> {
        let id = plugin_id.to_string();
        self.call(
            Auth::Client,
            Method::PUT,
            &["v1", "identity", "pam", "jira", &id],
            Some(request),
        )
        .await
    }

    pub async fn delete_pam_jira_plugin(&self, plugin_id: i64) -> Result<()> {
        let id = plugin_id.to_string();
        self.delete(&["v1", "identity", "pam", "jira", &id]).await
    }
}
