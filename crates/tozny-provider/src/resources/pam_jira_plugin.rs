use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tozny_client::{JiraPlugin, JiraPluginRequest};
use tozny_core::{Attribute, Schema};

use crate::error::{ProviderError, Result};
use crate::provider::Resource;
use crate::session::{CredentialSource, Session};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JiraPluginModel {
    #[serde(default)]
    pub id: String,
    #[serde(flatten)]
    pub credentials: CredentialSource,
    pub realm_name: String,
    pub jira_host_url: String,
    pub jira_bot_user_email: String,
    pub jira_bot_user_api_key: String,
    #[serde(default)]
    pub automation_auth_header: String,
}

impl JiraPluginModel {
    fn plugin_id(&self) -> Result<i64> {
        self.id
            .parse()
            .map_err(|_| ProviderError::invalid("id", format!("{:?} is not a plugin ID", self.id)))
    }

    fn request(&self) -> JiraPluginRequest {
        JiraPluginRequest {
            realm_name: self.realm_name.clone(),
            jira_host_url: self.jira_host_url.clone(),
            bot_user_email: self.jira_bot_user_email.clone(),
            bot_user_api_key: self.jira_bot_user_api_key.clone(),
        }
    }

    fn differs_from(&self, prior: &JiraPluginModel) -> bool {
        self.jira_host_url != prior.jira_host_url
            || self.jira_bot_user_email != prior.jira_bot_user_email
            || self.jira_bot_user_api_key != prior.jira_bot_user_api_key
    }

    /// The API never returns the bot API key, so the declared one is kept.
    fn apply(&mut self, plugin: JiraPlugin) {
        self.jira_host_url = plugin.jira_host_url;
        self.jira_bot_user_email = plugin.bot_user_email;
        self.automation_auth_header = plugin.automation_auth_header;
    }
}

/// `tozny_pam_jira_plugin`: lets Jira automations approve realm access requests.
pub struct JiraPluginResource;

#[async_trait]
impl Resource for JiraPluginResource {
    type Model = JiraPluginModel;
    const TYPE_NAME: &'static str = "tozny_pam_jira_plugin";
    const UPDATABLE: bool = true;

    fn schema() -> Schema {
        CredentialSource::extend_schema(
            Schema::new("A Jira integration for privileged access management in a realm.")
                .with_attribute(
                    "realm_name",
                    Attribute::required_string("Name of the realm the plugin serves.").force_new(),
                )
                .with_attribute(
                    "jira_host_url",
                    Attribute::required_string("Host of the Jira instance, without protocol or trailing slash."),
                )
                .with_attribute(
                    "jira_bot_user_email",
                    Attribute::required_string("Email of the Jira user acting on behalf of the realm."),
                )
                .with_attribute(
                    "jira_bot_user_api_key",
                    Attribute::required_string("API key of the Jira user acting on behalf of the realm.")
                        .sensitive(),
                )
                .with_attribute(
                    "automation_auth_header",
                    Attribute::computed_string("Authentication header for requests sent from Jira.")
                        .sensitive(),
                ),
        )
    }

    async fn create(&self, session: &Session, mut planned: JiraPluginModel) -> Result<JiraPluginModel> {
        let client = session.client_for(&planned.credentials)?;
        let plugin = client.create_pam_jira_plugin(&planned.request()).await?;
        planned.id = plugin.id.to_string();
        planned.automation_auth_header = plugin.automation_auth_header;
        Ok(planned)
    }

    async fn read(&self, session: &Session, mut state: JiraPluginModel) -> Result<Option<JiraPluginModel>> {
        let plugin_id = state.plugin_id()?;
        let client = session.client_for(&state.credentials)?;
        let plugin = client.describe_pam_jira_plugin(plugin_id).await?;
        state.apply(plugin);
        Ok(Some(state))
    }

    async fn update(
        &self,
        session: &Session,
        prior: JiraPluginModel,
        mut planned: JiraPluginModel,
    ) -> Result<JiraPluginModel> {
        planned.id = prior.id.clone();
        planned.automation_auth_header = prior.automation_auth_header.clone();
        if !planned.differs_from(&prior) {
            return Ok(planned);
        }

        let plugin_id = planned.plugin_id()?;
        let client = session.client_for(&planned.credentials)?;
        let mut request = planned.request();
        request.realm_name.clear();
        let plugin = client.update_pam_jira_plugin(plugin_id, &request).await?;
        planned.automation_auth_header = plugin.automation_auth_header;
        Ok(planned)
    }

    async fn delete(&self, session: &Session, state: JiraPluginModel) -> Result<()> {
        let plugin_id = state.plugin_id()?;
        let client = session.client_for(&state.credentials)?;
        client.delete_pam_jira_plugin(plugin_id).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> JiraPluginModel {
        JiraPluginModel {
            id: "42".into(),
            realm_name: "acme".into(),
            jira_host_url: "acme.atlassian.net".into(),
            jira_bot_user_email: "bot@acme.example".into(),
            jira_bot_user_api_key: "key-1".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_non_numeric_id_rejected() {
        let mut bad = model();
        bad.id = "plugin-42".into();
        assert!(bad.plugin_id().is_err());
        assert_eq!(model().plugin_id().unwrap(), 42);
    }

    #[test]
    fn test_only_plugin_settings_count_as_changes() {
        let prior = model();
        let mut planned = model();
        planned.automation_auth_header = "Bearer abc".into();
        assert!(!planned.differs_from(&prior));

        planned.jira_bot_user_api_key = "key-2".into();
        assert!(planned.differs_from(&prior));
    }

    #[test]
    fn test_apply_keeps_api_key() {
        let mut state = model();
        state.apply(JiraPlugin {
            id: 42,
            jira_host_url: "jira.acme.example".into(),
            bot_user_email: "bot@acme.example".into(),
            automation_auth_header: "Bearer abc".into(),
        });
        assert_eq!(state.jira_bot_user_api_key, "key-1");
        assert_eq!(state.jira_host_url, "jira.acme.example");
        assert_eq!(state.automation_auth_header, "Bearer abc");
    }
}
