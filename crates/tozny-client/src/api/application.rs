use reqwest::Method;
use serde::{Deserialize, Serialize};

use crate::client::{Auth, ToznyClient};
use crate::error::Result;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OidcSettings {
    #[serde(default)]
    pub root_url: String,
    #[serde(default)]
    pub standard_flow_enabled: bool,
    #[serde(default)]
    pub implicit_flow_enabled: bool,
    #[serde(default)]
    pub direct_access_grants_enabled: bool,
    #[serde(default)]
    pub base_url: String,
    #[serde(default)]
    pub access_type: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SamlSettings {
    #[serde(default)]
    pub default_endpoint: String,
    #[serde(default)]
    pub include_authn_statement: bool,
    #[serde(default)]
    pub include_one_time_use_condition: bool,
    #[serde(default)]
    pub sign_documents: bool,
    #[serde(default)]
    pub sign_assertions: bool,
    #[serde(default)]
    pub client_signature_required: bool,
    #[serde(default)]
    pub force_post_binding: bool,
    #[serde(default)]
    pub force_name_id_format: bool,
    #[serde(default)]
    pub name_id_format: String,
    #[serde(default)]
    pub idp_initiated_sso_url_name: String,
    #[serde(default)]
    pub assertion_consumer_service_post_binding_url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub client_id: String,
    pub name: String,
    #[serde(default)]
    pub active: bool,
    pub protocol: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allowed_origins: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oidc_settings: Option<OidcSettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saml_settings: Option<SamlSettings>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApplicationList {
    #[serde(default)]
    pub applications: Vec<Application>,
}

/// Claim or attribute mapping attached to an application's tokens.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationMapper {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub name: String,
    pub protocol: String,
    pub mapper_type: String,
    pub user_session_note: String,
    pub user_attribute: String,
    pub full_path: bool,
    pub token_claim_name: String,
    pub claim_json_type: String,
    pub add_to_id_token: bool,
    pub add_to_access_token: bool,
    pub add_to_user_info: bool,
    pub multivalued: bool,
    pub aggregate_attribute_values: bool,
    pub role_attribute_name: String,
    pub property: String,
    pub friendly_name: String,
    pub saml_attribute_name: String,
    pub saml_attribute_name_format: String,
    pub single_role_attribute: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApplicationSecret {
    pub secret: String,
}

/// SAML metadata document of an application, in the requested format.
#[derive(Debug, Clone, Deserialize)]
pub struct SamlDescription {
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessControlGroup {
    pub id: String,
    #[serde(default)]
    pub extend_to_children: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AccessControlPolicy {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub groups: Vec<AccessControlGroup>,
}

#[derive(Debug, Clone, Serialize)]
struct EnableAccessControlRequest {
    enable: bool,
}

#[derive(Debug, Clone, Serialize)]
struct AccessControlGroupsRequest<'a> {
    groups: &'a [AccessControlGroup],
}

fn application_path<'a>(realm_name: &'a str, application_id: &'a str) -> Vec<&'a str> {
    vec![
        "v1",
        "identity",
        "realm",
        realm_name,
        "application",
        application_id,
    ]
}

impl ToznyClient {
    pub async fn create_realm_application(
        &self,
        realm_name: &str,
        application: &Application,
    ) -> Result<Application> {
        self.call(
            Auth::Client,
            Method::POST,
            &["v1", "identity", "realm", realm_name, "application"],
            Some(application),
        )
        .await
    }

    pub async fn list_realm_applications(&self, realm_name: &str) -> Result<ApplicationList> {
        self.get(&["v1", "identity", "realm", realm_name, "application"])
            .await
    }

    pub async fn describe_realm_application(
        &self,
        realm_name: &str,
        application_id: &str,
    ) -> Result<Application> {
        self.get(&application_path(realm_name, application_id))
            .await
    }

    pub async fn delete_realm_application(
        &self,
        realm_name: &str,
        application_id: &str,
    ) -> Result<()> {
        self.delete(&application_path(realm_name, application_id))
            .await
    }

    pub async fn fetch_application_secret(
        &self,
        realm_name: &str,
        application_id: &str,
    ) -> Result<ApplicationSecret> {
        let mut path = application_path(realm_name, application_id);
        path.push("client_secret");
        self.get(&path).await
    }

    pub async fn fetch_application_saml_description(
        &self,
        realm_name: &str,
        application_id: &str,
        format: &str,
    ) -> Result<SamlDescription> {
        let mut path = application_path(realm_name, application_id);
        path.extend(["description", format]);
        self.get(&path).await
    }

    pub async fn describe_access_control(
        &self,
        realm_name: &str,
        application_id: &str,
    ) -> Result<AccessControlPolicy> {
        let mut path = application_path(realm_name, application_id);
        path.push("access_control");
        self.get(&path).await
    }

    pub async fn set_access_control(
        &self,
        realm_name: &str,
        application_id: &str,
        enable: bool,
    ) -> Result<()> {
        let mut path = application_path(realm_name, application_id);
        path.push("access_control");
        self.call_unit(
            Auth::Client,
            Method::PUT,
            &path,
            Some(&EnableAccessControlRequest { enable }),
        )
        .await
    }

    pub async fn add_access_control_groups(
        &self,
        realm_name: &str,
        application_id: &str,
        groups: &[AccessControlGroup],
    ) -> Result<()> {
        let mut path = application_path(realm_name, application_id);
        path.extend(["access_control", "groups"]);
        self.call_unit(
            Auth::Client,
            Method::POST,
            &path,
            Some(&AccessControlGroupsRequest { groups }),
        )
        .await
    }

    pub async fn remove_access_control_groups(
        &self,
        realm_name: &str,
        application_id: &str,
        groups: &[AccessControlGroup],
    ) -> Result<()> {
        let mut path = application_path(realm_name, application_id);
        path.extend(["access_control", "groups"]);
        self.call_unit(
            Auth::Client,
            Method::DELETE,
            &path,
            Some(&AccessControlGroupsRequest { groups }),
        )
        .await
    }

    pub async fn create_application_mapper(
        &self,
        realm_name: &str,
        application_id: &str,
        mapper: &ApplicationMapper,
    ) -> Result<ApplicationMapper> {
        let mut path = application_path(realm_name, application_id);
        path.push("mapper");
        self.call(Auth::Client, Method::POST, &path, Some(mapper))
            .await
    }

    pub async fn describe_application_mapper(
        &self,
        realm_name: &str,
        application_id: &str,
        mapper_id: &str,
    ) -> Result<ApplicationMapper> {
        let mut path = application_path(realm_name, application_id);
        path.extend(["mapper", mapper_id]);
        self.get(&path).await
    }

    pub async fn delete_application_mapper(
        &self,
        realm_name: &str,
        application_id: &str,
        mapper_id: &str,
    ) -> Result<()> {
        let mut path = application_path(realm_name, application_id);
        path.extend(["mapper", mapper_id]);
        self.delete(&path).await
    }
}
