use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tozny_client::{Application, OidcSettings, SamlSettings};
use tozny_core::{Attribute, AttributeType, Schema};

use crate::error::Result;
use crate::provider::Resource;
use crate::session::{CredentialSource, Session};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OidcBlock {
    #[serde(default)]
    pub allowed_origins: Vec<String>,
    pub access_type: String,
    #[serde(default)]
    pub root_url: String,
    pub standard_flow_enabled: bool,
    #[serde(default)]
    pub base_url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamlBlock {
    pub allowed_origins: Vec<String>,
    pub default_endpoint: String,
    pub include_authn_statement: bool,
    pub include_one_time_use_condition: bool,
    pub sign_documents: bool,
    pub sign_assertions: bool,
    pub client_signature_required: bool,
    pub force_post_binding: bool,
    pub force_name_id_format: bool,
    pub name_id_format: String,
    pub idp_initiated_sso_url_name: String,
    pub assertion_consumer_service_post_binding_url: String,
}

impl SamlBlock {
    fn settings(&self) -> SamlSettings {
        SamlSettings {
            default_endpoint: self.default_endpoint.clone(),
            include_authn_statement: self.include_authn_statement,
            include_one_time_use_condition: self.include_one_time_use_condition,
            sign_documents: self.sign_documents,
            sign_assertions: self.sign_assertions,
            client_signature_required: self.client_signature_required,
            force_post_binding: self.force_post_binding,
            force_name_id_format: self.force_name_id_format,
            name_id_format: self.name_id_format.clone(),
            idp_initiated_sso_url_name: self.idp_initiated_sso_url_name.clone(),
            assertion_consumer_service_post_binding_url: self
                .assertion_consumer_service_post_binding_url
                .clone(),
        }
    }

    pub(crate) fn from_settings(allowed_origins: Vec<String>, settings: SamlSettings) -> Self {
        Self {
            allowed_origins,
            default_endpoint: settings.default_endpoint,
            include_authn_statement: settings.include_authn_statement,
            include_one_time_use_condition: settings.include_one_time_use_condition,
            sign_documents: settings.sign_documents,
            sign_assertions: settings.sign_assertions,
            client_signature_required: settings.client_signature_required,
            force_post_binding: settings.force_post_binding,
            force_name_id_format: settings.force_name_id_format,
            name_id_format: settings.name_id_format,
            idp_initiated_sso_url_name: settings.idp_initiated_sso_url_name,
            assertion_consumer_service_post_binding_url: settings
                .assertion_consumer_service_post_binding_url,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RealmApplicationModel {
    #[serde(default)]
    pub id: String,
    #[serde(flatten)]
    pub credentials: CredentialSource,
    pub realm_name: String,
    pub client_id: String,
    pub name: String,
    pub protocol: String,
    pub active: bool,
    #[serde(default)]
    pub application_id: String,
    #[serde(default)]
    pub oidc_settings: Vec<OidcBlock>,
    #[serde(default)]
    pub saml_settings: Vec<SamlBlock>,
}

impl RealmApplicationModel {
    fn application(&self) -> Application {
        let mut application = Application {
            client_id: self.client_id.clone(),
            name: self.name.clone(),
            active: self.active,
            protocol: self.protocol.to_lowercase(),
            ..Default::default()
        };
        if let Some(oidc) = self.oidc_settings.first() {
            application.allowed_origins = oidc.allowed_origins.clone();
            application.oidc_settings = Some(OidcSettings {
                root_url: oidc.root_url.clone(),
                standard_flow_enabled: oidc.standard_flow_enabled,
                base_url: oidc.base_url.clone(),
                access_type: oidc.access_type.clone(),
                ..Default::default()
            });
        }
        if let Some(saml) = self.saml_settings.first() {
            application.allowed_origins = saml.allowed_origins.clone();
            application.saml_settings = Some(saml.settings());
        }
        application
    }

    /// Copy server values back, keeping whichever protocol block is declared.
    fn apply(&mut self, application: Application) {
        self.client_id = application.client_id;
        self.name = application.name;
        self.active = application.active;
        self.protocol = application.protocol;

        if self.saml_settings.is_empty() {
            let oidc = application.oidc_settings.unwrap_or_default();
            self.oidc_settings = vec![OidcBlock {
                allowed_origins: application.allowed_origins,
                access_type: oidc.access_type,
                root_url: oidc.root_url,
                standard_flow_enabled: oidc.standard_flow_enabled,
                base_url: oidc.base_url,
            }];
        } else {
            let saml = application.saml_settings.unwrap_or_default();
            self.saml_settings = vec![SamlBlock::from_settings(application.allowed_origins, saml)];
        }
    }
}

fn oidc_schema() -> Schema {
    Schema::new("Settings for an OIDC protocol based application.")
        .with_attribute(
            "allowed_origins",
            Attribute::optional(AttributeType::StringList, "Origins allowed to use the application.")
                .with_default(json!([])),
        )
        .with_attribute(
            "access_type",
            Attribute::optional_string("The OIDC access type: confidential, public or bearer-only.")
                .with_default("confidential"),
        )
        .with_attribute(
            "root_url",
            Attribute::optional_string("URL appended to relative URLs of the application.")
                .with_default(""),
        )
        .with_attribute(
            "standard_flow_enabled",
            Attribute::optional_bool("Whether the OIDC authorization code flow is enabled.")
                .with_default(true),
        )
        .with_attribute(
            "base_url",
            Attribute::optional_string("Default URL used when redirecting back to the application.")
                .with_default(""),
        )
}

pub(crate) fn saml_schema() -> Schema {
    let string = |description: &str| Attribute::optional_string(description).with_default("");
    let flag = |description: &str| Attribute::optional_bool(description).with_default(false);

    Schema::new("Settings for a SAML protocol based application.")
        .with_attribute(
            "allowed_origins",
            Attribute::optional(AttributeType::StringList, "Origins allowed to use the application.")
                .with_default(json!([])),
        )
        .with_attribute(
            "default_endpoint",
            string("URL used for every binding to the SP's assertion consumer and single logout services."),
        )
        .with_attribute("include_authn_statement", flag("Whether to include the Authn statement."))
        .with_attribute(
            "include_one_time_use_condition",
            flag("Whether to include a OneTimeUse condition in assertions."),
        )
        .with_attribute("sign_documents", flag("Whether SAML documents are signed by the realm."))
        .with_attribute("sign_assertions", flag("Whether SAML assertions are signed."))
        .with_attribute(
            "client_signature_required",
            flag("Whether the application signs its SAML requests and responses."),
        )
        .with_attribute("force_post_binding", flag("Whether to always use POST binding for responses."))
        .with_attribute(
            "force_name_id_format",
            flag("Whether to ignore the NameID policy requested by the application."),
        )
        .with_attribute("name_id_format", string("The name ID format to use for the subject."))
        .with_attribute(
            "idp_initiated_sso_url_name",
            string("URL fragment name used to reference the application for IDP initiated SSO."),
        )
        .with_attribute(
            "assertion_consumer_service_post_binding_url",
            string("URL for the SP's assertion consumer service using POST binding."),
        )
}

/// `tozny_realm_application`
pub struct RealmApplicationResource;

#[async_trait]
impl Resource for RealmApplicationResource {
    type Model = RealmApplicationModel;
    const TYPE_NAME: &'static str = "tozny_realm_application";

    fn schema() -> Schema {
        CredentialSource::extend_schema(
            Schema::new("An OIDC or SAML application registered with a realm.")
                .with_attribute(
                    "realm_name",
                    Attribute::required_string("Name of the realm the application belongs to.")
                        .force_new(),
                )
                .with_attribute(
                    "application_id",
                    Attribute::computed_string("Service defined identifier for the application."),
                )
                .with_attribute(
                    "client_id",
                    Attribute::required_string("The external client identifier for the application.")
                        .force_new(),
                )
                .with_attribute(
                    "name",
                    Attribute::required_string("Human readable name for the application.").force_new(),
                )
                .with_attribute(
                    "protocol",
                    Attribute::required_string("The protocol used by the application: oidc or saml.")
                        .force_new(),
                )
                .with_attribute(
                    "active",
                    Attribute::optional_bool("Whether the application is active.")
                        .with_default(true)
                        .force_new(),
                )
                .with_attribute(
                    "oidc_settings",
                    Attribute::optional_block("Settings for an OIDC application.", oidc_schema())
                        .max_items(1)
                        .force_new()
                        .conflicts_with("saml_settings"),
                )
                .with_attribute(
                    "saml_settings",
                    Attribute::optional_block("Settings for a SAML application.", saml_schema())
                        .max_items(1)
                        .force_new()
                        .conflicts_with("oidc_settings"),
                ),
        )
    }

    async fn create(
        &self,
        session: &Session,
        mut planned: RealmApplicationModel,
    ) -> Result<RealmApplicationModel> {
        let client = session.client_for(&planned.credentials)?;
        let created = client
            .create_realm_application(&planned.realm_name, &planned.application())
            .await?;
        planned.application_id = created.id.clone();
        planned.id = created.id;
        Ok(planned)
    }

    async fn read(
        &self,
        session: &Session,
        mut state: RealmApplicationModel,
    ) -> Result<Option<RealmApplicationModel>> {
        let client = session.client_for(&state.credentials)?;
        let application = client
            .describe_realm_application(&state.realm_name, &state.application_id)
            .await?;
        state.apply(application);
        Ok(Some(state))
    }

    async fn delete(&self, session: &Session, state: RealmApplicationModel) -> Result<()> {
        let client = session.client_for(&state.credentials)?;
        client
            .delete_realm_application(&state.realm_name, &state.application_id)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_oidc_defaults_and_lowercase_protocol() {
        let model: RealmApplicationModel = RealmApplicationResource::schema()
            .decode(&json!({
                "realm_name": "acme",
                "client_id": "portal",
                "name": "Portal",
                "protocol": "OIDC",
                "oidc_settings": [{"root_url": "https://portal.example"}]
            }))
            .unwrap();
        let application = model.application();
        assert_eq!(application.protocol, "oidc");
        assert!(application.active);
        let oidc = application.oidc_settings.unwrap();
        assert_eq!(oidc.access_type, "confidential");
        assert!(oidc.standard_flow_enabled);
        assert!(application.saml_settings.is_none());
    }

    #[test]
    fn test_protocol_blocks_conflict() {
        let err = RealmApplicationResource::schema()
            .validate(&json!({
                "realm_name": "acme",
                "client_id": "portal",
                "name": "Portal",
                "protocol": "saml",
                "oidc_settings": [{}],
                "saml_settings": [{}]
            }))
            .unwrap_err();
        assert!(matches!(err, tozny_core::CoreError::ConflictingAttributes { .. }));
    }

    #[test]
    fn test_read_keeps_saml_block() {
        let mut state = RealmApplicationModel {
            saml_settings: vec![SamlBlock::default()],
            ..Default::default()
        };
        state.apply(Application {
            client_id: "portal".into(),
            name: "Portal".into(),
            protocol: "saml".into(),
            active: true,
            allowed_origins: vec!["https://a.example".into()],
            saml_settings: Some(SamlSettings {
                sign_documents: true,
                ..Default::default()
            }),
            ..Default::default()
        });
        assert!(state.oidc_settings.is_empty());
        assert!(state.saml_settings[0].sign_documents);
        assert_eq!(state.saml_settings[0].allowed_origins, vec!["https://a.example"]);
    }
}
