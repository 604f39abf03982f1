use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tozny_client::{Application, ClientError};
use tozny_core::{Attribute, AttributeType, Schema};

use crate::error::Result;
use crate::provider::DataSource;
use crate::resources::{SamlBlock, saml_schema};
use crate::session::{CredentialSource, Session};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OidcDescription {
    pub allowed_origins: Vec<String>,
    pub access_type: String,
    pub root_url: String,
    pub standard_flow_enabled: bool,
    pub implicit_flow_enabled: bool,
    pub direct_access_grants_enabled: bool,
    pub base_url: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RealmApplicationLookup {
    #[serde(default)]
    pub id: String,
    #[serde(flatten)]
    pub credentials: CredentialSource,
    pub realm_name: String,
    pub client_id: String,
    #[serde(default)]
    pub application_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub protocol: String,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub oidc_settings: Vec<OidcDescription>,
    #[serde(default)]
    pub saml_settings: Vec<SamlBlock>,
}

impl RealmApplicationLookup {
    fn apply(&mut self, application: Application) {
        self.application_id = application.id.clone();
        self.id = application.id;
        self.name = application.name;
        self.active = application.active;
        self.oidc_settings.clear();
        self.saml_settings.clear();
        match application.protocol.as_str() {
            "openid-connect" => {
                let oidc = application.oidc_settings.unwrap_or_default();
                self.oidc_settings.push(OidcDescription {
                    allowed_origins: application.allowed_origins,
                    access_type: oidc.access_type,
                    root_url: oidc.root_url,
                    standard_flow_enabled: oidc.standard_flow_enabled,
                    implicit_flow_enabled: oidc.implicit_flow_enabled,
                    direct_access_grants_enabled: oidc.direct_access_grants_enabled,
                    base_url: oidc.base_url,
                });
            }
            "saml" => {
                let saml = application.saml_settings.unwrap_or_default();
                self.saml_settings
                    .push(SamlBlock::from_settings(application.allowed_origins, saml));
            }
            _ => {}
        }
        self.protocol = application.protocol;
    }
}

fn oidc_description_schema() -> Schema {
    Schema::new("Settings of an OIDC protocol based application.")
        .with_attribute(
            "allowed_origins",
            Attribute::computed(AttributeType::StringList, "Origins allowed to use the application."),
        )
        .with_attribute("access_type", Attribute::computed_string("The OIDC access type."))
        .with_attribute("root_url", Attribute::computed_string("URL appended to relative URLs."))
        .with_attribute(
            "standard_flow_enabled",
            Attribute::computed(AttributeType::Bool, "Whether the OIDC standard flow is enabled."),
        )
        .with_attribute(
            "implicit_flow_enabled",
            Attribute::computed(AttributeType::Bool, "Whether the OIDC implicit flow is enabled."),
        )
        .with_attribute(
            "direct_access_grants_enabled",
            Attribute::computed(AttributeType::Bool, "Whether direct access grants are enabled."),
        )
        .with_attribute("base_url", Attribute::computed_string("The OIDC base URL."))
}

/// `tozny_realm_application` data source: finds an application by its client ID.
pub struct RealmApplicationDataSource;

#[async_trait]
impl DataSource for RealmApplicationDataSource {
    type Model = RealmApplicationLookup;
    const TYPE_NAME: &'static str = "tozny_realm_application";

    fn schema() -> Schema {
        CredentialSource::extend_schema(
            Schema::new("Look up a realm application by client ID.")
                .with_attribute(
                    "realm_name",
                    Attribute::required_string("Name of the realm the application belongs to."),
                )
                .with_attribute(
                    "client_id",
                    Attribute::required_string("The external id clients use to reference the application."),
                )
                .with_attribute(
                    "application_id",
                    Attribute::computed_string("Server defined unique identifier for the application."),
                )
                .with_attribute("name", Attribute::computed_string("Human readable name of the application."))
                .with_attribute(
                    "protocol",
                    Attribute::computed_string("Protocol used by the application: openid-connect or saml."),
                )
                .with_attribute(
                    "active",
                    Attribute::computed(AttributeType::Bool, "Whether the application may authenticate identities."),
                )
                .with_attribute(
                    "oidc_settings",
                    Attribute::computed_block("Settings for an OIDC application.", oidc_description_schema()),
                )
                .with_attribute(
                    "saml_settings",
                    Attribute::computed_block("Settings for a SAML application.", saml_schema()),
                ),
        )
    }

    async fn read(
        &self,
        session: &Session,
        mut lookup: RealmApplicationLookup,
    ) -> Result<RealmApplicationLookup> {
        let client = session.client_for(&lookup.credentials)?;
        let list = client.list_realm_applications(&lookup.realm_name).await?;
        let application = list
            .applications
            .into_iter()
            .find(|application| application.client_id == lookup.client_id)
            .ok_or_else(|| {
                ClientError::NotFound(format!(
                    "application with client id {:?} in realm {:?}",
                    lookup.client_id, lookup.realm_name
                ))
            })?;
        lookup.apply(application);
        Ok(lookup)
    }
}

#[cfg(test)]
mod tests {
    use tozny_client::{OidcSettings, SamlSettings};

    use super::*;

    #[test]
    fn test_protocol_selects_settings_block() {
        let mut lookup = RealmApplicationLookup::default();
        lookup.apply(Application {
            id: "app-1".into(),
            protocol: "openid-connect".into(),
            allowed_origins: vec!["https://portal.example".into()],
            oidc_settings: Some(OidcSettings {
                implicit_flow_enabled: true,
                ..Default::default()
            }),
            ..Default::default()
        });
        assert_eq!(lookup.id, "app-1");
        assert!(lookup.saml_settings.is_empty());
        assert!(lookup.oidc_settings[0].implicit_flow_enabled);
        assert_eq!(lookup.oidc_settings[0].allowed_origins, vec!["https://portal.example"]);

        lookup.apply(Application {
            id: "app-2".into(),
            protocol: "saml".into(),
            saml_settings: Some(SamlSettings {
                sign_documents: true,
                ..Default::default()
            }),
            ..Default::default()
        });
        assert!(lookup.oidc_settings.is_empty());
        assert!(lookup.saml_settings[0].sign_documents);
    }
}
