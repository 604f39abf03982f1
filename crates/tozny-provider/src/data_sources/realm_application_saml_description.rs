use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tozny_core::{Attribute, Schema};

use crate::error::{ProviderError, Result};
use crate::provider::DataSource;
use crate::resources::{check_one_of, generated_id};
use crate::session::{CredentialSource, Session};

const DESCRIPTION_FORMATS: &[&str] = &[
    "saml-idp-descriptor",
    "keycloak-saml",
    "saml-sp-descriptor",
    "keycloak-saml-subsystem",
];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SamlDescriptionLookup {
    #[serde(default)]
    pub id: String,
    #[serde(flatten)]
    pub credentials: CredentialSource,
    pub realm_name: String,
    pub application_id: String,
    pub format: String,
    pub description_save_filepath: String,
    #[serde(default)]
    pub description: String,
}

/// `tozny_realm_application_saml_description` data source: fetches an
/// application's SAML XML metadata and saves it to a file.
pub struct SamlDescriptionDataSource;

#[async_trait]
impl DataSource for SamlDescriptionDataSource {
    type Model = SamlDescriptionLookup;
    const TYPE_NAME: &'static str = "tozny_realm_application_saml_description";

    fn schema() -> Schema {
        CredentialSource::extend_schema(
            Schema::new("The SAML XML description document of a realm application.")
                .with_attribute(
                    "realm_name",
                    Attribute::required_string("Name of the realm the application belongs to."),
                )
                .with_attribute(
                    "application_id",
                    Attribute::required_string("The application to describe."),
                )
                .with_attribute(
                    "format",
                    Attribute::required_string(
                        "Description format: saml-idp-descriptor, keycloak-saml, saml-sp-descriptor or keycloak-saml-subsystem.",
                    ),
                )
                .with_attribute(
                    "description_save_filepath",
                    Attribute::required_string("File the description is written to."),
                )
                .with_attribute(
                    "description",
                    Attribute::computed_string("SAML XML description document.").sensitive(),
                ),
        )
    }

    async fn read(
        &self,
        session: &Session,
        mut lookup: SamlDescriptionLookup,
    ) -> Result<SamlDescriptionLookup> {
        check_one_of("format", &lookup.format, DESCRIPTION_FORMATS)?;
        let client = session.client_for(&lookup.credentials)?;
        let description = client
            .fetch_application_saml_description(
                &lookup.realm_name.to_lowercase(),
                &lookup.application_id,
                &lookup.format,
            )
            .await?
            .description;

        let path = &lookup.description_save_filepath;
        tokio::fs::write(path, &description)
            .await
            .map_err(|err| ProviderError::io(path.clone(), err))?;
        tracing::debug!(path = %path, "wrote SAML description");

        lookup.description = description;
        lookup.id = generated_id();
        Ok(lookup)
    }
}
