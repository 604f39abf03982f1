use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tozny_client::ApplicationMapper;
use tozny_core::{Attribute, CoreError, Schema};

use crate::error::Result;
use crate::provider::Resource;
use crate::resources::check_one_of;
use crate::session::{CredentialSource, Session};

const PROTOCOLS: &[&str] = &["openid-connect", "saml"];
const MAPPER_TYPES: &[&str] = &[
    "oidc-user-session-note-mapper",
    "oidc-user-attribute-mapper",
    "oidc-group-membership-mapper",
    "saml-role-list-mapper",
    "saml-user-property-mapper",
];
const CLAIM_JSON_TYPES: &[&str] = &["String", "long", "int", "bool"];
const SAML_NAME_FORMATS: &[&str] = &["Basic", "URI Reference", "Unspecified"];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApplicationMapperModel {
    #[serde(default)]
    pub id: String,
    #[serde(flatten)]
    pub credentials: CredentialSource,
    pub realm_name: String,
    pub application_id: String,
    pub name: String,
    pub protocol: String,
    pub mapper_type: String,
    #[serde(default)]
    pub user_session_note: String,
    #[serde(default)]
    pub user_attribute: String,
    #[serde(default)]
    pub token_claim_name: String,
    #[serde(default)]
    pub claim_json_type: String,
    pub add_to_id_token: bool,
    pub add_to_access_token: bool,
    pub add_to_user_info: bool,
    pub multivalued: bool,
    pub aggregate_attribute_values: bool,
    #[serde(default)]
    pub saml_attribute_name: String,
    #[serde(default)]
    pub saml_attribute_name_format: String,
    #[serde(default)]
    pub friendly_name: String,
    #[serde(default)]
    pub role_attribute_name: String,
    #[serde(default)]
    pub property: String,
    pub single_role_attribute: bool,
    pub full_group_path: bool,
    #[serde(default)]
    pub application_mapper_id: String,
}

impl ApplicationMapperModel {
    fn realm(&self) -> String {
        self.realm_name.to_lowercase()
    }

    fn check(&self) -> std::result::Result<(), CoreError> {
        check_one_of("protocol", &self.protocol, PROTOCOLS)?;
        check_one_of("mapper_type", &self.mapper_type, MAPPER_TYPES)?;
        if !self.claim_json_type.is_empty() {
            check_one_of("claim_json_type", &self.claim_json_type, CLAIM_JSON_TYPES)?;
        }
        if !self.saml_attribute_name_format.is_empty() {
            check_one_of(
                "saml_attribute_name_format",
                &self.saml_attribute_name_format,
                SAML_NAME_FORMATS,
            )?;
        }
        Ok(())
    }

    fn mapper(&self) -> ApplicationMapper {
        ApplicationMapper {
            name: self.name.clone(),
            protocol: self.protocol.clone(),
            mapper_type: self.mapper_type.clone(),
            user_session_note: self.user_session_note.clone(),
            user_attribute: self.user_attribute.clone(),
            full_path: self.full_group_path,
            token_claim_name: self.token_claim_name.clone(),
            claim_json_type: self.claim_json_type.clone(),
            add_to_id_token: self.add_to_id_token,
            add_to_access_token: self.add_to_access_token,
            add_to_user_info: self.add_to_user_info,
            multivalued: self.multivalued,
            aggregate_attribute_values: self.aggregate_attribute_values,
            role_attribute_name: self.role_attribute_name.clone(),
            property: self.property.clone(),
            friendly_name: self.friendly_name.clone(),
            saml_attribute_name: self.saml_attribute_name.clone(),
            saml_attribute_name_format: self.saml_attribute_name_format.clone(),
            single_role_attribute: self.single_role_attribute,
            ..Default::default()
        }
    }

    fn apply(&mut self, mapper: ApplicationMapper) {
        self.name = mapper.name;
        self.protocol = mapper.protocol;
        self.mapper_type = mapper.mapper_type;
        self.user_session_note = mapper.user_session_note;
        self.user_attribute = mapper.user_attribute;
        self.full_group_path = mapper.full_path;
        self.token_claim_name = mapper.token_claim_name;
        self.claim_json_type = mapper.claim_json_type;
        self.add_to_id_token = mapper.add_to_id_token;
        self.add_to_access_token = mapper.add_to_access_token;
        self.add_to_user_info = mapper.add_to_user_info;
        self.multivalued = mapper.multivalued;
        self.aggregate_attribute_values = mapper.aggregate_attribute_values;
        self.role_attribute_name = mapper.role_attribute_name;
        self.property = mapper.property;
        self.friendly_name = mapper.friendly_name;
        self.saml_attribute_name = mapper.saml_attribute_name;
        self.saml_attribute_name_format = mapper.saml_attribute_name_format;
        self.single_role_attribute = mapper.single_role_attribute;
    }
}

/// `tozny_realm_application_mapper`: claims and attributes added to an application's tokens.
pub struct ApplicationMapperResource;

#[async_trait]
impl Resource for ApplicationMapperResource {
    type Model = ApplicationMapperModel;
    const TYPE_NAME: &'static str = "tozny_realm_application_mapper";

    fn schema() -> Schema {
        let string = |description: &str| {
            Attribute::optional_string(description)
                .with_default("")
                .force_new()
        };
        let flag = |description: &str| {
            Attribute::optional_bool(description)
                .with_default(false)
                .force_new()
        };

        CredentialSource::extend_schema(
            Schema::new("A protocol mapper for a realm application.")
                .with_attribute(
                    "realm_name",
                    Attribute::required_string("The name of the realm the application belongs to.")
                        .force_new(),
                )
                .with_attribute(
                    "application_id",
                    Attribute::required_string("ID of the application the mapper is associated with.")
                        .force_new(),
                )
                .with_attribute(
                    "name",
                    Attribute::required_string("User defined name for the application mapper.").force_new(),
                )
                .with_attribute(
                    "protocol",
                    Attribute::required_string("Protocol the mapper applies to: openid-connect or saml.")
                        .force_new(),
                )
                .with_attribute(
                    "mapper_type",
                    Attribute::required_string("The category of data this mapper is applied to.").force_new(),
                )
                .with_attribute(
                    "user_session_note",
                    string("Name of the stored user session note to map."),
                )
                .with_attribute("user_attribute", string("Name of the stored user attribute to map."))
                .with_attribute(
                    "token_claim_name",
                    string("Name of the claim to insert into the token; dots create nested objects."),
                )
                .with_attribute(
                    "claim_json_type",
                    string("JSON type of the claim: String, long, int or bool."),
                )
                .with_attribute("add_to_id_token", flag("Whether the claim is added to the ID token."))
                .with_attribute(
                    "add_to_access_token",
                    flag("Whether the claim is added to the access token."),
                )
                .with_attribute("add_to_user_info", flag("Whether the claim is added to the user info."))
                .with_attribute(
                    "multivalued",
                    flag("Whether every value of the attribute is set on the claim instead of the first."),
                )
                .with_attribute(
                    "aggregate_attribute_values",
                    flag("Whether attribute values are aggregated with group attributes."),
                )
                .with_attribute(
                    "saml_attribute_name",
                    string("Name of the SAML attribute used for the mapped value."),
                )
                .with_attribute(
                    "saml_attribute_name_format",
                    string("SAML attribute name format: Basic, URI Reference or Unspecified."),
                )
                .with_attribute(
                    "friendly_name",
                    string("Human readable form of the SAML attribute name."),
                )
                .with_attribute(
                    "role_attribute_name",
                    string("Name of the SAML attribute roles are put into, e.g. Role or memberOf."),
                )
                .with_attribute(
                    "property",
                    string("Name of the user property to map, e.g. email."),
                )
                .with_attribute(
                    "single_role_attribute",
                    flag("Whether all roles are stored as values of one attribute."),
                )
                .with_attribute(
                    "full_group_path",
                    flag("Whether group mappers include the full group path in tokens."),
                )
                .with_attribute(
                    "application_mapper_id",
                    Attribute::computed_string("Server defined unique identifier for the application mapper."),
                ),
        )
    }

    async fn create(
        &self,
        session: &Session,
        mut planned: ApplicationMapperModel,
    ) -> Result<ApplicationMapperModel> {
        planned.check()?;
        let client = session.client_for(&planned.credentials)?;
        let created = client
            .create_application_mapper(&planned.realm(), &planned.application_id, &planned.mapper())
            .await?;
        planned.application_mapper_id = created.id.clone();
        planned.id = created.id;
        Ok(planned)
    }

    async fn read(
        &self,
        session: &Session,
        mut state: ApplicationMapperModel,
    ) -> Result<Option<ApplicationMapperModel>> {
        let client = session.client_for(&state.credentials)?;
        let mapper = client
            .describe_application_mapper(
                &state.realm(),
                &state.application_id,
                &state.application_mapper_id,
            )
            .await?;
        state.apply(mapper);
        Ok(Some(state))
    }

    async fn delete(&self, session: &Session, state: ApplicationMapperModel) -> Result<()> {
        let client = session.client_for(&state.credentials)?;
        client
            .delete_application_mapper(
                &state.realm(),
                &state.application_id,
                &state.application_mapper_id,
            )
            .await?;
        Ok(())
    }
}
