use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tozny_client::{ProviderConnectionSettings, RealmProvider};
use tozny_core::{Attribute, AttributeType, Schema};

use crate::error::{ProviderError, Result};
use crate::provider::Resource;
use crate::resources::declared_or_observed;
use crate::session::{CredentialSource, Session};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionSettingsBlock {
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
    pub bind_credential: String,
    pub search_scope: i64,
    pub trust_store_spi_mode: String,
    pub connection_pooling: bool,
    pub pagination: bool,
}

impl From<&ConnectionSettingsBlock> for ProviderConnectionSettings {
    fn from(block: &ConnectionSettingsBlock) -> Self {
        Self {
            kind: block.kind.clone(),
            identity_name_attribute: block.identity_name_attribute.clone(),
            rdn_attribute: block.rdn_attribute.clone(),
            uuid_attribute: block.uuid_attribute.clone(),
            identity_object_classes: block.identity_object_classes.clone(),
            connection_url: block.connection_url.clone(),
            identity_dn: block.identity_dn.clone(),
            authentication_type: block.authentication_type.clone(),
            bind_dn: block.bind_dn.clone(),
            bind_credential: block.bind_credential.clone(),
            search_scope: block.search_scope,
            trust_store_spi_mode: block.trust_store_spi_mode.clone(),
            connection_pooling: block.connection_pooling,
            pagination: block.pagination,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RealmProviderModel {
    #[serde(default)]
    pub id: String,
    #[serde(flatten)]
    pub credentials: CredentialSource,
    pub realm_name: String,
    pub name: String,
    pub provider_type: String,
    pub active: bool,
    pub import_identities: bool,
    pub priority: i64,
    pub connection_settings: Vec<ConnectionSettingsBlock>,
    #[serde(default)]
    pub provider_id: String,
}

impl RealmProviderModel {
    fn settings(&self) -> Result<&ConnectionSettingsBlock> {
        self.connection_settings.first().ok_or_else(|| {
            ProviderError::invalid("connection_settings", "exactly one block is required")
        })
    }

    fn provider(&self) -> Result<RealmProvider> {
        Ok(RealmProvider {
            kind: self.provider_type.clone(),
            name: self.name.clone(),
            active: self.active,
            import_identities: self.import_identities,
            priority: self.priority,
            connection_settings: self.settings()?.into(),
            ..Default::default()
        })
    }

    /// Copy server values back. The bind credential comes back masked, so the
    /// declared one is kept.
    fn apply(&mut self, provider: RealmProvider) {
        let declared = self.connection_settings.first().cloned().unwrap_or_default();
        let server = provider.connection_settings;
        self.provider_type = provider.kind;
        self.name = provider.name;
        self.active = provider.active;
        self.import_identities = provider.import_identities;
        self.priority = provider.priority;
        self.connection_settings = vec![ConnectionSettingsBlock {
            kind: server.kind,
            identity_name_attribute: server.identity_name_attribute,
            rdn_attribute: server.rdn_attribute,
            uuid_attribute: server.uuid_attribute,
            identity_object_classes: declared_or_observed(
                declared.identity_object_classes,
                server.identity_object_classes,
            ),
            connection_url: server.connection_url,
            identity_dn: server.identity_dn,
            authentication_type: server.authentication_type,
            bind_dn: server.bind_dn,
            bind_credential: declared.bind_credential,
            search_scope: server.search_scope,
            trust_store_spi_mode: server.trust_store_spi_mode,
            connection_pooling: server.connection_pooling,
            pagination: server.pagination,
        }];
    }
}

fn connection_settings_schema() -> Schema {
    let string = |description: &str| Attribute::required_string(description).force_new();
    let flag = |description: &str| Attribute::required(AttributeType::Bool, description).force_new();

    Schema::new("Settings the realm uses to reach the LDAP directory.")
        .with_attribute(
            "type",
            string("Directory vendor: ad, Red Hat Directory Server, Tivoli, Novell eDirectory or other."),
        )
        .with_attribute(
            "identity_name_attribute",
            string("LDAP attribute mapped as the identity name, e.g. uid or sAMAccountName."),
        )
        .with_attribute("rdn_attribute", string("LDAP attribute used as RDN of a typical identity DN."))
        .with_attribute(
            "uuid_attribute",
            string("LDAP attribute used as the unique object identifier, e.g. entryUUID or objectGUID."),
        )
        .with_attribute(
            "identity_object_classes",
            Attribute::required(
                AttributeType::StringList,
                "All objectClass values of identities in LDAP.",
            )
            .force_new(),
        )
        .with_attribute("connection_url", string("URL for connecting to the directory."))
        .with_attribute("identity_dn", string("Full DN of the LDAP tree holding identities."))
        .with_attribute("authentication_type", string("LDAP authentication type: none or simple."))
        .with_attribute("bind_dn", string("DN of the LDAP admin used by the realm."))
        .with_attribute(
            "bind_credential",
            string("Password of the LDAP admin.").sensitive(),
        )
        .with_attribute(
            "search_scope",
            Attribute::required(AttributeType::Int, "1 searches one level, 2 the whole subtree.")
                .force_new(),
        )
        .with_attribute(
            "trust_store_spi_mode",
            string("Whether LDAP connections use the realm truststore: always, never or ldapsOnly."),
        )
        .with_attribute("connection_pooling", flag("Whether connections to the directory are pooled."))
        .with_attribute("pagination", flag("Whether the directory supports pagination."))
}

/// `tozny_realm_provider`: an LDAP directory a realm syncs identities from.
pub struct RealmProviderResource;

#[async_trait]
impl Resource for RealmProviderResource {
    type Model = RealmProviderModel;
    const TYPE_NAME: &'static str = "tozny_realm_provider";

    fn schema() -> Schema {
        CredentialSource::extend_schema(
            Schema::new("An identity provider for a realm.")
                .with_attribute(
                    "realm_name",
                    Attribute::required_string("The name of the realm to associate the provider with.")
                        .force_new(),
                )
                .with_attribute(
                    "name",
                    Attribute::required_string("User defined name for the provider.").force_new(),
                )
                .with_attribute(
                    "provider_type",
                    Attribute::optional_string("The type of provider. Only ldap is supported.")
                        .with_default("ldap")
                        .force_new(),
                )
                .with_attribute(
                    "active",
                    Attribute::optional_bool("Whether the provider is enabled for syncing identities.")
                        .with_default(true)
                        .force_new(),
                )
                .with_attribute(
                    "import_identities",
                    Attribute::optional_bool("Whether LDAP identities are imported into the realm.")
                        .with_default(true)
                        .force_new(),
                )
                .with_attribute(
                    "priority",
                    Attribute::optional(
                        AttributeType::Int,
                        "Lookup priority of the provider; lower numbers come first.",
                    )
                    .with_default(json!(0))
                    .force_new(),
                )
                .with_attribute(
                    "connection_settings",
                    Attribute::required_block(
                        "Settings for the realm to use when syncing identities from the provider.",
                        connection_settings_schema(),
                    )
                    .max_items(1)
                    .force_new(),
                )
                .with_attribute(
                    "provider_id",
                    Attribute::computed_string("Service defined unique identifier for the provider."),
                ),
        )
    }

    async fn create(
        &self,
        session: &Session,
        mut planned: RealmProviderModel,
    ) -> Result<RealmProviderModel> {
        let request = planned.provider()?;
        let client = session.client_for(&planned.credentials)?;
        let created = client
            .create_realm_provider(&planned.realm_name, &request)
            .await?;
        planned.provider_id = created.id.clone();
        planned.id = created.id;
        Ok(planned)
    }

    async fn read(
        &self,
        session: &Session,
        mut state: RealmProviderModel,
    ) -> Result<Option<RealmProviderModel>> {
        let client = session.client_for(&state.credentials)?;
        let provider = client
            .describe_realm_provider(&state.realm_name, &state.provider_id)
            .await?;
        state.apply(provider);
        Ok(Some(state))
    }

    async fn delete(&self, session: &Session, state: RealmProviderModel) -> Result<()> {
        let client = session.client_for(&state.credentials)?;
        client
            .delete_realm_provider(&state.realm_name, &state.provider_id)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> serde_json::Value {
        json!({
            "type": "ad",
            "identity_name_attribute": "cn",
            "rdn_attribute": "cn",
            "uuid_attribute": "objectGUID",
            "identity_object_classes": ["person", "user"],
            "connection_url": "ldaps://ldap.example",
            "identity_dn": "ou=users,dc=example,dc=com",
            "authentication_type": "simple",
            "bind_dn": "cn=admin,dc=example,dc=com",
            "bind_credential": "s3cr3t",
            "search_scope": 2,
            "trust_store_spi_mode": "ldapsOnly",
            "connection_pooling": true,
            "pagination": false
        })
    }

    #[test]
    fn test_defaults_and_request_shape() {
        let model: RealmProviderModel = RealmProviderResource::schema()
            .decode(&json!({
                "realm_name": "acme",
                "name": "corp-ldap",
                "connection_settings": [settings()]
            }))
            .unwrap();
        assert_eq!(model.provider_type, "ldap");
        assert!(model.active && model.import_identities);
        assert_eq!(model.priority, 0);

        let request = serde_json::to_value(model.provider().unwrap()).unwrap();
        assert_eq!(request["type"], "ldap");
        assert_eq!(request["connection_settings"]["type"], "ad");
        assert_eq!(request["connection_settings"]["search_scope"], 2);
        assert!(request.get("id").is_none());
    }

    #[test]
    fn test_second_settings_block_rejected() {
        let err = RealmProviderResource::schema()
            .decode::<RealmProviderModel>(&json!({
                "realm_name": "acme",
                "name": "corp-ldap",
                "connection_settings": [settings(), settings()]
            }))
            .unwrap_err();
        assert!(err.to_string().contains("connection_settings"));
    }

    #[test]
    fn test_apply_keeps_credential_and_class_order() {
        let mut model: RealmProviderModel = RealmProviderResource::schema()
            .decode(&json!({
                "realm_name": "acme",
                "name": "corp-ldap",
                "connection_settings": [settings()]
            }))
            .unwrap();
        let mut server = model.provider().unwrap();
        server.connection_settings.bind_credential = "**********".into();
        server.connection_settings.identity_object_classes = vec!["user".into(), "person".into()];
        server.priority = 3;

        model.apply(server);
        let block = &model.connection_settings[0];
        assert_eq!(block.bind_credential, "s3cr3t");
        assert_eq!(block.identity_object_classes, vec!["person", "user"]);
        assert_eq!(model.priority, 3);
    }
}
