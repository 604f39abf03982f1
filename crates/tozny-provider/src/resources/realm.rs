use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tozny_client::{CreateRealmRequest, Realm, RealmSettingsUpdateRequest};
use tozny_core::{Attribute, AttributeType, Schema};

use crate::error::Result;
use crate::provider::Resource;
use crate::session::{CredentialSource, Session};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SovereignBlock {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RealmModel {
    #[serde(default)]
    pub id: String,
    #[serde(flatten)]
    pub credentials: CredentialSource,
    pub realm_name: String,
    pub sovereign_name: String,
    #[serde(default)]
    pub default_registration_token: String,
    pub mpc_enabled: bool,
    pub tozid_federation_enabled: bool,
    #[serde(default)]
    pub realm_id: i64,
    #[serde(default)]
    pub domain: String,
    #[serde(default)]
    pub admin_url: String,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub broker_identity_tozny_id: String,
    #[serde(default)]
    pub sovereign: Vec<SovereignBlock>,
}

impl RealmModel {
    fn apply(&mut self, realm: Realm) {
        self.realm_id = realm.id;
        self.domain = realm.domain;
        self.admin_url = realm.admin_url;
        self.active = realm.active;
        self.broker_identity_tozny_id = realm.broker_identity_tozny_id;
        self.sovereign = vec![SovereignBlock {
            id: realm.sovereign.id,
            name: realm.sovereign.name,
        }];
    }
}

/// `tozny_realm`: an identity realm and its feature settings.
pub struct RealmResource;

#[async_trait]
impl Resource for RealmResource {
    type Model = RealmModel;
    const TYPE_NAME: &'static str = "tozny_realm";
    const UPDATABLE: bool = true;

    fn schema() -> Schema {
        let sovereign = Schema::new("The realm's sovereign identity.")
            .with_attribute(
                "id",
                Attribute::computed(AttributeType::Int, "Server defined sovereign identifier."),
            )
            .with_attribute("name", Attribute::computed_string("Sovereign name."));

        CredentialSource::extend_schema(
            Schema::new("Tozny identity realm.")
                .with_attribute(
                    "realm_name",
                    Attribute::required_string("User defined identifier for the realm.").force_new(),
                )
                .with_attribute(
                    "sovereign_name",
                    Attribute::required_string("User defined name for the realm's sovereign.")
                        .force_new(),
                )
                .with_attribute(
                    "default_registration_token",
                    Attribute::optional_string(
                        "Registration token used by realm identities when registering.",
                    )
                    .with_default("")
                    .force_new()
                    .sensitive(),
                )
                .with_attribute(
                    "mpc_enabled",
                    Attribute::optional_bool("Whether multi-party control is enabled for the realm.")
                        .with_default(false),
                )
                .with_attribute(
                    "tozid_federation_enabled",
                    Attribute::optional_bool("Whether TozID federation is enabled for the realm.")
                        .with_default(false),
                )
                .with_attribute(
                    "realm_id",
                    Attribute::computed(AttributeType::Int, "Server defined identifier for the realm."),
                )
                .with_attribute("domain", Attribute::computed_string("Realm domain."))
                .with_attribute("admin_url", Attribute::computed_string("Realm admin console URL."))
                .with_attribute(
                    "active",
                    Attribute::computed(AttributeType::Bool, "Whether the realm is active."),
                )
                .with_attribute(
                    "broker_identity_tozny_id",
                    Attribute::computed_string("Client ID of the realm's broker identity."),
                )
                .with_attribute(
                    "sovereign",
                    Attribute::computed_block("The realm's sovereign identity.", sovereign),
                ),
        )
    }

    async fn create(&self, session: &Session, mut planned: RealmModel) -> Result<RealmModel> {
        let client = session.client_for(&planned.credentials)?;
        let realm = client
            .create_realm(&CreateRealmRequest {
                realm_name: planned.realm_name.clone(),
                sovereign_name: planned.sovereign_name.clone(),
                registration_token: planned.default_registration_token.clone(),
            })
            .await?;
        planned.id = realm.id.to_string();
        planned.apply(realm);

        if planned.mpc_enabled || planned.tozid_federation_enabled {
            client
                .update_realm_settings(
                    &planned.realm_name,
                    &RealmSettingsUpdateRequest {
                        mpc_enabled: Some(planned.mpc_enabled),
                        tozid_federation_enabled: Some(planned.tozid_federation_enabled),
                    },
                )
                .await?;
        }
        Ok(planned)
    }

    async fn read(&self, session: &Session, mut state: RealmModel) -> Result<Option<RealmModel>> {
        let client = session.client_for(&state.credentials)?;
        let realm = client.describe_realm(&state.realm_name).await?;
        state.apply(realm);

        let info = client.private_realm_info(&state.realm_name).await?;
        state.mpc_enabled = info.mpc_enabled;
        state.tozid_federation_enabled = info.tozid_federation_enabled;
        Ok(Some(state))
    }

    async fn update(
        &self,
        session: &Session,
        prior: RealmModel,
        planned: RealmModel,
    ) -> Result<RealmModel> {
        let request = RealmSettingsUpdateRequest {
            mpc_enabled: (prior.mpc_enabled != planned.mpc_enabled).then_some(planned.mpc_enabled),
            tozid_federation_enabled: (prior.tozid_federation_enabled
                != planned.tozid_federation_enabled)
                .then_some(planned.tozid_federation_enabled),
        };
        if request.mpc_enabled.is_some() || request.tozid_federation_enabled.is_some() {
            let client = session.client_for(&planned.credentials)?;
            client
                .update_realm_settings(&planned.realm_name, &request)
                .await?;
        }
        Ok(planned)
    }

    async fn delete(&self, session: &Session, state: RealmModel) -> Result<()> {
        let client = session.client_for(&state.credentials)?;
        client.delete_realm(&state.realm_name).await?;
        Ok(())
    }
}
