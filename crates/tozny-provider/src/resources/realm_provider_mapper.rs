use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tozny_client::ProviderMapper;
use tozny_core::{Attribute, AttributeType, Schema};

use crate::error::Result;
use crate::provider::Resource;
use crate::resources::declared_or_observed;
use crate::session::{CredentialSource, Session};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderMapperModel {
    #[serde(default)]
    pub id: String,
    #[serde(flatten)]
    pub credentials: CredentialSource,
    pub realm_name: String,
    pub provider_id: String,
    pub name: String,
    pub provider_type: String,
    pub groups_dn: String,
    pub group_name_attribute: String,
    pub group_object_classes: Vec<String>,
    pub preserve_group_inheritance: bool,
    pub ignore_missing_groups: bool,
    pub member_of_attribute: String,
    pub membership_attribute: String,
    pub membership_attribute_type: String,
    pub membership_identity_attribute: String,
    pub mode: String,
    pub identity_groups_retrieval_strategy: String,
    pub drop_missing_groups_on_sync: bool,
    #[serde(default)]
    pub provider_mapper_id: String,
}

impl ProviderMapperModel {
    fn mapper(&self) -> ProviderMapper {
        ProviderMapper {
            kind: self.provider_type.clone(),
            name: self.name.clone(),
            groups_dn: self.groups_dn.clone(),
            group_name_attribute: self.group_name_attribute.clone(),
            group_object_classes: self.group_object_classes.clone(),
            preserve_group_inheritance: self.preserve_group_inheritance,
            ignore_missing_groups: self.ignore_missing_groups,
            member_of_attribute: self.member_of_attribute.clone(),
            membership_attribute: self.membership_attribute.clone(),
            membership_attribute_type: self.membership_attribute_type.clone(),
            membership_identity_attribute: self.membership_identity_attribute.clone(),
            mode: self.mode.clone(),
            identity_groups_retrieval_strategy: self.identity_groups_retrieval_strategy.clone(),
            drop_missing_groups_on_sync: self.drop_missing_groups_on_sync,
            ..Default::default()
        }
    }

    fn apply(&mut self, mapper: ProviderMapper) {
        self.provider_type = mapper.kind;
        self.name = mapper.name;
        self.groups_dn = mapper.groups_dn;
        self.group_name_attribute = mapper.group_name_attribute;
        self.group_object_classes = declared_or_observed(
            std::mem::take(&mut self.group_object_classes),
            mapper.group_object_classes,
        );
        self.preserve_group_inheritance = mapper.preserve_group_inheritance;
        self.ignore_missing_groups = mapper.ignore_missing_groups;
        self.member_of_attribute = mapper.member_of_attribute;
        self.membership_attribute = mapper.membership_attribute;
        self.membership_attribute_type = mapper.membership_attribute_type;
        self.membership_identity_attribute = mapper.membership_identity_attribute;
        self.mode = mapper.mode;
        self.identity_groups_retrieval_strategy = mapper.identity_groups_retrieval_strategy;
        self.drop_missing_groups_on_sync = mapper.drop_missing_groups_on_sync;
    }
}

/// `tozny_realm_provider_mapper`: maps LDAP groups of a realm provider onto realm groups.
pub struct ProviderMapperResource;

#[async_trait]
impl Resource for ProviderMapperResource {
    type Model = ProviderMapperModel;
    const TYPE_NAME: &'static str = "tozny_realm_provider_mapper";

    fn schema() -> Schema {
        let string = |description: &str| Attribute::required_string(description).force_new();
        let flag = |description: &str| Attribute::required(AttributeType::Bool, description).force_new();

        CredentialSource::extend_schema(
            Schema::new("A group mapper for a realm provider.")
                .with_attribute("realm_name", string("The name of the realm the provider belongs to."))
                .with_attribute(
                    "provider_id",
                    string("Service defined unique identifier for the provider to attach the mapper to."),
                )
                .with_attribute("name", string("User defined name for the provider mapper."))
                .with_attribute(
                    "provider_type",
                    string("Mapper type, e.g. group-ldap-mapper or role-ldap-mapper."),
                )
                .with_attribute(
                    "groups_dn",
                    string("LDAP DN where groups of this tree are saved, e.g. ou=groups,dc=example,dc=org."),
                )
                .with_attribute(
                    "group_name_attribute",
                    string("LDAP attribute used in group objects for name and RDN, usually cn."),
                )
                .with_attribute(
                    "group_object_classes",
                    Attribute::required(
                        AttributeType::StringList,
                        "Object classes of group objects, e.g. groupOfNames or group.",
                    )
                    .force_new(),
                )
                .with_attribute(
                    "preserve_group_inheritance",
                    flag("Whether LDAP group inheritance is propagated to the realm."),
                )
                .with_attribute(
                    "ignore_missing_groups",
                    flag("Whether missing groups in the hierarchy are ignored."),
                )
                .with_attribute(
                    "member_of_attribute",
                    string("LDAP attribute on identities listing their groups, usually memberOf."),
                )
                .with_attribute(
                    "membership_attribute",
                    string("LDAP attribute on groups used for membership, usually member."),
                )
                .with_attribute(
                    "membership_attribute_type",
                    string("How group members are declared: DN or UID."),
                )
                .with_attribute(
                    "membership_identity_attribute",
                    string("LDAP attribute on identities used for UID membership, usually uid."),
                )
                .with_attribute("mode", string("Group mapping mode: LDAP_ONLY, READ_ONLY or IMPORT."))
                .with_attribute(
                    "identity_groups_retrieval_strategy",
                    string("How the groups of an identity are retrieved from LDAP."),
                )
                .with_attribute(
                    "drop_missing_groups_on_sync",
                    flag("Whether realm groups no longer in LDAP are deleted during sync."),
                )
                .with_attribute(
                    "provider_mapper_id",
                    Attribute::computed_string("Service defined unique identifier for the provider mapper."),
                ),
        )
    }

    async fn create(
        &self,
        session: &Session,
        mut planned: ProviderMapperModel,
    ) -> Result<ProviderMapperModel> {
        let client = session.client_for(&planned.credentials)?;
        let created = client
            .create_realm_provider_mapper(&planned.realm_name, &planned.provider_id, &planned.mapper())
            .await?;
        planned.provider_mapper_id = created.id.clone();
        planned.id = created.id;
        Ok(planned)
    }

    async fn read(
        &self,
        session: &Session,
        mut state: ProviderMapperModel,
    ) -> Result<Option<ProviderMapperModel>> {
        let client = session.client_for(&state.credentials)?;
        let mapper = client
            .describe_realm_provider_mapper(
                &state.realm_name,
                &state.provider_id,
                &state.provider_mapper_id,
            )
            .await?;
        state.apply(mapper);
        Ok(Some(state))
    }

    async fn delete(&self, session: &Session, state: ProviderMapperModel) -> Result<()> {
        let client = session.client_for(&state.credentials)?;
        client
            .delete_realm_provider_mapper(
                &state.realm_name,
                &state.provider_id,
                &state.provider_mapper_id,
            )
            .await?;
        Ok(())
    }
}
