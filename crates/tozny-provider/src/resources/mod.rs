//! Managed resource handlers, one module per resource type.

mod account;
mod client_registration_token;
mod identity_group_membership;
mod pam_jira_plugin;
mod primary_realm_tozid_federation;
mod realm;
mod realm_application;
mod realm_application_access_control;
mod realm_application_client_secret;
mod realm_application_mapper;
mod realm_application_role;
mod realm_default_groups;
mod realm_group;
mod realm_group_role_mappings;
mod realm_provider;
mod realm_provider_mapper;
mod realm_role;
mod shadow_realm_tozid_federation;

pub use account::AccountResource;
pub use client_registration_token::ClientRegistrationTokenResource;
pub use identity_group_membership::IdentityGroupMembershipResource;
pub use pam_jira_plugin::JiraPluginResource;
pub use primary_realm_tozid_federation::PrimaryRealmFederationResource;
pub use realm::RealmResource;
pub use realm_application::RealmApplicationResource;
pub(crate) use realm_application::{SamlBlock, saml_schema};
pub use realm_application_access_control::AccessControlResource;
pub use realm_application_client_secret::ClientSecretResource;
pub use realm_application_mapper::ApplicationMapperResource;
pub use realm_application_role::ApplicationRoleResource;
pub use realm_default_groups::DefaultGroupsResource;
pub use realm_group::RealmGroupResource;
pub use realm_group_role_mappings::GroupRoleMappingsResource;
pub use realm_provider::RealmProviderResource;
pub use realm_provider_mapper::ProviderMapperResource;
pub use realm_role::RealmRoleResource;
pub use shadow_realm_tozid_federation::ShadowRealmFederationResource;

use tozny_core::{CoreError, reconcile};

use crate::provider::Provider;

pub(crate) fn register(provider: &mut Provider) {
    provider.register_resource(AccountResource);
    provider.register_resource(ClientRegistrationTokenResource);
    provider.register_resource(RealmResource);
    provider.register_resource(RealmRoleResource);
    provider.register_resource(RealmGroupResource);
    provider.register_resource(GroupRoleMappingsResource);
    provider.register_resource(DefaultGroupsResource);
    provider.register_resource(IdentityGroupMembershipResource);
    provider.register_resource(RealmApplicationResource);
    provider.register_resource(ApplicationRoleResource);
    provider.register_resource(ClientSecretResource);
    provider.register_resource(AccessControlResource);
    provider.register_resource(PrimaryRealmFederationResource);
    provider.register_resource(ShadowRealmFederationResource);
    provider.register_resource(RealmProviderResource);
    provider.register_resource(ProviderMapperResource);
    provider.register_resource(ApplicationMapperResource);
    provider.register_resource(JiraPluginResource);
}

/// State ID for objects the server does not identify on its own.
pub(crate) fn generated_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Reject values outside a fixed set of choices.
pub(crate) fn check_one_of(name: &str, value: &str, allowed: &[&str]) -> Result<(), CoreError> {
    if allowed.contains(&value) {
        return Ok(());
    }
    Err(CoreError::invalid(
        name,
        format!("{value:?} is not one of {allowed:?}"),
    ))
}

/// The declared list when it holds the same values as the server's, so a
/// reordering on the server is not reported as a change.
pub(crate) fn declared_or_observed(declared: Vec<String>, observed: Vec<String>) -> Vec<String> {
    if declared.len() == observed.len() && reconcile(&declared, &observed).is_empty() {
        declared
    } else {
        observed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|id| id.to_string()).collect()
    }

    #[test]
    fn test_declared_order_survives_server_reordering() {
        assert_eq!(
            declared_or_observed(list(&["a", "b"]), list(&["b", "a"])),
            list(&["a", "b"])
        );
        assert_eq!(
            declared_or_observed(list(&["a", "b"]), list(&["a", "c"])),
            list(&["a", "c"])
        );
        assert_eq!(
            declared_or_observed(list(&["a"]), list(&["a", "b"])),
            list(&["a", "b"])
        );
    }
}
