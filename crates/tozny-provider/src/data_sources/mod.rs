//! Read-only lookups.

mod realm_application;
mod realm_application_role;
mod realm_application_saml_description;
mod realm_role;

pub use realm_application::RealmApplicationDataSource;
pub use realm_application_role::ApplicationRoleDataSource;
pub use realm_application_saml_description::SamlDescriptionDataSource;
pub use realm_role::RealmRoleDataSource;

use crate::provider::Provider;

pub(crate) fn register(provider: &mut Provider) {
    provider.register_data_source(RealmRoleDataSource);
    provider.register_data_source(ApplicationRoleDataSource);
    provider.register_data_source(RealmApplicationDataSource);
    provider.register_data_source(SamlDescriptionDataSource);
}
