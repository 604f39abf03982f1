use std::collections::HashSet;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tozny_client::{AccessControlGroup, AccessControlPolicy};
use tozny_core::{Attribute, AttributeType, PresenceMap, Schema, reconcile};

use crate::error::Result;
use crate::provider::Resource;
use crate::session::{CredentialSource, Session};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupBlock {
    pub group_id: String,
    pub extend_to_children: bool,
}

impl From<&GroupBlock> for AccessControlGroup {
    fn from(block: &GroupBlock) -> Self {
        Self {
            id: block.group_id.clone(),
            extend_to_children: block.extend_to_children,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccessControlModel {
    #[serde(default)]
    pub id: String,
    #[serde(flatten)]
    pub credentials: CredentialSource,
    pub realm_name: String,
    pub application_id: String,
    pub enabled: bool,
    #[serde(default)]
    pub group: Vec<GroupBlock>,
}

impl AccessControlModel {
    /// Declared groups, first declaration of each ID wins.
    fn groups(&self) -> Vec<AccessControlGroup> {
        let mut seen = HashSet::new();
        self.group
            .iter()
            .filter(|block| seen.insert(block.group_id.as_str()))
            .map(AccessControlGroup::from)
            .collect()
    }
}

/// Groups to add and remove so the policy matches `desired`.
///
/// A declared group whose `extend_to_children` differs from the server is
/// added again to update it.
fn plan_group_changes(
    desired: &[GroupBlock],
    policy: &AccessControlPolicy,
) -> (Vec<AccessControlGroup>, Vec<AccessControlGroup>) {
    let delta = reconcile(
        desired.iter().map(|block| block.group_id.as_str()),
        policy.groups.iter().map(|group| group.id.as_str()),
    );
    let mut emitted = HashSet::new();
    let add = desired
        .iter()
        .filter(|block| {
            let needed = delta.add.contains(&block.group_id)
                || policy.groups.iter().any(|group| {
                    group.id == block.group_id && group.extend_to_children != block.extend_to_children
                });
            needed && emitted.insert(block.group_id.as_str())
        })
        .map(AccessControlGroup::from)
        .collect();
    let remove = policy
        .groups
        .iter()
        .filter(|group| delta.remove.contains(&group.id))
        .cloned()
        .collect();
    (add, remove)
}

/// Declared groups still on the server, then groups added outside this resource.
fn observed_groups(declared: &[GroupBlock], policy: &AccessControlPolicy) -> Vec<GroupBlock> {
    let presence = PresenceMap::new(
        declared.iter().map(|block| block.group_id.as_str()),
        policy.groups.iter().map(|group| group.id.as_str()),
    );
    presence
        .observed()
        .into_iter()
        .filter_map(|id| policy.groups.iter().find(|group| group.id == id))
        .map(|group| GroupBlock {
            group_id: group.id.clone(),
            extend_to_children: group.extend_to_children,
        })
        .collect()
}

/// `tozny_realm_application_access_control`: restricts an application to members of chosen groups.
pub struct AccessControlResource;

#[async_trait]
impl Resource for AccessControlResource {
    type Model = AccessControlModel;
    const TYPE_NAME: &'static str = "tozny_realm_application_access_control";
    const UPDATABLE: bool = true;

    fn schema() -> Schema {
        let group = Schema::new("A group whose members may access the application.")
            .with_attribute(
                "group_id",
                Attribute::required_string("Service defined unique identifier for the group."),
            )
            .with_attribute(
                "extend_to_children",
                Attribute::optional_bool("Whether subgroups may access the application as well.")
                    .with_default(false),
            );

        CredentialSource::extend_schema(
            Schema::new("Group based access control for a realm application.")
                .with_attribute(
                    "realm_name",
                    Attribute::required_string("The name of the realm associated with the application.")
                        .force_new(),
                )
                .with_attribute(
                    "application_id",
                    Attribute::required_string("Server defined unique identifier for the application.")
                        .force_new(),
                )
                .with_attribute(
                    "enabled",
                    Attribute::required(
                        AttributeType::Bool,
                        "Whether this application has managed access control.",
                    ),
                )
                .with_attribute(
                    "group",
                    Attribute::optional_block(
                        "Users within the selected groups can access this application.",
                        group,
                    ),
                ),
        )
    }

    async fn create(
        &self,
        session: &Session,
        mut planned: AccessControlModel,
    ) -> Result<AccessControlModel> {
        let client = session.client_for(&planned.credentials)?;
        client
            .set_access_control(&planned.realm_name, &planned.application_id, planned.enabled)
            .await?;
        if planned.enabled && !planned.group.is_empty() {
            client
                .add_access_control_groups(
                    &planned.realm_name,
                    &planned.application_id,
                    &planned.groups(),
                )
                .await?;
        }
        planned.id = planned.application_id.clone();
        Ok(planned)
    }

    async fn read(
        &self,
        session: &Session,
        mut state: AccessControlModel,
    ) -> Result<Option<AccessControlModel>> {
        let client = session.client_for(&state.credentials)?;
        let policy = client
            .describe_access_control(&state.realm_name, &state.application_id)
            .await?;
        state.enabled = policy.enabled;
        state.group = observed_groups(&state.group, &policy);
        Ok(Some(state))
    }

    async fn update(
        &self,
        session: &Session,
        prior: AccessControlModel,
        planned: AccessControlModel,
    ) -> Result<AccessControlModel> {
        let client = session.client_for(&planned.credentials)?;
        let (realm, application) = (&planned.realm_name, &planned.application_id);

        if prior.enabled != planned.enabled {
            client
                .set_access_control(realm, application, planned.enabled)
                .await?;
        }
        if !planned.enabled {
            return Ok(planned);
        }

        let policy = client.describe_access_control(realm, application).await?;
        let (add, remove) = plan_group_changes(&planned.group, &policy);
        if !add.is_empty() {
            client
                .add_access_control_groups(realm, application, &add)
                .await?;
        }
        if !remove.is_empty() {
            client
                .remove_access_control_groups(realm, application, &remove)
                .await?;
        }
        Ok(planned)
    }

    async fn delete(&self, session: &Session, state: AccessControlModel) -> Result<()> {
        let client = session.client_for(&state.credentials)?;
        client
            .set_access_control(&state.realm_name, &state.application_id, false)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(id: &str, children: bool) -> GroupBlock {
        GroupBlock {
            group_id: id.into(),
            extend_to_children: children,
        }
    }

    fn policy(groups: &[(&str, bool)]) -> AccessControlPolicy {
        AccessControlPolicy {
            enabled: true,
            groups: groups
                .iter()
                .map(|(id, children)| AccessControlGroup {
                    id: id.to_string(),
                    extend_to_children: *children,
                })
                .collect(),
        }
    }

    #[test]
    fn test_plan_group_changes() {
        let desired = vec![block("g1", false), block("g2", true)];
        let (add, remove) = plan_group_changes(&desired, &policy(&[("g2", true), ("g3", false)]));
        assert_eq!(add, vec![AccessControlGroup::from(&block("g1", false))]);
        assert_eq!(remove.len(), 1);
        assert_eq!(remove[0].id, "g3");
    }

    #[test]
    fn test_changed_children_flag_is_re_added() {
        let desired = vec![block("g1", true)];
        let (add, remove) = plan_group_changes(&desired, &policy(&[("g1", false)]));
        assert_eq!(add.len(), 1);
        assert!(add[0].extend_to_children);
        assert!(remove.is_empty());
    }

    #[test]
    fn test_duplicate_groups_are_added_once() {
        let desired = vec![block("g1", false), block("g1", false)];
        let (add, remove) = plan_group_changes(&desired, &policy(&[]));
        assert_eq!(add, vec![AccessControlGroup::from(&block("g1", false))]);
        assert!(remove.is_empty());

        let model = AccessControlModel {
            group: desired,
            ..Default::default()
        };
        assert_eq!(model.groups().len(), 1);
    }

    #[test]
    fn test_observed_groups_keep_declared_order_then_drift() {
        let declared = vec![block("g2", false), block("g1", false), block("gone", false)];
        let observed = observed_groups(&declared, &policy(&[("g1", true), ("extra", false), ("g2", false)]));
        let ids: Vec<_> = observed.iter().map(|g| g.group_id.as_str()).collect();
        assert_eq!(ids, vec!["g2", "g1", "extra"]);
        assert!(observed[1].extend_to_children);
    }
}
