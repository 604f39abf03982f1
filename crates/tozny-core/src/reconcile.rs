//! Membership reconciliation.
//!
//! Several resources attach a set of opaque identifiers to a parent object:
//! role IDs mapped onto a group, group IDs made default for a realm, groups an
//! identity belongs to, groups granted access to an application. Keeping those
//! in line with a declaration needs two things:
//!
//! - [`reconcile`] computes the add/remove delta between the declared set and
//!   the set observed on the server.
//! - [`PresenceMap`] tracks, for a refresh, which declared IDs were actually
//!   observed.
//!
//! IDs are compared by exact string equality. Both helpers are pure.

use std::collections::{BTreeSet, HashSet};

use indexmap::IndexMap;

/// The changes needed to turn an observed membership set into a desired one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MembershipDelta {
    /// Declared but not observed.
    pub add: BTreeSet<String>,
    /// Observed but not declared.
    pub remove: BTreeSet<String>,
}

impl MembershipDelta {
    /// True when the observed set already equals the desired one.
    pub fn is_empty(&self) -> bool {
        self.add.is_empty() && self.remove.is_empty()
    }

    pub fn has_additions(&self) -> bool {
        !self.add.is_empty()
    }

    pub fn has_removals(&self) -> bool {
        !self.remove.is_empty()
    }
}

/// Compute `add = desired - observed` and `remove = observed - desired`.
///
/// Duplicates in either input are ignored.
pub fn reconcile<D, O, S, T>(desired: D, observed: O) -> MembershipDelta
where
    D: IntoIterator<Item = S>,
    O: IntoIterator<Item = T>,
    S: AsRef<str>,
    T: AsRef<str>,
{
    let desired: HashSet<String> = desired
        .into_iter()
        .map(|id| id.as_ref().to_string())
        .collect();
    let observed: HashSet<String> = observed
        .into_iter()
        .map(|id| id.as_ref().to_string())
        .collect();

    let delta = MembershipDelta {
        add: desired.difference(&observed).cloned().collect(),
        remove: observed.difference(&desired).cloned().collect(),
    };
    tracing::debug!(
        add = delta.add.len(),
        remove = delta.remove.len(),
        "computed membership delta"
    );
    delta
}

/// Which declared IDs were seen on the server during a refresh.
///
/// Every declared ID starts as unseen; observed IDs that match a declared one
/// flip it to seen. Observed IDs nobody declared are kept aside so a refresh
/// can still report them as drift.
#[derive(Debug, Clone, Default)]
pub struct PresenceMap {
    declared: IndexMap<String, bool>,
    undeclared: Vec<String>,
}

impl PresenceMap {
    pub fn new<D, O, S, T>(desired: D, observed: O) -> Self
    where
        D: IntoIterator<Item = S>,
        O: IntoIterator<Item = T>,
        S: AsRef<str>,
        T: AsRef<str>,
    {
        let mut declared: IndexMap<String, bool> = IndexMap::new();
        for id in desired {
            declared.entry(id.as_ref().to_string()).or_insert(false);
        }

        let mut undeclared = Vec::new();
        for id in observed {
            let id = id.as_ref();
            match declared.get_mut(id) {
                Some(seen) => *seen = true,
                None => {
                    if !undeclared.iter().any(|u: &String| u == id) {
                        undeclared.push(id.to_string());
                    }
                }
            }
        }

        Self {
            declared,
            undeclared,
        }
    }

    pub fn is_observed(&self, id: &str) -> bool {
        self.declared.get(id).copied().unwrap_or(false)
    }

    /// Declared IDs that were not observed, in declaration order.
    pub fn missing(&self) -> Vec<String> {
        self.declared
            .iter()
            .filter(|(_, seen)| !**seen)
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Declared IDs that were observed, in declaration order.
    pub fn present(&self) -> Vec<String> {
        self.declared
            .iter()
            .filter(|(_, seen)| **seen)
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Observed IDs that were never declared.
    pub fn undeclared(&self) -> &[String] {
        &self.undeclared
    }

    /// Everything observed: present declared IDs first, then undeclared ones.
    pub fn observed(&self) -> Vec<String> {
        let mut ids = self.present();
        ids.extend(self.undeclared.iter().cloned());
        ids
    }
}
