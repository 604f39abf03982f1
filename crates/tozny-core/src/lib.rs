//! Core building blocks for the Tozny provider.
//!
//! Nothing in this crate performs I/O: it holds the attribute schema model
//! with its decoding layer and the membership reconciliation helpers shared
//! by the group, role-mapping and access-control resources.

pub mod error;
pub mod reconcile;
pub mod schema;

pub use error::{CoreError, ErrorCategory, Result};
pub use reconcile::{MembershipDelta, PresenceMap, reconcile};
pub use schema::{Attribute, AttributeType, ID_ATTRIBUTE, Schema};
