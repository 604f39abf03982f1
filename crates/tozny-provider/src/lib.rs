//! Declarative provisioning of Tozny accounts, realms and identity access.
//!
//! [`Provider`] dispatches create, read, update and delete calls for each
//! registered resource type over JSON attribute documents. Handlers receive a
//! [`Session`] holding the provider level client, or the error that kept it
//! from being built.

pub mod config;
pub mod data_sources;
pub mod error;
pub mod observability;
pub mod provider;
pub mod resources;
pub mod session;

pub use config::ProviderConfig;
pub use error::{ProviderError, Result};
pub use provider::{DataSource, Provider, ProviderSchema, Resource};
pub use session::{CredentialSource, Session};
