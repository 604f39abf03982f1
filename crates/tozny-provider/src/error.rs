use thiserror::Error;
use tozny_client::ClientError;
use tozny_core::CoreError;

/// Errors surfaced by provider configuration and resource handlers
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error(transparent)]
    Schema(#[from] CoreError),

    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("Unknown resource type: {0}")]
    UnknownResourceType(String),

    #[error("Unknown data source: {0}")]
    UnknownDataSource(String),

    #[error("{type_name} cannot be updated in place; replacement required for: {}", attributes.join(", "))]
    RequiresReplacement {
        type_name: String,
        attributes: Vec<String>,
    },

    #[error("Provider is not configured: {0}")]
    NotConfigured(String),

    #[error("Failed to access {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid {name}: {message}")]
    Invalid { name: String, message: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ProviderError {
    pub fn invalid(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Invalid {
            name: name.into(),
            message: message.into(),
        }
    }

    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn requires_replacement(type_name: &str, attributes: Vec<String>) -> Self {
        Self::RequiresReplacement {
            type_name: type_name.to_string(),
            attributes,
        }
    }

    /// True when the remote object no longer exists.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Client(err) if err.is_not_found())
    }
}

pub type Result<T> = std::result::Result<T, ProviderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requires_replacement_lists_attributes() {
        let err = ProviderError::requires_replacement(
            "tozny_realm",
            vec!["realm_name".into(), "sovereign_name".into()],
        );
        assert_eq!(
            err.to_string(),
            "tozny_realm cannot be updated in place; replacement required for: realm_name, sovereign_name"
        );
    }

    #[test]
    fn test_not_found_passes_through() {
        let err = ProviderError::from(ClientError::NotFound("realm gone".into()));
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "Not found: realm gone");
        assert!(!ProviderError::NotConfigured("x".into()).is_not_found());
    }
}
