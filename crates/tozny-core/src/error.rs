use thiserror::Error;

/// Errors raised while validating or decoding attribute documents
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Expected an object for {0}")]
    NotAnObject(String),

    #[error("Missing required attribute: {0}")]
    MissingAttribute(String),

    #[error("Unknown attribute: {0}")]
    UnknownAttribute(String),

    #[error("Attributes {first} and {second} cannot both be set")]
    ConflictingAttributes { first: String, second: String },

    #[error("Invalid attribute {name}: {message}")]
    InvalidAttribute { name: String, message: String },

    #[error("Failed to decode attributes: {0}")]
    Decode(#[from] serde_json::Error),
}

impl CoreError {
    /// Create a new MissingAttribute error
    pub fn missing(name: impl Into<String>) -> Self {
        Self::MissingAttribute(name.into())
    }

    /// Create a new InvalidAttribute error
    pub fn invalid(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidAttribute {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Create a new ConflictingAttributes error
    pub fn conflicting(first: impl Into<String>, second: impl Into<String>) -> Self {
        Self::ConflictingAttributes {
            first: first.into(),
            second: second.into(),
        }
    }

    /// Get error category for logging
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::NotAnObject(_) | Self::Decode(_) => ErrorCategory::Serialization,
            Self::MissingAttribute(_)
            | Self::UnknownAttribute(_)
            | Self::ConflictingAttributes { .. }
            | Self::InvalidAttribute { .. } => ErrorCategory::Validation,
        }
    }
}

/// Error categories for classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    Serialization,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Validation => write!(f, "validation"),
            ErrorCategory::Serialization => write!(f, "serialization"),
        }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_categories() {
        assert_eq!(
            CoreError::missing("realm_name").category(),
            ErrorCategory::Validation
        );
        assert_eq!(
            CoreError::NotAnObject("root".into()).category(),
            ErrorCategory::Serialization
        );
    }

    #[test]
    fn test_conflicting_message() {
        let err = CoreError::conflicting("client_credentials_filepath", "client_credentials_config");
        assert_eq!(
            err.to_string(),
            "Attributes client_credentials_filepath and client_credentials_config cannot both be set"
        );
    }
}
