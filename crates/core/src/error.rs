//! Error types for the generation pipeline.

use thiserror::Error;

use crate::emit::Target;
use crate::ir::BindingLocation;

/// Errors that abort a whole generation run.
#[derive(Debug, Error)]
pub enum Error {
    /// The input document could not be decoded.
    #[error("failed to parse {format} document: {message}")]
    Parse {
        format: &'static str,
        message: String,
    },

    /// Two operations resolve to the same identifier.
    #[error(
        "duplicate operationId '{0}' detected; each operation must have a unique identifier"
    )]
    DuplicateOperation(String),

    /// The same parameter is declared twice at one level of an operation.
    #[error("duplicate {location} parameter '{name}' in operation '{operation}'")]
    DuplicateParameter {
        operation: String,
        location: String,
        name: String,
    },

    /// A model is neither a record, an enum nor a discriminated union.
    #[error("model '{model}' has an unrecognized shape: {reason}")]
    UnrecognizedModelShape { model: String, reason: String },

    /// The generator configuration could not be decoded.
    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Result alias used across the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Why a parameter could not be bound for a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassificationReason {
    /// The target has no wire binding for this location.
    UnsupportedLocation,
    /// A path parameter has no `{name}` token in the path template.
    MissingPathPlaceholder,
}

/// A per-operation binding failure. Recoverable: only the offending
/// operation is dropped from the target output.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", describe(self))]
pub struct ClassificationError {
    pub parameter: String,
    pub operation: String,
    pub location: BindingLocation,
    pub target: Target,
    pub reason: ClassificationReason,
}

fn describe(err: &ClassificationError) -> String {
    match err.reason {
        ClassificationReason::UnsupportedLocation => format!(
            "unsupported parameter '{}' in operation '{}': {} parameters are not supported by the {} target",
            err.parameter,
            err.operation,
            err.location.as_str(),
            err.target
        ),
        ClassificationReason::MissingPathPlaceholder => format!(
            "path parameter '{}' of operation '{}' has no placeholder in the path template",
            err.parameter, err.operation
        ),
    }
}

/// Kinds of failure raised by generated decode functions at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeErrorKind {
    /// A union payload carried a discriminator value absent from the mapping.
    UnrecognizedVariant,
}

impl DecodeErrorKind {
    /// Name shared by every target's runtime `DecodeError`.
    pub fn as_str(&self) -> &'static str {
        match self {
            DecodeErrorKind::UnrecognizedVariant => "UnrecognizedVariant",
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_error_names_parameter_and_operation() {
        let err = ClassificationError {
            parameter: "session".into(),
            operation: "getProfile".into(),
            location: BindingLocation::Cookie,
            target: Target::MobileClient,
            reason: ClassificationReason::UnsupportedLocation,
        };
        let message = err.to_string();
        assert!(message.contains("'session'"));
        assert!(message.contains("'getProfile'"));
        assert!(message.contains("cookie"));
        assert!(message.contains("mobile-client"));
    }

    #[test]
    fn test_missing_placeholder_message() {
        let err = ClassificationError {
            parameter: "id".into(),
            operation: "getUser".into(),
            location: BindingLocation::Path,
            target: Target::Server,
            reason: ClassificationReason::MissingPathPlaceholder,
        };
        assert_eq!(
            err.to_string(),
            "path parameter 'id' of operation 'getUser' has no placeholder in the path template"
        );
    }
}
