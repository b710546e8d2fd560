use thiserror::Error;

/// Top-level error type for the gest crates
#[derive(Error, Debug)]
pub enum GestError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// The single failure kind for schema and protocol violations.
///
/// Every variant carries enough context (registry kind, entry name, offending
/// tag or value) to produce a readable message on its own.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("{kind} {name} must provide type field")]
    MissingType { kind: &'static str, name: String },

    #[error("{kind} type {tag} is not available")]
    UnknownType { kind: &'static str, tag: String },

    #[error("{kind} {name}: input type {found} not supported, expected {expected}")]
    UnsupportedInput {
        kind: &'static str,
        name: String,
        found: &'static str,
        expected: &'static str,
    },

    #[error("domain [{low}, {high}] does not satisfy the condition domain[1] > domain[0]")]
    InvalidDomain { low: f64, high: f64 },

    #[error("range [{low}, {high}] must have two numbers in ascending order")]
    InvalidRange { low: f64, high: f64 },

    #[error("discrete variable must declare at least one value")]
    EmptyValues,

    #[error("variables must declare at least one variable")]
    EmptyVariables,

    #[error("{field}: {message}")]
    InvalidField { field: String, message: String },

    #[error("unknown field: {0}")]
    UnknownField(String),

    #[error("variable {name} is not continuous")]
    NotContinuous { name: String },

    #[error("record is missing key {key}")]
    MissingKey { key: String },

    #[error("{generator} generator cannot accept {reason}")]
    Incompatible { generator: String, reason: String },

    #[error("requested {requested} points but {produced} can be produced")]
    CountMismatch { requested: usize, produced: usize },

    #[error("unknown point id: {0}")]
    UnknownId(String),

    #[error("point id {0} appears more than once in the batch")]
    DuplicateId(String),

    #[error("generator {0} has been finalized")]
    Finalized(String),

    #[error("{0}")]
    Invalid(String),
}

impl ValidationError {
    pub(crate) fn invalid_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidField {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Result type alias for schema operations
pub type GestResult<T> = Result<T, GestError>;

/// Macro for creating free-form validation errors
#[macro_export]
macro_rules! validation_error {
    ($($arg:tt)*) => {
        $crate::ValidationError::Invalid(format!($($arg)*))
    };
}

/// Macro for creating configuration errors
#[macro_export]
macro_rules! config_error {
    ($($arg:tt)*) => {
        $crate::GestError::Config(format!($($arg)*))
    };
}

/// Human-readable name of a JSON value's shape, used in error messages.
pub(crate) fn shape_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "list",
        serde_json::Value::Object(_) => "mapping",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = ValidationError::UnknownType {
            kind: "constraint",
            tag: "NotAConstraint".to_string(),
        };
        assert!(error.to_string().contains("NotAConstraint"));
        assert!(error.to_string().contains("constraint"));

        let error = ValidationError::CountMismatch {
            requested: 5,
            produced: 3,
        };
        assert!(error.to_string().contains('5'));
        assert!(error.to_string().contains('3'));
    }

    #[test]
    fn test_error_conversion() {
        let gest_error: GestError = ValidationError::EmptyVariables.into();
        match gest_error {
            GestError::Validation(ValidationError::EmptyVariables) => (),
            other => panic!("Expected Validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_macros() {
        let err = validation_error!("bad value: {}", 42);
        assert_eq!(err, ValidationError::Invalid("bad value: 42".to_string()));
        let config_err = config_error!("missing field: {}", "vocs");
        assert!(config_err.to_string().contains("vocs"));
    }
}
