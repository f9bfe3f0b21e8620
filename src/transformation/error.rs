//! Transformation error types

use thiserror::Error;

/// Errors that make a transformation impossible to serialize
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransformationError {
    /// A parameter value cannot be rendered
    #[error("Invalid parameter '{param}': {message}")]
    InvalidParameter { param: String, message: String },

    /// An overlay/underlay layer is missing required components
    #[error("Invalid layer: {0}")]
    InvalidLayer(String),

    /// Unknown string value for a closed set (crop mode, gravity, ...)
    #[error("Unknown {kind} '{value}'")]
    UnknownValue { kind: &'static str, value: String },
}

impl TransformationError {
    /// Create an invalid parameter error
    pub fn invalid_param(param: impl Into<String>, message: impl Into<String>) -> Self {
        TransformationError::InvalidParameter {
            param: param.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_param_display_names_parameter() {
        let err = TransformationError::invalid_param("q", "must be 1-100");
        assert_eq!(err.to_string(), "Invalid parameter 'q': must be 1-100");
    }

    #[test]
    fn test_invalid_layer_display() {
        let err = TransformationError::InvalidLayer("missing public id".to_string());
        assert!(err.to_string().contains("missing public id"));
    }
}
