//! Configuration error types.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigurationError {
    #[error("Required environment variable {variable} is missing or empty")]
    MissingVariable { variable: String },

    #[error("Invalid value for {variable}: {message}")]
    InvalidValue { variable: String, message: String },
}

impl ConfigurationError {
    pub fn missing(variable: impl Into<String>) -> Self {
        Self::MissingVariable {
            variable: variable.into(),
        }
    }

    pub fn invalid_value(variable: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            variable: variable.into(),
            message: message.into(),
        }
    }
}
