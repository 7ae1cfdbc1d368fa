//! Error types and handling for the Recosanté adapter

use thiserror::Error;

/// Main error type for the Recosanté adapter
#[derive(Error, Debug)]
pub enum RecosanteError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Input validation errors
    #[error("Invalid input: {message}")]
    Validation { message: String },

    /// Postal code could not be resolved to a municipality
    #[error("Location resolution failed: {message}")]
    Resolution { message: String },

    /// Transport-level failures (timeout, connection refused, DNS)
    #[error("Network error: {source}")]
    Network {
        #[from]
        source: reqwest::Error,
    },

    /// The remote API answered with a non-OK status
    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    /// The response body could not be decoded
    #[error("Parse error: {message}")]
    Parse { message: String },
}

impl RecosanteError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a new resolution error
    pub fn resolution<S: Into<String>>(message: S) -> Self {
        Self::Resolution {
            message: message.into(),
        }
    }

    /// Create a new API status error
    pub fn api<S: Into<String>>(status: u16, message: S) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Create a new parse error
    pub fn parse<S: Into<String>>(message: S) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            RecosanteError::Config { .. } => {
                "Configuration error. Please check your config file.".to_string()
            }
            RecosanteError::Validation { message } => format!("Invalid input: {message}"),
            RecosanteError::Resolution { .. } => {
                "No INSEE code found for this postal code.".to_string()
            }
            RecosanteError::Network { .. } => {
                "Unable to reach the Recosanté services. Please check your internet connection."
                    .to_string()
            }
            RecosanteError::Api { status, .. } => {
                format!("The remote service answered with HTTP {status}.")
            }
            RecosanteError::Parse { .. } => {
                "The remote service returned data that could not be read.".to_string()
            }
        }
    }
}
