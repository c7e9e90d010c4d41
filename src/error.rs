//! Error types and handling for the `NomadAI` planner

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

/// Main error type for the `NomadAI` planner
#[derive(Error, Debug)]
pub enum NomadError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Upstream API communication errors (Amadeus, Google Places, OpenAI)
    #[error("API error: {message}")]
    Api { message: String },

    /// Input validation errors
    #[error("Invalid input: {message}")]
    Validation { message: String },

    /// No candidates for a route or city, or an unknown itinerary
    #[error("Not found: {message}")]
    NotFound { message: String },

    /// Request carried no user identity
    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    /// Cache operation errors
    #[error("Cache error: {message}")]
    Cache { message: String },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl NomadError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new API error
    pub fn api<S: Into<String>>(message: S) -> Self {
        Self::Api {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a new not-found error
    pub fn not_found<S: Into<String>>(message: S) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Create a new unauthorized error
    pub fn unauthorized<S: Into<String>>(message: S) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    /// Create a new cache error
    pub fn cache<S: Into<String>>(message: S) -> Self {
        Self::Cache {
            message: message.into(),
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            NomadError::Config { .. } => {
                "Configuration error. Please check your config file and API keys.".to_string()
            }
            NomadError::Api { .. } => {
                "Unable to reach the travel data providers. Please try again later.".to_string()
            }
            NomadError::Validation { message } => format!("Invalid input: {message}"),
            NomadError::NotFound { message } => message.clone(),
            NomadError::Unauthorized { .. } => "Please sign in to continue.".to_string(),
            NomadError::Cache { .. } => "Cache operation failed.".to_string(),
            NomadError::Io { .. } => {
                "File operation failed. Please check file permissions.".to_string()
            }
        }
    }
}

impl NomadError {
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            NomadError::Validation { .. } => StatusCode::BAD_REQUEST,
            NomadError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            NomadError::NotFound { .. } => StatusCode::NOT_FOUND,
            NomadError::Api { .. } => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for NomadError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("{}", self);
        } else {
            tracing::debug!("{}", self);
        }

        (status, Json(json!({ "error": self.user_message() }))).into_response()
    }
}

impl From<reqwest::Error> for NomadError {
    fn from(err: reqwest::Error) -> Self {
        NomadError::api(err.to_string())
    }
}

impl From<reqwest_middleware::Error> for NomadError {
    fn from(err: reqwest_middleware::Error) -> Self {
        NomadError::api(err.to_string())
    }
}
