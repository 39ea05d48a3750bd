//! Error taxonomy for backend calls

use crate::coordinator::{Operation, Resource};
use std::time::Duration;

/// Message shown when the server gives no usable detail
pub const GENERIC_FAILURE_MESSAGE: &str = "Something went wrong. Please try again.";

/// Error returned by any backend call
///
/// `Clone` so one failed fetch can be handed to every caller sharing it.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    /// The request never produced an HTTP response
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),
    /// The bearer credential was rejected; the session has been cleared
    #[error("Session expired or credential rejected")]
    Unauthorized,
    /// Non-2xx response other than 401
    #[error("Server rejected request ({status}): {message}")]
    Server { status: u16, message: String },
    #[error("Failed to decode response: {0}")]
    Decode(String),
    #[error("{operation} is not supported for {resource}")]
    Unsupported { resource: Resource, operation: Operation },
    /// No credential is available to authorize the request
    #[error("Not signed in")]
    SignedOut,
}

impl ApiError {
    /// Build a server error from a response body, preferring its `message`
    pub fn from_response(status: u16, body: &serde_json::Value) -> Self {
        let message = body
            .get("message")
            .or_else(|| body.get("error"))
            .and_then(|m| m.as_str())
            .filter(|m| !m.trim().is_empty())
            .map(str::to_string)
            .or_else(|| body.as_str().filter(|s| !s.trim().is_empty()).map(str::to_string))
            .unwrap_or_else(|| GENERIC_FAILURE_MESSAGE.to_string());
        ApiError::Server { status, message }
    }

    /// Failures worth retrying for idempotent reads
    pub fn is_transient(&self) -> bool {
        match self {
            ApiError::Transport(_) | ApiError::Timeout(_) => true,
            ApiError::Server { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Text suitable for a notification
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Server { message, .. } => message.clone(),
            ApiError::Unauthorized | ApiError::SignedOut => {
                "Your session has expired. Please sign in again.".to_string()
            }
            ApiError::Transport(_) | ApiError::Timeout(_) => {
                "Unable to reach the server. Check your connection and try again.".to_string()
            }
            ApiError::Decode(_) => GENERIC_FAILURE_MESSAGE.to_string(),
            ApiError::Unsupported { .. } => self.to_string(),
        }
    }
}
