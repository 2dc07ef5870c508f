//! Client error types

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;
use shared::ErrorCode;
use thiserror::Error;

/// Client error type
#[derive(Debug, Error)]
pub enum ClientError {
    /// Transport failure, no response
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with an error body
    #[error("API error {status}: {message}")]
    Api {
        status: u16,
        /// `None` when the body carried a code this client does not know
        code: Option<ErrorCode>,
        message: String,
        details: Option<HashMap<String, Value>>,
    },

    /// Response body did not match the expected shape
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Superseded by a newer fetch or stopped by shutdown
    #[error("Request cancelled")]
    Cancelled,
}

impl ClientError {
    /// Build from a non-success response body; non-JSON bodies become the message
    pub fn from_response(status: u16, body: &str) -> Self {
        #[derive(Deserialize)]
        struct ErrorBody {
            #[serde(default)]
            code: Option<u16>,
            #[serde(default)]
            message: Option<String>,
            #[serde(default)]
            details: Option<HashMap<String, Value>>,
        }

        match serde_json::from_str::<ErrorBody>(body) {
            Ok(parsed) => ClientError::Api {
                status,
                code: parsed.code.and_then(|c| ErrorCode::try_from(c).ok()),
                message: parsed.message.unwrap_or_default(),
                details: parsed.details,
            },
            Err(_) => ClientError::Api {
                status,
                code: None,
                message: body.trim().to_string(),
                details: None,
            },
        }
    }

    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            ClientError::Api { code, .. } => *code,
            _ => None,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            ClientError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Token missing, expired or rejected
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }
}

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;
