use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::providers::BackendError;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("illegal request body: {0}")]
    BadRequest(#[from] serde_json::Error),

    /// The backend stream could not be opened. Reported to the caller as 400,
    /// kept separate so logs can tell it apart from a malformed body.
    #[error("invoke mesh service error: {0}")]
    Backend(#[from] BackendError),

    #[error("Unsupported path")]
    NotFound,

    #[error("allow methods POST, OPTIONS")]
    MethodNotAllowed,

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl GatewayError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::BadRequest(_) | GatewayError::Backend(_) => StatusCode::BAD_REQUEST,
            GatewayError::NotFound => StatusCode::NOT_FOUND,
            GatewayError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            GatewayError::Config(_) | GatewayError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short plain-text body sent to the client. Never includes upstream details.
    pub fn public_message(&self) -> &'static str {
        match self {
            GatewayError::BadRequest(_) => "illegal request body",
            GatewayError::Backend(_) => "chat completion backend unavailable",
            GatewayError::NotFound => "Unsupported path",
            GatewayError::MethodNotAllowed => "allow methods POST, OPTIONS",
            GatewayError::Config(_) | GatewayError::Io(_) => "internal server error",
        }
    }
}

impl From<toml::de::Error> for GatewayError {
    fn from(e: toml::de::Error) -> Self {
        GatewayError::Config(e.to_string())
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        (self.status_code(), self.public_message()).into_response()
    }
}

pub type Result<T> = std::result::Result<T, GatewayError>;
