//! Error types for the hosted data API.

use thiserror::Error;

/// Errors that can occur while talking to the hosted data API.
#[derive(Debug, Error, Clone)]
pub enum ApiError {
    /// Network/HTTP request failed
    #[error("Network error: {message}")]
    Network { message: String },

    /// The service answered with a non-success status
    #[error("Request rejected with status {status}: {message}")]
    Status {
        status: u16,
        message: String,
        code: Option<String>,
    },

    /// The response body did not have the expected shape
    #[error("Failed to decode response: {message}")]
    Decode { message: String },

    /// URL parsing/construction failed
    #[error("URL error: {message}")]
    Url { message: String },

    /// A lookup that must hit a row found none
    #[error("No matching row in {table}")]
    NotFound { table: &'static str },

    /// Sign-in, sign-up or session lookup was refused
    #[error("Authentication failed: {0}")]
    Auth(AuthFailure),
}

impl ApiError {
    /// Returns true if the caller's session is no longer usable.
    pub fn needs_reauth(&self) -> bool {
        matches!(
            self,
            ApiError::Status { status: 401, .. } | ApiError::Auth(AuthFailure::SessionExpired)
        )
    }

    /// Message shown to the user in an error notice.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Status { message, .. } => message.clone(),
            ApiError::Auth(failure) => failure.user_message(),
            other => other.to_string(),
        }
    }
}

/// Why an authentication call was refused.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthFailure {
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("email already registered")]
    AlreadyRegistered,

    #[error("session expired")]
    SessionExpired,

    #[error("{0}")]
    Other(String),
}

impl AuthFailure {
    /// Localized (pt-BR) message for the login screen.
    pub fn user_message(&self) -> String {
        match self {
            AuthFailure::InvalidCredentials => "E-mail ou senha inválidos".to_string(),
            AuthFailure::AlreadyRegistered => "Este e-mail já está cadastrado".to_string(),
            AuthFailure::SessionExpired => "Sua sessão expirou. Entre novamente".to_string(),
            AuthFailure::Other(message) => format!("Erro ao autenticar: {message}"),
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Decode {
                message: err.to_string(),
            }
        } else {
            ApiError::Network {
                message: err.to_string(),
            }
        }
    }
}

impl From<url::ParseError> for ApiError {
    fn from(err: url::ParseError) -> Self {
        ApiError::Url {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Decode {
            message: err.to_string(),
        }
    }
}
