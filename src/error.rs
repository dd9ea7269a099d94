//! Error types for configuration, startup and request handling.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

/// Errors raised while reading [`Config`](crate::Config) from the environment.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A numeric or boolean variable could not be parsed.
    #[error("invalid value {value:?} for {name}")]
    Invalid { name: &'static str, value: String },

    /// `SESSION_STORE` named a backend this application does not know.
    #[error("unknown session store {0:?}, expected \"memory\" or \"file\"")]
    UnknownStore(String),

    /// The signing secret is too short to derive a cookie key from.
    #[error("session secret must be at least {min} bytes, got {len}")]
    SecretTooShort { len: usize, min: usize },
}

/// Errors that abort startup.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to prepare session store: {0}")]
    Store(#[from] tower_sessions::session_store::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Failures inside a route handler.
///
/// Store failures are not translated for the client; they surface as a bare
/// `500 Internal Server Error`.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("session error: {0}")]
    Session(#[from] tower_sessions::session::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self, "request failed");
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
    }
}
