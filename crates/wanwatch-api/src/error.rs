use std::time::Duration;

use thiserror::Error;

/// Top-level error type for the `wanwatch-api` crate.
///
/// Every variant is local to a single check attempt. Callers in
/// `wanwatch-core` flatten these into a human-readable string inside the
/// check result's details -- they are never propagated past a checker.
#[derive(Debug, Error)]
pub enum Error {
    /// Credential rejected at every header variant.
    #[error("Authentication failed: {message}")]
    AuthFailed { message: String },

    /// No device or endpoint matched any heuristic.
    #[error("Not found: {message}")]
    NotFound { message: String },

    /// Response was not valid JSON where JSON was required.
    #[error("Parse failed: {message}")]
    ParseFailed { message: String },

    /// A call exceeded its time budget.
    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// TLS setup or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    /// Non-success HTTP status with the message extracted from the
    /// vendor's error envelope.
    #[error("{message} for {url}")]
    Api {
        status: u16,
        message: String,
        url: String,
    },
}

impl Error {
    /// Wrap a `reqwest::Error`, promoting deadline overruns to
    /// [`Error::Timeout`] so the budget shows up in the message.
    pub(crate) fn transport(e: reqwest::Error, timeout: Duration) -> Self {
        if e.is_timeout() {
            Self::Timeout {
                timeout_secs: timeout.as_secs(),
            }
        } else {
            Self::Transport(e)
        }
    }

    /// Returns `true` if this error indicates a rejected credential.
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::AuthFailed { .. } | Self::Api { status: 401, .. })
    }

    /// Returns `true` if this is a transient network error.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Timeout { .. } => true,
            _ => false,
        }
    }
}
