// Core error type. API-layer errors are flattened into a message here;
// by the time they cross this boundary the caller only needs the text
// (check results carry errors as details, not as `Err`).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("configuration error: {message}")]
    Config { message: String },

    #[error("API error: {message}")]
    Api { message: String },
}

impl CoreError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

impl From<wanwatch_api::Error> for CoreError {
    fn from(e: wanwatch_api::Error) -> Self {
        Self::Api {
            message: e.to_string(),
        }
    }
}
