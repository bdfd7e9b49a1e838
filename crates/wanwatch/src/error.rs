use thiserror::Error;

#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("configuration error: {message}")]
    Config { message: String },

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for DaemonError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}
