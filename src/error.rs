use thiserror::Error;

#[derive(Error, Debug)]
pub enum PiqDashError {
    #[error("API key rejected by the server")]
    InvalidCredential,

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PiqDashError {
    /// Everything except an explicit key rejection is a connectivity-class
    /// failure from the session's point of view.
    pub fn is_connectivity(&self) -> bool {
        !matches!(self, Self::InvalidCredential)
    }
}

pub type Result<T> = std::result::Result<T, PiqDashError>;
