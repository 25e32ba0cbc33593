use thiserror::Error;

#[derive(Error, Debug)]
pub enum CrackError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Archive unreadable: {0}")]
    ArchiveUnreadable(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CrackError {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        CrackError::InvalidConfiguration(message.into())
    }
}

pub type Result<T> = std::result::Result<T, CrackError>;
