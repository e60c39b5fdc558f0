use thiserror::Error;

pub type Result<T> = std::result::Result<T, MergepulseError>;

#[derive(Error, Debug)]
pub enum MergepulseError {
    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),
    #[error("Store error: {0}")]
    Store(String),
    #[error("Remote fetch error: {0}")]
    Remote(String),
    #[error("Invariant violation: {0}")]
    Invariant(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for MergepulseError {
    fn from(err: reqwest::Error) -> Self {
        MergepulseError::Remote(err.to_string())
    }
}
