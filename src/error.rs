use thiserror::Error;

#[derive(Error, Debug)]
pub enum DeckError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid cluster data: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("{0}")]
    Validation(String),
}

pub type Result<T> = std::result::Result<T, DeckError>;
