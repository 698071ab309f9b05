use thiserror::Error;

#[derive(Error, Debug)]
pub enum TrackerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Item not found: {0}")]
    UnknownItem(String),

    #[error("Location not found: {0}")]
    UnknownLocation(String),

    #[error("Section not found: {location}/{section}")]
    UnknownSection { location: String, section: String },

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Unsupported state format version: {0}")]
    UnsupportedFormat(i64),

    #[error("Bad definition: {0}")]
    Definition(String),
}

pub type Result<T> = std::result::Result<T, TrackerError>;
