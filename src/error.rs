use thiserror::Error;

#[derive(Error, Debug)]
pub enum TagSelectError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Tag fetch error: {0}")]
    Fetch(String),

    #[error("Tag decode error: {0}")]
    Decode(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
