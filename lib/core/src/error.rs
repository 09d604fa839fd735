use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Raised when stored vector bytes cannot be turned back into floats.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("vector blob length {0} is not a multiple of 4")]
    Misaligned(usize),

    #[error("vector blob holds {actual} floats, expected {expected}")]
    WrongDimension { expected: usize, actual: usize },
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Embedding provider unavailable: {0}")]
    EmbeddingUnavailable(String),

    #[error("Translation failed: {0}")]
    Translation(String),

    #[error("Text generation failed: {0}")]
    Generation(String),

    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("Job not found: {0}")]
    JobNotFound(u64),

    #[error("Skill not found: {0}")]
    SkillNotFound(u64),

    #[error("Invalid vector dimension: expected {expected}, got {actual}")]
    InvalidDimension { expected: usize, actual: usize },

    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
