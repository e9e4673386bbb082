use thiserror::Error;

#[derive(Error, Debug)]
pub enum TraceError {
    #[error("Store error: {0}")]
    StoreError(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Config parse error: {0}")]
    ConfigError(#[from] toml::de::Error),

    #[error("Config write error: {0}")]
    ConfigWriteError(#[from] toml::ser::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid page title: {0:?}")]
    InvalidTitle(String),
}

pub type Result<T> = std::result::Result<T, TraceError>;
