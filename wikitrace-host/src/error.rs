use thiserror::Error;

#[derive(Error, Debug)]
pub enum HostError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Parse error on line {line}: {message}")]
    ParseError { line: usize, message: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, HostError>;
