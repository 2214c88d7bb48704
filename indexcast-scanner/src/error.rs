use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("HTTP status {0}")]
    HttpStatus(u16),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Parse error: {0}")]
    ParseError(String),
}

impl ScanError {
    /// Whether the failure happened before a document was received.
    pub fn is_fetch(&self) -> bool {
        !matches!(self, ScanError::ParseError(_))
    }
}

pub type Result<T> = std::result::Result<T, ScanError>;
