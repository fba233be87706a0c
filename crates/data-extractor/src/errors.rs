use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExtractError {
    #[error("unknown content type: {0}")]
    UnknownContentType(String),
}
