use thiserror::Error;

#[derive(Debug, Error)]
pub enum TodoError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("malformed profile: {0}")]
    MalformedProfile(String),
}
