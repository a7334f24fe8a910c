#[derive(Debug, Clone, thiserror::Error)]
pub enum InternalError {
    #[error("Unexpected state: {0}")]
    InvalidState(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}
