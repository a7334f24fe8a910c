#[derive(Debug, Clone, thiserror::Error)]
pub enum DomainError {
    #[error("HTTP error: {message}")]
    Http {
        /// `None` when no response was received (network failure, timeout).
        status: Option<u16>,
        message: String,
    },

    #[error("Config error: {message}")]
    Config { message: String },

    /// Displays the bare message; it is shown to the user as-is.
    #[error("{message}")]
    Selection { message: String },

    #[error("IO error: {message}")]
    Io { message: String },
}
