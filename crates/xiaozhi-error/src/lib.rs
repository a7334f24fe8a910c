pub mod domain;
pub mod internal;
pub mod policy;
pub mod result_ext;
pub mod severity;

// public exports
pub use domain::DomainError;
pub use internal::InternalError;
pub use policy::{CombinedPolicy, ErrorPolicy, NoopPolicy};
#[cfg(feature = "tracing")]
pub use policy::TracingPolicy;
pub use result_ext::ResultExt;
pub use severity::Severity;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Internal(#[from] InternalError),

    /// A failure that leaves the current operation unrecoverable.
    #[error("Fatal: {0}")]
    Fatal(String),
    /// Non-fatal condition; work can continue.
    #[error("Warning: {0}")]
    Warning(String),
}

impl Error {
    pub fn is_warning(&self) -> bool {
        matches!(self, Error::Warning(_))
    }

    /// Default classification used by policies that do not override it.
    pub fn severity(&self) -> Severity {
        match self {
            Error::Warning(_) => Severity::Warning,
            Error::Fatal(_) => Severity::Fatal,
            Error::Domain(DomainError::Http { status, .. }) if status.is_some_and(|s| s < 500) => {
                Severity::Warning
            }
            Error::Domain(_) | Error::Internal(_) => Severity::Error,
        }
    }
}
