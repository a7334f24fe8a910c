use super::{ErrorPolicy, Result, Severity};

/// Extension trait for `Result` enabling policy-driven emission without
/// contaminating core control-flow with side-effects.
///
/// Typical usage: at subsystem boundaries in applications, call one of the
/// helpers to emit errors via your chosen [`ErrorPolicy`], while preserving
/// the original result for further handling.
///
/// Example
/// ```rust,ignore
/// use xiaozhi_error::{Result, ResultExt, ErrorPolicy, DomainError};
///
/// fn do_work(policy: &impl ErrorPolicy) -> Result<()> {
///     let r: Result<()> = Err(DomainError::Selection { message: "no file".into() }.into());
///     r.emit_error(policy) // Emitted according to policy, still Err for caller to handle
/// }
/// ```
pub trait ResultExt<T> {
    /// Emit the error using the provided policy and return the result unchanged
    fn emit_event(self, policy: &impl ErrorPolicy) -> Self;

    /// If the result is an error classified as a warning, emit it
    fn emit_warning(self, policy: &impl ErrorPolicy) -> Self;

    /// If the result is an error classified as an error, emit it
    fn emit_error(self, policy: &impl ErrorPolicy) -> Self;

    /// If the result is an error classified as fatal, emit it
    fn emit_fatal(self, policy: &impl ErrorPolicy) -> Self;
}

fn emit_if<T>(result: &Result<T>, policy: &impl ErrorPolicy, severity: Severity) {
    if let Err(e) = result {
        if policy.classify(e) == severity {
            policy.emit(e);
        }
    }
}

impl<T> ResultExt<T> for Result<T> {
    fn emit_event(self, policy: &impl ErrorPolicy) -> Self {
        if let Err(ref e) = self {
            policy.emit(e);
        }
        self
    }

    fn emit_warning(self, policy: &impl ErrorPolicy) -> Self {
        emit_if(&self, policy, Severity::Warning);
        self
    }

    fn emit_error(self, policy: &impl ErrorPolicy) -> Self {
        emit_if(&self, policy, Severity::Error);
        self
    }

    fn emit_fatal(self, policy: &impl ErrorPolicy) -> Self {
        emit_if(&self, policy, Severity::Fatal);
        self
    }
}
