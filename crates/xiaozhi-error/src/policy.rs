use super::{Error, Severity};

/// A policy for classifying and emitting errors.
///
/// Libraries should not log or notify directly; instead, they return [`crate::Result`] and let
/// the application install an `ErrorPolicy` to decide how to present or route errors.
///
/// Emission can be anything:
/// - tracing logs
/// - a toast/notification bus
/// - custom telemetry
///
/// Example
/// ```rust,ignore
/// use xiaozhi_error::{ErrorPolicy, Severity, Error};
///
/// struct PrintPolicy;
/// impl ErrorPolicy for PrintPolicy {
///     fn classify(&self, e: &Error) -> Severity { e.severity() }
///     fn emit(&self, e: &Error) { eprintln!("[{:?}] {e}", self.classify(e)); }
/// }
/// ```
pub trait ErrorPolicy: Send + Sync {
    /// Classify the error's severity
    fn classify(&self, error: &Error) -> Severity {
        error.severity()
    }

    /// Emit the error according to the policy (e.g., log, send to UI, etc.)
    fn emit(&self, error: &Error);
}

impl<P: ErrorPolicy + ?Sized> ErrorPolicy for std::sync::Arc<P> {
    fn classify(&self, error: &Error) -> Severity {
        (**self).classify(error)
    }

    fn emit(&self, error: &Error) {
        (**self).emit(error)
    }
}

/// A no-operation policy that does nothing
#[derive(Debug, Clone, Default)]
pub struct NoopPolicy;

impl ErrorPolicy for NoopPolicy {
    fn emit(&self, _error: &Error) {}
}

/// A policy that uses the error's default severity and emits via tracing
#[cfg(feature = "tracing")]
#[derive(Debug, Clone, Default)]
pub struct TracingPolicy;

#[cfg(feature = "tracing")]
impl ErrorPolicy for TracingPolicy {
    fn emit(&self, error: &Error) {
        use tracing::{Level, event};

        match error.severity() {
            Severity::Info => event!(Level::INFO, error = %error),
            Severity::Warning => event!(Level::WARN, error = %error),
            Severity::Error | Severity::Fatal => event!(Level::ERROR, error = %error),
        }
    }
}

/// A composite policy that delegates to multiple policies.
///
/// Behavior
/// - classify: returns the maximum severity among inner policies (defaulting to the error's own severity when empty).
/// - emit: delegates emission to all inner policies in insertion order.
#[derive(Default)]
pub struct CombinedPolicy {
    policies: Vec<Box<dyn ErrorPolicy>>,
}

impl CombinedPolicy {
    pub fn new() -> Self {
        Self {
            policies: Vec::new(),
        }
    }

    /// Add a policy. Consumes and returns Self for builder-style chaining.
    pub fn push<P: ErrorPolicy + 'static>(mut self, policy: P) -> Self {
        self.policies.push(Box::new(policy));
        self
    }

    pub fn len(&self) -> usize {
        self.policies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }
}

impl std::fmt::Debug for CombinedPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CombinedPolicy")
            .field("policies", &self.policies.len())
            .finish()
    }
}

impl ErrorPolicy for CombinedPolicy {
    fn classify(&self, error: &Error) -> Severity {
        self.policies
            .iter()
            .map(|p| p.classify(error))
            .fold(error.severity(), |acc, s| {
                if s.rank() > acc.rank() { s } else { acc }
            })
    }

    fn emit(&self, error: &Error) {
        for p in &self.policies {
            p.emit(error);
        }
    }
}
