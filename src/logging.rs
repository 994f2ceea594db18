/// The diagnostic channel of the resolution engine.
///
/// A `TreeBuilder` reports resolver failures, unresolved references and cycle cuts through
/// this trait instead of writing to a global sink.
pub trait Logger: Send + Sync {
    fn error(&self, message: &str);
    fn warn(&self, message: &str);
    fn debug(&self, message: &str);
}

/// Forwards engine diagnostics to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn error(&self, message: &str) {
        tracing::error!(target: "calltree", "{}", message);
    }

    fn warn(&self, message: &str) {
        tracing::warn!(target: "calltree", "{}", message);
    }

    fn debug(&self, message: &str) {
        tracing::debug!(target: "calltree", "{}", message);
    }
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullLogger;

impl Logger for NullLogger {
    fn error(&self, _message: &str) {}
    fn warn(&self, _message: &str) {}
    fn debug(&self, _message: &str) {}
}
