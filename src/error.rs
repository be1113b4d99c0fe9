//! Infrastructure error types
//!
//! These cover failures of the execution collaborators themselves (network,
//! interpreter bootstrap), never failures of user code. User-code errors are
//! data inside an [`crate::executor::ExecutionResult`], not `Err` values.

use thiserror::Error;

/// Errors raised by the execution collaborators
#[derive(Error, Debug)]
pub enum EngineError {
    /// The remote sandbox could not be reached or returned garbage.
    #[error("sandbox request failed: {0}")]
    Sandbox(#[from] reqwest::Error),

    /// The remote sandbox answered with a non-success HTTP status.
    #[error("sandbox request failed with status {0}")]
    SandboxStatus(u16),

    /// The local interpreter is not installed or failed its probe.
    #[error("interpreter unavailable: {0}")]
    InterpreterUnavailable(String),

    /// The interpreter exceeded its run timeout.
    #[error("interpreter timed out after {0} ms")]
    InterpreterTimeout(u32),

    /// Failed to spawn or drive the interpreter process.
    #[error("interpreter I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// No configuration entry for the requested language.
    #[error("unsupported language: {0}")]
    UnsupportedLanguage(String),
}
