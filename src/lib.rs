//! Code-runner engine
//!
//! Executes C and Python snippets and turns raw diagnostics into
//! plain-language explanations. Python runs prefer a local interpreter and
//! fall back to a remote Piston-compatible sandbox; C always uses the
//! sandbox. Before running anything, a static scan decides whether the
//! snippet would block waiting on interactive input.

pub mod detect;
pub mod echo;
pub mod error;
pub mod executor;
pub mod explain;
pub mod interpreter;
pub mod languages;
pub mod piston;

pub use error::EngineError;
pub use executor::{
    Availability, Engine, ExecutionRequest, ExecutionResult, AWAITING_INPUT_EXIT_CODE,
};
pub use explain::Explanation;
pub use languages::Language;
