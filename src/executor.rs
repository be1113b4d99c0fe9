//! Execution orchestrator
//!
//! Top-level entry point for running a snippet: validates the request, runs
//! the input-requirement pre-check, dispatches to the right collaborator,
//! and assembles the final result record. Nothing here returns `Err` to the
//! caller - every failure mode, including infrastructure failures, ends up
//! as data inside an [`ExecutionResult`].

use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::detect::detect_input_requirement;
use crate::error::EngineError;
use crate::echo::simulate_input_echo;
use crate::explain::{classify_error, Explanation};
use crate::interpreter::InterpreterCell;
use crate::languages::Language;
use crate::piston::{PistonClient, SandboxExecutor, SandboxOutcome};

/// Sentinel exit code: the program was never run because it would block
/// waiting on interactive input. Mutually exclusive with having executed.
pub const AWAITING_INPUT_EXIT_CODE: i32 = -1;

/// One run request; created per run, discarded afterwards
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionRequest {
    pub source: String,
    pub language: Language,
    #[serde(default)]
    pub stdin: String,
    /// Attach a plain-language explanation when the run errors
    #[serde(default)]
    pub explain: bool,
}

impl ExecutionRequest {
    pub fn new(source: impl Into<String>, language: Language) -> Self {
        Self {
            source: source.into(),
            language,
            stdin: String::new(),
            explain: false,
        }
    }

    pub fn with_stdin(mut self, stdin: impl Into<String>) -> Self {
        self.stdin = stdin.into();
        self
    }

    pub fn with_explanations(mut self, explain: bool) -> Self {
        self.explain = explain;
        self
    }
}

/// Final record of one run; immutable once built
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
    pub output: String,
    pub error: String,
    /// Wall-clock time for the whole call, milliseconds
    pub execution_time_ms: u64,
    /// Estimated memory footprint in KB (derived, not measured)
    pub memory_estimate_kb: u32,
    pub exit_code: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<Explanation>,
}

impl ExecutionResult {
    pub fn is_awaiting_input(&self) -> bool {
        self.exit_code == AWAITING_INPUT_EXIT_CODE
    }
}

/// Reachability of the two execution collaborators
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Availability {
    pub interpreter: bool,
    pub sandbox: bool,
}

/// The execution engine: owns the collaborator handles
pub struct Engine {
    sandbox: Arc<dyn SandboxExecutor>,
    interpreter: InterpreterCell,
}

impl Engine {
    /// Engine with the default collaborators: Piston client configured from
    /// the environment and the process-wide interpreter handle
    pub fn new() -> Self {
        Self {
            sandbox: Arc::new(PistonClient::from_env()),
            interpreter: InterpreterCell::shared(),
        }
    }

    /// Engine with explicit collaborators (used by tests)
    pub fn with_collaborators(
        sandbox: Arc<dyn SandboxExecutor>,
        interpreter: InterpreterCell,
    ) -> Self {
        Self {
            sandbox,
            interpreter,
        }
    }

    /// Run one snippet and produce its result record. Never fails: user
    /// code errors, the awaiting-input state, and infrastructure failures
    /// all come back as normally-returned results.
    pub async fn execute(&self, request: &ExecutionRequest) -> ExecutionResult {
        let started = Instant::now();

        if request.source.trim().is_empty() {
            return empty_source_result(request.explain);
        }

        if let Some(construct) = detect_input_requirement(&request.source, request.language) {
            if request.stdin.trim().is_empty() {
                info!(
                    "Run deferred: {} snippet reads input via {} but no stdin was supplied",
                    request.language, construct
                );
                return awaiting_input_result(construct, request.language, request.explain);
            }
        }

        match self.dispatch(request).await {
            Ok(outcome) => {
                let execution_time_ms = started.elapsed().as_millis() as u64;

                // Explicit non-zero code from the executor wins; otherwise a
                // non-empty error string means failure.
                let exit_code = if outcome.exit_code != 0 {
                    outcome.exit_code
                } else if !outcome.stderr.is_empty() {
                    1
                } else {
                    0
                };

                let explanation = if !outcome.stderr.is_empty() && request.explain {
                    Some(classify_error(
                        &outcome.stderr,
                        &request.source,
                        request.language,
                    ))
                } else {
                    None
                };

                ExecutionResult {
                    memory_estimate_kb: estimate_memory_kb(&outcome.stdout),
                    output: outcome.stdout.trim().to_string(),
                    error: outcome.stderr.trim().to_string(),
                    execution_time_ms,
                    exit_code,
                    explanation,
                }
            }
            Err(e) => {
                warn!("Dispatch failed: {}", e);
                infrastructure_failure_result(
                    started.elapsed().as_millis() as u64,
                    &e.to_string(),
                    request.explain,
                )
            }
        }
    }

    /// Pick the collaborator for the language and run the snippet.
    ///
    /// Python prefers the local interpreter and falls back to the remote
    /// sandbox when the interpreter is missing or faults; C always uses the
    /// sandbox. Sandbox stdout gets the input echo spliced in; interpreter
    /// output already reflects true interleaving and is left alone.
    async fn dispatch(&self, request: &ExecutionRequest) -> Result<SandboxOutcome, EngineError> {
        if request.language == Language::Python {
            match self.run_with_interpreter(request).await {
                Ok(outcome) => return Ok(outcome),
                Err(e) => {
                    warn!("Interpreter failed ({}), falling back to sandbox", e);
                }
            }
        }

        let mut outcome = self
            .sandbox
            .execute(request.language, &request.source, &request.stdin)
            .await?;

        outcome.stdout = simulate_input_echo(&outcome.stdout, &request.stdin);
        Ok(outcome)
    }

    async fn run_with_interpreter(
        &self,
        request: &ExecutionRequest,
    ) -> Result<SandboxOutcome, EngineError> {
        let interpreter = self.interpreter.get().await?;
        let outcome = interpreter.run(&request.source, &request.stdin).await?;
        Ok(SandboxOutcome {
            stdout: outcome.stdout,
            stderr: outcome.stderr,
            exit_code: outcome.exit_code,
        })
    }

    /// Warm the interpreter without running user code
    pub async fn preload(&self) -> bool {
        match self.interpreter.get().await {
            Ok(_) => true,
            Err(e) => {
                warn!("Interpreter preload failed: {}", e);
                false
            }
        }
    }

    /// Probe both collaborators independently; probe failures are swallowed
    pub async fn check_availability(&self) -> Availability {
        let interpreter = self.interpreter.get().await.is_ok();
        let sandbox = self.sandbox.probe().await;
        Availability {
            interpreter,
            sandbox,
        }
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

/// Rough footprint estimate from output size; the engine never measures the
/// real process.
fn estimate_memory_kb(output: &str) -> u32 {
    100 + (output.len() as u32 / 4).min(500)
}

fn empty_source_result(explain: bool) -> ExecutionResult {
    ExecutionResult {
        output: String::new(),
        error: "No code provided".to_string(),
        execution_time_ms: 0,
        memory_estimate_kb: 0,
        exit_code: 1,
        explanation: explain.then(|| {
            Explanation::new(
                "Empty Code",
                "You haven't written any code yet!",
                "Start by typing your code in the editor, then run it.",
            )
        }),
    }
}

fn awaiting_input_result(construct: &str, language: Language, explain: bool) -> ExecutionResult {
    let output = format!(
        "Your program is waiting for input...\n\nYour code uses {}. Enter the \
         required values in the input field and run again.",
        construct
    );

    let explanation = explain.then(|| {
        let fix = match language {
            Language::C => {
                "For scanf(\"%d %d\", &a, &b), enter two numbers separated by a \
                 space, like: 5 10"
            }
            Language::Python => "For input(), enter each value on a new line.",
        };
        Explanation::new(
            "Input Required",
            format!(
                "Your code uses {} to read user input. Enter the values below to \
                 continue.",
                construct
            ),
            fix,
        )
    });

    ExecutionResult {
        output,
        error: String::new(),
        execution_time_ms: 0,
        memory_estimate_kb: 0,
        exit_code: AWAITING_INPUT_EXIT_CODE,
        explanation,
    }
}

fn infrastructure_failure_result(
    execution_time_ms: u64,
    message: &str,
    explain: bool,
) -> ExecutionResult {
    ExecutionResult {
        output: String::new(),
        error: format!("Execution failed: {}", message),
        execution_time_ms,
        memory_estimate_kb: 0,
        exit_code: 1,
        explanation: explain.then(|| {
            Explanation::new(
                "Execution Error",
                "There was a problem executing your code. This might be a network \
                 issue or a problem with the execution service.",
                "Try running your code again. If the problem persists, check your \
                 internet connection.",
            )
        }),
    }
}
