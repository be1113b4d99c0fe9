//! Local Python interpreter collaborator
//!
//! Python snippets prefer a local interpreter over the remote sandbox; the
//! orchestrator falls back to the sandbox when the interpreter is missing or
//! fails. The interpreter handle is initialized at most once per process:
//! concurrent first callers share the same initialization future, and the
//! handle lives for the rest of the process lifetime.

use std::process::Stdio;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use crate::error::EngineError;
use crate::languages::{get_language_config, Language};

/// Output of an interpreter run
#[derive(Debug, Clone)]
pub struct InterpreterOutcome {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

/// In-process interpreter abstraction, mockable in tests
#[async_trait]
pub trait Interpreter: Send + Sync {
    /// Run `source` with `stdin` attached; `Err` means the interpreter
    /// itself failed, not the user's program
    async fn run(&self, source: &str, stdin: &str) -> Result<InterpreterOutcome, EngineError>;
}

/// Installed as `sitecustomize.py` next to the snippet. Wraps stdin so every
/// consumed line is echoed back into stdout, so the transcript interleaves
/// prompts and typed input the way a terminal session would. This is why the
/// orchestrator never runs interpreter output through the echo simulator.
const STDIN_ECHO_SHIM: &str = r#"import sys


class _EchoInput:
    def __init__(self, stream):
        self._stream = stream

    def readline(self, *args):
        line = self._stream.readline(*args)
        if line:
            sys.stdout.write(line if line.endswith("\n") else line + "\n")
        return line

    def read(self, *args):
        data = self._stream.read(*args)
        if data:
            sys.stdout.write(data)
        return data

    def __iter__(self):
        for line in self._stream:
            sys.stdout.write(line)
            yield line

    def __getattr__(self, name):
        return getattr(self._stream, name)


sys.stdin = _EchoInput(sys.stdin)
"#;

/// Runs snippets with the system Python
#[derive(Debug)]
pub struct LocalPython {
    binary: String,
}

impl LocalPython {
    /// Probe the interpreter binary; errors when it is not runnable.
    /// Override the binary with `PYTHON_BIN` (default `python3`).
    pub async fn detect() -> Result<Self, EngineError> {
        let binary = std::env::var("PYTHON_BIN").unwrap_or_else(|_| "python3".to_string());

        let output = Command::new(&binary)
            .arg("--version")
            .output()
            .await
            .map_err(|e| EngineError::InterpreterUnavailable(format!("{}: {}", binary, e)))?;

        if !output.status.success() {
            return Err(EngineError::InterpreterUnavailable(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }

        let version = String::from_utf8_lossy(&output.stdout);
        info!("Local interpreter available: {}", version.trim());

        Ok(Self { binary })
    }
}

#[async_trait]
impl Interpreter for LocalPython {
    async fn run(&self, source: &str, stdin: &str) -> Result<InterpreterOutcome, EngineError> {
        let config = get_language_config(Language::Python)
            .ok_or_else(|| EngineError::UnsupportedLanguage(Language::Python.to_string()))?;

        let temp_dir = tempfile::tempdir()?;
        let source_path = temp_dir.path().join(&config.source_file);
        tokio::fs::write(&source_path, source).await?;
        tokio::fs::write(temp_dir.path().join("sitecustomize.py"), STDIN_ECHO_SHIM).await?;

        debug!("Running snippet with {}", self.binary);

        let mut child = Command::new(&self.binary)
            .arg(&source_path)
            .env("PYTHONPATH", temp_dir.path())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        if let Some(mut child_stdin) = child.stdin.take() {
            // The program may exit without draining stdin (e.g. a syntax
            // error); that failure belongs in its stderr, not here.
            if let Err(e) = child_stdin.write_all(stdin.as_bytes()).await {
                if e.kind() != std::io::ErrorKind::BrokenPipe {
                    return Err(e.into());
                }
            }
            // Close stdin so reads past the supplied input see EOF
        }

        let timeout = Duration::from_millis(config.run_timeout_ms as u64);
        let output = tokio::time::timeout(timeout, child.wait_with_output())
            .await
            .map_err(|_| EngineError::InterpreterTimeout(config.run_timeout_ms))??;

        Ok(InterpreterOutcome {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code: output.status.code().unwrap_or(-1),
        })
    }
}

/// Memoized interpreter handle.
///
/// Wraps a `tokio::sync::OnceCell` so the underlying interpreter is detected
/// at most once; concurrent first callers await the same probe. Clones share
/// the same cell.
#[derive(Clone)]
pub struct InterpreterCell {
    inner: Arc<OnceCell<Arc<dyn Interpreter>>>,
}

impl InterpreterCell {
    /// Fresh cell that detects the local Python on first use
    pub fn new() -> Self {
        Self {
            inner: Arc::new(OnceCell::new()),
        }
    }

    /// Process-wide cell shared by every `Engine` built with defaults
    pub fn shared() -> Self {
        static SHARED: OnceLock<InterpreterCell> = OnceLock::new();
        SHARED.get_or_init(InterpreterCell::new).clone()
    }

    /// Cell pre-seeded with an interpreter (used by tests)
    pub fn preset(interpreter: Arc<dyn Interpreter>) -> Self {
        Self {
            inner: Arc::new(OnceCell::new_with(Some(interpreter))),
        }
    }

    /// Get the interpreter, initializing it on first call
    pub async fn get(&self) -> Result<Arc<dyn Interpreter>, EngineError> {
        let interpreter = self
            .inner
            .get_or_try_init(|| async {
                let local = LocalPython::detect().await?;
                Ok::<_, EngineError>(Arc::new(local) as Arc<dyn Interpreter>)
            })
            .await?;
        Ok(Arc::clone(interpreter))
    }
}

impl Default for InterpreterCell {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingInterpreter {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Interpreter for CountingInterpreter {
        async fn run(&self, _source: &str, _stdin: &str) -> Result<InterpreterOutcome, EngineError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(InterpreterOutcome {
                stdout: "ok\n".to_string(),
                stderr: String::new(),
                exit_code: 0,
            })
        }
    }

    #[tokio::test]
    async fn test_preset_cell_returns_seeded_interpreter() {
        let interpreter = Arc::new(CountingInterpreter {
            calls: AtomicUsize::new(0),
        });
        let cell = InterpreterCell::preset(interpreter.clone());

        let handle = cell.get().await.unwrap();
        let outcome = handle.run("print('hi')", "").await.unwrap();
        assert_eq!(outcome.stdout, "ok\n");
        assert_eq!(interpreter.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_clones_share_one_cell() {
        let interpreter = Arc::new(CountingInterpreter {
            calls: AtomicUsize::new(0),
        });
        let cell = InterpreterCell::preset(interpreter);
        let clone = cell.clone();

        let a = cell.get().await.unwrap();
        let b = clone.get().await.unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[tokio::test]
    async fn test_consumed_input_lines_are_echoed() {
        let Ok(local) = LocalPython::detect().await else {
            return;
        };
        let outcome = local
            .run("name = input('Name: ')\nprint('hello', name)", "alice\n")
            .await
            .unwrap();
        assert_eq!(outcome.stdout, "Name: alice\nhello alice\n");
        assert_eq!(outcome.exit_code, 0);
    }

    #[tokio::test]
    async fn test_early_exit_keeps_user_error() {
        let Ok(local) = LocalPython::detect().await else {
            return;
        };
        // Enough stdin to overflow the pipe buffer while the child exits
        // without ever reading it.
        let stdin = "x\n".repeat(600_000);
        let outcome = local.run("x =", &stdin).await.unwrap();
        assert!(outcome.stderr.contains("SyntaxError"));
        assert_ne!(outcome.exit_code, 0);
    }

    #[tokio::test]
    async fn test_concurrent_first_callers_share_initialization() {
        // Both tasks race get(); the OnceCell must coalesce them into one
        // initialization and hand back the same handle.
        let cell = InterpreterCell::preset(Arc::new(CountingInterpreter {
            calls: AtomicUsize::new(0),
        }));
        let (a, b) = tokio::join!(cell.get(), cell.get());
        assert!(Arc::ptr_eq(&a.unwrap(), &b.unwrap()));
    }
}
