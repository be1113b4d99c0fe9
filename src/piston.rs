//! Remote sandbox executor client
//!
//! Talks to a Piston-compatible execution API. The API compiles and runs a
//! single source file with stdin attached and reports separate compile and
//! run phases; a non-empty compile-phase stderr takes precedence over the
//! run phase and is surfaced as the error with the compile exit code.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::EngineError;
use crate::languages::{get_language_config, Language};

/// Default public Piston endpoint; override with `PISTON_URL`.
pub const DEFAULT_PISTON_URL: &str = "https://emkc.org/api/v2/piston";

/// What came back from the sandbox, reduced to the engine's terms
#[derive(Debug, Clone)]
pub struct SandboxOutcome {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

/// Remote executor abstraction, mockable in tests
#[async_trait]
pub trait SandboxExecutor: Send + Sync {
    /// Compile (if applicable) and run `source` with `stdin` attached
    async fn execute(
        &self,
        language: Language,
        source: &str,
        stdin: &str,
    ) -> Result<SandboxOutcome, EngineError>;

    /// Report whether the sandbox is reachable; never errors
    async fn probe(&self) -> bool;
}

#[derive(Debug, Serialize)]
struct ExecuteRequest<'a> {
    language: &'a str,
    version: &'a str,
    files: Vec<SourceFile<'a>>,
    stdin: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    compile_timeout: Option<u32>,
    run_timeout: u32,
}

#[derive(Debug, Serialize)]
struct SourceFile<'a> {
    name: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ExecuteResponse {
    run: PhaseResult,
    compile: Option<PhaseResult>,
}

impl ExecuteResponse {
    /// Reduce the two phases to one outcome. A non-empty compile-phase
    /// stderr wins over the run phase and carries the compile exit code
    /// (never 0, since the compile failed).
    fn into_outcome(self) -> SandboxOutcome {
        if let Some(compile) = self.compile {
            if !compile.stderr.is_empty() {
                let exit_code = match compile.code {
                    Some(code) if code != 0 => code,
                    _ => 1,
                };
                return SandboxOutcome {
                    stdout: String::new(),
                    stderr: compile.stderr,
                    exit_code,
                };
            }
        }

        SandboxOutcome {
            stdout: self.run.stdout,
            stderr: self.run.stderr,
            exit_code: self.run.code.unwrap_or(0),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct PhaseResult {
    stdout: String,
    stderr: String,
    code: Option<i32>,
}

/// HTTP client for a Piston-compatible sandbox
#[derive(Debug, Clone)]
pub struct PistonClient {
    client: Client,
    base_url: String,
}

impl PistonClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Create a client from the `PISTON_URL` environment variable,
    /// falling back to the public endpoint
    pub fn from_env() -> Self {
        let base_url =
            std::env::var("PISTON_URL").unwrap_or_else(|_| DEFAULT_PISTON_URL.to_string());
        Self::new(base_url)
    }
}

#[async_trait]
impl SandboxExecutor for PistonClient {
    async fn execute(
        &self,
        language: Language,
        source: &str,
        stdin: &str,
    ) -> Result<SandboxOutcome, EngineError> {
        let config = get_language_config(language)
            .ok_or_else(|| EngineError::UnsupportedLanguage(language.to_string()))?;

        let request = ExecuteRequest {
            language: &config.runtime,
            version: &config.version,
            files: vec![SourceFile {
                name: &config.source_file,
                content: source,
            }],
            stdin,
            compile_timeout: config.compile_timeout_ms,
            run_timeout: config.run_timeout_ms,
        };

        debug!(
            "Dispatching {} snippet to sandbox at {}",
            language, self.base_url
        );

        let response = self
            .client
            .post(format!("{}/execute", self.base_url))
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(EngineError::SandboxStatus(status.as_u16()));
        }

        let result: ExecuteResponse = response.json().await?;
        Ok(result.into_outcome())
    }

    async fn probe(&self) -> bool {
        match self
            .client
            .get(format!("{}/runtimes", self.base_url))
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                warn!("Sandbox probe failed: {}", e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_execute_request_serialization() {
        let request = ExecuteRequest {
            language: "c",
            version: "*",
            files: vec![SourceFile {
                name: "main.c",
                content: "int main() { return 0; }",
            }],
            stdin: "",
            compile_timeout: Some(10000),
            run_timeout: 5000,
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["language"], "c");
        assert_eq!(json["version"], "*");
        assert_eq!(json["files"][0]["name"], "main.c");
        assert_eq!(json["compile_timeout"], 10000);
        assert_eq!(json["run_timeout"], 5000);
    }

    #[test]
    fn test_run_timeout_only_for_python() {
        let request = ExecuteRequest {
            language: "python",
            version: "3.10",
            files: vec![SourceFile {
                name: "main.py",
                content: "print(1)",
            }],
            stdin: "",
            compile_timeout: None,
            run_timeout: 5000,
        };

        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("compile_timeout").is_none());
    }

    #[test]
    fn test_compile_stderr_takes_precedence() {
        let raw = r#"{
            "run": {"stdout": "ignored", "stderr": "", "code": 0, "signal": null, "output": ""},
            "compile": {"stdout": "", "stderr": "undefined reference to `main'", "code": 1}
        }"#;
        let response: ExecuteResponse = serde_json::from_str(raw).unwrap();
        let outcome = response.into_outcome();
        assert_eq!(outcome.stderr, "undefined reference to `main'");
        assert_eq!(outcome.exit_code, 1);
        assert!(outcome.stdout.is_empty());
    }

    #[test]
    fn test_compile_failure_with_zero_code_maps_to_one() {
        let raw = r#"{
            "run": {"stdout": "", "stderr": "", "code": 0},
            "compile": {"stdout": "", "stderr": "warning treated as error", "code": 0}
        }"#;
        let response: ExecuteResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(response.into_outcome().exit_code, 1);
    }

    #[test]
    fn test_clean_compile_uses_run_phase() {
        let raw = r#"{
            "run": {"stdout": "hi\n", "stderr": "", "code": 0},
            "compile": {"stdout": "", "stderr": "", "code": 0}
        }"#;
        let response: ExecuteResponse = serde_json::from_str(raw).unwrap();
        let outcome = response.into_outcome();
        assert_eq!(outcome.stdout, "hi\n");
        assert_eq!(outcome.exit_code, 0);
    }

    #[test]
    fn test_response_parsing_without_compile_phase() {
        let raw = r#"{"run": {"stdout": "hi\n", "stderr": "", "code": 0}}"#;
        let response: ExecuteResponse = serde_json::from_str(raw).unwrap();
        assert!(response.compile.is_none());
        assert_eq!(response.run.stdout, "hi\n");
    }
}
