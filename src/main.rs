use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use coderunner::{Engine, ExecutionRequest, Language};

/// Run a C or Python snippet and print the result record as JSON
#[derive(Debug, Parser)]
#[command(name = "coderunner", version, about)]
struct Cli {
    /// Source file to run
    #[arg(required_unless_present_any = ["check", "preload"])]
    source: Option<PathBuf>,

    /// Language of the snippet (c, python; aliases py, python3)
    #[arg(short, long)]
    language: Option<Language>,

    /// File whose contents are fed to the program's stdin
    #[arg(long)]
    stdin_file: Option<PathBuf>,

    /// Attach a plain-language explanation when the run errors
    #[arg(long)]
    explain: bool,

    /// Probe collaborator availability and exit
    #[arg(long)]
    check: bool,

    /// Warm the local interpreter and exit
    #[arg(long)]
    preload: bool,
}

fn guess_language(path: &Path) -> Option<Language> {
    match path.extension()?.to_str()? {
        "c" => Some(Language::C),
        "py" => Some(Language::Python),
        _ => None,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("coderunner=info".parse()?),
        )
        .init();

    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let engine = Engine::new();

    if cli.check {
        let availability = engine.check_availability().await;
        println!("{}", serde_json::to_string_pretty(&availability)?);
        return Ok(());
    }

    if cli.preload {
        let warmed = engine.preload().await;
        info!("Interpreter preload: {}", if warmed { "ok" } else { "failed" });
        return Ok(());
    }

    let source_path = cli
        .source
        .ok_or_else(|| anyhow::anyhow!("A source file is required"))?;
    let source = std::fs::read_to_string(&source_path)
        .with_context(|| format!("Failed to read {}", source_path.display()))?;

    let language = match cli.language {
        Some(language) => language,
        None => guess_language(&source_path)
            .ok_or_else(|| anyhow::anyhow!("Cannot guess language, pass --language"))?,
    };

    let stdin = match &cli.stdin_file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        None => String::new(),
    };

    let request = ExecutionRequest::new(source, language)
        .with_stdin(stdin)
        .with_explanations(cli.explain);

    let result = engine.execute(&request).await;
    println!("{}", serde_json::to_string_pretty(&result)?);

    Ok(())
}
