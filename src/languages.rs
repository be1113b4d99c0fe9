//! Language configuration for snippet execution

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// A language the engine can run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    C,
    Python,
}

impl Language {
    /// Canonical name, matches the section keys in `files/languages.toml`
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::C => "c",
            Language::Python => "python",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.to_lowercase();
        for lang in [Language::C, Language::Python] {
            if name == lang.as_str() {
                return Ok(lang);
            }
            if let Some(config) = get_language_config(lang) {
                if config.aliases.iter().any(|a| a.to_lowercase() == name) {
                    return Ok(lang);
                }
            }
        }
        anyhow::bail!("Unsupported language: {}", s)
    }
}

/// Configuration for a supported language
#[derive(Debug, Clone, Deserialize)]
pub struct LanguageConfig {
    /// Name of the source file sent to the sandbox (e.g., "main.c")
    pub source_file: String,
    /// Runtime name understood by the remote sandbox
    pub runtime: String,
    /// Runtime version selector ("*" accepts any)
    pub version: String,
    /// Compile timeout in milliseconds (None if the language is not compiled)
    pub compile_timeout_ms: Option<u32>,
    /// Run timeout in milliseconds
    pub run_timeout_ms: u32,
    /// Alternative names accepted on input ("py", "python3", ...)
    #[serde(default)]
    pub aliases: Vec<String>,
}

/// Global language configurations
static LANGUAGES: OnceLock<HashMap<String, LanguageConfig>> = OnceLock::new();

fn load_languages() -> HashMap<String, LanguageConfig> {
    let content = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/files/languages.toml"));
    parse_languages(content).expect("embedded languages.toml is valid")
}

fn parse_languages(content: &str) -> anyhow::Result<HashMap<String, LanguageConfig>> {
    let configs: HashMap<String, LanguageConfig> =
        toml::from_str(content).context("Failed to parse language configuration")?;
    Ok(configs)
}

/// Get the configuration for a language
pub fn get_language_config(language: Language) -> Option<&'static LanguageConfig> {
    LANGUAGES.get_or_init(load_languages).get(language.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_embedded_config() {
        let content = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/files/languages.toml"));
        let configs = parse_languages(content).unwrap();

        assert!(configs.contains_key("c"));
        assert!(configs.contains_key("python"));
        assert_eq!(configs["c"].source_file, "main.c");
        assert_eq!(configs["c"].compile_timeout_ms, Some(10000));
        assert_eq!(configs["python"].version, "3.10");
        assert!(configs["python"].compile_timeout_ms.is_none());
    }

    #[test]
    fn test_language_from_str() {
        assert_eq!("c".parse::<Language>().unwrap(), Language::C);
        assert_eq!("C".parse::<Language>().unwrap(), Language::C);
        assert_eq!("python".parse::<Language>().unwrap(), Language::Python);
        assert_eq!("py".parse::<Language>().unwrap(), Language::Python);
        assert_eq!("Python3".parse::<Language>().unwrap(), Language::Python);
        assert!("java".parse::<Language>().is_err());
    }

    #[test]
    fn test_language_config_lookup() {
        let config = get_language_config(Language::Python).unwrap();
        assert_eq!(config.source_file, "main.py");
        assert_eq!(config.run_timeout_ms, 5000);
        assert_eq!(config.aliases, vec!["py", "python3"]);
    }
}
