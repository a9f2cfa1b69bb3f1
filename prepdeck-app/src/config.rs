//! `prepdeck.toml` loading. Values from the command line (or their
//! `PREPDECK_*` environment variables) win over the file.

use anyhow::{bail, Context, Result};
use clap::ValueEnum;
use prepdeck_json::paths;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::cli::opts::Cli;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    Memory,
    #[default]
    Json,
    Sqlite,
    Remote,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Endpoint {
    pub url: Option<String>,
    pub api_key: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub store: Option<StoreKind>,
    pub db_path: Option<PathBuf>,
    pub remote: Endpoint,
    pub ai: Endpoint,
}

impl FileConfig {
    pub fn parse(text: &str) -> Result<Self> {
        toml::from_str(text).context("invalid prepdeck.toml")
    }

    /// An explicit path must exist; the default location is optional.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let (path, required) = match explicit {
            Some(p) => (p.to_path_buf(), true),
            None => (paths::config_file(), false),
        };
        if !path.exists() {
            if required {
                bail!("config file not found: {}", path.display());
            }
            return Ok(Self::default());
        }
        debug!(path = %path.display(), "loading config");
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("reading {}", path.display()))?;
        Self::parse(&text)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub store: StoreKind,
    pub db_path: PathBuf,
    pub remote_url: Option<String>,
    pub remote_key: Option<String>,
    pub ai_url: Option<String>,
    pub ai_key: Option<String>,
}

impl Settings {
    pub fn resolve(cli: &Cli, file: FileConfig) -> Self {
        Self {
            store: cli.store.or(file.store).unwrap_or_default(),
            db_path: cli
                .db_path
                .clone()
                .or(file.db_path)
                .unwrap_or_else(|| paths::data_root().join("prepdeck.sqlite3")),
            remote_url: cli.remote_url.clone().or(file.remote.url),
            remote_key: cli.remote_key.clone().or(file.remote.api_key),
            ai_url: cli.ai_url.clone().or(file.ai.url),
            ai_key: cli.ai_key.clone().or(file.ai.api_key),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    const SAMPLE: &str = r#"
store = "sqlite"
db_path = "/tmp/prep.sqlite3"

[remote]
url = "https://project.example"
api_key = "anon"

[ai]
url = "http://ai.example/generate"
"#;

    #[test]
    fn file_values_apply_when_flags_are_absent() {
        let cli = Cli::parse_from(["prepdeck", "deck", "list"]);
        let s = Settings::resolve(&cli, FileConfig::parse(SAMPLE).unwrap());
        assert_eq!(s.store, StoreKind::Sqlite);
        assert_eq!(s.db_path, PathBuf::from("/tmp/prep.sqlite3"));
        assert_eq!(s.remote_key.as_deref(), Some("anon"));
        assert_eq!(s.ai_url.as_deref(), Some("http://ai.example/generate"));
        assert_eq!(s.ai_key, None);
    }

    #[test]
    fn flags_override_the_file() {
        let cli = Cli::parse_from(["prepdeck", "--store", "memory", "--remote-url", "https://other", "deck", "list"]);
        let s = Settings::resolve(&cli, FileConfig::parse(SAMPLE).unwrap());
        assert_eq!(s.store, StoreKind::Memory);
        assert_eq!(s.remote_url.as_deref(), Some("https://other"));
    }

    #[test]
    fn empty_file_defaults_to_json() {
        let cli = Cli::parse_from(["prepdeck", "deck", "list"]);
        let s = Settings::resolve(&cli, FileConfig::parse("").unwrap());
        assert_eq!(s.store, StoreKind::Json);
        assert!(FileConfig::parse("store = \"floppy\"").is_err());
    }

    #[test]
    fn explicit_missing_config_is_an_error() {
        assert!(FileConfig::load(Some(Path::new("/nonexistent/prepdeck.toml"))).is_err());
    }
}
