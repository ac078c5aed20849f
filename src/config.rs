use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    #[serde(default)]
    pub import: ImportConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

/// How the rows of one import run are committed.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum CommitPolicy {
    /// One transaction around the whole file; a storage fault rolls back
    /// every card of the run.
    #[default]
    File,
    /// Each insert commits on its own; cards before a storage fault stay.
    Statement,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ImportConfig {
    #[serde(default)]
    pub commit: CommitPolicy,
    /// Joins address components and replaces newlines inside an address.
    #[serde(default = "default_address_separator")]
    pub address_separator: String,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            commit: CommitPolicy::default(),
            address_separator: default_address_separator(),
        }
    }
}

fn default_address_separator() -> String {
    ", ".to_string()
}

impl Config {
    /// Config with only a database path, everything else defaulted.
    pub fn with_db_path(path: impl Into<PathBuf>) -> Self {
        Self {
            db: DbConfig { path: path.into() },
            import: ImportConfig::default(),
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    if config.db.path.as_os_str().is_empty() {
        anyhow::bail!("db.path must not be empty");
    }

    if config.import.address_separator.is_empty() {
        anyhow::bail!("import.address_separator must not be empty");
    }

    Ok(config)
}
