use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    pub sources: SourcesConfig,
    #[serde(default)]
    pub reports: ReportsConfig,
    #[serde(default)]
    pub search: SearchConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

/// Paths to the four tabular inputs. The relationship source is optional;
/// the other three are required for a full ingestion run.
#[derive(Debug, Deserialize, Clone)]
pub struct SourcesConfig {
    pub categories: PathBuf,
    pub parts: PathBuf,
    pub secondary: PathBuf,
    #[serde(default)]
    pub relationships: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ReportsConfig {
    /// Where the list of unmatched secondary identifiers is written.
    #[serde(default = "default_unmatched_path")]
    pub unmatched_path: PathBuf,
    /// Where the search index artifact is written.
    #[serde(default = "default_index_path")]
    pub index_path: PathBuf,
}

impl Default for ReportsConfig {
    fn default() -> Self {
        Self {
            unmatched_path: default_unmatched_path(),
            index_path: default_index_path(),
        }
    }
}

fn default_unmatched_path() -> PathBuf {
    PathBuf::from("data/unmatched_parts.txt")
}

fn default_index_path() -> PathBuf {
    PathBuf::from("data/search_index.json")
}

#[derive(Debug, Deserialize, Clone)]
pub struct SearchConfig {
    #[serde(default = "default_result_cap")]
    pub result_cap: i64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            result_cap: default_result_cap(),
        }
    }
}

fn default_result_cap() -> i64 {
    1000
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    if config.search.result_cap < 1 {
        anyhow::bail!("search.result_cap must be >= 1");
    }

    Ok(config)
}
