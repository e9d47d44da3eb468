use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    pub remote: RemoteConfig,
    pub corpus: CorpusConfig,
    pub index: IndexConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RemoteConfig {
    /// Base URL of the municipal content API, without a trailing slash.
    pub base_url: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// The deployed service presents an invalid certificate chain; set this
    /// to tolerate it. Off by default.
    #[serde(default)]
    pub accept_invalid_certs: bool,
}

fn default_timeout_secs() -> u64 {
    10
}

#[derive(Debug, Deserialize, Clone)]
pub struct CorpusConfig {
    /// Root of the extracted-text tree: `{text_root}/{folder}/{agenda}/{file}`.
    pub text_root: PathBuf,

    /// Root of the transient download staging tree, removed after each sync.
    pub staging_root: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct IndexConfig {
    /// Location of the search index file. Rebuilds write `{path}.tmp` and
    /// rename it over this path.
    pub path: PathBuf,
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let mut config: Config =
        toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    while config.remote.base_url.ends_with('/') {
        config.remote.base_url.pop();
    }

    if config.remote.base_url.is_empty() {
        anyhow::bail!("remote.base_url must be set");
    }

    if !config.remote.base_url.starts_with("http://") && !config.remote.base_url.starts_with("https://")
    {
        anyhow::bail!("remote.base_url must be an http(s) URL");
    }

    if config.remote.timeout_secs == 0 {
        anyhow::bail!("remote.timeout_secs must be > 0");
    }

    if config.corpus.text_root == config.corpus.staging_root {
        anyhow::bail!("corpus.text_root and corpus.staging_root must differ — the staging tree is deleted after every sync");
    }

    Ok(config)
}
