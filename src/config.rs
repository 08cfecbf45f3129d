use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use crate::storage::StoreOptions;

/// Service configuration, read from `jobtrends.toml`.
///
/// Missing keys fall back to the defaults below; the binary then applies
/// CLI flags and `JOBTRENDS_*` environment variables on top.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JobTrendsConfig {
    pub database: PathBuf,
    pub host: String,
    pub port: u16,
    pub pool_size: u32,
    pub busy_timeout_ms: u64,
    pub request_timeout_secs: u64,
    /// `work_year` stored when a new job omits it
    pub default_work_year: i64,
    /// Upper bound on `limit` for job listings
    pub max_list_limit: usize,
    /// Origins allowed by CORS; empty allows any origin
    pub cors_allowed_origins: Vec<String>,
}

impl Default for JobTrendsConfig {
    fn default() -> Self {
        Self {
            database: default_database_path_in(Path::new(".")),
            host: "127.0.0.1".to_string(),
            port: 8000,
            pool_size: 8,
            busy_timeout_ms: 5_000,
            request_timeout_secs: 30,
            default_work_year: 2024,
            max_list_limit: 10_000,
            cors_allowed_origins: Vec::new(),
        }
    }
}

impl JobTrendsConfig {
    pub fn store_options(&self) -> StoreOptions {
        StoreOptions {
            pool_size: self.pool_size.max(1),
            busy_timeout: Duration::from_millis(self.busy_timeout_ms),
            ..StoreOptions::default()
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("jobtrends.toml")
}

pub fn default_database_path_in(base: &Path) -> PathBuf {
    base.join(".jobtrends").join("jobtrends.db")
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Option<JobTrendsConfig>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)?;
    let config: JobTrendsConfig = toml::from_str(&contents)?;
    Ok(Some(config))
}

pub fn write_config(path: &Path, config: &JobTrendsConfig, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("config already exists at {} (use --force to overwrite)", path.display());
    }

    let contents = toml::to_string_pretty(config)?;
    std::fs::write(path, contents)?;
    Ok(())
}

pub fn ensure_db_dir(db_path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
