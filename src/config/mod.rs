use std::env;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

const APP_DOMAIN: &str = "io";
const APP_ORG: &str = "Newsdesk";
const APP_NAME: &str = "newsdesk";

const DEFAULT_FETCH_LIMIT: usize = 10;

pub struct ConfigLoader {
    paths: ConfigPaths,
}

impl ConfigLoader {
    pub fn discover() -> Result<Self> {
        let paths = ConfigPaths::discover()?;
        Ok(Self { paths })
    }

    pub fn paths(&self) -> &ConfigPaths {
        &self.paths
    }

    pub fn load_or_init(&self) -> Result<AppConfig> {
        self.paths.ensure_directories()?;
        if !self.paths.config_file.exists() {
            let mut default_cfg = AppConfig::default();
            default_cfg.post_load();
            self.write_default_config(&default_cfg)?;
            return Ok(default_cfg);
        }

        self.load()
    }

    pub fn load(&self) -> Result<AppConfig> {
        let raw = fs::read_to_string(&self.paths.config_file)
            .with_context(|| format!("reading config {}", self.paths.config_file.display()))?;
        let mut cfg: AppConfig = toml::from_str(&raw).context("parsing config toml")?;
        cfg.post_load();
        Ok(cfg)
    }

    fn write_default_config(&self, cfg: &AppConfig) -> Result<()> {
        let toml = toml::to_string_pretty(cfg).context("serializing default config")?;
        if let Some(parent) = self.paths.config_file.parent() {
            fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
        }
        let mut file = fs::File::create(&self.paths.config_file)
            .with_context(|| format!("creating config {}", self.paths.config_file.display()))?;
        file.write_all(toml.as_bytes())
            .context("writing default config")?;
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct ConfigPaths {
    pub config_dir: PathBuf,
    pub config_file: PathBuf,
    pub state_dir: PathBuf,
    pub log_dir: PathBuf,
}

impl ConfigPaths {
    pub fn discover() -> Result<Self> {
        let override_config = env::var("NEWSDESK_CONFIG").ok().map(PathBuf::from);

        let project_dirs = ProjectDirs::from(APP_DOMAIN, APP_ORG, APP_NAME)
            .context("resolving XDG project directories")?;

        let config_dir = override_config
            .clone()
            .map(|p| {
                if p.is_dir() {
                    p
                } else {
                    p.parent().map(Path::to_path_buf).unwrap_or(p)
                }
            })
            .unwrap_or_else(|| project_dirs.config_dir().to_path_buf());

        let config_file = override_config
            .filter(|p| p.is_file() || p.extension().is_some())
            .unwrap_or_else(|| config_dir.join("config.toml"));

        let state_dir = project_dirs
            .state_dir()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| config_dir.join("state"));
        let log_dir = state_dir.join("logs");

        Ok(Self {
            config_dir,
            config_file,
            state_dir,
            log_dir,
        })
    }

    pub fn ensure_directories(&self) -> Result<()> {
        for dir in [&self.config_dir, &self.state_dir, &self.log_dir] {
            fs::create_dir_all(dir)
                .with_context(|| format!("creating application directory {}", dir.display()))?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub store: StoreOptions,
    pub fetch: FetchOptions,
    pub ui: UiOptions,
}

impl AppConfig {
    fn post_load(&mut self) {
        self.store.apply_env_overrides(
            env::var("NEWSDESK_STORE_URL").ok(),
            env::var("NEWSDESK_STORE_KEY").ok(),
        );
        if self.fetch.limit == 0 {
            tracing::warn!("fetch.limit of 0 in config, falling back to {DEFAULT_FETCH_LIMIT}");
            self.fetch.limit = DEFAULT_FETCH_LIMIT;
        }
    }
}

/// Connection details for the hosted row store. The API key can be kept out
/// of the config file entirely and supplied via `NEWSDESK_STORE_KEY`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreOptions {
    pub endpoint: String,
    pub api_key: String,
    pub table: String,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            api_key: String::new(),
            table: "news_items".to_string(),
        }
    }
}

impl StoreOptions {
    pub(crate) fn apply_env_overrides(
        &mut self,
        endpoint: Option<String>,
        api_key: Option<String>,
    ) {
        if let Some(endpoint) = endpoint.filter(|v| !v.trim().is_empty()) {
            self.endpoint = endpoint;
        }
        if let Some(api_key) = api_key.filter(|v| !v.trim().is_empty()) {
            self.api_key = api_key;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchOptions {
    /// Rows requested per fetch; the store truncates server-side.
    pub limit: usize,
    /// How long a fetched batch is displayed before the feed refetches.
    pub refresh_minutes: u64,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            limit: DEFAULT_FETCH_LIMIT,
            refresh_minutes: 60,
        }
    }
}

impl FetchOptions {
    pub fn refresh_interval(&self) -> time::Duration {
        time::Duration::minutes(self.refresh_minutes as i64)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiOptions {
    /// Display lines a collapsed card title is clamped to.
    pub collapsed_title_lines: u16,
}

impl Default for UiOptions {
    fn default() -> Self {
        Self {
            collapsed_title_lines: 2,
        }
    }
}
