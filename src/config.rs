//! Configuration management using the prefer crate for file discovery.
//!
//! Settings come from, in order of precedence: environment overrides, an
//! explicit `--config` file or one discovered by `prefer` under the name
//! `specfetch`, then built-in defaults. Files may be TOML, YAML or JSON.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Result, ScrapeError};
use crate::models::{CategoryEntry, CategoryTable, DEFAULT_BASE_URL};
use crate::scrapers::browser::BrowserConfig;
use crate::scrapers::extract::ExtractionConfig;
use crate::scrapers::http_client::HttpConfig;
use crate::scrapers::rate_limiter::RateLimitConfig;
use crate::scrapers::resolve::ResolutionConfig;
use crate::services::download::RetryConfig;

/// Default directory spec sheets are written to.
pub const DEFAULT_OUTPUT_DIR: &str = "watts_specs";

/// Default directory for diagnostic page dumps.
pub const DEFAULT_DIAGNOSTICS_DIR: &str = "debug";

/// Complete run configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Catalog site root, e.g. `https://www.watts.com`.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Root of the category-structured spec-sheet store.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Where diagnostic markup is saved; unset disables it.
    #[serde(default = "default_diagnostics_dir")]
    pub diagnostics_dir: Option<PathBuf>,

    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    #[serde(default)]
    pub retry: RetryConfig,

    #[serde(default)]
    pub http: HttpConfig,

    #[serde(default)]
    pub browser: BrowserConfig,

    #[serde(default)]
    pub extraction: ExtractionConfig,

    #[serde(default)]
    pub resolution: ResolutionConfig,

    /// Category table, in processing order.
    #[serde(default = "CategoryTable::default_entries")]
    pub categories: Vec<CategoryEntry>,

    /// File the settings were loaded from.
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(DEFAULT_OUTPUT_DIR)
}

fn default_diagnostics_dir() -> Option<PathBuf> {
    Some(PathBuf::from(DEFAULT_DIAGNOSTICS_DIR))
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            output_dir: default_output_dir(),
            diagnostics_dir: default_diagnostics_dir(),
            rate_limit: RateLimitConfig::default(),
            retry: RetryConfig::default(),
            http: HttpConfig::default(),
            browser: BrowserConfig::default(),
            extraction: ExtractionConfig::default(),
            resolution: ResolutionConfig::default(),
            categories: CategoryTable::default_entries(),
            source_path: None,
        }
    }
}

impl Settings {
    /// Load settings from `config_path`, or from a file discovered by
    /// `prefer`, falling back to defaults when none exists.
    ///
    /// An explicit path that cannot be read or parsed is an error; a
    /// discovered file that fails to parse is reported and ignored.
    pub async fn load(config_path: Option<&Path>) -> Result<Self> {
        let settings = match config_path {
            Some(path) => Self::load_from_path(path).await?,
            None => Self::discover().await,
        };
        let settings = settings.with_env_overrides().with_resolved_paths();
        settings.validate()?;
        Ok(settings)
    }

    async fn discover() -> Self {
        let path = match prefer::load("specfetch").await {
            Ok(found) => found.source_path().map(|p| p.to_path_buf()),
            Err(_) => None,
        };
        let Some(path) = path else {
            debug!("No config file found, using defaults");
            return Self::default();
        };
        match Self::load_from_path(&path).await {
            Ok(settings) => settings,
            Err(e) => {
                warn!("Ignoring config file {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Load settings from a specific file. Format follows the extension.
    pub async fn load_from_path(path: &Path) -> Result<Self> {
        let contents = tokio::fs::read_to_string(path).await.map_err(|e| {
            ScrapeError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

        let mut settings = Self::parse(&contents, ext)
            .map_err(|e| ScrapeError::Config(format!("{}: {}", path.display(), e)))?;
        settings.source_path = Some(path.to_path_buf());
        Ok(settings)
    }

    /// Parse settings text in the given format (`toml`, `yaml`/`yml`, `json`).
    pub fn parse(contents: &str, format: &str) -> std::result::Result<Self, String> {
        match format {
            "yaml" | "yml" => serde_yaml::from_str(contents)
                .map_err(|e| format!("failed to parse YAML config: {}", e)),
            "json" => serde_json::from_str(contents)
                .map_err(|e| format!("failed to parse JSON config: {}", e)),
            _ => toml::from_str(contents).map_err(|e| format!("failed to parse TOML config: {}", e)),
        }
    }

    /// Apply `SPECFETCH_*` environment overrides.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(dir) = non_empty_env("SPECFETCH_OUTPUT_DIR") {
            self.output_dir = PathBuf::from(dir);
        }
        if let Some(url) = non_empty_env("SPECFETCH_BASE_URL") {
            self.base_url = url;
        }
        if let Some(dir) = non_empty_env("SPECFETCH_DIAGNOSTICS_DIR") {
            self.diagnostics_dir = Some(PathBuf::from(dir));
        }
        self.browser = self.browser.with_env_overrides();
        self
    }

    /// Expand `~` and make relative paths relative to the config file.
    pub fn with_resolved_paths(mut self) -> Self {
        let base_dir = self.base_dir();
        self.output_dir = resolve_path(&self.output_dir, base_dir.as_deref());
        self.diagnostics_dir = self
            .diagnostics_dir
            .as_deref()
            .map(|dir| resolve_path(dir, base_dir.as_deref()));
        self
    }

    /// Directory of the config file, if settings came from one.
    pub fn base_dir(&self) -> Option<PathBuf> {
        self.source_path
            .as_ref()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
            .filter(|p| !p.as_os_str().is_empty())
    }

    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.base_url)
            .map_err(|e| ScrapeError::Config(format!("invalid base_url {}: {}", self.base_url, e)))?;
        if self.categories.is_empty() {
            return Err(ScrapeError::Config(
                "category table must not be empty".to_string(),
            ));
        }
        self.rate_limit.validate()?;
        self.retry.validate()?;
        self.extraction.validate()?;
        self.resolution.validate()?;
        Ok(())
    }

    pub fn category_table(&self) -> CategoryTable {
        CategoryTable::new(self.base_url.clone(), self.categories.clone())
    }

    /// Settings as TOML, for `specfetch config`.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| ScrapeError::Config(format!("failed to serialize settings: {}", e)))
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Resolve a path that may use `~` or be relative to the config file.
fn resolve_path(path: &Path, base_dir: Option<&Path>) -> PathBuf {
    let raw = path.to_string_lossy();
    let expanded = shellexpand::tilde(raw.as_ref());
    let expanded = Path::new(expanded.as_ref());
    match base_dir {
        Some(base) if expanded.is_relative() => base.join(expanded),
        _ => expanded.to_path_buf(),
    }
}
