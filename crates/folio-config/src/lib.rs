//! Configuration management for folio.
//!
//! Parses `folio.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! String configuration values support environment variable expansion:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//!
//! Expanded fields:
//! - `docs.source_dir`
//! - `docs.public_dir`
//! - `site.name`
//!
//! ## Site Passthrough
//!
//! The `[site]` section has a fixed set of typed fields. Any other key is
//! kept in [`SiteConfig::extra`] and serialized back out unchanged, so front
//! ends can grow new settings without a change here.

mod expand;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override docs source directory.
    pub source_dir: Option<PathBuf>,
    /// Override public directory for `/`-rooted images.
    pub public_dir: Option<PathBuf>,
    /// Override watch enabled flag.
    pub watch_enabled: Option<bool>,
    /// Override minimum chunk size.
    pub min_chunk_size: Option<usize>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "folio.toml";

/// Application configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Documentation configuration (paths are relative strings from TOML).
    docs: DocsConfigRaw,
    /// Chunking and image preview configuration.
    pub chunks: ChunksConfig,
    /// Summary and reading time configuration.
    pub reading: ReadingConfig,
    /// Source watching configuration.
    pub watch: WatchConfig,
    /// Site presentation settings, passed through to front ends.
    pub site: SiteConfig,

    /// Resolved docs configuration (set after loading).
    #[serde(skip)]
    pub docs_resolved: DocsConfig,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_with_base(Path::new("."))
    }
}

/// Raw docs configuration as parsed from TOML (paths as strings).
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct DocsConfigRaw {
    source_dir: Option<String>,
    public_dir: Option<String>,
}

/// Resolved documentation configuration with absolute paths.
#[derive(Debug, Default)]
pub struct DocsConfig {
    /// Source directory for markdown files.
    pub source_dir: PathBuf,
    /// Public web root; `/`-rooted image sources resolve here.
    pub public_dir: PathBuf,
}

/// Chunking configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ChunksConfig {
    /// Characters a merged text chunk must reach before it is emitted.
    pub min_chunk_size: usize,
    /// Preview thumbnail width in pixels.
    pub lqip_width: u32,
    /// Preview JPEG quality (1-100).
    pub lqip_quality: u8,
}

impl Default for ChunksConfig {
    fn default() -> Self {
        Self {
            min_chunk_size: 3000,
            lqip_width: 24,
            lqip_quality: 30,
        }
    }
}

/// Reading statistics configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ReadingConfig {
    /// Assumed reading speed for reading time estimates.
    pub words_per_minute: u32,
    /// Length of derived summaries in characters.
    pub summary_length: usize,
}

impl Default for ReadingConfig {
    fn default() -> Self {
        Self {
            words_per_minute: 400,
            summary_length: 200,
        }
    }
}

/// Source watching configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Whether changes are picked up while running.
    pub enabled: bool,
    /// Quiet period before a burst of events on one file is applied.
    pub debounce_ms: u64,
    /// File patterns to watch for changes.
    pub patterns: Vec<String>,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            debounce_ms: 100,
            patterns: vec!["**/*.md".to_owned()],
        }
    }
}

/// Site settings consumed by front ends.
///
/// Only `name` and `description` are used here (as the `folio index`
/// header); the rest is passed through to whatever serves the site.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SiteConfig {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub keywords: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footer_html: Option<String>,
    pub nav_links: Vec<NavLink>,
    /// Unknown keys, preserved verbatim.
    #[serde(flatten)]
    pub extra: BTreeMap<String, toml::Value>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            name: "Folio".to_owned(),
            description: None,
            keywords: Vec::new(),
            icon_url: None,
            logo_url: None,
            footer_html: None,
            nav_links: Vec::new(),
            extra: BTreeMap::new(),
        }
    }
}

/// Navigation link shown in the site header.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct NavLink {
    pub label: String,
    pub url: String,
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`site.name`").
        field: String,
        /// Error message (e.g., "${`SITE_NAME`} not set").
        message: String,
    },
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `folio.toml` in current directory and parents.
    ///
    /// CLI settings are applied after loading and path resolution, allowing CLI
    /// arguments to take precedence over config file values.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist or parsing fails.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default_with_cwd()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
            config.validate()?;
        }

        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(source_dir) = &settings.source_dir {
            self.docs_resolved.source_dir.clone_from(source_dir);
        }
        if let Some(public_dir) = &settings.public_dir {
            self.docs_resolved.public_dir.clone_from(public_dir);
        }
        if let Some(enabled) = settings.watch_enabled {
            self.watch.enabled = enabled;
        }
        if let Some(min_chunk_size) = settings.min_chunk_size {
            self.chunks.min_chunk_size = min_chunk_size;
        }
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Create default config with paths relative to current working directory.
    fn default_with_cwd() -> Self {
        let cwd = std::env::current_dir().unwrap_or_default();
        Self::default_with_base(&cwd)
    }

    /// Create default config with paths relative to given base directory.
    fn default_with_base(base: &Path) -> Self {
        Self {
            docs: DocsConfigRaw::default(),
            chunks: ChunksConfig::default(),
            reading: ReadingConfig::default(),
            watch: WatchConfig::default(),
            site: SiteConfig::default(),
            docs_resolved: DocsConfig {
                source_dir: base.join("docs"),
                public_dir: base.join("public"),
            },
            config_path: None,
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        // Expand environment variables before path resolution
        config.expand_env_vars()?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve_paths(config_dir);
        config.config_path = Some(path.to_path_buf());

        // Validate configuration after loading and resolution
        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// Called automatically after loading from file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_chunks()?;
        self.validate_reading()?;
        require_non_empty(&self.site.name, "site.name")?;
        if self.watch.patterns.is_empty() {
            return Err(ConfigError::Validation(
                "watch.patterns cannot be empty".to_owned(),
            ));
        }
        Ok(())
    }

    /// Validate chunks configuration.
    fn validate_chunks(&self) -> Result<(), ConfigError> {
        const MAX_LQIP_WIDTH: u32 = 256;

        if self.chunks.min_chunk_size == 0 {
            return Err(ConfigError::Validation(
                "chunks.min_chunk_size must be greater than 0".to_owned(),
            ));
        }
        if self.chunks.lqip_width == 0 || self.chunks.lqip_width > MAX_LQIP_WIDTH {
            return Err(ConfigError::Validation(format!(
                "chunks.lqip_width must be between 1 and {MAX_LQIP_WIDTH}"
            )));
        }
        if !(1..=100).contains(&self.chunks.lqip_quality) {
            return Err(ConfigError::Validation(
                "chunks.lqip_quality must be between 1 and 100".to_owned(),
            ));
        }
        Ok(())
    }

    /// Validate reading configuration.
    fn validate_reading(&self) -> Result<(), ConfigError> {
        if self.reading.words_per_minute == 0 {
            return Err(ConfigError::Validation(
                "reading.words_per_minute must be greater than 0".to_owned(),
            ));
        }
        if self.reading.summary_length < 4 {
            return Err(ConfigError::Validation(
                "reading.summary_length must be at least 4".to_owned(),
            ));
        }
        Ok(())
    }

    /// Expand environment variable references in configuration strings.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        if let Some(ref source_dir) = self.docs.source_dir {
            self.docs.source_dir = Some(expand::expand_env(source_dir, "docs.source_dir")?);
        }
        if let Some(ref public_dir) = self.docs.public_dir {
            self.docs.public_dir = Some(expand::expand_env(public_dir, "docs.public_dir")?);
        }
        self.site.name = expand::expand_env(&self.site.name, "site.name")?;
        Ok(())
    }

    /// Resolve relative paths to absolute paths based on config directory.
    fn resolve_paths(&mut self, config_dir: &Path) {
        let resolve = |path: Option<&str>, default: &str| config_dir.join(path.unwrap_or(default));

        self.docs_resolved = DocsConfig {
            source_dir: resolve(self.docs.source_dir.as_deref(), "docs"),
            public_dir: resolve(self.docs.public_dir.as_deref(), "public"),
        };
    }
}
