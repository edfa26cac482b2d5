use anyhow::{anyhow, Context, Result};
use caption_core::SelectionMode;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::formatters::OutputFormat;

/// Prefix of every environment variable that overrides configuration
pub const ENV_PREFIX: &str = "CAPTION_HARVESTER_";

/// Configuration for the caption harvester
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP client settings
    pub http: HttpConfig,

    /// Track selection and batch settings
    pub retrieval: RetrievalConfig,

    /// Output and logging settings
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Request timeout in seconds
    pub timeout_seconds: u64,

    /// User agent sent with every request
    pub user_agent: String,

    /// Value of the Accept-Language header. Page markers are matched on the
    /// English page layout.
    pub accept_language: String,

    /// Proxy URL applied to all requests
    pub proxy: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Language codes in descending priority
    pub languages: Vec<String>,

    /// Which provenance buckets are searched
    pub mode: SelectionMode,

    /// Record failed identifiers instead of aborting the batch
    pub continue_after_error: bool,

    /// Maximum number of identifiers processed concurrently
    pub workers: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Rendering of fetched transcripts
    pub format: OutputFormat,

    /// Write one file per identifier here instead of printing to stdout
    pub output_dir: Option<PathBuf>,

    /// Log level
    pub log_level: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
            user_agent: "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string(),
            accept_language: "en-US".to_string(),
            proxy: None,
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            languages: vec!["en".to_string()],
            mode: SelectionMode::Any,
            continue_after_error: false,
            workers: num_cpus::get().min(4), // Use available cores, max 4
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            output_dir: None,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from the first readable config file, then apply
    /// environment overrides. Falls back to defaults when no file exists.
    pub fn load() -> Result<Self> {
        for path in Self::search_paths() {
            if let Ok(config_str) = std::fs::read_to_string(&path) {
                match toml::from_str::<Self>(&config_str) {
                    Ok(mut config) => {
                        tracing::info!("📄 Loaded configuration from: {}", path.display());
                        config.apply_env_overrides(|name| std::env::var(name).ok())?;
                        return Ok(config);
                    }
                    Err(e) => {
                        tracing::warn!("Failed to parse config file {}: {}", path.display(), e);
                    }
                }
            }
        }

        Self::from_env()
    }

    /// Load configuration from an explicit file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config_str = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot read config file {}", path.display()))?;
        let config: Self = toml::from_str(&config_str)
            .with_context(|| format!("Invalid config file {}", path.display()))?;

        tracing::info!("📄 Loaded configuration from: {}", path.display());
        Ok(config)
    }

    /// Defaults with environment overrides applied
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env_overrides(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    fn search_paths() -> Vec<PathBuf> {
        let mut paths = vec![
            PathBuf::from("caption-harvester.toml"),
            PathBuf::from("config/caption-harvester.toml"),
        ];
        if let Ok(home) = std::env::var("HOME") {
            paths.push(PathBuf::from(home).join(".config/caption-harvester/config.toml"));
        }
        paths.push(PathBuf::from("/etc/caption-harvester/config.toml"));
        paths
    }

    /// Overlay `CAPTION_HARVESTER_*` values supplied by `lookup`
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |suffix: &str| lookup(&format!("{}{}", ENV_PREFIX, suffix));

        if let Some(languages) = var("LANGUAGES") {
            self.retrieval.languages = languages
                .split(',')
                .map(str::trim)
                .filter(|code| !code.is_empty())
                .map(str::to_string)
                .collect();
        }

        if let Some(workers) = var("WORKERS") {
            self.retrieval.workers = workers
                .trim()
                .parse()
                .with_context(|| format!("Invalid {}WORKERS: {}", ENV_PREFIX, workers))?;
        }

        if let Some(timeout) = var("TIMEOUT") {
            self.http.timeout_seconds = timeout
                .trim()
                .parse()
                .with_context(|| format!("Invalid {}TIMEOUT: {}", ENV_PREFIX, timeout))?;
        }

        if let Some(proxy) = var("PROXY") {
            self.http.proxy = Some(proxy).filter(|p| !p.is_empty());
        }

        if let Some(log_level) = var("LOG_LEVEL") {
            self.output.log_level = log_level;
        }

        if let Some(format) = var("FORMAT") {
            self.output.format = OutputFormat::from_str(format.trim(), true)
                .map_err(|e| anyhow!("Invalid {}FORMAT: {}", ENV_PREFIX, e))?;
        }

        Ok(())
    }

    /// Save configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let config_str = toml::to_string_pretty(self)?;
        std::fs::write(path, config_str)?;
        tracing::info!("💾 Configuration saved to: {}", path.display());
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.retrieval.workers == 0 {
            return Err(anyhow!("workers must be greater than 0"));
        }

        if self.http.timeout_seconds == 0 {
            return Err(anyhow!("timeout_seconds must be greater than 0"));
        }

        if self.retrieval.languages.is_empty() {
            return Err(anyhow!("at least one language code is required"));
        }

        if let Some(proxy) = &self.http.proxy {
            url::Url::parse(proxy).with_context(|| format!("Invalid proxy URL: {}", proxy))?;
        }

        tracing::debug!("✅ Configuration validation passed");
        Ok(())
    }

    /// Get runtime configuration summary
    pub fn summary(&self) -> String {
        format!(
            "Caption Harvester Configuration:\n\
            - Languages: {}\n\
            - Selection Mode: {:?}\n\
            - Workers: {}\n\
            - Continue After Error: {}\n\
            - Timeout: {}s\n\
            - Proxy: {}\n\
            - Output Format: {:?}\n\
            - Output Directory: {}",
            self.retrieval.languages.join(", "),
            self.retrieval.mode,
            self.retrieval.workers,
            self.retrieval.continue_after_error,
            self.http.timeout_seconds,
            self.http.proxy.as_deref().unwrap_or("none"),
            self.output.format,
            self.output
                .output_dir
                .as_ref()
                .map(|dir| dir.display().to_string())
                .unwrap_or_else(|| "stdout".to_string())
        )
    }
}

/// Configuration builder for programmatic config creation
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn with_languages<I, S>(mut self, languages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.retrieval.languages = languages.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_mode(mut self, mode: SelectionMode) -> Self {
        self.config.retrieval.mode = mode;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.config.retrieval.workers = workers;
        self
    }

    pub fn with_timeout(mut self, timeout_seconds: u64) -> Self {
        self.config.http.timeout_seconds = timeout_seconds;
        self
    }

    pub fn with_proxy(mut self, proxy: String) -> Self {
        self.config.http.proxy = Some(proxy);
        self
    }

    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.config.output.format = format;
        self
    }

    pub fn with_output_dir(mut self, dir: PathBuf) -> Self {
        self.config.output.output_dir = Some(dir);
        self
    }

    pub fn continue_after_error(mut self, enable: bool) -> Self {
        self.config.retrieval.continue_after_error = enable;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
