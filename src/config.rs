use crate::constants::{ARIA2C_BINARY, DEFAULT_HOST, DEFAULT_OUTPUT_BASE};
use crate::errors::{AppError, AppResult};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use url::Url;

/// Which transfer backend performs the downloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DownloaderKind {
    /// Delegate to the external `aria2c` tool
    #[default]
    Aria2c,
    /// Built-in reqwest downloader
    Native,
}

impl TryFrom<&str> for DownloaderKind {
    type Error = AppError;

    fn try_from(value: &str) -> AppResult<Self> {
        match value.trim().to_lowercase().as_str() {
            "aria2c" | "aria2" => Ok(Self::Aria2c),
            "native" | "http" => Ok(Self::Native),
            other => Err(AppError::InvalidInput(format!(
                "Unknown downloader '{other}' (expected aria2c or native)"
            ))),
        }
    }
}

/// Resolved configuration with all values filled in (no Options).
///
/// Deserialized from an optional TOML file; command-line flags are applied on
/// top by the CLI layer. Unknown keys are rejected to catch typos.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResolvedConfig {
    /// Archive host, without trailing slash
    pub host: String,
    /// Base directory; files land in `output_base/PROJECT/DATE`
    pub output_base: PathBuf,
    /// Parent directory for per-run workspaces. `None` uses the system temp dir.
    pub scratch_dir: Option<PathBuf>,

    // Downloads
    /// Transfer backend
    pub downloader: DownloaderKind,
    /// Maximum number of files transferred at once
    pub concurrency: usize,
    /// Path or name of the aria2c executable
    pub aria2c_path: PathBuf,
    /// Connections aria2c opens per server for one file
    pub connections_per_server: u32,

    // Native backend retries
    /// Maximum number of retry attempts for failed downloads
    pub max_retries: u32,
    /// Initial delay in milliseconds before the first retry
    pub retry_initial_delay_ms: u64,
    /// Maximum delay in milliseconds between retries
    pub retry_max_delay_ms: u64,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            output_base: PathBuf::from(DEFAULT_OUTPUT_BASE),
            scratch_dir: None,
            downloader: DownloaderKind::Aria2c,
            concurrency: 1,
            aria2c_path: PathBuf::from(ARIA2C_BINARY),
            connections_per_server: 1,
            max_retries: 3,
            retry_initial_delay_ms: 1000,
            retry_max_delay_ms: 10000,
        }
    }
}

impl ResolvedConfig {
    /// Loads and validates configuration from a TOML file.
    ///
    /// Missing keys take their defaults.
    ///
    /// # Errors
    ///
    /// Returns `Config` if the file cannot be read, the TOML is malformed,
    /// unknown keys are present, or a value fails [`ResolvedConfig::validate`].
    pub fn from_toml_file(path: &Path) -> AppResult<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read {}: {e}", path.display()))
        })?;
        let config: ResolvedConfig = toml::from_str(&contents)
            .map_err(|e| AppError::Config(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks value ranges that serde cannot express.
    pub fn validate(&self) -> AppResult<()> {
        if self.concurrency == 0 {
            return Err(AppError::Config(
                "Concurrency must be greater than 0".into(),
            ));
        }
        if !(1..=16).contains(&self.connections_per_server) {
            return Err(AppError::Config(
                "connections_per_server must be between 1 and 16".into(),
            ));
        }
        let host = Url::parse(&self.host)
            .map_err(|e| AppError::Config(format!("Invalid host '{}': {e}", self.host)))?;
        if !matches!(host.scheme(), "http" | "https") {
            return Err(AppError::Config(format!(
                "Host must be an http(s) URL, got '{}'",
                self.host
            )));
        }
        Ok(())
    }

    /// Host with any trailing slash removed.
    pub fn host(&self) -> &str {
        self.host.trim_end_matches('/')
    }
}
