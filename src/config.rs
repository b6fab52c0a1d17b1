use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default config file name looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "surveyor.toml";

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub scan: ScanConfig,
    pub output: OutputConfig,
    pub watch: WatchConfig,
}

/// File discovery settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// File extensions to analyze, without the leading dot
    pub extensions: Vec<String>,
    /// Directory names to skip anywhere in the tree
    pub exclude: Vec<String>,
    /// Follow symlinks during traversal
    pub follow_links: bool,
}

/// Output settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub format: OutputFormat,
    /// Pretty-print JSON output
    pub pretty: bool,
    /// Mermaid layout direction (TB, LR, BT, RL)
    pub direction: String,
}

/// Watch mode settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Quiet period after the last change before the cache is invalidated
    pub debounce_ms: u64,
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Json,
    Mermaid,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            extensions: vec!["ts".to_string(), "js".to_string()],
            exclude: vec![
                "node_modules".to_string(),
                "dist".to_string(),
                "build".to_string(),
                ".git".to_string(),
            ],
            follow_links: true,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            pretty: true,
            direction: "TB".to_string(),
        }
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self { debounce_ms: 500 }
    }
}

impl Config {
    /// Load config from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load config from file or return defaults
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// Merge CLI arguments into config (CLI takes precedence)
    pub fn merge_cli(
        &mut self,
        exclude: Vec<String>,
        extensions: Vec<String>,
        format: Option<String>,
        debounce_ms: Option<u64>,
    ) {
        if !exclude.is_empty() {
            self.scan.exclude.extend(exclude);
        }

        if !extensions.is_empty() {
            self.scan.extensions = extensions;
        }

        if let Some(fmt) = format {
            self.output.format = match fmt.as_str() {
                "mermaid" | "mmd" => OutputFormat::Mermaid,
                _ => OutputFormat::Json,
            };
        }

        if let Some(ms) = debounce_ms {
            self.watch.debounce_ms = ms;
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.scan.extensions.is_empty() {
            return Err(Error::config_validation("at least one extension required"));
        }

        for ext in &self.scan.extensions {
            if ext.starts_with('.') {
                return Err(Error::config_validation(format!(
                    "extensions are written without the dot: {}",
                    ext
                )));
            }
        }

        if !matches!(self.output.direction.as_str(), "TB" | "LR" | "BT" | "RL") {
            return Err(Error::config_validation(format!(
                "direction must be one of TB, LR, BT, RL: {}",
                self.output.direction
            )));
        }

        if self.watch.debounce_ms == 0 {
            return Err(Error::config_validation("debounce_ms must be at least 1"));
        }

        if self.watch.debounce_ms > 60_000 {
            return Err(Error::config_validation("debounce_ms cannot exceed 60000"));
        }

        Ok(())
    }
}
