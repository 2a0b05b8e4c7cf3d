use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use anyhow::{Context, Result};
use std::fs;

use common::WasId;

use crate::notifier::Channel;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout")]
    pub timeout_ms: u64,
}

fn default_base_url() -> String { common::DEFAULT_BASE_URL.to_string() }
fn default_timeout() -> u64 { 30_000 }

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_ms: default_timeout(),
        }
    }
}

impl BackendConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Periods of the three background tasks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerConfig {
    #[serde(default = "default_clock_tick")]
    pub clock_tick_ms: u64,
    #[serde(default = "default_time_sync")]
    pub time_sync_ms: u64,
    #[serde(default = "default_poll")]
    pub poll_ms: u64,
}

fn default_clock_tick() -> u64 { 1_000 }
fn default_time_sync() -> u64 { 60_000 }
fn default_poll() -> u64 { 10_000 }

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            clock_tick_ms: default_clock_tick(),
            time_sync_ms: default_time_sync(),
            poll_ms: default_poll(),
        }
    }
}

impl TimerConfig {
    pub fn clock_tick(&self) -> Duration { Duration::from_millis(self.clock_tick_ms) }
    pub fn time_sync(&self) -> Duration { Duration::from_millis(self.time_sync_ms) }
    pub fn poll(&self) -> Duration { Duration::from_millis(self.poll_ms) }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WasConfig {
    #[serde(default = "default_was")]
    pub default: WasId,
    #[serde(default = "default_variants")]
    pub variants: Vec<WasId>,
}

fn default_was() -> WasId { WasId::default() }
fn default_variants() -> Vec<WasId> {
    common::DEFAULT_WAS_VARIANTS.iter().map(|id| WasId::new(*id)).collect()
}

impl Default for WasConfig {
    fn default() -> Self {
        Self {
            default: default_was(),
            variants: default_variants(),
        }
    }
}

/// What happens to selected names that vanish from a refreshed inventory.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SelectionPolicy {
    /// Keep them until the user clears the selection or switches WAS.
    #[default]
    Sticky,
    /// Drop them on every inventory replacement.
    Prune,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SelectionConfig {
    #[serde(default)]
    pub policy: SelectionPolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    pub output: Option<PathBuf>,
}

fn default_log_level() -> String { "info".to_string() }

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            output: None,
        }
    }
}

impl LoggingConfig {
    pub fn level_filter(&self) -> log::LevelFilter {
        self.level.parse().unwrap_or(log::LevelFilter::Info)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    #[serde(default = "default_channels")]
    pub channels: Vec<Channel>,
}

fn default_channels() -> Vec<Channel> { vec![Channel::Stdout, Channel::Log] }

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            channels: default_channels(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub timers: TimerConfig,
    #[serde(default)]
    pub was: WasConfig,
    #[serde(default)]
    pub selection: SelectionConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub notifications: NotificationConfig,
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;
        Ok(config)
    }

    /// Detect file type by extension and load
    pub fn from_file(path: &Path) -> Result<Self> {
        let ext = path.extension()
            .and_then(|e| e.to_str())
            .unwrap_or("");

        let config = match ext {
            "yaml" | "yml" => Self::from_yaml_file(path),
            "toml" => Self::from_toml_file(path),
            _ => Err(anyhow::anyhow!("Unsupported config file format. Use .yaml, .yml, or .toml")),
        }?;
        config.validate()?;
        Ok(config)
    }

    /// Load an explicit path, or the system and local default files layered in that order.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::from_file(path);
        }
        Self::load_layered(&[
            Path::new(common::DEFAULT_CONFIG_PATH),
            Path::new(common::USER_CONFIG_PATH),
        ])
    }

    /// Merge every existing file over the previous ones. No file at all gives the defaults.
    pub fn load_layered(candidates: &[&Path]) -> Result<Self> {
        let mut config: Option<Config> = None;
        for candidate in candidates.iter().filter(|c| c.exists()) {
            log::info!("Loading config from {:?}", candidate);
            let layer = Self::from_file(candidate)?;
            match config.as_mut() {
                Some(base) => base.merge(layer),
                None => config = Some(layer),
            }
        }
        let config = config.unwrap_or_default();
        config.validate()?;
        Ok(config)
    }

    /// Command-line flags win over whatever the files said.
    pub fn apply_overrides(&mut self, base_url: Option<String>, was: Option<String>) {
        let mut flags = self.clone();
        if let Some(base_url) = base_url {
            flags.backend.base_url = base_url;
        }
        if let Some(was) = was {
            flags.was.default = WasId::new(was);
        }
        self.merge(flags);
    }

    /// The default WAS must be one of the variants; an empty variant list means "only the default".
    pub fn validate(&self) -> Result<()> {
        if self.timers.clock_tick_ms == 0 || self.timers.time_sync_ms == 0 || self.timers.poll_ms == 0 {
            return Err(anyhow::anyhow!("Timer periods must be greater than zero"));
        }
        if !self.was.variants.is_empty() && !self.was.variants.contains(&self.was.default) {
            return Err(anyhow::anyhow!(
                "Default WAS {:?} is not one of the configured variants",
                self.was.default.as_str()
            ));
        }
        Ok(())
    }

    /// Configured WAS variants, always including the default.
    pub fn was_variants(&self) -> Vec<WasId> {
        let mut variants = self.was.variants.clone();
        if !variants.contains(&self.was.default) {
            variants.insert(0, self.was.default.clone());
        }
        variants
    }

    /// Merge with another config, preferring values from other
    pub fn merge(&mut self, other: Config) {
        self.backend.base_url = other.backend.base_url;
        self.backend.timeout_ms = other.backend.timeout_ms;

        self.timers = other.timers;

        self.was.default = other.was.default;
        for variant in other.was.variants {
            if !self.was.variants.contains(&variant) {
                self.was.variants.push(variant);
            }
        }

        self.selection.policy = other.selection.policy;

        self.logging.level = other.logging.level;
        if other.logging.output.is_some() {
            self.logging.output = other.logging.output;
        }

        self.notifications.channels = other.notifications.channels;
    }
}
