//! Application configuration management.
//!
//! Settings are merged from, lowest to highest priority:
//!
//! 1. built-in defaults
//! 2. a TOML file (`--config PATH`, or `config.toml` in the platform config
//!    directory when present)
//! 3. `DUPSCAN_*` environment variables, with `__` separating nested keys
//!    (`DUPSCAN_PROGRESS__ENABLED=false`)
//! 4. command-line flags, applied by [`Config::apply_scan_args`]
//!
//! # Example file
//!
//! ```toml
//! prehash_size = 8192
//! report_empty_dirs = true
//!
//! [progress]
//! tick_ms = 250
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::cli::ScanArgs;
use crate::engine::EngineConfig;
use crate::observer::EVENT_CHANNEL_CAPACITY;
use crate::scanner::PREHASH_SIZE;

/// Prefix for configuration environment variables.
pub const ENV_PREFIX: &str = "DUPSCAN_";

/// Progress bar settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressConfig {
    /// Show the progress bar on interactive terminals
    pub enabled: bool,
    /// Spinner redraw interval in milliseconds
    pub tick_ms: u64,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            tick_ms: 100,
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Bytes covered by the first-pass digest
    pub prehash_size: usize,
    /// Leave zero-length files out of duplicate detection
    pub skip_empty_files: bool,
    /// Capacity of the event channel between the worker and the front end
    pub event_channel_capacity: usize,
    /// List empty directories after the scan
    pub report_empty_dirs: bool,
    /// Progress bar settings
    pub progress: ProgressConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            prehash_size: PREHASH_SIZE,
            skip_empty_files: true,
            event_channel_capacity: EVENT_CHANNEL_CAPACITY,
            report_empty_dirs: false,
            progress: ProgressConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from defaults, a file and the environment.
    ///
    /// An explicit `path` must exist; the default file is optional.
    ///
    /// # Errors
    ///
    /// Fails if an explicit file is missing, or any layer holds a value of
    /// the wrong type.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(path) => {
                if !path.is_file() {
                    anyhow::bail!("Config file not found: {}", path.display());
                }
                Some(path.to_path_buf())
            }
            None => Self::default_path().filter(|p| p.is_file()),
        };

        match &file {
            Some(path) => log::debug!("Loading config from {}", path.display()),
            None => log::debug!("No config file, using defaults and environment"),
        }

        Self::figment(file.as_deref())
            .extract()
            .context("Invalid configuration")
    }

    /// The layered provider stack, without command-line overrides.
    #[must_use]
    pub fn figment(file: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(file) = file {
            figment = figment.merge(Toml::file(file));
        }
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Platform-specific default config file location.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "dupscan", "dupscan")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Apply scan flags, which override every other layer.
    pub fn apply_scan_args(&mut self, args: &ScanArgs) {
        if let Some(size) = args.prehash_size {
            self.prehash_size = usize::try_from(size).unwrap_or(usize::MAX);
        }
        if args.include_empty_files {
            self.skip_empty_files = false;
        }
        if args.empty_dirs {
            self.report_empty_dirs = true;
        }
        if args.no_progress {
            self.progress.enabled = false;
        }
    }

    /// Render as a TOML document.
    ///
    /// # Errors
    ///
    /// Fails only if a value cannot be represented in TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to render configuration")
    }

    /// Engine settings derived from this configuration.
    #[must_use]
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig::default()
            .with_prehash_size(self.prehash_size.max(1))
            .with_skip_empty_files(self.skip_empty_files)
    }
}
