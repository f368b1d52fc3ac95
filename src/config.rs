//! Application paths and persisted settings.
//!
//! Paths resolve in this order:
//! 1. CLI `--config-dir`
//! 2. `EPIC_VIEWER_CONFIG_DIR` environment variable
//! 3. Local folder IF config files exist there (epic_viewer.json, epic_viewer.log)
//! 4. Platform-specific directory from dirs-next
//!
//! Settings are serialized as JSON into eframe storage (`epic_viewer.json`)
//! and can be overridden per run from the command line.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cli::Args;
use crate::core::preload::PreloadConfig;
use crate::core::session::{DEFAULT_DATE, SessionConfig};

/// Directory name under platform config/data roots
pub const APP_DIR: &str = "epic_viewer";
/// eframe persistence file (window state + settings)
pub const CONFIG_FILE: &str = "epic_viewer.json";
/// Default `--log` target
pub const LOG_FILE: &str = "epic_viewer.log";
pub const CONFIG_DIR_ENV: &str = "EPIC_VIEWER_CONFIG_DIR";

/// Configuration for overriding default application paths
#[derive(Debug, Clone, Default)]
pub struct PathConfig {
    /// Custom config directory (from CLI or ENV)
    pub config_dir: Option<PathBuf>,
}

impl PathConfig {
    /// Priority: CLI args -> ENV var (EPIC_VIEWER_CONFIG_DIR) -> None (use defaults)
    pub fn from_env_and_cli(cli_dir: Option<PathBuf>) -> Self {
        let config_dir = cli_dir.or_else(|| std::env::var(CONFIG_DIR_ENV).ok().map(PathBuf::from));
        Self { config_dir }
    }
}

/// Path to a configuration file
pub fn config_file(name: &str, config: &PathConfig) -> PathBuf {
    resolve_dir(config, dirs_next::config_dir()).join(name)
}

/// Path to a data file (logs)
pub fn data_file(name: &str, config: &PathConfig) -> PathBuf {
    resolve_dir(config, dirs_next::data_dir()).join(name)
}

/// Create configuration and data directories if missing.
pub fn ensure_dirs(config: &PathConfig) -> Result<()> {
    let config_dir = resolve_dir(config, dirs_next::config_dir());
    let data_dir = resolve_dir(config, dirs_next::data_dir());

    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir)
            .with_context(|| format!("Failed to create config directory: {}", config_dir.display()))?;
    }
    if data_dir != config_dir && !data_dir.exists() {
        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;
    }
    Ok(())
}

fn has_local_config_files(dir: &Path) -> bool {
    [CONFIG_FILE, LOG_FILE].iter().any(|f| dir.join(f).exists())
}

fn resolve_dir(config: &PathConfig, platform_root: Option<PathBuf>) -> PathBuf {
    if let Some(dir) = &config.config_dir {
        return dir.clone();
    }
    if let Ok(current_dir) = std::env::current_dir()
        && has_local_config_files(&current_dir)
    {
        return current_dir;
    }
    if let Some(dir) = platform_root {
        return dir.join(APP_DIR);
    }
    PathBuf::from(".")
}

/// User-tunable settings (persisted)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// EPIC API base URL, without trailing slash
    pub api_base_url: String,
    /// Date opened on startup
    pub default_date: String,
    /// Images requested immediately when a date loads
    pub priority_count: usize,
    /// Gap between throttled image requests (ms)
    pub tail_delay_ms: u64,
    /// Auto-advance interval (ms)
    pub playback_interval_ms: u64,
    /// Per-image load timeout (ms, 0 = none)
    pub load_timeout_ms: u64,
    /// HTTP request timeout (s)
    pub request_timeout_secs: u64,
    /// Worker threads (0 = auto)
    pub workers: usize,
    pub autoplay: bool,
    pub show_details: bool,
    pub show_monitor: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:4200".to_string(),
            default_date: DEFAULT_DATE.to_string(),
            priority_count: 3,
            tail_delay_ms: 100,
            playback_interval_ms: 600,
            load_timeout_ms: 15_000,
            request_timeout_secs: 30,
            workers: 0,
            autoplay: false,
            show_details: true,
            show_monitor: false,
        }
    }
}

impl Settings {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse settings")
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize settings")
    }

    /// Command-line flags win over persisted values for this run.
    pub fn apply_args(&mut self, args: &Args) {
        if let Some(url) = &args.api_url {
            self.api_base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(date) = &args.date {
            self.default_date = date.clone();
        }
        if args.autoplay {
            self.autoplay = true;
        }
        if let Some(workers) = args.workers {
            self.workers = workers;
        }
    }

    /// Worker count, 3/4 of cores when unset
    pub fn worker_count(&self) -> usize {
        if self.workers > 0 {
            return self.workers;
        }
        (num_cpus::get() * 3 / 4).max(2)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn preload_config(&self) -> PreloadConfig {
        PreloadConfig {
            priority_count: self.priority_count.max(1),
            tail_delay: Duration::from_millis(self.tail_delay_ms),
            load_timeout: (self.load_timeout_ms > 0).then(|| Duration::from_millis(self.load_timeout_ms)),
        }
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            default_date: self.default_date.clone(),
            preload: self.preload_config(),
            playback_interval: Duration::from_millis(self.playback_interval_ms.max(50)),
            autoplay: self.autoplay,
        }
    }
}
