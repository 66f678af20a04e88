use crate::dialog::headless::SurfaceTiming;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Runtime configuration for the dialog controller and the headless surface
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Capacity of the lifecycle event channel
    pub event_capacity: usize,

    /// Delay standing in for one rendering frame
    pub frame_interval_ms: u64,

    /// Duration of the entry animation
    pub entry_animation_ms: u64,

    /// Duration of the exit animation
    pub exit_animation_ms: u64,

    /// tracing filter directive used when RUST_LOG is unset
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            event_capacity: 32,
            frame_interval_ms: 16,
            entry_animation_ms: 150,
            exit_animation_ms: 150,
            log_filter: "modal_lifecycle=info,modalctl=info".to_string(),
        }
    }
}

/// Values read from a config file; only the keys present in the file are set
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct ConfigFile {
    pub event_capacity: Option<usize>,
    pub frame_interval_ms: Option<u64>,
    pub entry_animation_ms: Option<u64>,
    pub exit_animation_ms: Option<u64>,
    pub log_filter: Option<String>,
}

impl Config {
    /// Initialize configuration from defaults, environment and config files
    pub async fn init() -> Result<Self> {
        debug!("Initializing configuration");

        let mut config = Self::default();

        config.load_from_env();

        if let Ok(file_config) = Self::load_from_file().await {
            config.merge_with(file_config);
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from MODALCTL_* environment variables
    pub fn load_from_env(&mut self) {
        self.apply_vars(|key| std::env::var(key).ok());
    }

    fn apply_vars(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(capacity) = var("MODALCTL_EVENT_CAPACITY").and_then(|v| v.parse().ok()) {
            self.event_capacity = capacity;
        }

        if let Some(frame) = var("MODALCTL_FRAME_MS").and_then(|v| v.parse().ok()) {
            self.frame_interval_ms = frame;
        }

        if let Some(entry) = var("MODALCTL_ENTRY_MS").and_then(|v| v.parse().ok()) {
            self.entry_animation_ms = entry;
        }

        if let Some(exit) = var("MODALCTL_EXIT_MS").and_then(|v| v.parse().ok()) {
            self.exit_animation_ms = exit;
        }

        if let Some(filter) = var("MODALCTL_LOG") {
            self.log_filter = filter;
        }
    }

    /// Load configuration from modalctl.json files
    pub async fn load_from_file() -> Result<ConfigFile> {
        // Priority:
        // 1. ./.modalctl.json
        // 2. ./modalctl.json
        // 3. $CONFIG_DIR/modalctl/modalctl.json
        let mut config_paths = vec![
            PathBuf::from("./.modalctl.json"),
            PathBuf::from("./modalctl.json"),
        ];

        if let Some(config_dir) = dirs::config_dir() {
            config_paths.push(config_dir.join("modalctl").join("modalctl.json"));
        }

        for path in config_paths {
            if path.exists() {
                return Self::load_from_path(&path).await;
            }
        }

        Err(anyhow::anyhow!("No configuration file found"))
    }

    pub async fn load_from_path(path: &Path) -> Result<ConfigFile> {
        debug!("Loading configuration from: {}", path.display());
        let content = tokio::fs::read_to_string(path).await?;
        let file: ConfigFile = serde_json::from_str(&content)?;
        Ok(file)
    }

    /// Merge file values into this configuration; every key the file sets wins
    pub fn merge_with(&mut self, file: ConfigFile) {
        if let Some(capacity) = file.event_capacity {
            self.event_capacity = capacity;
        }
        if let Some(frame) = file.frame_interval_ms {
            self.frame_interval_ms = frame;
        }
        if let Some(entry) = file.entry_animation_ms {
            self.entry_animation_ms = entry;
        }
        if let Some(exit) = file.exit_animation_ms {
            self.exit_animation_ms = exit;
        }
        if let Some(filter) = file.log_filter {
            self.log_filter = filter;
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.event_capacity == 0 {
            return Err(anyhow::anyhow!("event_capacity must be greater than 0"));
        }

        // A frame longer than a second is a misconfiguration, not a slow display
        if self.frame_interval_ms > 1000 {
            return Err(anyhow::anyhow!("frame_interval_ms must be at most 1000"));
        }

        if self.log_filter.trim().is_empty() {
            return Err(anyhow::anyhow!("log_filter must not be empty"));
        }

        Ok(())
    }

    /// Headless surface timing described by this configuration
    pub fn surface_timing(&self) -> SurfaceTiming {
        SurfaceTiming {
            frame: Duration::from_millis(self.frame_interval_ms),
            entry_animation: Duration::from_millis(self.entry_animation_ms),
            exit_animation: Duration::from_millis(self.exit_animation_ms),
            failing_animation: None,
        }
    }
}
