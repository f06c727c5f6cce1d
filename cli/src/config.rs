// Configuration management for the ImageFlow CLI
//
// Cross-platform config stored in:
// - macOS: ~/Library/Application Support/imageflow/config.json
// - Linux: ~/.config/imageflow/config.json
// - Windows: %APPDATA%\imageflow\config.json

use anyhow::{Context, Result};
use imageflow_core::{BatchSettings, ChannelImportance, OverflowPolicy};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Settings handed to the keep-alive core
    pub batch: BatchSettings,

    /// Simulation settings
    pub simulation: SimulationConfig,

    /// Write logs to a daily rolling file in the data directory
    pub log_to_file: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Delay between processed items in milliseconds
    pub step_ms: u64,

    /// Seconds before the simulated OS revokes a background task (0 = never)
    pub grant_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            batch: BatchSettings::default(),
            simulation: SimulationConfig::default(),
            log_to_file: false,
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            step_ms: 250,
            grant_secs: 30, // iOS background task budget
        }
    }
}

fn parse_bool(value: &str) -> Result<bool> {
    value.parse().context("Invalid boolean value")
}

impl Config {
    /// Get the config directory path (cross-platform)
    pub fn config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to determine config directory")?
            .join("imageflow");

        std::fs::create_dir_all(&config_dir).context("Failed to create config directory")?;

        Ok(config_dir)
    }

    /// Get the data directory path (cross-platform)
    pub fn data_dir() -> Result<PathBuf> {
        let data_dir = dirs::data_local_dir()
            .context("Failed to determine data directory")?
            .join("imageflow");

        std::fs::create_dir_all(&data_dir).context("Failed to create data directory")?;

        Ok(data_dir)
    }

    /// Get the config file path
    pub fn config_file() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.json"))
    }

    /// Load config from file, or create default if not exists
    pub fn load() -> Result<Self> {
        let config_file = Self::config_file()?;

        if config_file.exists() {
            let contents =
                std::fs::read_to_string(&config_file).context("Failed to read config file")?;
            let config: Config =
                serde_json::from_str(&contents).context("Failed to parse config file")?;
            config
                .batch
                .validate()
                .context("Invalid batch settings in config file")?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save()?;
            Ok(config)
        }
    }

    /// Save config to file
    pub fn save(&self) -> Result<()> {
        self.batch.validate().context("Refusing to save invalid settings")?;

        let config_file = Self::config_file()?;
        let contents = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(&config_file, contents).context("Failed to write config file")?;
        Ok(())
    }

    /// Set a config value
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "product_name" => self.batch.product_name = value.to_string(),
            "method_channel" => self.batch.method_channel = value.to_string(),
            "notification_channel_id" => self.batch.notification_channel_id = value.to_string(),
            "notification_channel_name" => {
                self.batch.notification_channel_name = value.to_string()
            }
            "notification_id" => {
                self.batch.notification_id = value.parse().context("Invalid notification id")?;
            }
            "channel_importance" => {
                self.batch.channel_importance = match value {
                    "min" => ChannelImportance::Min,
                    "low" => ChannelImportance::Low,
                    "default" => ChannelImportance::Default,
                    "high" => ChannelImportance::High,
                    _ => anyhow::bail!("Invalid importance (min, low, default, high): {}", value),
                };
            }
            "background_task_name" => self.batch.background_task_name = value.to_string(),
            "overflow_policy" => {
                self.batch.overflow_policy = match value {
                    "pass_through" => OverflowPolicy::PassThrough,
                    "clamp" => OverflowPolicy::Clamp,
                    _ => anyhow::bail!("Invalid overflow policy (pass_through, clamp): {}", value),
                };
            }
            "step_ms" => {
                self.simulation.step_ms = value.parse().context("Invalid number")?;
            }
            "grant_secs" => {
                self.simulation.grant_secs = value.parse().context("Invalid number")?;
            }
            "log_to_file" => self.log_to_file = parse_bool(value)?,
            _ => anyhow::bail!("Unknown config key: {}", key),
        }
        self.save()?;
        Ok(())
    }

    /// Get a config value
    pub fn get(&self, key: &str) -> Option<String> {
        self.list()
            .into_iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// List all config values
    pub fn list(&self) -> Vec<(String, String)> {
        let importance = match self.batch.channel_importance {
            ChannelImportance::Min => "min",
            ChannelImportance::Low => "low",
            ChannelImportance::Default => "default",
            ChannelImportance::High => "high",
        };
        let policy = match self.batch.overflow_policy {
            OverflowPolicy::PassThrough => "pass_through",
            OverflowPolicy::Clamp => "clamp",
        };

        vec![
            ("product_name".to_string(), self.batch.product_name.clone()),
            ("method_channel".to_string(), self.batch.method_channel.clone()),
            (
                "notification_channel_id".to_string(),
                self.batch.notification_channel_id.clone(),
            ),
            (
                "notification_channel_name".to_string(),
                self.batch.notification_channel_name.clone(),
            ),
            (
                "notification_id".to_string(),
                self.batch.notification_id.to_string(),
            ),
            ("channel_importance".to_string(), importance.to_string()),
            (
                "background_task_name".to_string(),
                self.batch.background_task_name.clone(),
            ),
            ("overflow_policy".to_string(), policy.to_string()),
            ("step_ms".to_string(), self.simulation.step_ms.to_string()),
            ("grant_secs".to_string(), self.simulation.grant_secs.to_string()),
            ("log_to_file".to_string(), self.log_to_file.to_string()),
        ]
    }
}
