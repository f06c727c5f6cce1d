//! Batch keep-alive settings
//!
//! Everything the hosts need to render the keep-alive surface (product name,
//! notification channel, background task name) plus the overflow policy.
//! Serializable to/from JSON so platform code and the CLI share one file.

use crate::progress::OverflowPolicy;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

pub const DEFAULT_PRODUCT_NAME: &str = "ImageFlow";
pub const DEFAULT_METHOD_CHANNEL: &str = "batch_background";
pub const DEFAULT_NOTIFICATION_CHANNEL_ID: &str = "batch_processing";
pub const DEFAULT_NOTIFICATION_CHANNEL_NAME: &str = "Batch Processing";
pub const DEFAULT_NOTIFICATION_ID: u32 = 1;
pub const DEFAULT_BACKGROUND_TASK_NAME: &str = "BatchProcessing";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Notification channel importance (maps to Android `IMPORTANCE_*`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, uniffi::Enum)]
#[serde(rename_all = "snake_case")]
pub enum ChannelImportance {
    Min,
    #[default]
    Low,
    Default,
    High,
}

/// Complete keep-alive settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, uniffi::Record)]
#[serde(default)]
pub struct BatchSettings {
    /// Notification title
    pub product_name: String,

    /// Method-call bridge channel name
    pub method_channel: String,

    pub notification_channel_id: String,
    pub notification_channel_name: String,
    pub channel_importance: ChannelImportance,

    /// Fixed identifier of the single status notification (must be non-zero)
    pub notification_id: u32,

    /// Name passed to the OS when requesting a timed grant
    pub background_task_name: String,

    pub overflow_policy: OverflowPolicy,
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            product_name: DEFAULT_PRODUCT_NAME.to_string(),
            method_channel: DEFAULT_METHOD_CHANNEL.to_string(),
            notification_channel_id: DEFAULT_NOTIFICATION_CHANNEL_ID.to_string(),
            notification_channel_name: DEFAULT_NOTIFICATION_CHANNEL_NAME.to_string(),
            channel_importance: ChannelImportance::Low,
            notification_id: DEFAULT_NOTIFICATION_ID,
            background_task_name: DEFAULT_BACKGROUND_TASK_NAME.to_string(),
            overflow_policy: OverflowPolicy::PassThrough,
        }
    }
}

impl BatchSettings {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), SettingsError> {
        let required = [
            ("product_name", &self.product_name),
            ("method_channel", &self.method_channel),
            ("notification_channel_id", &self.notification_channel_id),
            ("notification_channel_name", &self.notification_channel_name),
            ("background_task_name", &self.background_task_name),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(SettingsError::ConfigError(format!(
                    "{} cannot be empty",
                    field
                )));
            }
        }

        // Android rejects startForeground with id 0
        if self.notification_id == 0 {
            return Err(SettingsError::ConfigError(
                "notification_id must be non-zero".to_string(),
            ));
        }

        Ok(())
    }

    /// Load settings from JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_string(&content)
    }

    /// Save settings to JSON file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), SettingsError> {
        let json = self.to_json_string()?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Convert to pretty JSON string
    pub fn to_json_string(&self) -> Result<String, SettingsError> {
        self.validate()?;
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Create from JSON string
    pub fn from_json_string(json: &str) -> Result<Self, SettingsError> {
        let settings: BatchSettings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }
}
