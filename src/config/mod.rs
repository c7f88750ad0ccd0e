use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::widget::WidgetOptions;

pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:5000/upload";
pub const DEFAULT_FIELD_NAME: &str = "image";

/// Hex colour overrides, e.g. `success = "#a6da95"`
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct ThemeOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_dim: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inactive: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AppConfig {
    /// Text-extraction endpoint the image is posted to
    pub endpoint: String,

    /// Multipart field the file is sent under
    pub field_name: String,

    /// How long a notification stays up
    pub notification_secs: u64,

    /// Whole-request timeout, upload and server processing included
    pub request_timeout_secs: u64,

    /// Result pane height bounds, in terminal rows
    pub result_min_rows: u16,
    pub result_max_rows: u16,

    /// Also raise a desktop notification for headless uploads
    pub desktop_notifications: bool,

    /// Directory the file browser opens in (home when unset)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub browser_start_dir: Option<PathBuf>,

    pub theme: ThemeOverrides,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            field_name: DEFAULT_FIELD_NAME.to_string(),
            notification_secs: 3,
            request_timeout_secs: 120,
            result_min_rows: crate::widget::result::DEFAULT_MIN_ROWS,
            result_max_rows: crate::widget::result::DEFAULT_MAX_ROWS,
            desktop_notifications: false,
            browser_start_dir: None,
            theme: ThemeOverrides::default(),
        }
    }
}

impl AppConfig {
    /// Get the config file path
    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?
            .join("ocrdrop");

        if let Err(e) = std::fs::create_dir_all(&config_dir) {
            tracing::warn!("Could not create config directory: {}", e);
        }

        Ok(config_dir.join("config.toml"))
    }

    /// Load config from file, or create default
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Ok(path) => Self::load_from(&path),
            Err(_) => Ok(AppConfig::default()),
        }
    }

    /// Read `path`, writing defaults there when it does not exist yet. A file
    /// that cannot be read or parsed is an error and is left untouched.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            return Self::parse(&content).with_context(|| format!("Invalid config {}", path.display()));
        }

        let config = AppConfig::default();
        if let Err(e) = config.save_to(path) {
            tracing::warn!("Could not write default config: {}", e);
        }
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save config to file
    fn save_to(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        let endpoint = reqwest::Url::parse(&self.endpoint)
            .with_context(|| format!("endpoint is not a valid URL: {:?}", self.endpoint))?;
        if !matches!(endpoint.scheme(), "http" | "https") || endpoint.host_str().is_none() {
            anyhow::bail!("endpoint must be an http(s) URL with a host, got {:?}", self.endpoint);
        }
        if self.field_name.trim().is_empty() {
            anyhow::bail!("field_name must not be empty");
        }
        if self.notification_secs == 0 {
            anyhow::bail!("notification_secs must be greater than 0");
        }
        if self.request_timeout_secs == 0 {
            anyhow::bail!("request_timeout_secs must be greater than 0");
        }
        if self.result_min_rows < 3 || self.result_min_rows > self.result_max_rows {
            anyhow::bail!(
                "result rows must satisfy 3 <= min ({}) <= max ({})",
                self.result_min_rows,
                self.result_max_rows
            );
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn widget_options(&self) -> WidgetOptions {
        WidgetOptions {
            notification_window: Duration::from_secs(self.notification_secs),
            result_min_rows: self.result_min_rows,
            result_max_rows: self.result_max_rows,
        }
    }
}
