use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::TagSelectError;
use crate::pagination::DEFAULT_PAGE_LIMIT;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Display options forwarded untouched to the selection widget
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WidgetOptions {
    /// Dropdown width while the menu is open
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dropdown_open_width: Option<u32>,
    /// Dropdown width while the menu is closed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dropdown_closed_width: Option<u32>,
    pub max_menu_height: u32,
    pub class_name: String,
    pub class_name_prefix: String,
    /// Any other widget keys, passed through as-is
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Default for WidgetOptions {
    fn default() -> Self {
        Self {
            dropdown_open_width: None,
            dropdown_closed_width: None,
            max_menu_height: 280,
            class_name: "ds-select".to_string(),
            class_name_prefix: "ds-react-select".to_string(),
            extra: serde_json::Map::new(),
        }
    }
}

/// Tag selector configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TagSelectConfig {
    /// Service name attached to exported traces
    pub service_name: String,
    /// Base URL of the tag lookup API
    pub api_url: String,
    /// Records requested per page
    pub page_size: u32,
    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
    /// Age after which a loaded page is re-requested
    pub stale_after_secs: u64,
    /// Fallback filter when `RUST_LOG` is unset
    pub log_filter: String,
    pub log_format: LogFormat,
    /// OTLP collector endpoint, only used with the `otlp` feature
    pub otlp_endpoint: Option<String>,
    pub widget: WidgetOptions,
}

impl Default for TagSelectConfig {
    fn default() -> Self {
        Self {
            service_name: "metric-tag-select".to_string(),
            api_url: "http://localhost:8000/api".to_string(),
            page_size: DEFAULT_PAGE_LIMIT,
            request_timeout_secs: 10,
            stale_after_secs: 30,
            log_filter: "info".to_string(),
            log_format: LogFormat::Text,
            otlp_endpoint: None,
            widget: WidgetOptions::default(),
        }
    }
}

impl TagSelectConfig {
    /// Parse and validate a JSON config document. Missing fields take defaults.
    pub fn from_json_str(raw: &str) -> Result<Self, TagSelectError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON config file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, TagSelectError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> Result<(), TagSelectError> {
        if self.page_size == 0 {
            return Err(TagSelectError::Config("page_size must be positive".into()));
        }
        if self.request_timeout_secs == 0 {
            return Err(TagSelectError::Config(
                "request_timeout_secs must be positive".into(),
            ));
        }
        if !(self.api_url.starts_with("http://") || self.api_url.starts_with("https://")) {
            return Err(TagSelectError::Config(format!(
                "api_url must be an http(s) URL, got {:?}",
                self.api_url
            )));
        }
        Ok(())
    }
}
