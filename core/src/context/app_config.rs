//! Application configuration
//!
//! Persisted as TOML through `confy` under the `marquee` app name. Every
//! field has a default so partial or missing files still load.

use std::path::PathBuf;
use std::time::Duration;

use marquee_types::PageContext;
use serde::{Deserialize, Serialize};

use crate::storage::FileStore;

pub const APP_NAME: &str = "marquee";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Base URL of the storefront backend serving `/api/banners`
    pub api_base_url: String,
    /// Page context used when none is given
    pub default_page: String,
    pub request_timeout_secs: u64,
    /// Overrides where dismissals are stored
    pub storage_path: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:3000".to_string(),
            default_page: marquee_types::ALL_PAGES.to_string(),
            request_timeout_secs: 10,
            storage_path: None,
        }
    }
}

impl AppConfig {
    /// Load from the user's config dir, falling back to defaults on any error
    pub fn load() -> Self {
        match confy::load(APP_NAME, None) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load config, using defaults");
                Self::default()
            }
        }
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        confy::store(APP_NAME, None, self)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf, ConfigError> {
        Ok(confy::get_configuration_file_path(APP_NAME, None)?)
    }

    pub fn default_page(&self) -> PageContext {
        PageContext::new(self.default_page.clone())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    /// Dismissal store location: explicit override, else the platform data dir
    pub fn storage_path(&self) -> Option<PathBuf> {
        self.storage_path.clone().or_else(FileStore::default_path)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config error: {0}")]
    Confy(#[from] confy::ConfyError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: AppConfig = toml::from_str(r#"api_base_url = "https://shop.example""#).unwrap();
        assert_eq!(config.api_base_url, "https://shop.example");
        assert_eq!(config.default_page, "all");
        assert_eq!(config.request_timeout_secs, 10);
        assert_eq!(config.storage_path, None);
    }

    #[test]
    fn test_roundtrip_through_toml() {
        let config = AppConfig {
            api_base_url: "http://127.0.0.1:8080".to_string(),
            default_page: "home".to_string(),
            request_timeout_secs: 3,
            storage_path: Some(PathBuf::from("/tmp/marquee.json")),
        };
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed, config);
        assert_eq!(parsed.default_page(), PageContext::new("home"));
    }

    #[test]
    fn test_zero_timeout_is_clamped() {
        let config = AppConfig {
            request_timeout_secs: 0,
            ..AppConfig::default()
        };
        assert_eq!(config.request_timeout(), Duration::from_secs(1));
    }

    #[test]
    fn test_storage_override_wins() {
        let config = AppConfig {
            storage_path: Some(PathBuf::from("/srv/dismissed.json")),
            ..AppConfig::default()
        };
        assert_eq!(config.storage_path(), Some(PathBuf::from("/srv/dismissed.json")));
    }
}
