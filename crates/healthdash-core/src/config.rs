//! Application configuration management.
//!
//! Configuration is stored at `~/.config/healthdash/config.json`. A missing
//! file yields defaults; `HEALTHDASH_API_URL` and `HEALTHDASH_MEMBER`
//! override the file for the current run and are never written back.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::models::{MemberId, ResourceId};
use crate::view::Tab;

/// Application name used for config/cache directory paths
pub const APP_NAME: &str = "healthdash";

/// Config file name
const CONFIG_FILE: &str = "config.json";

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:5000/api";

/// HTTP request timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

pub const ENV_API_URL: &str = "HEALTHDASH_API_URL";
pub const ENV_MEMBER: &str = "HEALTHDASH_MEMBER";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_base_url: String,
    pub request_timeout_secs: u64,
    /// Member focused at startup when nothing else selects one.
    pub default_member: Option<MemberId>,
    /// Last member selected in the dashboard, saved on selection.
    pub last_member: Option<MemberId>,
    pub initial_tab: Tab,
    /// Resources warmed after the primary view loads; `None` uses the
    /// controller default.
    pub warm_resources: Option<Vec<ResourceId>>,

    /// `HEALTHDASH_API_URL` for this run; never saved.
    #[serde(skip)]
    pub env_api_url: Option<String>,
    /// `HEALTHDASH_MEMBER` for this run; never saved.
    #[serde(skip)]
    pub env_member: Option<MemberId>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            default_member: None,
            last_member: None,
            initial_tab: Tab::Profile,
            warm_resources: None,
            env_api_url: None,
            env_member: None,
        }
    }
}

impl Config {
    /// Load from the default location, then apply environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&Self::config_path()?)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Apply overrides looked up by environment variable name.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        self.env_api_url = lookup(ENV_API_URL)
            .filter(|v| !v.trim().is_empty())
            .map(|v| v.trim().to_string());
        self.env_member = lookup(ENV_MEMBER)
            .filter(|v| !v.trim().is_empty())
            .map(|v| MemberId::new(v.trim()));
    }

    /// Backend base URL in effect: the environment override, else the file.
    pub fn api_url(&self) -> &str {
        self.env_api_url.as_deref().unwrap_or(&self.api_base_url)
    }

    /// Configured member, the environment override winning over the file.
    pub fn preferred_member(&self) -> Option<&MemberId> {
        self.env_member.as_ref().or(self.default_member.as_ref())
    }

    /// Member to focus at startup: the environment override, then the
    /// last selection, then the configured default.
    pub fn startup_member(&self) -> Option<&MemberId> {
        self.env_member
            .as_ref()
            .or(self.last_member.as_ref())
            .or(self.default_member.as_ref())
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Directory for log files.
    pub fn cache_dir() -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("healthdash-test-{}-{}", name, std::process::id()))
            .join(CONFIG_FILE)
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let config = Config::load_from(&temp_path("missing")).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let path = temp_path("partial");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, r#"{"initial_tab": "biomarkers", "warm_resources": ["chats"]}"#).unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.initial_tab, Tab::Biomarkers);
        assert_eq!(config.warm_resources, Some(vec![ResourceId::Chats]));
        assert_eq!(config.request_timeout_secs, DEFAULT_REQUEST_TIMEOUT_SECS);

        std::fs::remove_dir_all(path.parent().unwrap()).ok();
    }

    #[test]
    fn test_save_then_load() {
        let path = temp_path("save");
        let config = Config {
            last_member: Some(MemberId::new("Rohan Patel")),
            ..Default::default()
        };
        config.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap(), config);

        std::fs::remove_dir_all(path.parent().unwrap()).ok();
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let path = temp_path("invalid");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "{not json").unwrap();
        assert!(Config::load_from(&path).is_err());
        std::fs::remove_dir_all(path.parent().unwrap()).ok();
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            (ENV_API_URL, " http://backend:8000/api "),
            (ENV_MEMBER, "m7"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));
        assert_eq!(config.api_url(), "http://backend:8000/api");
        assert_eq!(config.preferred_member(), Some(&MemberId::new("m7")));
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
        assert_eq!(config.default_member, None);
    }

    #[test]
    fn test_env_member_wins_over_last_selection() {
        let mut config = Config {
            default_member: Some(MemberId::new("d")),
            last_member: Some(MemberId::new("saved")),
            ..Default::default()
        };
        config.apply_overrides(|key| (key == ENV_MEMBER).then(|| "m7".to_string()));
        assert_eq!(config.startup_member(), Some(&MemberId::new("m7")));
    }

    #[test]
    fn test_env_overrides_are_not_saved() {
        let path = temp_path("env-save");
        let mut config = Config::default();
        config.apply_overrides(|key| match key {
            ENV_API_URL => Some("http://tmp-host/api".to_string()),
            ENV_MEMBER => Some("m7".to_string()),
            _ => None,
        });
        config.last_member = Some(MemberId::new("Rohan Patel"));
        config.save_to(&path).unwrap();

        let reloaded = Config::load_from(&path).unwrap();
        assert_eq!(reloaded.api_url(), DEFAULT_API_BASE_URL);
        assert_eq!(reloaded.default_member, None);
        assert_eq!(reloaded.last_member, Some(MemberId::new("Rohan Patel")));
        assert_eq!(reloaded.startup_member(), Some(&MemberId::new("Rohan Patel")));

        std::fs::remove_dir_all(path.parent().unwrap()).ok();
    }

    #[test]
    fn test_blank_env_ignored() {
        let mut config = Config::default();
        config.apply_overrides(|_| Some("   ".to_string()));
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_startup_member_prefers_last() {
        let config = Config {
            default_member: Some(MemberId::new("d")),
            last_member: Some(MemberId::new("l")),
            ..Default::default()
        };
        assert_eq!(config.startup_member(), Some(&MemberId::new("l")));
    }
}
