//! Application configuration management.
//!
//! Configuration is stored at `~/.config/scoutorg/config.json` and may be
//! overridden per field by `SCOUTORG_*` environment variables (a `.env`
//! file is read by the binary before the config is loaded).

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::OrgError;

/// Application name used for config/cache directory paths
const APP_NAME: &str = "scoutorg";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Default provider host
pub const DEFAULT_DOMAIN: &str = "www.scoutnet.se";

/// Default lifetime of fetched provider data.
/// Member data changes slowly; an hour keeps the rate-limited API quiet.
pub const DEFAULT_CACHE_LIFETIME_SECS: u64 = 3600;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub domain: String,
    pub group_id: Option<i64>,
    pub member_list_api_key: Option<String>,
    pub custom_lists_api_key: Option<String>,
    pub cache_lifetime_secs: u64,
    pub branches_file: Option<PathBuf>,
    pub cache_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            domain: DEFAULT_DOMAIN.to_string(),
            group_id: None,
            member_list_api_key: None,
            custom_lists_api_key: None,
            cache_lifetime_secs: DEFAULT_CACHE_LIFETIME_SECS,
            branches_file: None,
            cache_dir: None,
        }
    }
}

/// Validated settings for a provider client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    pub domain: String,
    pub group_id: i64,
    pub member_list_api_key: String,
    pub custom_lists_api_key: String,
    pub cache_lifetime: Duration,
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        let mut config = Self::load_from(&path)?;
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config file {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Apply `SCOUTORG_*` overrides. `lookup` is injected so tests do not
    /// have to touch the process environment.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(domain) = lookup("SCOUTORG_DOMAIN") {
            self.domain = domain;
        }
        if let Some(group_id) = lookup("SCOUTORG_GROUP_ID") {
            self.group_id = Some(
                group_id
                    .trim()
                    .parse()
                    .with_context(|| format!("SCOUTORG_GROUP_ID is not a number: {}", group_id))?,
            );
        }
        if let Some(key) = lookup("SCOUTORG_MEMBER_LIST_KEY") {
            self.member_list_api_key = Some(key);
        }
        if let Some(key) = lookup("SCOUTORG_CUSTOM_LISTS_KEY") {
            self.custom_lists_api_key = Some(key);
        }
        if let Some(lifetime) = lookup("SCOUTORG_CACHE_LIFETIME") {
            self.cache_lifetime_secs = lifetime.trim().parse().with_context(|| {
                format!("SCOUTORG_CACHE_LIFETIME is not a number of seconds: {}", lifetime)
            })?;
        }
        if let Some(path) = lookup("SCOUTORG_BRANCHES_FILE") {
            self.branches_file = Some(PathBuf::from(path));
        }
        Ok(())
    }

    /// Directory for cached provider responses, namespaced by group
    pub fn cache_dir(&self) -> Result<PathBuf> {
        let base = match self.cache_dir {
            Some(ref dir) => dir.clone(),
            None => dirs::cache_dir()
                .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?
                .join(APP_NAME),
        };
        Ok(match self.group_id {
            Some(id) => base.join(id.to_string()),
            None => base,
        })
    }

    /// Validate the provider settings. A missing group id or API key
    /// disables organization loading.
    pub fn provider_config(&self) -> Result<ProviderConfig, OrgError> {
        let group_id = match self.group_id {
            Some(id) if id > 0 => id,
            Some(id) => {
                return Err(OrgError::ConfigurationInvalid(format!(
                    "group id must be positive, got {}",
                    id
                )))
            }
            None => {
                return Err(OrgError::ConfigurationInvalid(
                    "group id is not set".to_string(),
                ))
            }
        };

        let member_list_api_key = required_key(&self.member_list_api_key, "member list")?;
        let custom_lists_api_key = required_key(&self.custom_lists_api_key, "custom lists")?;

        if self.domain.trim().is_empty() {
            return Err(OrgError::ConfigurationInvalid(
                "provider domain is empty".to_string(),
            ));
        }

        Ok(ProviderConfig {
            domain: self.domain.trim().to_string(),
            group_id,
            member_list_api_key,
            custom_lists_api_key,
            cache_lifetime: Duration::from_secs(self.cache_lifetime_secs),
        })
    }
}

fn required_key(key: &Option<String>, category: &str) -> Result<String, OrgError> {
    key.as_deref()
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .ok_or_else(|| OrgError::ConfigurationInvalid(format!("{} API key is not set", category)))
}
