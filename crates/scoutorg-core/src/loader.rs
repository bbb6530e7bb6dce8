//! Wiring an organization from configuration.

use std::sync::Arc;

use tracing::{info, warn};

use crate::branch::BranchTable;
use crate::config::Config;
use crate::error::{OrgError, OrgResult};
use crate::org::ScoutOrg;
use crate::provider::{Provider, RawCache, ScoutnetClient};

/// Build a `ScoutOrg` from configuration.
///
/// Returns `ConfigurationInvalid` when the group id or an API key is
/// missing, in which case organization loading should be treated as
/// unavailable rather than fatal.
pub fn load_organization(config: &Config) -> OrgResult<ScoutOrg> {
    let provider_config = config.provider_config()?;

    let branches = match config.branches_file {
        Some(ref path) => BranchTable::load(path)
            .map_err(|e| OrgError::ConfigurationInvalid(format!("{:#}", e)))?,
        None => {
            warn!("No branch table configured, all troops will be branch-less");
            BranchTable::default()
        }
    };

    let cache = match config.cache_dir() {
        Ok(dir) => RawCache::new(Some(dir), provider_config.cache_lifetime).unwrap_or_else(|e| {
            warn!(error = %e, "Raw cache directory unavailable, caching in memory only");
            RawCache::in_memory(provider_config.cache_lifetime)
        }),
        Err(e) => {
            warn!(error = %e, "No cache directory, caching in memory only");
            RawCache::in_memory(provider_config.cache_lifetime)
        }
    };

    let group_id = provider_config.group_id;
    let client = ScoutnetClient::new(provider_config, cache)
        .map_err(|e| OrgError::ConfigurationInvalid(format!("HTTP client setup failed: {}", e)))?;

    info!(group_id, branches = branches.branches().len(), "Organization loaded");
    Ok(ScoutOrg::new(vec![Arc::new(client) as Arc<dyn Provider>], branches))
}
