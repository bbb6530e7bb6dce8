use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedData<T> {
    pub data: T,
    pub cached_at: DateTime<Utc>,
}

impl<T> CachedData<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            cached_at: Utc::now(),
        }
    }

    pub fn age_seconds(&self) -> i64 {
        (Utc::now() - self.cached_at).num_seconds()
    }

    pub fn is_stale(&self, lifetime: Duration) -> bool {
        let age = self.age_seconds();
        // Clock skew: an entry from the future is not trusted
        age < 0 || age as u64 >= lifetime.as_secs()
    }
}

/// Response-body cache for the provider client.
///
/// Bodies are kept in memory and, when a directory is configured, mirrored
/// to `{name}.json` files so a restarted process can reuse them.
pub struct RawCache {
    cache_dir: Option<PathBuf>,
    lifetime: Duration,
    memory: Mutex<HashMap<String, CachedData<String>>>,
}

impl RawCache {
    pub fn new(cache_dir: Option<PathBuf>, lifetime: Duration) -> Result<Self> {
        if let Some(ref dir) = cache_dir {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create cache directory {}", dir.display()))?;
        }
        Ok(Self {
            cache_dir,
            lifetime,
            memory: Mutex::new(HashMap::new()),
        })
    }

    pub fn in_memory(lifetime: Duration) -> Self {
        Self {
            cache_dir: None,
            lifetime,
            memory: Mutex::new(HashMap::new()),
        }
    }

    fn is_enabled(&self) -> bool {
        !self.lifetime.is_zero()
    }

    fn cache_path(&self, name: &str) -> Option<PathBuf> {
        self.cache_dir
            .as_ref()
            .map(|dir| dir.join(format!("{}.json", name)))
    }

    /// Return a fresh cached body, if any
    pub fn get(&self, name: &str) -> Option<String> {
        if !self.is_enabled() {
            return None;
        }

        {
            let memory = self.memory.lock().unwrap_or_else(|e| e.into_inner());
            if let Some(cached) = memory.get(name) {
                if !cached.is_stale(self.lifetime) {
                    debug!(cache = name, age_secs = cached.age_seconds(), "Raw cache hit (memory)");
                    return Some(cached.data.clone());
                }
            }
        }

        match self.load_from_disk(name) {
            Ok(Some(cached)) if !cached.is_stale(self.lifetime) => {
                debug!(cache = name, age_secs = cached.age_seconds(), "Raw cache hit (disk)");
                let body = cached.data.clone();
                self.memory
                    .lock()
                    .unwrap_or_else(|e| e.into_inner())
                    .insert(name.to_string(), cached);
                Some(body)
            }
            Ok(_) => None,
            Err(e) => {
                debug!(cache = name, error = %e, "Failed to load raw cache file");
                None
            }
        }
    }

    /// Store a body. Disk write failures are logged, the memory copy is kept.
    pub fn put(&self, name: &str, body: &str) {
        if !self.is_enabled() {
            return;
        }

        let cached = CachedData::new(body.to_string());
        if let Err(e) = self.save_to_disk(name, &cached) {
            debug!(cache = name, error = %e, "Failed to write raw cache file");
        }
        self.memory
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(name.to_string(), cached);
    }

    /// Drop one cached body, in memory and on disk
    pub fn remove(&self, name: &str) -> Result<()> {
        self.memory
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(name);
        if let Some(path) = self.cache_path(name) {
            if path.exists() {
                std::fs::remove_file(&path)
                    .with_context(|| format!("Failed to remove cache file: {}", name))?;
            }
        }
        Ok(())
    }

    fn load_from_disk(&self, name: &str) -> Result<Option<CachedData<String>>> {
        let path = match self.cache_path(name) {
            Some(path) if path.exists() => path,
            _ => return Ok(None),
        };

        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read cache file: {}", name))?;

        let cached: CachedData<String> = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse cache file: {}", name))?;

        Ok(Some(cached))
    }

    fn save_to_disk(&self, name: &str, cached: &CachedData<String>) -> Result<()> {
        if let Some(path) = self.cache_path(name) {
            let contents = serde_json::to_string(cached)?;
            std::fs::write(&path, contents)
                .with_context(|| format!("Failed to write cache file: {}", name))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cached_data_is_stale() {
        let fresh = CachedData::new("body");
        assert!(!fresh.is_stale(Duration::from_secs(60)));

        let mut old = CachedData::new("body");
        old.cached_at = Utc::now() - chrono::Duration::seconds(61);
        assert!(old.is_stale(Duration::from_secs(60)));

        let mut future = CachedData::new("body");
        future.cached_at = Utc::now() + chrono::Duration::minutes(5);
        assert!(future.is_stale(Duration::from_secs(600)));
    }

    #[test]
    fn test_memory_round_trip() {
        let cache = RawCache::in_memory(Duration::from_secs(60));
        assert_eq!(cache.get("memberlist"), None);
        cache.put("memberlist", "{\"data\": []}");
        assert_eq!(cache.get("memberlist").as_deref(), Some("{\"data\": []}"));
    }

    #[test]
    fn test_zero_lifetime_disables_cache() {
        let cache = RawCache::in_memory(Duration::ZERO);
        cache.put("memberlist", "{}");
        assert_eq!(cache.get("memberlist"), None);
    }

    #[test]
    fn test_disk_cache_survives_new_instance() {
        let dir = tempfile::tempdir().unwrap();
        let lifetime = Duration::from_secs(600);

        let cache = RawCache::new(Some(dir.path().to_path_buf()), lifetime).unwrap();
        cache.put("customlists", "[1,2]");
        assert!(dir.path().join("customlists.json").exists());

        let reopened = RawCache::new(Some(dir.path().to_path_buf()), lifetime).unwrap();
        assert_eq!(reopened.get("customlists").as_deref(), Some("[1,2]"));

        reopened.remove("customlists").unwrap();
        assert!(!dir.path().join("customlists.json").exists());
        assert_eq!(reopened.get("customlists"), None);
    }

    #[test]
    fn test_stale_disk_entry_is_miss() {
        let dir = tempfile::tempdir().unwrap();
        let mut stale = CachedData::new("old".to_string());
        stale.cached_at = Utc::now() - chrono::Duration::hours(2);
        std::fs::write(
            dir.path().join("memberlist.json"),
            serde_json::to_string(&stale).unwrap(),
        )
        .unwrap();

        let cache = RawCache::new(Some(dir.path().to_path_buf()), Duration::from_secs(3600)).unwrap();
        assert_eq!(cache.get("memberlist"), None);
    }
}
