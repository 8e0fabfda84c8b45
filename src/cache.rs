// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! TTL-based cache for fetched activities and recommendations
//!
//! A single JSON file with an embedded expiry. A missing, corrupt, or
//! expired file reads as a cache miss, never an error; the core never
//! manages expiry beyond stamping it at save time.

use anyhow::{Context as _, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing::debug;

use crate::config::Config;
use crate::constants::files;
use crate::models::{ActivityRecord, Recommendation};

/// One cached snapshot of fetched data and its derived recommendation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub activities: Vec<ActivityRecord>,
    pub recommendation: Option<Recommendation>,
    pub timestamp: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl CacheEntry {
    /// Whole hours until expiry; 0 when already expired
    pub fn hours_left(&self) -> i64 {
        (self.expires_at - Utc::now()).num_hours().max(0)
    }
}

/// File-backed cache with a fixed TTL
pub struct CacheManager {
    path: PathBuf,
    ttl_hours: u64,
}

impl CacheManager {
    pub fn new(path: PathBuf, ttl_hours: u64) -> Self {
        Self { path, ttl_hours }
    }

    /// Cache file under the platform data dir
    pub fn with_default_path(ttl_hours: u64) -> Self {
        Self::new(Config::data_dir().join(files::CACHE_FILE), ttl_hours)
    }

    /// Load the cached entry, or `None` when missing, corrupt, or expired
    pub fn load(&self) -> Option<CacheEntry> {
        let content = fs::read_to_string(&self.path).ok()?;
        let entry: CacheEntry = match serde_json::from_str(&content) {
            Ok(entry) => entry,
            Err(err) => {
                debug!("Discarding unreadable cache file {}: {err}", self.path.display());
                return None;
            }
        };

        if Utc::now() < entry.expires_at {
            Some(entry)
        } else {
            debug!("Cache expired at {}", entry.expires_at);
            None
        }
    }

    /// Persist a snapshot, stamping its expiry from the configured TTL
    pub fn save(
        &self,
        activities: &[ActivityRecord],
        recommendation: Option<&Recommendation>,
    ) -> Result<CacheEntry> {
        let now = Utc::now();
        let entry = CacheEntry {
            activities: activities.to_vec(),
            recommendation: recommendation.cloned(),
            timestamp: now,
            expires_at: now + Duration::hours(self.ttl_hours as i64),
        };

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).context("Failed to create cache directory")?;
        }

        let content = serde_json::to_string_pretty(&entry)?;
        fs::write(&self.path, content)
            .with_context(|| format!("Failed to write cache file {}", self.path.display()))?;

        Ok(entry)
    }

    /// Remove the cache file if present
    pub fn clear(&self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path)
                .with_context(|| format!("Failed to remove cache file {}", self.path.display()))?;
        }
        Ok(())
    }
}
