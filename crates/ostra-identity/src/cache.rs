// SPDX-FileCopyrightText: 2026 Ostra Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-process TTL cache over resolved identities.
//!
//! Keyed by the (channel, external_id) pair. Entries expire lazily: an
//! expired entry is evicted on the read that observes it.

use std::time::{Duration, Instant};

use dashmap::DashMap;
use ostra_core::types::Channel;

/// Default entry lifetime: 30 days, matching how long a resolved identity
/// can be trusted without rechecking the store.
pub const DEFAULT_TTL: Duration = Duration::from_secs(30 * 24 * 60 * 60);

struct CacheEntry {
    unified_id: String,
    phone: Option<String>,
    inserted_at: Instant,
}

/// Concurrent identity cache shared by all workers.
pub struct IdentityCache {
    entries: DashMap<(Channel, String), CacheEntry>,
    ttl: Duration,
}

impl IdentityCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    /// Cached unified id and phone for the pair, if present and fresh.
    pub fn get(&self, channel: Channel, external_id: &str) -> Option<(String, Option<String>)> {
        let key = (channel, external_id.to_string());
        if let Some(entry) = self.entries.get(&key) {
            if entry.inserted_at.elapsed() < self.ttl {
                return Some((entry.unified_id.clone(), entry.phone.clone()));
            }
        } else {
            return None;
        }
        // Fresh check failed above, so the entry is stale.
        self.entries.remove(&key);
        None
    }

    pub fn insert(
        &self,
        channel: Channel,
        external_id: &str,
        unified_id: &str,
        phone: Option<&str>,
    ) {
        self.entries.insert(
            (channel, external_id.to_string()),
            CacheEntry {
                unified_id: unified_id.to_string(),
                phone: phone.map(str::to_string),
                inserted_at: Instant::now(),
            },
        );
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

impl Default for IdentityCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hit_and_miss() {
        let cache = IdentityCache::default();
        assert!(cache.get(Channel::Telegram, "42").is_none());

        cache.insert(Channel::Telegram, "42", "u-1", Some("+7999"));
        let (unified, phone) = cache.get(Channel::Telegram, "42").unwrap();
        assert_eq!(unified, "u-1");
        assert_eq!(phone.as_deref(), Some("+7999"));

        // Channel is part of the key.
        assert!(cache.get(Channel::Whatsapp, "42").is_none());
    }

    #[test]
    fn stale_entries_are_evicted_on_read() {
        let cache = IdentityCache::new(Duration::ZERO);
        cache.insert(Channel::Site, "sess-1", "u-1", None);
        assert!(cache.get(Channel::Site, "sess-1").is_none());
        assert_eq!(cache.len(), 0);
    }
}
