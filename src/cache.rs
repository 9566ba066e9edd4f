// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bounded cache of MFA decisions, owned and passed around by the caller.
#[cfg(test)]
use mock_instant::thread_local::Instant;
use std::collections::{HashMap, VecDeque};
use std::time::Duration;
#[cfg(not(test))]
use std::time::Instant;

use tracing::trace;

#[derive(Clone, Debug)]
pub struct Config {
    /// Maximum number of users kept in the cache. The oldest entry gets evicted when full.
    ///
    /// Defaults to 1024.
    pub capacity: usize,

    /// Time after which a cached decision expires.
    ///
    /// Defaults to 30 seconds.
    pub ttl: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            capacity: 1024,
            ttl: Duration::from_secs(30),
        }
    }
}

#[derive(Debug)]
struct Entry {
    auth_time: u64,
    mfa_enabled: bool,
    inserted_at: Instant,
}

/// Caches whether MFA was satisfied for a user's authentication.
///
/// Decisions are keyed by user and auth time: once a user authenticates again, lookups with the
/// new auth time miss until a fresh decision is inserted.
#[derive(Debug)]
pub struct MfaDecisionCache {
    config: Config,
    entries: HashMap<String, Entry>,

    /// Users in insertion order, oldest first.
    order: VecDeque<String>,
}

impl MfaDecisionCache {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            entries: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    pub fn get(&mut self, user_id: &str, auth_time: u64) -> Option<bool> {
        let entry = self.entries.get(user_id)?;

        if entry.inserted_at.elapsed() >= self.config.ttl {
            trace!(user_id, "mfa decision expired");
            self.remove(user_id);
            return None;
        }

        (entry.auth_time == auth_time).then_some(entry.mfa_enabled)
    }

    pub fn insert(&mut self, user_id: impl Into<String>, auth_time: u64, mfa_enabled: bool) {
        if self.config.capacity == 0 {
            return;
        }

        let user_id = user_id.into();
        self.purge_expired();

        if self.entries.contains_key(&user_id) {
            self.order.retain(|id| id != &user_id);
        } else if self.entries.len() >= self.config.capacity {
            if let Some(oldest) = self.order.pop_front() {
                trace!(user_id = %oldest, "evict mfa decision");
                self.entries.remove(&oldest);
            }
        }

        self.order.push_back(user_id.clone());
        self.entries.insert(
            user_id,
            Entry {
                auth_time,
                mfa_enabled,
                inserted_at: Instant::now(),
            },
        );
    }

    pub fn remove(&mut self, user_id: &str) -> bool {
        if self.entries.remove(user_id).is_some() {
            self.order.retain(|id| id != user_id);
            true
        } else {
            false
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    fn purge_expired(&mut self) {
        let ttl = self.config.ttl;
        self.entries.retain(|_, entry| entry.inserted_at.elapsed() < ttl);

        let entries = &self.entries;
        self.order.retain(|id| entries.contains_key(id));
    }
}

impl Default for MfaDecisionCache {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use mock_instant::thread_local::MockClock;

    use super::{Config, MfaDecisionCache};

    #[test]
    fn lookup_by_user_and_auth_time() {
        let mut cache = MfaDecisionCache::default();
        cache.insert("alice", 100, true);
        cache.insert("bob", 100, false);

        assert_eq!(cache.get("alice", 100), Some(true));
        assert_eq!(cache.get("bob", 100), Some(false));
        assert_eq!(cache.get("carol", 100), None);

        // A newer authentication misses until a new decision is inserted.
        assert_eq!(cache.get("alice", 200), None);
        cache.insert("alice", 200, false);
        assert_eq!(cache.get("alice", 200), Some(false));
        assert_eq!(cache.get("alice", 100), None);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn decisions_expire() {
        let config = Config {
            capacity: 8,
            ttl: Duration::from_secs(30),
        };
        let mut cache = MfaDecisionCache::new(config.clone());
        cache.insert("alice", 1, true);

        // Right before expiry the decision is still served.
        MockClock::advance(config.ttl - Duration::from_secs(1));
        assert_eq!(cache.get("alice", 1), Some(true));

        MockClock::advance(Duration::from_secs(1));
        assert_eq!(cache.get("alice", 1), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn capacity_evicts_oldest() {
        let mut cache = MfaDecisionCache::new(Config {
            capacity: 2,
            ..Default::default()
        });
        cache.insert("alice", 1, true);
        cache.insert("bob", 1, true);

        // Refreshing alice makes bob the oldest entry.
        cache.insert("alice", 2, true);
        cache.insert("carol", 1, false);

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("bob", 1), None);
        assert_eq!(cache.get("alice", 2), Some(true));
        assert_eq!(cache.get("carol", 1), Some(false));
    }

    #[test]
    fn zero_capacity_stores_nothing() {
        let mut cache = MfaDecisionCache::new(Config {
            capacity: 0,
            ..Default::default()
        });
        cache.insert("alice", 1, true);
        assert!(cache.is_empty());
    }

    #[test]
    fn remove_and_clear() {
        let mut cache = MfaDecisionCache::default();
        cache.insert("alice", 1, true);
        cache.insert("bob", 1, true);

        assert!(cache.remove("alice"));
        assert!(!cache.remove("alice"));
        assert_eq!(cache.len(), 1);

        cache.clear();
        assert!(cache.is_empty());
    }
}
