// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Short-lived cache of authenticated user lookups.
//!
//! Maps email to a serialized `User` snapshot with a fixed TTL. The user
//! directory stays authoritative: an entry is never served past its expiry
//! and auth writes invalidate the entry for the affected email.
//!
//! Each email also carries a generation that [`SessionCache::invalidate`]
//! bumps. A reader that fills the cache after a directory lookup passes the
//! generation it saw before the lookup to [`SessionCache::put_if_current`],
//! so a snapshot read before a concurrent write is never stored after it.

use crate::models::User;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Cached user snapshot with expiry information.
struct CachedUser {
    snapshot: String,
    expires_at: Instant,
}

/// Shared read-through cache in front of the user directory.
#[derive(Clone)]
pub struct SessionCache {
    entries: Arc<DashMap<String, CachedUser>>,
    generations: Arc<DashMap<String, u64>>,
    ttl: Duration,
}

impl SessionCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            generations: Arc::new(DashMap::new()),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Cached snapshot for `email`, if present and not expired.
    pub fn get(&self, email: &str) -> Option<User> {
        let snapshot = {
            let entry = self.entries.get(email)?;
            (Instant::now() < entry.expires_at).then(|| entry.snapshot.clone())
        };

        let Some(snapshot) = snapshot else {
            self.entries
                .remove_if(email, |_, entry| Instant::now() >= entry.expires_at);
            return None;
        };

        match serde_json::from_str(&snapshot) {
            Ok(user) => Some(user),
            Err(e) => {
                tracing::warn!(error = %e, "Dropping undecodable session cache entry");
                self.entries.remove(email);
                None
            }
        }
    }

    /// Store a snapshot of `user` under `email` for one TTL.
    pub fn put(&self, email: &str, user: &User) {
        if let Some(entry) = self.snapshot(user) {
            self.entries.insert(email.to_string(), entry);
        }
    }

    /// Current invalidation generation for `email`.
    pub fn generation(&self, email: &str) -> u64 {
        self.generations.get(email).map(|g| *g).unwrap_or(0)
    }

    /// Store `user` only if `email` has not been invalidated since
    /// `generation` was read. Returns whether the snapshot was stored.
    pub fn put_if_current(&self, email: &str, user: &User, generation: u64) -> bool {
        let Some(entry) = self.snapshot(user) else {
            return false;
        };

        // Holding the generation lock keeps invalidate() out until the insert lands.
        let current = self.generations.entry(email.to_string()).or_insert(0);
        if *current != generation {
            return false;
        }
        self.entries.insert(email.to_string(), entry);
        true
    }

    /// Drop the entry for `email` and fence off fills that started before now.
    pub fn invalidate(&self, email: &str) {
        *self.generations.entry(email.to_string()).or_insert(0) += 1;
        self.entries.remove(email);
    }

    fn snapshot(&self, user: &User) -> Option<CachedUser> {
        match serde_json::to_string(user) {
            Ok(snapshot) => Some(CachedUser {
                snapshot,
                expires_at: Instant::now() + self.ttl,
            }),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to serialize user for session cache");
                None
            }
        }
    }

    /// Drop every expired entry. Returns the number removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| now < entry.expires_at);
        before.saturating_sub(self.entries.len())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
