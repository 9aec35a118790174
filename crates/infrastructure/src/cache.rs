use std::time::{Duration, Instant};

use dashmap::DashMap;
use dnssec_validator_application::ports::ZoneOutcomeCache;
use dnssec_validator_domain::{Name, ValidationOutcome};
use tracing::trace;

struct CacheEntry {
    outcome: ValidationOutcome,
    expires_at: Instant,
}

/// Lock-free, TTL-expiring [`ZoneOutcomeCache`] backed by `DashMap`, in the
/// same shape as the teacher's per-kind DNSSEC caches (flat map, expiry
/// checked on read, no background sweep).
#[derive(Debug, Default)]
pub struct DashMapZoneOutcomeCache {
    entries: DashMap<Name, CacheEntry>,
}

impl DashMapZoneOutcomeCache {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Drops every expired entry. Not called automatically; callers that
    /// want bounded memory growth should schedule this periodically.
    pub fn cleanup_expired(&self) {
        let now = Instant::now();
        self.entries.retain(|_, entry| entry.expires_at > now);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ZoneOutcomeCache for DashMapZoneOutcomeCache {
    fn get(&self, zone: &Name) -> Option<ValidationOutcome> {
        if let Some(entry) = self.entries.get(zone) {
            if entry.expires_at > Instant::now() {
                trace!(zone = %zone, outcome = %entry.outcome, "zone outcome cache hit");
                return Some(entry.outcome);
            }
            drop(entry);
            self.entries.remove(zone);
        }
        None
    }

    fn put(&self, zone: &Name, outcome: ValidationOutcome, ttl: Duration) {
        self.entries.insert(
            zone.clone(),
            CacheEntry {
                outcome,
                expires_at: Instant::now() + ttl,
            },
        );
        trace!(zone = %zone, outcome = %outcome, ttl_secs = ttl.as_secs(), "cached zone outcome");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_then_get_hits_before_expiry() {
        let cache = DashMapZoneOutcomeCache::new();
        let zone = Name::parse("example.com").unwrap();
        cache.put(&zone, ValidationOutcome::Insecure, Duration::from_secs(60));
        assert_eq!(cache.get(&zone), Some(ValidationOutcome::Insecure));
    }

    #[test]
    fn expired_entry_is_evicted_on_read() {
        let cache = DashMapZoneOutcomeCache::new();
        let zone = Name::parse("example.com").unwrap();
        cache.put(&zone, ValidationOutcome::Indeterminate, Duration::from_secs(0));
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(cache.get(&zone), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn cleanup_expired_drops_stale_entries_only() {
        let cache = DashMapZoneOutcomeCache::new();
        let stale = Name::parse("stale.example").unwrap();
        let fresh = Name::parse("fresh.example").unwrap();
        cache.put(&stale, ValidationOutcome::Insecure, Duration::from_secs(0));
        cache.put(&fresh, ValidationOutcome::Insecure, Duration::from_secs(60));
        std::thread::sleep(Duration::from_millis(5));
        cache.cleanup_expired();
        assert_eq!(cache.len(), 1);
    }
}
