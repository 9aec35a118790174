use std::time::Duration;

use dnssec_validator_domain::{Name, ValidationOutcome};

/// The zone-outcome validation cache (spec §3, §5, §9): a concurrent map
/// keyed by zone FQDN that short-circuits the chain walker.
///
/// Only `Insecure` and `Indeterminate` zone-security results are ever
/// persisted through [`ZoneOutcomeCache::put`] — the chain walker enforces
/// this, not the cache itself, since `Secure` must be re-derived while an
/// RRSIG's validity window is still time-bound. Implementations only need
/// to provide storage with expiry; races between concurrent writers of the
/// same key are fine because the computed outcome for a given zone/time
/// window is deterministic.
pub trait ZoneOutcomeCache: Send + Sync {
    fn get(&self, zone: &Name) -> Option<ValidationOutcome>;
    fn put(&self, zone: &Name, outcome: ValidationOutcome, ttl: Duration);
}

/// A no-op cache, useful for tests that want every chain walk to run cold.
#[derive(Debug, Default)]
pub struct NullZoneOutcomeCache;

impl ZoneOutcomeCache for NullZoneOutcomeCache {
    fn get(&self, _zone: &Name) -> Option<ValidationOutcome> {
        None
    }

    fn put(&self, _zone: &Name, _outcome: ValidationOutcome, _ttl: Duration) {}
}
