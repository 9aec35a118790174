//! Concrete adapters for the DNSSEC validator's ports: `ring`-backed
//! cryptography, a `DashMap` zone-outcome cache, and atomics-based metrics
//! (spec §6). Upstream transport is explicitly out of scope (spec §1's
//! Non-goals) — callers supply their own [`UpstreamResolver`] implementation.

pub mod cache;
pub mod crypto;
pub mod metrics;

pub use cache::DashMapZoneOutcomeCache;
pub use crypto::RingCryptoProvider;
pub use metrics::DnssecMetrics;

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use dnssec_validator_application::ports::{CancellationToken, UpstreamResolver};
use dnssec_validator_application::{validate, TrustAnchorStore, ValidationEnv};
use dnssec_validator_application::services::Nsec3HashEngine;
use dnssec_validator_domain::{DnssecConfig, DnssecErrorKind, Message, ValidationOutcome};

/// Wires the concrete adapters in this crate together behind the single
/// `validate` entry point the rest of the system calls (spec §4.7).
///
/// Built once at startup and shared (it is `Send + Sync`, cheap to clone
/// via the `Arc`s it holds internally where state needs to be shared).
pub struct DnssecValidator {
    resolver: Arc<dyn UpstreamResolver>,
    crypto: RingCryptoProvider,
    cache: DashMapZoneOutcomeCache,
    metrics: DnssecMetrics,
    trust_anchors: TrustAnchorStore,
    nsec3: Nsec3HashEngine,
    config: DnssecConfig,
}

impl DnssecValidator {
    pub fn new(resolver: Arc<dyn UpstreamResolver>, config: DnssecConfig) -> Result<Self, DnssecErrorKind> {
        let trust_anchors = TrustAnchorStore::new(&config.trust_anchors)?;
        Ok(Self {
            resolver,
            crypto: RingCryptoProvider::new(),
            cache: DashMapZoneOutcomeCache::new(),
            metrics: DnssecMetrics::new(),
            trust_anchors,
            nsec3: Nsec3HashEngine::new(),
            config,
        })
    }

    /// Validates one already-decoded DNS response (spec §4.7's dispatcher
    /// entry point), against the current wall-clock time.
    pub async fn validate(&self, cancellation: CancellationToken, response: &Message) -> ValidationOutcome {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);

        let env = ValidationEnv {
            resolver: self.resolver.as_ref(),
            crypto: &self.crypto,
            cache: &self.cache,
            metrics: &self.metrics,
            trust_anchors: &self.trust_anchors,
            nsec3: &self.nsec3,
            config: &self.config,
            cancellation,
            now,
        };

        validate(&env, response).await
    }

    pub fn metrics(&self) -> &DnssecMetrics {
        &self.metrics
    }

    pub fn cache(&self) -> &DashMapZoneOutcomeCache {
        &self.cache
    }
}
