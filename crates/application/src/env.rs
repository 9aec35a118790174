use dnssec_validator_domain::DnssecConfig;

use crate::ports::{CancellationToken, CryptoProvider, MetricsSink, UpstreamResolver, ZoneOutcomeCache};
use crate::services::Nsec3HashEngine;
use crate::trust_anchor::TrustAnchorStore;

/// Everything one top-level `Validate` call shares across every recursive
/// step (RRset verification, chain walking, denial-of-existence proving):
/// the external ports it queries through, plus the value shared from a
/// single clock read (spec §4.4 step 8, §9).
///
/// Deliberately not the query budget or the zone-recursion path: those are
/// per-call-frame values threaded explicitly (spec §4.2, §5, §9) rather
/// than bundled here, so a budget spent down one branch of the call tree
/// can never leak into a sibling branch.
pub struct ValidationEnv<'a> {
    pub resolver: &'a dyn UpstreamResolver,
    pub crypto: &'a dyn CryptoProvider,
    pub cache: &'a dyn ZoneOutcomeCache,
    pub metrics: &'a dyn MetricsSink,
    pub trust_anchors: &'a TrustAnchorStore,
    pub nsec3: &'a Nsec3HashEngine,
    pub config: &'a DnssecConfig,
    pub cancellation: CancellationToken,
    pub now: u64,
}
