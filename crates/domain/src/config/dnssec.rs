use serde::{Deserialize, Serialize};

/// DNSSEC validator configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DnssecConfig {
    /// How long a zone-level Insecure/Indeterminate outcome stays cached
    /// before the chain is re-walked.
    #[serde(default = "default_cache_expiration_hours")]
    pub cache_expiration_hours: u64,

    /// Upper bound on how many zone cuts the chain walker will cross
    /// before giving up as Indeterminate (spec §4.6, §8: prevents an
    /// unbounded walk against a pathological or hostile zone).
    #[serde(default = "default_max_chain_depth")]
    pub max_chain_depth: u8,

    /// NSEC3 iteration ceiling (RFC 9276 recommends 0; RFC 5155 allows up
    /// to 2500). Proofs using more than this are treated as Bogus rather
    /// than spending CPU on a hostile zone's hash-cost amplification.
    #[serde(default = "default_max_nsec3_iterations")]
    pub max_nsec3_iterations: u16,

    /// Per top-level validation call, the maximum number of upstream
    /// queries the query budget (spec §4.2) will allow before returning
    /// Indeterminate.
    #[serde(default = "default_max_upstream_queries")]
    pub max_upstream_queries: u32,

    /// Seconds of clock skew tolerated on either side of an RRSIG's
    /// inception/expiration window.
    #[serde(default = "default_clock_skew_tolerance_sec")]
    pub clock_skew_tolerance_sec: u32,

    /// Base64 DNSKEY/DS trust anchors to seed in addition to the
    /// compiled-in IANA root anchors, formatted as `"<zone> <RR data>"`
    /// presentation lines.
    #[serde(default)]
    pub trust_anchors: Vec<String>,

    /// Whether SHA-1 DS digests are accepted at all. RFC 6840 §5.11 does
    /// not forbid them outright, but operators validating against
    /// modern zones may want to require SHA-256 or stronger.
    #[serde(default = "default_true")]
    pub allow_sha1_digest: bool,
}

impl Default for DnssecConfig {
    fn default() -> Self {
        Self {
            cache_expiration_hours: default_cache_expiration_hours(),
            max_chain_depth: default_max_chain_depth(),
            max_nsec3_iterations: default_max_nsec3_iterations(),
            max_upstream_queries: default_max_upstream_queries(),
            clock_skew_tolerance_sec: default_clock_skew_tolerance_sec(),
            trust_anchors: vec![],
            allow_sha1_digest: true,
        }
    }
}

fn default_cache_expiration_hours() -> u64 {
    1
}

fn default_max_chain_depth() -> u8 {
    10
}

fn default_max_nsec3_iterations() -> u16 {
    150
}

fn default_max_upstream_queries() -> u32 {
    30
}

fn default_clock_skew_tolerance_sec() -> u32 {
    3600
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec_budgets() {
        let cfg = DnssecConfig::default();
        assert_eq!(cfg.max_chain_depth, 10);
        assert_eq!(cfg.max_nsec3_iterations, 150);
        assert_eq!(cfg.max_upstream_queries, 30);
        assert!(cfg.allow_sha1_digest);
    }
}
