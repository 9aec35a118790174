use std::time::Duration;

use dnssec_validator_domain::ValidationOutcome;

/// Emission point for the three stable metric names from spec §6:
/// `dnssec_validation_total{result}`, `dnssec_cache_hits_total`, and
/// `dnssec_validation_duration_seconds{result}`. The dispatcher (C7) is
/// the only caller; concrete storage (atomics, histograms, exposition
/// format) is an infrastructure concern.
pub trait MetricsSink: Send + Sync {
    fn record_validation(&self, outcome: ValidationOutcome);
    fn record_cache_hit(&self);
    fn record_duration(&self, outcome: ValidationOutcome, elapsed: Duration);
}

/// Discards every observation, for tests that don't care about metrics.
#[derive(Debug, Default)]
pub struct NullMetricsSink;

impl MetricsSink for NullMetricsSink {
    fn record_validation(&self, _outcome: ValidationOutcome) {}
    fn record_cache_hit(&self) {}
    fn record_duration(&self, _outcome: ValidationOutcome, _elapsed: Duration) {}
}
