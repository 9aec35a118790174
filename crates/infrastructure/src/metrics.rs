use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use dnssec_validator_application::ports::MetricsSink;
use dnssec_validator_domain::ValidationOutcome;

/// Bucket upper bounds (seconds) for `dnssec_validation_duration_seconds`,
/// the same fixed-ladder shape Prometheus histograms use: each bucket
/// counts observations less than or equal to its bound, the last bucket
/// (`+Inf`) always equals the total count.
const DURATION_BUCKETS_SEC: [f64; 8] = [0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0];

#[derive(Debug)]
struct DurationHistogram {
    bucket_counts: [AtomicU64; DURATION_BUCKETS_SEC.len()],
    sum_micros: AtomicU64,
    count: AtomicU64,
}

impl Default for DurationHistogram {
    fn default() -> Self {
        Self {
            bucket_counts: std::array::from_fn(|_| AtomicU64::new(0)),
            sum_micros: AtomicU64::new(0),
            count: AtomicU64::new(0),
        }
    }
}

impl DurationHistogram {
    fn observe(&self, elapsed: Duration) {
        let secs = elapsed.as_secs_f64();
        for (bound, counter) in DURATION_BUCKETS_SEC.iter().zip(&self.bucket_counts) {
            if secs <= *bound {
                counter.fetch_add(1, Ordering::Relaxed);
            }
        }
        self.sum_micros.fetch_add(elapsed.as_micros() as u64, Ordering::Relaxed);
        self.count.fetch_add(1, Ordering::Relaxed);
    }

    fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    fn mean(&self) -> Option<Duration> {
        let count = self.count();
        if count == 0 {
            return None;
        }
        Some(Duration::from_micros(self.sum_micros.load(Ordering::Relaxed) / count))
    }
}

/// Atomics-plus-`DashMap` [`MetricsSink`], exposing the three stable
/// metric names from spec §6: a per-outcome validation counter, a cache
/// hit counter, and a per-outcome duration histogram, in the same
/// hand-rolled-atomics style as the teacher's `QueryMetrics` — no
/// `prometheus` crate is in the dependency stack, so `render_text`
/// formats the exposition text directly.
#[derive(Debug, Default)]
pub struct DnssecMetrics {
    validations_by_outcome: DashMap<ValidationOutcome, u64>,
    cache_hits: AtomicU64,
    durations_by_outcome: DashMap<ValidationOutcome, DurationHistogram>,
}

impl DnssecMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn validation_count(&self, outcome: ValidationOutcome) -> u64 {
        self.validations_by_outcome.get(&outcome).map(|v| *v).unwrap_or(0)
    }

    pub fn cache_hit_count(&self) -> u64 {
        self.cache_hits.load(Ordering::Relaxed)
    }

    /// Mean validation duration for `outcome`, or `None` if never observed.
    pub fn mean_duration(&self, outcome: ValidationOutcome) -> Option<Duration> {
        self.durations_by_outcome.get(&outcome).and_then(|h| h.mean())
    }

    /// Renders every counter in Prometheus text exposition format
    /// (spec §6): an external scrape endpoint (out of scope here, per
    /// spec §1's "Prometheus registration" Non-goal) serves this text
    /// verbatim.
    pub fn render_text(&self) -> String {
        let mut out = String::new();

        out.push_str("# TYPE dnssec_validation_total counter\n");
        for outcome in [
            ValidationOutcome::Secure,
            ValidationOutcome::Insecure,
            ValidationOutcome::Bogus,
            ValidationOutcome::Indeterminate,
        ] {
            out.push_str(&format!(
                "dnssec_validation_total{{result=\"{}\"}} {}\n",
                outcome.as_str(),
                self.validation_count(outcome)
            ));
        }

        out.push_str("# TYPE dnssec_cache_hits_total counter\n");
        out.push_str(&format!("dnssec_cache_hits_total {}\n", self.cache_hit_count()));

        out.push_str("# TYPE dnssec_validation_duration_seconds histogram\n");
        for entry in self.durations_by_outcome.iter() {
            let outcome = entry.key().as_str();
            let histogram = entry.value();
            let mut cumulative = 0u64;
            for (bound, counter) in DURATION_BUCKETS_SEC.iter().zip(&histogram.bucket_counts) {
                cumulative = cumulative.max(counter.load(Ordering::Relaxed));
                out.push_str(&format!(
                    "dnssec_validation_duration_seconds_bucket{{result=\"{outcome}\",le=\"{bound}\"}} {cumulative}\n"
                ));
            }
            let total = histogram.count();
            out.push_str(&format!(
                "dnssec_validation_duration_seconds_bucket{{result=\"{outcome}\",le=\"+Inf\"}} {total}\n"
            ));
            out.push_str(&format!(
                "dnssec_validation_duration_seconds_sum{{result=\"{outcome}\"}} {}\n",
                histogram.sum_micros.load(Ordering::Relaxed) as f64 / 1_000_000.0
            ));
            out.push_str(&format!(
                "dnssec_validation_duration_seconds_count{{result=\"{outcome}\"}} {total}\n"
            ));
        }

        out
    }
}

impl MetricsSink for DnssecMetrics {
    fn record_validation(&self, outcome: ValidationOutcome) {
        self.validations_by_outcome
            .entry(outcome)
            .and_modify(|c| *c += 1)
            .or_insert(1);
    }

    fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    fn record_duration(&self, outcome: ValidationOutcome, elapsed: Duration) {
        self.durations_by_outcome
            .entry(outcome)
            .or_default()
            .observe(elapsed);
    }
}
