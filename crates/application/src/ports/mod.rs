//! Traits the validator's business logic depends on instead of any
//! concrete network, clock, or cryptographic backend (spec §6).

pub mod cancellation;
pub mod crypto_provider;
pub mod metrics;
pub mod upstream_resolver;
pub mod zone_cache;

pub use cancellation::CancellationToken;
pub use crypto_provider::CryptoProvider;
pub use metrics::{MetricsSink, NullMetricsSink};
pub use upstream_resolver::UpstreamResolver;
pub use zone_cache::{NullZoneOutcomeCache, ZoneOutcomeCache};
