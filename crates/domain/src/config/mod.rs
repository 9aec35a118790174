//! Configuration structures, organized by domain:
//! - `dnssec`: validator budgets, clock skew tolerance, trust anchors

pub mod dnssec;

pub use dnssec::DnssecConfig;
