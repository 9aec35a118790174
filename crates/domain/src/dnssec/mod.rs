//! DNSSEC types shared across the application and infrastructure crates:
//! the algorithm/digest registries, the internal error taxonomy, name
//! helpers, wire-format record types, and the validation outcome itself.

pub mod algorithm;
pub mod digest;
pub mod error_kind;
pub mod name;
pub mod outcome;
pub mod records;

pub use algorithm::DnssecAlgorithm;
pub use digest::DigestType;
pub use error_kind::{DnssecErrorKind, Recovery};
pub use name::Name;
pub use outcome::ValidationOutcome;
pub use records::{Dnskey, Ds, Nsec, Nsec3, Nsec3Param, Nsec3Params, Rrsig, TypeBitmap};
