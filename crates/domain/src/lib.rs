//! Domain layer: DNSSEC types and validation outcomes that carry no
//! dependency on how records are fetched or cached.
pub mod config;
pub mod dnssec;
pub mod errors;
pub mod message;

pub use config::DnssecConfig;
pub use dnssec::{
    DigestType, Dnskey, DnssecAlgorithm, DnssecErrorKind, Ds, Name, Nsec, Nsec3, Nsec3Param,
    Nsec3Params, Recovery, Rrsig, TypeBitmap, ValidationOutcome,
};
pub use errors::DomainError;
pub use message::{canonical_rrset_bytes, Message, Question, Rcode, RecordType, ResourceRecord};
