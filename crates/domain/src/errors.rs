use crate::dnssec::DnssecErrorKind;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Invalid domain name: {0}")]
    InvalidDomainName(String),

    #[error("Invalid DNS response: {0}")]
    InvalidDnsResponse(String),

    #[error("I/O error: {0}")]
    IoError(String),

    #[error("Query timeout")]
    QueryTimeout,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("DNSSEC validation error: {0}")]
    Dnssec(#[from] DnssecErrorKind),
}
