use thiserror::Error;

/// Internal failure taxonomy for a single validation attempt.
///
/// Never surfaced to callers directly — the only externally visible result
/// of validation is [`crate::dnssec::ValidationOutcome`]. Each kind is
/// pre-classified by [`DnssecErrorKind::recovery`] so the RRset verifier and
/// chain walker can aggregate attempts without string matching (RFC 4035
/// §2.2 and spec §7).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DnssecErrorKind {
    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(u8),

    #[error("unsupported digest type: {0}")]
    UnsupportedDigest(u8),

    #[error("unsupported RSA exponent (exceeds 2^31-1)")]
    UnsupportedRsaExponent,

    #[error("signature did not verify")]
    SignatureInvalid,

    #[error("signer name {signer} is not in the bailiwick of owner {owner}")]
    SignerNotInBailiwick { signer: String, owner: String },

    #[error("RRSIG algorithm does not match DNSKEY algorithm")]
    AlgorithmMismatch,

    #[error("signature expired at {expiration} (now {now}, tolerance {tolerance}s)")]
    SignatureExpired {
        now: u64,
        expiration: u64,
        tolerance: u32,
    },

    #[error("signature not yet valid: inception {inception} (now {now}, tolerance {tolerance}s)")]
    SignatureNotYetValid {
        now: u64,
        inception: u64,
        tolerance: u32,
    },

    #[error("wildcard-expanded record lacks a non-existence proof for the original name")]
    WildcardProofMissing,

    #[error("NSEC3 iteration count {actual} exceeds maximum {max}")]
    Nsec3IterationsTooHigh { actual: u16, max: u16 },

    #[error("NSEC3 records in one proof disagree on (algorithm, salt, iterations)")]
    InconsistentNsec3Parameters,

    #[error("DS digest does not match the hash of the candidate DNSKEY")]
    DsDigestMismatch,

    #[error("no DNSKEY matches the RRSIG's key tag and algorithm")]
    NoMatchingDnskey,

    #[error("denial-of-existence proof does not cover the queried name or type: {0}")]
    DenialProofInvalid(String),

    #[error("upstream query budget exhausted")]
    BudgetExhausted,

    #[error("upstream query failed: {0}")]
    UpstreamError(String),

    #[error("validation cancelled")]
    Cancelled,

    #[error("parent zone validation is indeterminate")]
    ParentIndeterminate,

    #[error("no trust anchor configured for the root zone")]
    NoTrustAnchorConfigured,

    #[error("malformed DNSSEC record: {0}")]
    Malformed(String),
}

/// How a failed validation attempt should fold into the aggregate outcome
/// of the surrounding RRset verification (spec §4.4 step 3, §7).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recovery {
    /// Counts toward "all attempts failed only on unsupported algorithm/digest"
    /// which resolves to Insecure per RFC 4035 §2.2.
    Insecure,
    /// Any other cryptographic or structural failure: Bogus.
    Bogus,
    /// Network/budget/cancellation failures: Indeterminate, never cached.
    Indeterminate,
}

impl DnssecErrorKind {
    pub fn recovery(&self) -> Recovery {
        match self {
            Self::UnsupportedAlgorithm(_)
            | Self::UnsupportedDigest(_)
            | Self::UnsupportedRsaExponent => Recovery::Insecure,

            Self::BudgetExhausted
            | Self::UpstreamError(_)
            | Self::Cancelled
            | Self::ParentIndeterminate
            | Self::NoTrustAnchorConfigured => Recovery::Indeterminate,

            Self::SignatureInvalid
            | Self::SignerNotInBailiwick { .. }
            | Self::AlgorithmMismatch
            | Self::SignatureExpired { .. }
            | Self::SignatureNotYetValid { .. }
            | Self::WildcardProofMissing
            | Self::Nsec3IterationsTooHigh { .. }
            | Self::InconsistentNsec3Parameters
            | Self::DsDigestMismatch
            | Self::NoMatchingDnskey
            | Self::DenialProofInvalid(_)
            | Self::Malformed(_) => Recovery::Bogus,
        }
    }
}
