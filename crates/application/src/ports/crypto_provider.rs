use dnssec_validator_domain::{DigestType, DnssecAlgorithm, DnssecErrorKind};

/// The validator's other external collaborator: the low-level
/// cryptographic primitives it does not implement itself (spec §1, §6).
///
/// Everything DNSSEC-specific — which RRSIG matches which DNSKEY, time
/// windows, wildcard/signer rules, chain walking — lives in this crate.
/// Only the raw "does this signature verify" and "what is this digest"
/// operations are delegated, since they are ordinary asymmetric-crypto and
/// hashing primitives rather than protocol logic.
pub trait CryptoProvider: Send + Sync {
    /// Verifies `signature` over `signed_data` under `public_key`,
    /// interpreted per `algorithm`'s wire format (RFC 4034 §3.1.8.1 /
    /// Appendix A.1's per-algorithm key encodings).
    ///
    /// `Ok(false)` means the signature did not verify; it is not an error
    /// condition. `Err` is reserved for malformed keys/signatures that
    /// cannot even be parsed, and for algorithms recognized by
    /// [`DnssecAlgorithm`] but not wired up to a concrete implementation.
    fn verify_signature(
        &self,
        algorithm: DnssecAlgorithm,
        public_key: &[u8],
        signed_data: &[u8],
        signature: &[u8],
    ) -> Result<bool, DnssecErrorKind>;

    /// Computes the digest of `data` under `digest_type`, used to check a
    /// DS record against the canonical wire form of a candidate DNSKEY
    /// (RFC 4034 §5.1.4).
    fn digest(&self, digest_type: DigestType, data: &[u8]) -> Result<Vec<u8>, DnssecErrorKind>;
}
