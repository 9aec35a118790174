use std::fmt;

/// DNSSEC signing algorithm (IANA "DNS Security Algorithm Numbers" registry).
///
/// `strength()` implements the downgrade-resistant ordering from
/// RFC 6840 §5.11: when several RRSIGs cover the same RRset, the
/// strongest-scoring algorithm is tried first so an attacker cannot force
/// a weaker, more easily forged signature to be attempted (and accepted)
/// before a stronger one that would fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DnssecAlgorithm {
    RsaSha1,
    RsaSha1Nsec3Sha1,
    RsaSha256,
    RsaSha512,
    EcdsaP256Sha256,
    EcdsaP384Sha384,
    Ed25519,
    Ed448,
    Unknown(u8),
}

impl DnssecAlgorithm {
    pub fn from_u8(value: u8) -> Self {
        match value {
            5 => Self::RsaSha1,
            7 => Self::RsaSha1Nsec3Sha1,
            8 => Self::RsaSha256,
            10 => Self::RsaSha512,
            13 => Self::EcdsaP256Sha256,
            14 => Self::EcdsaP384Sha384,
            15 => Self::Ed25519,
            16 => Self::Ed448,
            other => Self::Unknown(other),
        }
    }

    pub fn to_u8(self) -> u8 {
        match self {
            Self::RsaSha1 => 5,
            Self::RsaSha1Nsec3Sha1 => 7,
            Self::RsaSha256 => 8,
            Self::RsaSha512 => 10,
            Self::EcdsaP256Sha256 => 13,
            Self::EcdsaP384Sha384 => 14,
            Self::Ed25519 => 15,
            Self::Ed448 => 16,
            Self::Unknown(v) => v,
        }
    }

    /// Higher is stronger. Zero means "not a recognized signing algorithm".
    ///
    /// Ordering per spec: ED448 > ED25519 > ECDSAP384SHA384 >
    /// ECDSAP256SHA256 > RSASHA512 > RSASHA256 > RSASHA1 (incl. its NSEC3
    /// alias).
    pub fn strength(self) -> u8 {
        match self {
            Self::Ed448 => 7,
            Self::Ed25519 => 6,
            Self::EcdsaP384Sha384 => 5,
            Self::EcdsaP256Sha256 => 4,
            Self::RsaSha512 => 3,
            Self::RsaSha256 => 2,
            Self::RsaSha1 | Self::RsaSha1Nsec3Sha1 => 1,
            Self::Unknown(_) => 0,
        }
    }

    pub fn is_supported(self) -> bool {
        self.strength() > 0
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::RsaSha1 => "RSASHA1",
            Self::RsaSha1Nsec3Sha1 => "RSASHA1-NSEC3-SHA1",
            Self::RsaSha256 => "RSASHA256",
            Self::RsaSha512 => "RSASHA512",
            Self::EcdsaP256Sha256 => "ECDSAP256SHA256",
            Self::EcdsaP384Sha384 => "ECDSAP384SHA384",
            Self::Ed25519 => "ED25519",
            Self::Ed448 => "ED448",
            Self::Unknown(_) => "UNKNOWN",
        }
    }
}

impl fmt::Display for DnssecAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name(), self.to_u8())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strength_ordering_matches_rfc6840() {
        assert!(DnssecAlgorithm::Ed448.strength() > DnssecAlgorithm::Ed25519.strength());
        assert!(DnssecAlgorithm::Ed25519.strength() > DnssecAlgorithm::EcdsaP384Sha384.strength());
        assert!(
            DnssecAlgorithm::EcdsaP384Sha384.strength() > DnssecAlgorithm::EcdsaP256Sha256.strength()
        );
        assert!(DnssecAlgorithm::EcdsaP256Sha256.strength() > DnssecAlgorithm::RsaSha512.strength());
        assert!(DnssecAlgorithm::RsaSha512.strength() > DnssecAlgorithm::RsaSha256.strength());
        assert!(DnssecAlgorithm::RsaSha256.strength() > DnssecAlgorithm::RsaSha1.strength());
        assert_eq!(
            DnssecAlgorithm::RsaSha1.strength(),
            DnssecAlgorithm::RsaSha1Nsec3Sha1.strength()
        );
    }

    #[test]
    fn unknown_algorithm_scores_zero() {
        assert_eq!(DnssecAlgorithm::from_u8(200).strength(), 0);
        assert!(!DnssecAlgorithm::from_u8(200).is_supported());
    }

    #[test]
    fn roundtrips_through_u8() {
        for raw in [5u8, 7, 8, 10, 13, 14, 15, 16] {
            assert_eq!(DnssecAlgorithm::from_u8(raw).to_u8(), raw);
        }
    }
}
