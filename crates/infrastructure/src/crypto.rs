use dnssec_validator_application::ports::CryptoProvider;
use dnssec_validator_domain::{DigestType, DnssecAlgorithm, DnssecErrorKind};
use ring::signature;
use sha1::Sha1;
use sha2::{Digest, Sha256, Sha384};

/// `ring`-backed [`CryptoProvider`]: raw signature verification and
/// digesting, with no DNSSEC protocol logic of its own (spec §6).
///
/// Supports the algorithms spec §6 requires (5, 7, 8, 10, 13, 14, 15).
/// Algorithm 16 (Ed448) is recognized by [`DnssecAlgorithm`] but has no
/// verify-only implementation in `ring`; it surfaces as
/// [`DnssecErrorKind::UnsupportedAlgorithm`] rather than panicking.
/// `ring`'s RSA verifier rejects exponents that don't fit a platform
/// `i32` (spec §4.4.2): a big-endian exponent whose significant bytes
/// exceed 4, or whose 4-byte form has its sign bit set, is above
/// `2^31 - 1` and must be rejected before it ever reaches `ring`.
fn exponent_exceeds_platform_limit(exponent: &[u8]) -> bool {
    let trimmed = exponent
        .iter()
        .position(|&b| b != 0)
        .map(|i| &exponent[i..])
        .unwrap_or(&[]);
    match trimmed.len() {
        0..=3 => false,
        4 => trimmed[0] > 0x7F,
        _ => true,
    }
}

#[derive(Debug, Default)]
pub struct RingCryptoProvider;

impl RingCryptoProvider {
    pub fn new() -> Self {
        Self
    }

    /// Splits a DNSKEY RSA public key into (exponent, modulus) per RFC
    /// 3110 §2: a one-byte exponent length, or `0x00` followed by a
    /// two-byte length when the exponent does not fit in a byte.
    fn parse_rsa_key(key_data: &[u8]) -> Result<(Vec<u8>, Vec<u8>), DnssecErrorKind> {
        if key_data.is_empty() {
            return Err(DnssecErrorKind::Malformed("empty RSA public key".into()));
        }

        let first_byte = key_data[0];
        let (exp_len, exp_start) = if first_byte == 0 {
            if key_data.len() < 3 {
                return Err(DnssecErrorKind::Malformed(
                    "RSA key too short for long-form exponent length".into(),
                ));
            }
            let exp_len = u16::from_be_bytes([key_data[1], key_data[2]]) as usize;
            (exp_len, 3)
        } else {
            (first_byte as usize, 1)
        };

        let exp_end = exp_start + exp_len;
        if exp_end > key_data.len() {
            return Err(DnssecErrorKind::Malformed(
                "RSA exponent extends beyond key data".into(),
            ));
        }

        let exponent = key_data[exp_start..exp_end].to_vec();
        let modulus = key_data[exp_end..].to_vec();
        if modulus.is_empty() {
            return Err(DnssecErrorKind::Malformed("RSA modulus is empty".into()));
        }
        if exponent_exceeds_platform_limit(&exponent) {
            return Err(DnssecErrorKind::UnsupportedRsaExponent);
        }
        Ok((exponent, modulus))
    }

    fn verify_rsa(
        algorithm: &'static signature::RsaParameters,
        public_key: &[u8],
        signed_data: &[u8],
        signature: &[u8],
    ) -> Result<bool, DnssecErrorKind> {
        let (exponent, modulus) = Self::parse_rsa_key(public_key)?;
        let key = signature::RsaPublicKeyComponents {
            n: &modulus,
            e: &exponent,
        };
        Ok(key.verify(algorithm, signed_data, signature).is_ok())
    }

    fn verify_fixed(
        algorithm: &'static signature::EcdsaVerificationAlgorithm,
        public_key: &[u8],
        signed_data: &[u8],
        signature: &[u8],
        expected_key_len: usize,
    ) -> Result<bool, DnssecErrorKind> {
        if public_key.len() != expected_key_len {
            return Err(DnssecErrorKind::Malformed(format!(
                "expected {expected_key_len}-byte public key, got {}",
                public_key.len()
            )));
        }
        // DNSKEY carries the bare point (no 0x04 prefix); ring's FIXED
        // ECDSA verifier expects the same uncompressed-point encoding
        // ring's own APIs produce, so the prefix byte must be added back.
        let mut uncompressed_point = Vec::with_capacity(1 + public_key.len());
        uncompressed_point.push(0x04);
        uncompressed_point.extend_from_slice(public_key);
        let key = signature::UnparsedPublicKey::new(algorithm, &uncompressed_point);
        Ok(key.verify(signed_data, signature).is_ok())
    }

    fn verify_ed25519(public_key: &[u8], signed_data: &[u8], signature: &[u8]) -> Result<bool, DnssecErrorKind> {
        if public_key.len() != 32 {
            return Err(DnssecErrorKind::Malformed(
                "Ed25519 public key must be 32 bytes".into(),
            ));
        }
        let key = signature::UnparsedPublicKey::new(&signature::ED25519, public_key);
        Ok(key.verify(signed_data, signature).is_ok())
    }
}

impl CryptoProvider for RingCryptoProvider {
    fn verify_signature(
        &self,
        algorithm: DnssecAlgorithm,
        public_key: &[u8],
        signed_data: &[u8],
        signature: &[u8],
    ) -> Result<bool, DnssecErrorKind> {
        match algorithm {
            DnssecAlgorithm::RsaSha1 | DnssecAlgorithm::RsaSha1Nsec3Sha1 => Self::verify_rsa(
                &signature::RSA_PKCS1_2048_8192_SHA1_FOR_LEGACY_USE_ONLY,
                public_key,
                signed_data,
                signature,
            ),
            DnssecAlgorithm::RsaSha256 => {
                Self::verify_rsa(&signature::RSA_PKCS1_2048_8192_SHA256, public_key, signed_data, signature)
            }
            DnssecAlgorithm::RsaSha512 => {
                Self::verify_rsa(&signature::RSA_PKCS1_2048_8192_SHA512, public_key, signed_data, signature)
            }
            DnssecAlgorithm::EcdsaP256Sha256 => Self::verify_fixed(
                &signature::ECDSA_P256_SHA256_FIXED,
                public_key,
                signed_data,
                signature,
                64,
            ),
            DnssecAlgorithm::EcdsaP384Sha384 => Self::verify_fixed(
                &signature::ECDSA_P384_SHA384_FIXED,
                public_key,
                signed_data,
                signature,
                96,
            ),
            DnssecAlgorithm::Ed25519 => Self::verify_ed25519(public_key, signed_data, signature),
            DnssecAlgorithm::Ed448 | DnssecAlgorithm::Unknown(_) => {
                Err(DnssecErrorKind::UnsupportedAlgorithm(algorithm.to_u8()))
            }
        }
    }

    fn digest(&self, digest_type: DigestType, data: &[u8]) -> Result<Vec<u8>, DnssecErrorKind> {
        match digest_type {
            DigestType::Sha1 => {
                let mut hasher = Sha1::new();
                hasher.update(data);
                Ok(hasher.finalize().to_vec())
            }
            DigestType::Sha256 => {
                let mut hasher = Sha256::new();
                hasher.update(data);
                Ok(hasher.finalize().to_vec())
            }
            DigestType::Sha384 => {
                let mut hasher = Sha384::new();
                hasher.update(data);
                Ok(hasher.finalize().to_vec())
            }
            DigestType::Unknown(v) => Err(DnssecErrorKind::Malformed(format!(
                "unsupported DS digest type {v}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ed448_is_not_supported() {
        let provider = RingCryptoProvider::new();
        let result = provider.verify_signature(DnssecAlgorithm::Ed448, &[], &[], &[]);
        assert!(result.is_err());
    }

    #[test]
    fn sha256_digest_has_expected_length() {
        let provider = RingCryptoProvider::new();
        let digest = provider.digest(DigestType::Sha256, b"hello").unwrap();
        assert_eq!(digest.len(), 32);
    }

    #[test]
    fn sha1_digest_has_expected_length() {
        let provider = RingCryptoProvider::new();
        let digest = provider.digest(DigestType::Sha1, b"hello").unwrap();
        assert_eq!(digest.len(), 20);
    }

    #[test]
    fn malformed_rsa_key_is_rejected() {
        let result = RingCryptoProvider::parse_rsa_key(&[]);
        assert!(result.is_err());
    }

    #[test]
    fn oversized_rsa_exponent_is_unsupported() {
        // 5-byte exponent, well above the 2^31-1 platform limit.
        let mut key_data = vec![5u8, 1, 0, 0, 0, 1];
        key_data.extend(std::iter::repeat(0xAB).take(256));
        let result = RingCryptoProvider::parse_rsa_key(&key_data);
        assert!(matches!(result, Err(DnssecErrorKind::UnsupportedRsaExponent)));
    }

    #[test]
    fn four_byte_exponent_within_limit_is_accepted() {
        // 0x7FFFFFFF == 2^31-1, the maximum representable value.
        let mut key_data = vec![4u8, 0x7F, 0xFF, 0xFF, 0xFF];
        key_data.extend(std::iter::repeat(0xAB).take(256));
        let result = RingCryptoProvider::parse_rsa_key(&key_data);
        assert!(result.is_ok());
    }
}
