use std::fmt;

use super::algorithm::DnssecAlgorithm;
use super::digest::DigestType;
use super::error_kind::DnssecErrorKind;
use super::name::Name;

/// DNSKEY record (RFC 4034 §2): the public key used to verify RRSIGs over
/// this zone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dnskey {
    pub flags: u16,
    pub protocol: u8,
    pub algorithm: DnssecAlgorithm,
    pub public_key: Vec<u8>,
}

impl Dnskey {
    /// Wire format: 2 bytes flags, 1 byte protocol, 1 byte algorithm, then
    /// the public key.
    pub fn parse(data: &[u8]) -> Result<Self, DnssecErrorKind> {
        if data.len() < 4 {
            return Err(DnssecErrorKind::Malformed("DNSKEY record too short".into()));
        }
        let flags = u16::from_be_bytes([data[0], data[1]]);
        let protocol = data[2];
        if protocol != 3 {
            return Err(DnssecErrorKind::Malformed(format!(
                "invalid DNSKEY protocol {protocol} (expected 3)"
            )));
        }
        let algorithm = DnssecAlgorithm::from_u8(data[3]);
        let public_key = data[4..].to_vec();
        Ok(Self {
            flags,
            protocol,
            algorithm,
            public_key,
        })
    }

    /// Zone Key flag (bit 7), must be set for a key that may sign data.
    pub fn is_zone_key(&self) -> bool {
        self.flags & 0x0100 != 0
    }

    /// Secure Entry Point flag (bit 15): conventionally a KSK, though the
    /// chain walker must not rely on this alone (RFC 4035 §2.2 notes it is
    /// informational).
    pub fn is_secure_entry_point(&self) -> bool {
        self.flags & 0x0001 != 0
    }

    /// REVOKE flag (RFC 5011 §7, bit 8): a key publishing this means
    /// "don't use me anymore." Revoked keys are skipped, never treated as
    /// a fatal error on their own.
    pub fn is_revoked(&self) -> bool {
        self.flags & 0x0080 != 0
    }

    /// A key is usable as a signer or trust-anchor candidate iff it is a
    /// zone key, not revoked, and speaks protocol 3 (spec §3, §4.6).
    pub fn is_usable(&self) -> bool {
        self.is_zone_key() && !self.is_revoked() && self.protocol == 3
    }

    /// RFC 4034 Appendix B key tag algorithm.
    pub fn key_tag(&self) -> u16 {
        let mut wire = Vec::with_capacity(4 + self.public_key.len());
        wire.extend_from_slice(&self.flags.to_be_bytes());
        wire.push(self.protocol);
        wire.push(self.algorithm.to_u8());
        wire.extend_from_slice(&self.public_key);

        let mut accumulator: u32 = 0;
        for chunk in wire.chunks(2) {
            if chunk.len() == 2 {
                accumulator += u32::from(u16::from_be_bytes([chunk[0], chunk[1]]));
            } else {
                accumulator += u32::from(chunk[0]) << 8;
            }
        }
        accumulator += accumulator >> 16;
        (accumulator & 0xFFFF) as u16
    }

    /// Wire-format rdata, used both for key-tag computation and as the
    /// digest input when deriving a DS from this key.
    pub fn to_wire(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(4 + self.public_key.len());
        out.extend_from_slice(&self.flags.to_be_bytes());
        out.push(self.protocol);
        out.push(self.algorithm.to_u8());
        out.extend_from_slice(&self.public_key);
        out
    }
}

impl fmt::Display for Dnskey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "DNSKEY flags={} proto={} alg={} tag={}",
            self.flags,
            self.protocol,
            self.algorithm,
            self.key_tag()
        )
    }
}

/// DS record (RFC 4034 §5): a parent-zone pointer to a child DNSKEY,
/// expressed as a digest rather than the raw key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ds {
    pub key_tag: u16,
    pub algorithm: DnssecAlgorithm,
    pub digest_type: DigestType,
    pub digest: Vec<u8>,
}

impl Ds {
    pub fn parse(data: &[u8]) -> Result<Self, DnssecErrorKind> {
        if data.len() < 4 {
            return Err(DnssecErrorKind::Malformed("DS record too short".into()));
        }
        let key_tag = u16::from_be_bytes([data[0], data[1]]);
        let algorithm = DnssecAlgorithm::from_u8(data[2]);
        let digest_type = DigestType::from_u8(data[3]);
        let digest = data[4..].to_vec();

        if let Some(expected) = digest_type.expected_len() {
            if digest.len() != expected {
                return Err(DnssecErrorKind::Malformed(format!(
                    "DS digest length {} does not match {} for {}",
                    digest.len(),
                    expected,
                    digest_type
                )));
            }
        }

        Ok(Self {
            key_tag,
            algorithm,
            digest_type,
            digest,
        })
    }
}

impl fmt::Display for Ds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "DS tag={} alg={} digest_type={}",
            self.key_tag, self.algorithm, self.digest_type
        )
    }
}

/// RRSIG record (RFC 4034 §3): a signature covering one RRset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rrsig {
    pub type_covered: u16,
    pub algorithm: DnssecAlgorithm,
    pub labels: u8,
    pub original_ttl: u32,
    pub signature_expiration: u32,
    pub signature_inception: u32,
    pub key_tag: u16,
    pub signer_name: Name,
    pub signature: Vec<u8>,
}

impl Rrsig {
    /// Fixed part is 18 bytes, followed by the signer name (DNS name
    /// format) and then the raw signature.
    pub fn parse(data: &[u8]) -> Result<Self, DnssecErrorKind> {
        if data.len() < 19 {
            return Err(DnssecErrorKind::Malformed("RRSIG record too short".into()));
        }

        let type_covered = u16::from_be_bytes([data[0], data[1]]);
        let algorithm = DnssecAlgorithm::from_u8(data[2]);
        let labels = data[3];
        let original_ttl = u32::from_be_bytes([data[4], data[5], data[6], data[7]]);
        let signature_expiration = u32::from_be_bytes([data[8], data[9], data[10], data[11]]);
        let signature_inception = u32::from_be_bytes([data[12], data[13], data[14], data[15]]);
        let key_tag = u16::from_be_bytes([data[16], data[17]]);

        let (signer_name, name_len) = Name::from_wire(&data[18..])?;
        let signature_start = 18 + name_len;
        if signature_start > data.len() {
            return Err(DnssecErrorKind::Malformed("RRSIG missing signature".into()));
        }
        let signature = data[signature_start..].to_vec();

        Ok(Self {
            type_covered,
            algorithm,
            labels,
            original_ttl,
            signature_expiration,
            signature_inception,
            key_tag,
            signer_name,
            signature,
        })
    }

    /// Whether `now` (unix seconds) falls within the signature's validity
    /// window, widened on both ends by `tolerance_sec` to absorb clock
    /// skew between the validator and the signer (spec §4.4, RFC 6840
    /// §5.3 recommends but does not mandate a tolerance).
    pub fn is_time_valid(&self, now: u64, tolerance_sec: u32) -> Result<(), DnssecErrorKind> {
        let inception = self.signature_inception as u64;
        let expiration = self.signature_expiration as u64;
        let tolerance = tolerance_sec as u64;

        if now + tolerance < inception {
            return Err(DnssecErrorKind::SignatureNotYetValid {
                now,
                inception: self.signature_inception as u64,
                tolerance: tolerance_sec,
            });
        }
        if now > expiration + tolerance {
            return Err(DnssecErrorKind::SignatureExpired {
                now,
                expiration: self.signature_expiration as u64,
                tolerance: tolerance_sec,
            });
        }
        Ok(())
    }

    /// The rdata with the signature field stripped, i.e. everything that
    /// goes into the RRSIG_RDATA portion of the signed octet stream
    /// (RFC 4034 §3.1.8.1).
    pub fn signed_data_prefix(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(18 + self.signer_name.to_wire().len());
        out.extend_from_slice(&self.type_covered.to_be_bytes());
        out.push(self.algorithm.to_u8());
        out.push(self.labels);
        out.extend_from_slice(&self.original_ttl.to_be_bytes());
        out.extend_from_slice(&self.signature_expiration.to_be_bytes());
        out.extend_from_slice(&self.signature_inception.to_be_bytes());
        out.extend_from_slice(&self.key_tag.to_be_bytes());
        out.extend_from_slice(&self.signer_name.to_wire());
        out
    }
}

impl fmt::Display for Rrsig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RRSIG type={} alg={} labels={} signer={} tag={}",
            self.type_covered, self.algorithm, self.labels, self.signer_name, self.key_tag
        )
    }
}

/// Type bitmap shared by NSEC and NSEC3 (RFC 4034 §4.1.2 / RFC 5155 §3.2.1):
/// a sparse set of RR types encoded as 256-bit windows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeBitmap {
    present: Vec<u16>,
}

impl TypeBitmap {
    pub fn parse(mut data: &[u8]) -> Result<Self, DnssecErrorKind> {
        let mut present = Vec::new();
        while !data.is_empty() {
            if data.len() < 2 {
                return Err(DnssecErrorKind::Malformed(
                    "truncated type bitmap window".into(),
                ));
            }
            let window = data[0] as u16;
            let bitmap_len = data[1] as usize;
            if bitmap_len == 0 || bitmap_len > 32 || data.len() < 2 + bitmap_len {
                return Err(DnssecErrorKind::Malformed(
                    "invalid type bitmap window length".into(),
                ));
            }
            for (byte_index, byte) in data[2..2 + bitmap_len].iter().enumerate() {
                for bit in 0..8u16 {
                    if byte & (0x80 >> bit) != 0 {
                        present.push(window * 256 + byte_index as u16 * 8 + bit);
                    }
                }
            }
            data = &data[2 + bitmap_len..];
        }
        Ok(Self { present })
    }

    pub fn contains(&self, rr_type: u16) -> bool {
        self.present.contains(&rr_type)
    }

    pub fn types(&self) -> &[u16] {
        &self.present
    }
}

/// NSEC record (RFC 4034 §4): proves the non-existence of names and types
/// by pointing to the next owner name in canonical order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Nsec {
    pub next_owner_name: Name,
    pub type_bitmap: TypeBitmap,
}

impl Nsec {
    pub fn parse(data: &[u8]) -> Result<Self, DnssecErrorKind> {
        let (next_owner_name, consumed) = Name::from_wire(data)?;
        let type_bitmap = TypeBitmap::parse(&data[consumed..])?;
        Ok(Self {
            next_owner_name,
            type_bitmap,
        })
    }
}

impl fmt::Display for Nsec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NSEC next={}", self.next_owner_name)
    }
}

/// NSEC3 parameters shared across an NSEC3 record and its owning
/// NSEC3PARAM (RFC 5155 §3, §4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Nsec3Params<'a> {
    pub hash_algorithm: u8,
    pub flags: u8,
    pub iterations: u16,
    pub salt: &'a [u8],
}

/// NSEC3 record (RFC 5155 §3): the hashed analog of NSEC, additionally
/// preventing zone-walking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Nsec3 {
    pub hash_algorithm: u8,
    pub flags: u8,
    pub iterations: u16,
    pub salt: Vec<u8>,
    pub next_hashed_owner_name: Vec<u8>,
    pub type_bitmap: TypeBitmap,
}

impl Nsec3 {
    pub fn parse(data: &[u8]) -> Result<Self, DnssecErrorKind> {
        if data.len() < 5 {
            return Err(DnssecErrorKind::Malformed("NSEC3 record too short".into()));
        }
        let hash_algorithm = data[0];
        let flags = data[1];
        let iterations = u16::from_be_bytes([data[2], data[3]]);
        let salt_len = data[4] as usize;
        let mut pos = 5;
        if data.len() < pos + salt_len + 1 {
            return Err(DnssecErrorKind::Malformed("NSEC3 salt truncated".into()));
        }
        let salt = data[pos..pos + salt_len].to_vec();
        pos += salt_len;

        let hash_len = data[pos] as usize;
        pos += 1;
        if data.len() < pos + hash_len {
            return Err(DnssecErrorKind::Malformed(
                "NSEC3 next hashed owner name truncated".into(),
            ));
        }
        let next_hashed_owner_name = data[pos..pos + hash_len].to_vec();
        pos += hash_len;

        let type_bitmap = TypeBitmap::parse(&data[pos..])?;

        Ok(Self {
            hash_algorithm,
            flags,
            iterations,
            salt,
            next_hashed_owner_name,
            type_bitmap,
        })
    }

    /// The Opt-Out flag (RFC 5155 §3.1.2.1, bit 0): when set, this NSEC3
    /// may cover (rather than exactly match) an insecure delegation.
    pub fn opt_out(&self) -> bool {
        self.flags & 0x01 != 0
    }

    pub fn params(&self) -> Nsec3Params<'_> {
        Nsec3Params {
            hash_algorithm: self.hash_algorithm,
            flags: self.flags,
            iterations: self.iterations,
            salt: &self.salt,
        }
    }
}

impl fmt::Display for Nsec3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "NSEC3 alg={} it={} opt_out={} salt_len={}",
            self.hash_algorithm,
            self.iterations,
            self.opt_out(),
            self.salt.len()
        )
    }
}

/// NSEC3PARAM record (RFC 5155 §4): advertises the salt/iterations a zone
/// uses, independent of any single NSEC3 owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Nsec3Param {
    pub hash_algorithm: u8,
    pub flags: u8,
    pub iterations: u16,
    pub salt: Vec<u8>,
}

impl Nsec3Param {
    pub fn parse(data: &[u8]) -> Result<Self, DnssecErrorKind> {
        if data.len() < 5 {
            return Err(DnssecErrorKind::Malformed(
                "NSEC3PARAM record too short".into(),
            ));
        }
        let hash_algorithm = data[0];
        let flags = data[1];
        let iterations = u16::from_be_bytes([data[2], data[3]]);
        let salt_len = data[4] as usize;
        if data.len() != 5 + salt_len {
            return Err(DnssecErrorKind::Malformed(
                "NSEC3PARAM salt length mismatch".into(),
            ));
        }
        let salt = data[5..].to_vec();
        Ok(Self {
            hash_algorithm,
            flags,
            iterations,
            salt,
        })
    }
}

impl fmt::Display for Nsec3Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "NSEC3PARAM alg={} it={} salt_len={}",
            self.hash_algorithm,
            self.iterations,
            self.salt.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_dnskey() -> Dnskey {
        Dnskey {
            flags: 257,
            protocol: 3,
            algorithm: DnssecAlgorithm::RsaSha256,
            public_key: vec![0x01, 0x02, 0x03, 0x04, 0x05],
        }
    }

    #[test]
    fn dnskey_rejects_bad_protocol() {
        let mut wire = vec![0x01, 0x01, 0x02, 0x08];
        wire.extend_from_slice(&[0xAA; 4]);
        assert!(Dnskey::parse(&wire).is_err());
    }

    #[test]
    fn dnskey_flags_classify_ksk_zsk() {
        let ksk = sample_dnskey();
        assert!(ksk.is_secure_entry_point());
        assert!(ksk.is_zone_key());
    }

    #[test]
    fn ds_rejects_wrong_digest_length() {
        let mut wire = vec![0x00, 0x01, 0x08, 0x02];
        wire.extend_from_slice(&[0u8; 10]); // SHA-256 expects 32
        assert!(Ds::parse(&wire).is_err());
    }

    #[test]
    fn rrsig_time_window_respects_tolerance() {
        let rrsig = Rrsig {
            type_covered: 1,
            algorithm: DnssecAlgorithm::RsaSha256,
            labels: 2,
            original_ttl: 3600,
            signature_expiration: 2_000_000_000,
            signature_inception: 1_000_000_000,
            key_tag: 12345,
            signer_name: Name::parse("example.com").unwrap(),
            signature: vec![0xAB; 16],
        };
        assert!(rrsig.is_time_valid(1_500_000_000, 0).is_ok());
        assert!(rrsig.is_time_valid(999_999_999, 0).is_err());
        assert!(rrsig.is_time_valid(999_999_999, 10).is_ok());
        assert!(rrsig.is_time_valid(2_000_000_001, 0).is_err());
    }

    #[test]
    fn type_bitmap_round_trips_presence() {
        // Window 0, bitmap length 1, bit 0 (type 0) and bit 1 (type 1) set -> 0xC0.
        let wire = [0x00u8, 0x01, 0xC0];
        let bitmap = TypeBitmap::parse(&wire).unwrap();
        assert!(bitmap.contains(0));
        assert!(bitmap.contains(1));
        assert!(!bitmap.contains(2));
    }

    #[test]
    fn nsec3_opt_out_flag() {
        let wire = [1u8, 0x01, 0x00, 0x0A, 0x00, 0x01, 0x14];
        let record = Nsec3::parse(&wire).unwrap();
        assert!(record.opt_out());
        assert_eq!(record.next_hashed_owner_name, vec![0x14]);
    }
}
