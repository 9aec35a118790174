use dashmap::DashMap;
use dnssec_validator_domain::{DnssecErrorKind, Name, Nsec3};
use sha1::{Digest, Sha1};

/// Base32hex (RFC 4648 §7) alphabet used for NSEC3 owner-name hash labels
/// (RFC 5155 §1, no padding, rendered uppercase).
///
/// Hand-rolled rather than via `data_encoding::BASE32_DNSSEC`: that spec's
/// `NoPad` padding policy rejects any input whose bit length isn't a
/// multiple of a full output byte, but RFC 5155 hash labels are exactly
/// that — a 5-bits-per-symbol encoding of a hash with no byte-alignment
/// guarantee relative to the symbol count — so a permissive bit-level
/// codec is the correct tool here, not a strict standard encoding.
const BASE32HEX_ALPHABET: &[u8; 32] = b"0123456789ABCDEFGHIJKLMNOPQRSTUV";

fn base32hex_encode(data: &[u8]) -> String {
    let mut out = String::with_capacity((data.len() * 8).div_ceil(5));
    let mut buffer: u32 = 0;
    let mut bits = 0u32;
    for &byte in data {
        buffer = (buffer << 8) | u32::from(byte);
        bits += 8;
        while bits >= 5 {
            bits -= 5;
            let index = ((buffer >> bits) & 0x1F) as usize;
            out.push(BASE32HEX_ALPHABET[index] as char);
        }
    }
    if bits > 0 {
        let index = ((buffer << (5 - bits)) & 0x1F) as usize;
        out.push(BASE32HEX_ALPHABET[index] as char);
    }
    out
}

fn base32hex_decode(text: &str) -> Result<Vec<u8>, DnssecErrorKind> {
    let mut buffer: u32 = 0;
    let mut bits = 0u32;
    let mut out = Vec::with_capacity(text.len() * 5 / 8);
    for ch in text.chars() {
        let upper = ch.to_ascii_uppercase();
        let value = BASE32HEX_ALPHABET
            .iter()
            .position(|&c| c as char == upper)
            .ok_or_else(|| DnssecErrorKind::Malformed(format!("invalid base32hex character {ch:?}")))?;
        buffer = (buffer << 5) | value as u32;
        bits += 5;
        if bits >= 8 {
            bits -= 8;
            out.push(((buffer >> bits) & 0xFF) as u8);
        }
    }
    Ok(out)
}

/// Key into the process-wide NSEC3 hash cache (spec §3, §4.3): the
/// canonicalized name plus every parameter that participates in the hash,
/// since the same name hashes to a different value per (alg, salt, iterations).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct HashCacheKey {
    name: String,
    algorithm: u8,
    salt: Vec<u8>,
    iterations: u16,
}

/// The NSEC3 hash engine (spec §4.3, C3): canonical SHA-1 iterative
/// hashing with a write-once cache, plus binary-exact base32hex comparison
/// and range-coverage tests that respect RFC 5155's end-of-zone wraparound.
///
/// This is pure computation with no upstream dependency, so — following
/// the crate's existing wiring of `sha1`/`dashmap` directly into this
/// crate's `Cargo.toml` rather than into the infrastructure crate — it
/// lives here rather than behind a port.
#[derive(Debug, Default)]
pub struct Nsec3HashEngine {
    cache: DashMap<HashCacheKey, String>,
    cache_hits: std::sync::atomic::AtomicU64,
}

impl Nsec3HashEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cache_hits(&self) -> u64 {
        self.cache_hits.load(std::sync::atomic::Ordering::Relaxed)
    }

    /// Computes the base32hex NSEC3 hash of `name` (spec §4.3). Only
    /// algorithm 1 (SHA-1) is defined by RFC 5155; anything else is
    /// rejected as unsupported rather than silently miscomputed.
    pub fn hash(
        &self,
        name: &Name,
        algorithm: u8,
        salt: &[u8],
        iterations: u16,
    ) -> Result<String, DnssecErrorKind> {
        if algorithm != 1 {
            return Err(DnssecErrorKind::UnsupportedAlgorithm(algorithm));
        }

        let key = HashCacheKey {
            name: name.as_str().to_string(),
            algorithm,
            salt: salt.to_vec(),
            iterations,
        };
        if let Some(cached) = self.cache.get(&key) {
            self.cache_hits.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
            return Ok(cached.clone());
        }

        let mut digest = name.to_wire();
        for _ in 0..=iterations {
            let mut hasher = Sha1::new();
            hasher.update(&digest);
            hasher.update(salt);
            digest = hasher.finalize().to_vec();
        }
        let encoded = base32hex_encode(&digest);

        // Idempotent insert: concurrent computations of the same key
        // converge on the same bytes, so a race just repeats the work.
        self.cache.entry(key).or_insert_with(|| encoded.clone());
        Ok(encoded)
    }

    /// Decodes both hashes and compares as big-endian byte arrays (spec
    /// §4.3): unequal lengths compare lexicographically over the raw
    /// bytes rather than erroring, matching RFC 5155's byte-string
    /// ordering for owner names.
    pub fn compare_hashes(&self, a: &str, b: &str) -> Result<std::cmp::Ordering, DnssecErrorKind> {
        let a = base32hex_decode(a)?;
        let b = base32hex_decode(b)?;
        Ok(a.cmp(&b))
    }

    /// True iff `h` falls in the half-open-on-the-left, closed-on-the-right
    /// range `(owner, next]`, with RFC 5155 §7.2.1 wraparound: when
    /// `owner > next` (the last NSEC3 in the zone), the range wraps through
    /// the top of the hash space. A single record whose owner equals its
    /// next-hash covers the entire hash space (one-record zone).
    pub fn hash_in_range(&self, h: &str, owner: &str, next: &str) -> Result<bool, DnssecErrorKind> {
        use std::cmp::Ordering::*;

        let owner_next = self.compare_hashes(owner, next)?;
        if owner_next == Equal {
            return Ok(true);
        }

        let h_owner = self.compare_hashes(h, owner)?;
        let h_next = self.compare_hashes(h, next)?;

        if owner_next == Less {
            // No wrap: owner < next. In range iff owner < h <= next.
            Ok(h_owner == Greater && h_next != Greater)
        } else {
            // Wrap: owner > next. In range iff h > owner OR h <= next.
            Ok(h_owner == Greater || h_next != Greater)
        }
    }

    /// True iff some NSEC3 in `records` covers `h` (spec §4.3). Each
    /// record's own hashed owner name must be supplied alongside it since
    /// NSEC3 records don't carry their own owner hash in their rdata.
    pub fn covers(&self, records: &[(String, &Nsec3)], h: &str) -> Result<bool, DnssecErrorKind> {
        Ok(self.covering_owner(records, h)?.is_some())
    }

    /// Same as [`Nsec3HashEngine::covers`], but returns the covering
    /// record's owner hash label rather than a bare bool — callers that
    /// need to locate and authenticate the covering RRset (spec §4.4.1)
    /// need to know which record matched, not just that one did.
    pub fn covering_owner(&self, records: &[(String, &Nsec3)], h: &str) -> Result<Option<String>, DnssecErrorKind> {
        for (owner_hash, record) in records {
            let next_hash = base32hex_encode(&record.next_hashed_owner_name);
            if self.hash_in_range(h, owner_hash, &next_hash)? {
                return Ok(Some(owner_hash.clone()));
            }
        }
        Ok(None)
    }

    /// Same as [`Nsec3HashEngine::covers`] but restricted to records with
    /// the Opt-Out flag set (RFC 5155 §6.3 / spec §4.5.2), used to
    /// downgrade an otherwise-Bogus gap to Insecure.
    pub fn covers_with_opt_out(
        &self,
        records: &[(String, &Nsec3)],
        h: &str,
    ) -> Result<bool, DnssecErrorKind> {
        for (owner_hash, record) in records {
            if !record.opt_out() {
                continue;
            }
            let next_hash = base32hex_encode(&record.next_hashed_owner_name);
            if self.hash_in_range(h, owner_hash, &next_hash)? {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_deterministic_and_case_insensitive_on_input() {
        let engine = Nsec3HashEngine::new();
        let lower = Name::parse("example.com").unwrap();
        let upper = Name::parse("EXAMPLE.COM").unwrap();
        let h1 = engine.hash(&lower, 1, &[], 0).unwrap();
        let h2 = engine.hash(&upper, 1, &[], 0).unwrap();
        assert_eq!(h1, h2);
    }

    #[test]
    fn unsupported_algorithm_is_rejected() {
        let engine = Nsec3HashEngine::new();
        let name = Name::parse("example.com").unwrap();
        assert!(engine.hash(&name, 2, &[], 0).is_err());
    }

    #[test]
    fn compare_is_antisymmetric() {
        let engine = Nsec3HashEngine::new();
        let a = "0000000000000000000000000000000000000000";
        let b = "vvvvvvvvvvvvvvvvvvvvvvvvvvvvvvvvvvvvvvvvvv";
        let ab = engine.compare_hashes(a, b).unwrap();
        let ba = engine.compare_hashes(b, a).unwrap();
        assert_ne!(ab, ba);
        assert_eq!(ab, std::cmp::Ordering::Less);
        assert_eq!(ba, std::cmp::Ordering::Greater);
    }

    #[test]
    fn hash_in_range_never_true_for_owner_itself() {
        let engine = Nsec3HashEngine::new();
        let owner = "ABCDEFGHIJKLMNOPQRSTUVABCDEFGHIJKLMNOPQRS";
        let next = "MBCDEFGHIJKLMNOPQRSTUVABCDEFGHIJKLMNOPQRS";
        assert!(!engine.hash_in_range(owner, owner, next).unwrap());
    }

    #[test]
    fn hash_in_range_matches_next_boundary() {
        let engine = Nsec3HashEngine::new();
        let owner = "A000000000000000000000000000000000000000";
        let next = "M000000000000000000000000000000000000000";
        assert!(engine.hash_in_range(next, owner, next).unwrap());
        assert!(!engine.hash_in_range(owner, owner, next).unwrap());
    }

    #[test]
    fn hash_in_range_wraps_at_end_of_zone() {
        let engine = Nsec3HashEngine::new();
        // owner ("T...") > next ("0...") represents the last NSEC3 in a zone.
        let owner = "T000000000000000000000000000000000000000";
        let next = "000000000000000000000000000000000000000";
        let beyond_owner = "U000000000000000000000000000000000000000";
        assert!(engine.hash_in_range(beyond_owner, owner, next).unwrap());
        assert!(engine.hash_in_range(next, owner, next).unwrap());
        let far_from_both = "IIIIIIIIIIIIIIIIIIIIIIIIIIIIIIIIIIIIIIIII";
        assert!(!engine.hash_in_range(far_from_both, owner, next).unwrap());
    }

    #[test]
    fn single_record_covers_whole_space_when_owner_equals_next() {
        let engine = Nsec3HashEngine::new();
        let owner = "ABCABCABCABCABCABCABCABCABCABCABCABCABCABC";
        assert!(engine.hash_in_range("0000000000000000000000000000000000000000", owner, owner).unwrap());
        assert!(engine.hash_in_range("VVVVVVVVVVVVVVVVVVVVVVVVVVVVVVVVVVVVVVVVVV", owner, owner).unwrap());
    }

    #[test]
    fn base32hex_roundtrip() {
        let data = b"hello nsec3";
        let encoded = base32hex_encode(data);
        let decoded = base32hex_decode(&encoded).unwrap();
        assert_eq!(decoded, data);
    }
}
