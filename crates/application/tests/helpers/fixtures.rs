#![allow(dead_code)]

//! Shared fixtures for end-to-end validation tests: a fake upstream
//! resolver keyed by (name, qtype) and a fake crypto provider whose
//! "signature" and "digest" are trivial, letting tests exercise the
//! chain-walking and denial-of-existence orchestration without real
//! asymmetric crypto.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use dnssec_validator_application::ports::CryptoProvider;
use dnssec_validator_application::ports::UpstreamResolver;
use dnssec_validator_domain::{
    DigestType, DnssecAlgorithm, DnssecErrorKind, Dnskey, DomainError, Message, Name, Question,
    Rcode, RecordType, ResourceRecord, Rrsig,
};

/// Always succeeds, always verifies. Lets tests describe chain-of-trust
/// shapes (which DS points at which DNSKEY, which RRSIG covers which
/// RRset) without constructing real key material.
#[derive(Debug, Default)]
pub struct FakeCrypto;

impl CryptoProvider for FakeCrypto {
    fn verify_signature(
        &self,
        _algorithm: DnssecAlgorithm,
        _public_key: &[u8],
        _signed_data: &[u8],
        signature: &[u8],
    ) -> Result<bool, DnssecErrorKind> {
        // A signature of exactly one byte 0x00 simulates a forged/invalid
        // signature; anything else "verifies".
        Ok(signature != [0x00])
    }

    fn digest(&self, _digest_type: DigestType, data: &[u8]) -> Result<Vec<u8>, DnssecErrorKind> {
        // Not cryptographic: just enough structure for a DS record to
        // either "match" or "not match" a DNSKEY in a test.
        Ok(data.to_vec())
    }
}

/// Keyed by (owner name, qtype), returning a canned [`Message`]. Panics if
/// a test exercises a query it didn't anticipate, which is preferable to
/// silently returning an empty/incorrect answer.
#[derive(Clone, Default)]
pub struct FakeResolver {
    responses: Arc<Mutex<HashMap<(Name, RecordType), Message>>>,
}

impl FakeResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, name: Name, qtype: RecordType, message: Message) {
        self.responses.lock().unwrap().insert((name, qtype), message);
    }
}

#[async_trait]
impl UpstreamResolver for FakeResolver {
    async fn resolve(&self, question: &Question) -> Result<Message, DomainError> {
        self.responses
            .lock()
            .unwrap()
            .get(&(question.name.clone(), question.qtype))
            .cloned()
            .ok_or(DomainError::NotFound)
    }
}

pub fn name(text: &str) -> Name {
    Name::parse(text).unwrap()
}

/// A self-signed DNSKEY RRset (one ZSK/KSK combined key, flags 257) plus
/// its covering RRSIG, as a ready-to-serve DNSKEY response for `zone`.
pub fn dnskey_response(zone: &Name, key_tag_seed: u8, now: u64) -> (Message, Dnskey) {
    let dnskey = Dnskey {
        flags: 257,
        protocol: 3,
        algorithm: DnssecAlgorithm::RsaSha256,
        public_key: vec![key_tag_seed; 8],
    };
    let dnskey_rr = ResourceRecord::new(zone.clone(), RecordType::Dnskey, 1, 3600, dnskey.to_wire());

    let rrsig = Rrsig {
        type_covered: RecordType::Dnskey.to_u16(),
        algorithm: DnssecAlgorithm::RsaSha256,
        labels: zone.label_count(),
        original_ttl: 3600,
        signature_expiration: (now + 100_000) as u32,
        signature_inception: now.saturating_sub(100_000) as u32,
        key_tag: dnskey.key_tag(),
        signer_name: zone.clone(),
        signature: vec![0xAB; 16],
    };
    let mut rrsig_rdata = rrsig.signed_data_prefix();
    rrsig_rdata.extend_from_slice(&rrsig.signature);
    let rrsig_rr = ResourceRecord::new(zone.clone(), RecordType::Rrsig, 1, 3600, rrsig_rdata);

    let message = Message {
        rcode: Rcode::NoError,
        question: Question {
            name: zone.clone(),
            qtype: RecordType::Dnskey,
        },
        answer: vec![dnskey_rr, rrsig_rr],
        authority: vec![],
        additional: vec![],
    };
    (message, dnskey)
}

/// A DS response for `zone` pointing at `child_key`, digested with
/// [`FakeCrypto::digest`] (the identity function), plus its covering
/// RRSIG signed by `signer` (the parent zone).
pub fn ds_response(zone: &Name, signer: &Name, child_key: &Dnskey, now: u64) -> Message {
    let mut digest_input = zone.to_wire();
    digest_input.extend_from_slice(&child_key.to_wire());

    let mut ds_rdata = Vec::new();
    ds_rdata.extend_from_slice(&child_key.key_tag().to_be_bytes());
    ds_rdata.push(child_key.algorithm.to_u8());
    ds_rdata.push(DigestType::Sha256.to_u8());
    ds_rdata.extend_from_slice(&digest_input);
    let ds_rr = ResourceRecord::new(zone.clone(), RecordType::Ds, 1, 3600, ds_rdata);

    let rrsig = Rrsig {
        type_covered: RecordType::Ds.to_u16(),
        algorithm: DnssecAlgorithm::RsaSha256,
        labels: zone.label_count(),
        original_ttl: 3600,
        signature_expiration: (now + 100_000) as u32,
        signature_inception: now.saturating_sub(100_000) as u32,
        key_tag: 1,
        signer_name: signer.clone(),
        signature: vec![0xCD; 16],
    };
    let mut rrsig_rdata = rrsig.signed_data_prefix();
    rrsig_rdata.extend_from_slice(&rrsig.signature);
    let rrsig_rr = ResourceRecord::new(zone.clone(), RecordType::Rrsig, 1, 3600, rrsig_rdata);

    Message {
        rcode: Rcode::NoError,
        question: Question {
            name: zone.clone(),
            qtype: RecordType::Ds,
        },
        answer: vec![ds_rr, rrsig_rr],
        authority: vec![],
        additional: vec![],
    }
}

/// Root trust anchor line matching the DNSKEY [`dnskey_response`] would
/// generate for the root zone with the same `key_tag_seed`.
pub fn root_trust_anchor_line(key_tag_seed: u8) -> String {
    let public_key = vec![key_tag_seed; 8];
    format!(". 257 3 8 {}", STANDARD.encode(public_key))
}

/// Builds an RRSIG resource record covering `rtype` at `owner`, signed by
/// `signer`, valid at `now`.
pub fn rrsig_rr(owner: &Name, rtype: RecordType, signer: &Name, key_tag: u16, now: u64) -> ResourceRecord {
    let rrsig = Rrsig {
        type_covered: rtype.to_u16(),
        algorithm: DnssecAlgorithm::RsaSha256,
        labels: owner.label_count(),
        original_ttl: 3600,
        signature_expiration: (now + 100_000) as u32,
        signature_inception: now.saturating_sub(100_000) as u32,
        key_tag,
        signer_name: signer.clone(),
        signature: vec![0xEF; 16],
    };
    let mut rdata = rrsig.signed_data_prefix();
    rdata.extend_from_slice(&rrsig.signature);
    ResourceRecord::new(owner.clone(), RecordType::Rrsig, 1, 3600, rdata)
}

/// A type bitmap encoding a single 256-type window covering the listed
/// types (RFC 4034 §4.1.2); sufficient for every type this crate cares about.
pub fn type_bitmap_wire(types: &[RecordType]) -> Vec<u8> {
    let mut window = [0u8; 32];
    for rtype in types {
        let t = rtype.to_u16();
        assert!(t < 256, "fixture only supports window 0");
        window[(t / 8) as usize] |= 0x80 >> (t % 8);
    }
    let mut last_used = 0usize;
    for (i, byte) in window.iter().enumerate() {
        if *byte != 0 {
            last_used = i + 1;
        }
    }
    let mut out = vec![0u8, last_used as u8];
    out.extend_from_slice(&window[..last_used]);
    out
}

pub fn nsec_rr(owner: &Name, next: &Name, types: &[RecordType]) -> ResourceRecord {
    let mut rdata = next.to_wire();
    rdata.extend_from_slice(&type_bitmap_wire(types));
    ResourceRecord::new(owner.clone(), RecordType::Nsec, 1, 3600, rdata)
}

#[allow(clippy::too_many_arguments)]
pub fn nsec3_rr(
    hashed_owner_label: &str,
    zone: &Name,
    iterations: u16,
    salt: &[u8],
    next_hashed: &[u8],
    opt_out: bool,
    types: &[RecordType],
) -> ResourceRecord {
    let owner = Name::parse(&format!("{hashed_owner_label}.{}", zone.as_str().trim_end_matches('.'))).unwrap();
    let mut rdata = vec![1u8, if opt_out { 1 } else { 0 }];
    rdata.extend_from_slice(&iterations.to_be_bytes());
    rdata.push(salt.len() as u8);
    rdata.extend_from_slice(salt);
    rdata.push(next_hashed.len() as u8);
    rdata.extend_from_slice(next_hashed);
    rdata.extend_from_slice(&type_bitmap_wire(types));
    ResourceRecord::new(owner, RecordType::Nsec3, 1, 3600, rdata)
}
