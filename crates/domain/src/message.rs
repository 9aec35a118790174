use std::fmt;

use crate::dnssec::Name;

/// Record types the validator needs to reason about directly. Everything
/// else a response may carry (A, AAAA, MX, TXT, ...) is opaque payload as
/// far as DNSSEC is concerned and is represented as `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordType {
    Ns,
    Cname,
    Soa,
    Ds,
    Rrsig,
    Nsec,
    Dnskey,
    Nsec3,
    Nsec3Param,
    Other(u16),
}

impl RecordType {
    pub fn from_u16(value: u16) -> Self {
        match value {
            2 => Self::Ns,
            5 => Self::Cname,
            6 => Self::Soa,
            43 => Self::Ds,
            46 => Self::Rrsig,
            47 => Self::Nsec,
            48 => Self::Dnskey,
            50 => Self::Nsec3,
            51 => Self::Nsec3Param,
            other => Self::Other(other),
        }
    }

    pub fn to_u16(self) -> u16 {
        match self {
            Self::Ns => 2,
            Self::Cname => 5,
            Self::Soa => 6,
            Self::Ds => 43,
            Self::Rrsig => 46,
            Self::Nsec => 47,
            Self::Dnskey => 48,
            Self::Nsec3 => 50,
            Self::Nsec3Param => 51,
            Self::Other(v) => v,
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ns => write!(f, "NS"),
            Self::Cname => write!(f, "CNAME"),
            Self::Soa => write!(f, "SOA"),
            Self::Ds => write!(f, "DS"),
            Self::Rrsig => write!(f, "RRSIG"),
            Self::Nsec => write!(f, "NSEC"),
            Self::Dnskey => write!(f, "DNSKEY"),
            Self::Nsec3 => write!(f, "NSEC3"),
            Self::Nsec3Param => write!(f, "NSEC3PARAM"),
            Self::Other(v) => write!(f, "TYPE{v}"),
        }
    }
}

/// Response code, narrowed to the values the dispatcher branches on
/// (spec §4.7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rcode {
    NoError,
    NxDomain,
    Other(u16),
}

impl Rcode {
    pub fn from_u16(value: u16) -> Self {
        match value {
            0 => Self::NoError,
            3 => Self::NxDomain,
            other => Self::Other(other),
        }
    }
}

/// One resource record as handed to the validator by the upstream
/// resolver: name/type/class/ttl plus undecoded rdata. DNSSEC-relevant
/// rdata (RRSIG, DNSKEY, DS, NSEC, NSEC3, NSEC3PARAM) is parsed lazily by
/// the verifier via [`crate::dnssec::records`], since most records in a
/// section are never inspected at that granularity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRecord {
    pub name: Name,
    pub rtype: RecordType,
    pub class: u16,
    pub ttl: u32,
    pub rdata: Vec<u8>,
}

impl ResourceRecord {
    pub fn new(name: Name, rtype: RecordType, class: u16, ttl: u32, rdata: Vec<u8>) -> Self {
        Self {
            name,
            rtype,
            class,
            ttl,
            rdata,
        }
    }
}

/// The question the response answers, carried alongside it so the
/// dispatcher and denial-of-existence prover can compare against the
/// original query name without threading it separately.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub name: Name,
    pub qtype: RecordType,
}

/// A DNS response in the shape the validator needs: sections of already
/// decoded resource records plus the rcode and original question. Framing,
/// compression, and non-DNSSEC rdata decoding are assumed to have already
/// happened upstream of this boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub rcode: Rcode,
    pub question: Question,
    pub answer: Vec<ResourceRecord>,
    pub authority: Vec<ResourceRecord>,
    pub additional: Vec<ResourceRecord>,
}

impl Message {
    /// All records of one `rtype` from every section, in original order,
    /// used by the verifier when hunting for RRSIGs/DNSKEYs wherever they
    /// landed (authority or additional, depending on query type).
    pub fn records_of_type(&self, rtype: RecordType) -> impl Iterator<Item = &ResourceRecord> {
        self.answer
            .iter()
            .chain(self.authority.iter())
            .chain(self.additional.iter())
            .filter(move |rr| rr.rtype == rtype)
    }

    pub fn has_any_rrsig(&self) -> bool {
        self.records_of_type(RecordType::Rrsig).next().is_some()
    }

    /// A "Success with empty answer" response, i.e. NODATA (spec §4.5).
    pub fn is_nodata(&self) -> bool {
        self.rcode == Rcode::NoError && self.answer.is_empty()
    }

    pub fn is_nxdomain(&self) -> bool {
        self.rcode == Rcode::NxDomain
    }
}

/// Builds the canonical signed-data octet stream an RRSIG covers (RFC 4034
/// §3.1.8.1): the RRSIG_RDATA (without the signature field, supplied
/// separately by [`crate::dnssec::Rrsig::signed_data_prefix`]) followed by
/// every record in the RRset, each re-owned under `owner` (the literal
/// wildcard name when the RRset was synthesised, RFC 4035 §5.3.4) and
/// sorted into canonical RRset order.
///
/// Per-record rdata is treated as already in canonical wire form — the
/// typed-record layer that hands records to the validator is responsible
/// for lowercasing any embedded names before this point (spec §1's
/// "parsing and canonical wire-encoding of DNS records" boundary).
pub fn canonical_rrset_bytes(records: &[ResourceRecord], owner: &Name, original_ttl: u32) -> Vec<u8> {
    let owner_wire = owner.to_wire();
    let mut encoded: Vec<Vec<u8>> = records
        .iter()
        .map(|rr| {
            let mut one = Vec::with_capacity(owner_wire.len() + 10 + rr.rdata.len());
            one.extend_from_slice(&owner_wire);
            one.extend_from_slice(&rr.rtype.to_u16().to_be_bytes());
            one.extend_from_slice(&rr.class.to_be_bytes());
            one.extend_from_slice(&original_ttl.to_be_bytes());
            one.extend_from_slice(&(rr.rdata.len() as u16).to_be_bytes());
            one.extend_from_slice(&rr.rdata);
            one
        })
        .collect();
    // RFC 4034 §6.3: canonical RRset order sorts by rdata octets, with
    // (owner/type/class/ttl) identical across the set by construction.
    encoded.sort_by(|a, b| {
        let a_rdata = &a[owner_wire.len() + 10..];
        let b_rdata = &b[owner_wire.len() + 10..];
        a_rdata.cmp(b_rdata)
    });
    encoded.concat()
}
