use std::collections::HashMap;

use base64::{engine::general_purpose::STANDARD, Engine};
use dnssec_validator_domain::{DnssecAlgorithm, DnssecErrorKind, Dnskey, Name};

/// A KSK DNSKEY pinned for a zone, trusted without further verification
/// (RFC 4033 §2, spec §3). Immutable once built into a [`TrustAnchorStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustAnchor {
    pub zone: Name,
    pub dnskey: Dnskey,
    pub key_tag: u16,
}

impl TrustAnchor {
    fn new(zone: Name, dnskey: Dnskey) -> Result<Self, DnssecErrorKind> {
        if !dnskey.is_secure_entry_point() {
            return Err(DnssecErrorKind::Malformed(format!(
                "trust anchor for {zone} is not a KSK (SEP flag unset)"
            )));
        }
        let key_tag = dnskey.key_tag();
        Ok(Self {
            zone,
            dnskey,
            key_tag,
        })
    }

    /// Matches an in-band DNSKEY by (key tag, algorithm, public key bytes),
    /// per spec §4.6's root validation step.
    pub fn matches(&self, candidate: &Dnskey) -> bool {
        self.key_tag == candidate.key_tag()
            && self.dnskey.algorithm == candidate.algorithm
            && self.dnskey.public_key == candidate.public_key
    }
}

/// Holds the KSKs trusted as the root(s) of the chain of trust, keyed by
/// zone. Read-only after construction (spec §3, §5): built once at
/// startup from configuration, with the compiled-in IANA root default as
/// a fallback when no anchors are configured.
#[derive(Debug, Clone)]
pub struct TrustAnchorStore {
    anchors: HashMap<Name, Vec<TrustAnchor>>,
}

impl TrustAnchorStore {
    /// Builds a store from explicit presentation-format DNSKEY lines
    /// (`"<zone> <flags> <protocol> <algorithm> <base64 key>"`, the IANA
    /// zone-file convention). Falls back to the compiled-in root KSK when
    /// `lines` is empty.
    pub fn new(lines: &[String]) -> Result<Self, DnssecErrorKind> {
        if lines.is_empty() {
            return Ok(Self::with_default_root());
        }

        let mut anchors: HashMap<Name, Vec<TrustAnchor>> = HashMap::new();
        for line in lines {
            let anchor = Self::parse_line(line)?;
            anchors.entry(anchor.zone.clone()).or_default().push(anchor);
        }
        Ok(Self { anchors })
    }

    /// The IANA root KSK-2017 (key tag 20326, RSA/SHA-256), compiled in as
    /// a constant per spec §6. Rotation requires a source update; no
    /// RFC 5011 automated trust-anchor update is implemented (spec §9
    /// explicitly leaves this open).
    ///
    /// TODO: add the 2024 root KSK rollover anchor (key tag 38696) once
    /// its public key bytes can be sourced and verified against
    /// IANA's root-anchors.xml rather than transcribed from memory.
    pub fn with_default_root() -> Self {
        let mut anchors = HashMap::new();
        anchors.insert(Name::root(), vec![Self::root_ksk_20326()]);
        Self { anchors }
    }

    pub fn empty() -> Self {
        Self {
            anchors: HashMap::new(),
        }
    }

    fn root_ksk_20326() -> TrustAnchor {
        let public_key_b64 = concat!(
            "AwEAAaz/tAm8yTn4Mfeh5eyI96WSVexTBAvkMgJzkKTOiW1vkIbzxeF3",
            "+/4RgWOq7HrxRixHlFlExOLAJr5emLvN7SWXgnLh4+B5xQlNVz8Og8kv",
            "ArMtNROxVQuCaSnIDdD5LKyWbRd2n9WGe2R8PzgCmr3EgVLrjyBxWezF",
            "0jLHwVN8efS3rCj/EWgvIWgb9tarpVUDK/b58Da+sqqls3eNbuv7pr+e",
            "oZG+SrDK6nWeL3c6H5Apxz7LjVc1uTIdsIXxuOLYA4/ilBmSVIzuDWfd",
            "RUfhHdY6+cn8HFRm+2hM8AnXGXws9555KrUB5qihylGa8subX2Nn6UwN",
            "R1AkUTV74bU="
        );
        let public_key = STANDARD
            .decode(public_key_b64)
            .expect("root KSK-2017 constant is valid base64");
        let dnskey = Dnskey {
            flags: 257,
            protocol: 3,
            algorithm: DnssecAlgorithm::RsaSha256,
            public_key,
        };
        TrustAnchor::new(Name::root(), dnskey).expect("root KSK-2017 constant has SEP set")
    }

    fn parse_line(line: &str) -> Result<TrustAnchor, DnssecErrorKind> {
        let fields: Vec<&str> = line.split_whitespace().collect();
        let [zone, flags, protocol, algorithm, key_b64] = fields.as_slice() else {
            return Err(DnssecErrorKind::Malformed(format!(
                "trust anchor line {line:?} must have 5 fields"
            )));
        };

        let zone = Name::parse(zone)?;
        let flags: u16 = flags
            .parse()
            .map_err(|_| DnssecErrorKind::Malformed(format!("invalid flags in {line:?}")))?;
        let protocol: u8 = protocol
            .parse()
            .map_err(|_| DnssecErrorKind::Malformed(format!("invalid protocol in {line:?}")))?;
        let algorithm: u8 = algorithm
            .parse()
            .map_err(|_| DnssecErrorKind::Malformed(format!("invalid algorithm in {line:?}")))?;
        let public_key = STANDARD
            .decode(key_b64)
            .map_err(|_| DnssecErrorKind::Malformed(format!("invalid base64 key in {line:?}")))?;

        let dnskey = Dnskey {
            flags,
            protocol,
            algorithm: DnssecAlgorithm::from_u8(algorithm),
            public_key,
        };
        TrustAnchor::new(zone, dnskey)
    }

    pub fn get(&self, zone: &Name) -> &[TrustAnchor] {
        self.anchors.get(zone).map_or(&[], Vec::as_slice)
    }

    pub fn has(&self, zone: &Name) -> bool {
        self.anchors.contains_key(zone)
    }

    pub fn add_line(&mut self, line: &str) -> Result<(), DnssecErrorKind> {
        let anchor = Self::parse_line(line)?;
        self.anchors.entry(anchor.zone.clone()).or_default().push(anchor);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_root_contains_ksk_20326() {
        let store = TrustAnchorStore::with_default_root();
        let anchors = store.get(&Name::root());
        assert_eq!(anchors.len(), 1);
        assert_eq!(anchors[0].key_tag, 20326);
        assert_eq!(anchors[0].dnskey.algorithm, DnssecAlgorithm::RsaSha256);
    }

    #[test]
    fn empty_lines_falls_back_to_default() {
        let store = TrustAnchorStore::new(&[]).unwrap();
        assert!(store.has(&Name::root()));
    }

    #[test]
    fn non_ksk_line_is_rejected() {
        // SEP bit (flags & 1) unset: flags=256 is a ZSK, not a valid anchor.
        let line = format!(
            ". 256 3 8 {}",
            STANDARD.encode([0xAAu8; 8])
        );
        let result = TrustAnchorStore::new(&[line]);
        assert!(result.is_err());
    }
}
