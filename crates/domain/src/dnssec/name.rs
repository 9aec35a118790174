use super::error_kind::DnssecErrorKind;

/// A fully-qualified DNS name, stored canonicalized (ASCII-lowercase,
/// trailing root dot) so comparisons never need to special-case case
/// folding (RFC 4034 §6.1, RFC 4035 §5.3.4).
///
/// Wire encode/decode follows the same label-walking shape as the
/// teacher's `RrsigRecord::parse_dns_name`, generalized to a reusable type
/// instead of a one-off private helper.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Name {
    canonical: String,
    labels: Vec<String>,
}

impl Name {
    /// Builds a `Name` from presentation format, lower-casing and ensuring
    /// a trailing root dot.
    pub fn parse(text: &str) -> Result<Self, DnssecErrorKind> {
        let trimmed = text.trim_end_matches('.');
        let labels: Vec<String> = if trimmed.is_empty() {
            Vec::new()
        } else {
            trimmed
                .split('.')
                .map(|label| {
                    if label.is_empty() || label.len() > 63 {
                        Err(DnssecErrorKind::Malformed(format!(
                            "invalid label in name {text:?}"
                        )))
                    } else {
                        Ok(label.to_ascii_lowercase())
                    }
                })
                .collect::<Result<_, _>>()?
        };
        Ok(Self::from_labels(labels))
    }

    fn from_labels(labels: Vec<String>) -> Self {
        let canonical = if labels.is_empty() {
            ".".to_string()
        } else {
            format!("{}.", labels.join("."))
        };
        Self { canonical, labels }
    }

    pub fn root() -> Self {
        Self::from_labels(Vec::new())
    }

    /// Parses a DNS name in wire format starting at `data[0]`.
    ///
    /// Returns the name and the number of bytes consumed. Compression
    /// pointers are rejected rather than followed: RRSIG signer names and
    /// NSEC/NSEC3 owner names inside an authenticated RRset are never
    /// compressed relative to the section being validated, and accepting a
    /// pointer here would require carrying the whole message around this
    /// type just to resolve it.
    pub fn from_wire(data: &[u8]) -> Result<(Self, usize), DnssecErrorKind> {
        let mut labels = Vec::new();
        let mut pos = 0;

        loop {
            if pos >= data.len() {
                return Err(DnssecErrorKind::Malformed("DNS name truncated".into()));
            }

            let len = data[pos] as usize;
            if len & 0xC0 == 0xC0 {
                return Err(DnssecErrorKind::Malformed(
                    "compressed name not allowed in DNSSEC record data".into(),
                ));
            }
            pos += 1;

            if len == 0 {
                break;
            }
            if len > 63 {
                return Err(DnssecErrorKind::Malformed("invalid DNS label length".into()));
            }
            if pos + len > data.len() {
                return Err(DnssecErrorKind::Malformed("DNS label truncated".into()));
            }

            let label = String::from_utf8_lossy(&data[pos..pos + len]).to_ascii_lowercase();
            labels.push(label);
            pos += len;
        }

        Ok((Self::from_labels(labels), pos))
    }

    /// Encodes to wire format (uncompressed, as required for RRSIG/NSEC(3)
    /// rdata in RFC 4034 §6.2 canonical form).
    pub fn to_wire(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for label in &self.labels {
            out.push(label.len() as u8);
            out.extend_from_slice(label.as_bytes());
        }
        out.push(0);
        out
    }

    pub fn as_str(&self) -> &str {
        &self.canonical
    }

    pub fn label_count(&self) -> u8 {
        self.labels.len() as u8
    }

    pub fn is_root(&self) -> bool {
        self.labels.is_empty()
    }

    /// The immediate parent name, or `None` for the root.
    pub fn parent(&self) -> Option<Self> {
        if self.labels.is_empty() {
            None
        } else {
            Some(Self::from_labels(self.labels[1..].to_vec()))
        }
    }

    /// Walks ancestor names from `self` up to (and including) the root,
    /// used by the chain walker to enumerate zone cuts (spec §4.6).
    pub fn ancestors_inclusive(&self) -> Vec<Self> {
        let mut out = Vec::with_capacity(self.labels.len() + 1);
        let mut current = self.clone();
        loop {
            let is_root = current.is_root();
            out.push(current.clone());
            if is_root {
                break;
            }
            current = current.parent().expect("non-root name has a parent");
        }
        out
    }

    /// True if `self` is equal to or a subdomain of `other` (RFC 4035
    /// §2.3's bailiwick check: a signer name must cover the RRset owner).
    pub fn is_subdomain_of(&self, other: &Self) -> bool {
        if other.labels.len() > self.labels.len() {
            return false;
        }
        let offset = self.labels.len() - other.labels.len();
        self.labels[offset..] == other.labels[..]
    }

    /// Builds `*.<self>`, the wildcard name used to re-derive a wildcard
    /// RRSIG's original owner per RFC 4035 §5.3.4.
    pub fn wildcard(&self) -> Self {
        let mut labels = Vec::with_capacity(self.labels.len() + 1);
        labels.push("*".to_string());
        labels.extend(self.labels.iter().cloned());
        Self::from_labels(labels)
    }

    /// RFC 4034 §6.1 canonical wire comparison, used to sort RRsets before
    /// hashing and to order NSEC/NSEC3 owner ranges.
    pub fn canonical_cmp(&self, other: &Self) -> std::cmp::Ordering {
        // Canonical ordering compares the label sequence right-to-left
        // (least significant label first), each label compared
        // byte-by-byte as if uppercase letters were lowercased (already
        // true here since both names are stored lower-cased).
        let mut a = self.labels.iter().rev();
        let mut b = other.labels.iter().rev();
        loop {
            match (a.next(), b.next()) {
                (None, None) => return std::cmp::Ordering::Equal,
                (None, Some(_)) => return std::cmp::Ordering::Less,
                (Some(_), None) => return std::cmp::Ordering::Greater,
                (Some(la), Some(lb)) => {
                    let ord = la.as_bytes().cmp(lb.as_bytes());
                    if ord != std::cmp::Ordering::Equal {
                        return ord;
                    }
                }
            }
        }
    }
}

impl std::fmt::Display for Name {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.canonical)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_lowercases_and_adds_root_dot() {
        let n = Name::parse("Example.COM").unwrap();
        assert_eq!(n.as_str(), "example.com.");
    }

    #[test]
    fn wire_roundtrip() {
        let n = Name::parse("www.example.com").unwrap();
        let wire = n.to_wire();
        let (decoded, consumed) = Name::from_wire(&wire).unwrap();
        assert_eq!(decoded, n);
        assert_eq!(consumed, wire.len());
    }

    #[test]
    fn compressed_name_is_rejected() {
        let wire = [0xC0, 0x0C];
        assert!(Name::from_wire(&wire).is_err());
    }

    #[test]
    fn bailiwick_check() {
        let owner = Name::parse("www.example.com").unwrap();
        let signer = Name::parse("example.com").unwrap();
        let outsider = Name::parse("example.net").unwrap();
        assert!(owner.is_subdomain_of(&signer));
        assert!(!owner.is_subdomain_of(&outsider));
        assert!(signer.is_subdomain_of(&signer));
    }

    #[test]
    fn wildcard_construction() {
        let owner = Name::parse("example.com").unwrap();
        assert_eq!(owner.wildcard().as_str(), "*.example.com.");
    }

    #[test]
    fn ancestors_reach_root() {
        let name = Name::parse("a.b.example.com").unwrap();
        let ancestors = name.ancestors_inclusive();
        assert_eq!(
            ancestors.iter().map(Name::to_string).collect::<Vec<_>>(),
            vec![
                "a.b.example.com.",
                "b.example.com.",
                "example.com.",
                "com.",
                ".",
            ]
        );
    }

    #[test]
    fn canonical_ordering_is_right_to_left() {
        let a = Name::parse("a.example").unwrap();
        let z = Name::parse("z.example").unwrap();
        let b_sub = Name::parse("a.b.example").unwrap();
        assert_eq!(a.canonical_cmp(&z), std::cmp::Ordering::Less);
        // "a.example" < "a.b.example" because the owner has fewer labels
        // once the shared rightmost labels compare equal.
        assert_eq!(a.canonical_cmp(&b_sub), std::cmp::Ordering::Less);
    }
}
