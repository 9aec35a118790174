use dnssec_validator_domain::{DnssecErrorKind, Name, Nsec3, RecordType, ResourceRecord, ValidationOutcome};

use crate::env::ValidationEnv;
use crate::services::QueryBudget;
use crate::verifier::verify_rrset;

/// Parses every NSEC record out of `authority`, paired with its owner name.
pub(crate) fn parsed_nsec(authority: &[ResourceRecord]) -> Vec<(Name, dnssec_validator_domain::Nsec)> {
    authority
        .iter()
        .filter(|rr| rr.rtype == RecordType::Nsec)
        .filter_map(|rr| {
            dnssec_validator_domain::Nsec::parse(&rr.rdata)
                .ok()
                .map(|nsec| (rr.name.clone(), nsec))
        })
        .collect()
}

/// Parses every NSEC3 record out of `authority`, paired with its owner
/// name's first label (the base32hex hash) lowercased-to-uppercase as
/// RFC 5155 §1 canonical form.
pub(crate) fn parsed_nsec3(authority: &[ResourceRecord]) -> Vec<(String, Nsec3)> {
    authority
        .iter()
        .filter(|rr| rr.rtype == RecordType::Nsec3)
        .filter_map(|rr| {
            let hash = owner_hash_label(&rr.name)?;
            Nsec3::parse(&rr.rdata).ok().map(|nsec3| (hash, nsec3))
        })
        .collect()
}

pub(crate) fn owner_hash_label(name: &Name) -> Option<String> {
    name.as_str().split('.').next().map(|s| s.to_ascii_uppercase())
}

/// RFC 4034 §4/§5.4: an NSEC chain proves `name` doesn't exist when some
/// NSEC's (owner, next] range covers it in canonical order. Returns the
/// covering record's owner name so callers that need to locate and
/// authenticate the covering RRset (spec §4.4.1) know which one matched.
pub(crate) fn find_covering_nsec(
    records: &[(Name, dnssec_validator_domain::Nsec)],
    name: &Name,
) -> Option<Name> {
    records
        .iter()
        .find(|(owner, nsec)| {
            use std::cmp::Ordering::*;
            let owner_next = owner.canonical_cmp(&nsec.next_owner_name);
            let name_owner = name.canonical_cmp(owner);
            let name_next = name.canonical_cmp(&nsec.next_owner_name);
            match owner_next {
                Less => name_owner == Greater && name_next == Less,
                Greater => name_owner == Greater || name_next == Less,
                Equal => true,
            }
        })
        .map(|(owner, _)| owner.clone())
}

/// RFC 4034 §4/§5.4: an NSEC chain proves `name` doesn't exist when some
/// NSEC's (owner, next] range covers it in canonical order.
fn nsec_covers(records: &[(Name, dnssec_validator_domain::Nsec)], name: &Name) -> bool {
    find_covering_nsec(records, name).is_some()
}

/// Checks preconditions shared by every NSEC3 proof (spec §4.5.2): the
/// iteration ceiling and mutual (algorithm, salt, iterations) agreement.
pub(crate) fn check_nsec3_preconditions(
    env: &ValidationEnv<'_>,
    records: &[(String, Nsec3)],
) -> Result<(), DnssecErrorKind> {
    let Some((_, first)) = records.first() else {
        return Ok(());
    };
    if first.iterations > env.config.max_nsec3_iterations {
        return Err(DnssecErrorKind::Nsec3IterationsTooHigh {
            actual: first.iterations,
            max: env.config.max_nsec3_iterations,
        });
    }
    if first.hash_algorithm != 1 {
        return Err(DnssecErrorKind::UnsupportedAlgorithm(first.hash_algorithm));
    }
    for (_, record) in records {
        if record.iterations > env.config.max_nsec3_iterations {
            return Err(DnssecErrorKind::Nsec3IterationsTooHigh {
                actual: record.iterations,
                max: env.config.max_nsec3_iterations,
            });
        }
        if record.hash_algorithm != first.hash_algorithm
            || record.salt != first.salt
            || record.iterations != first.iterations
        {
            return Err(DnssecErrorKind::InconsistentNsec3Parameters);
        }
    }
    Ok(())
}

/// Walks ancestors of `name` looking for the closest encloser: the
/// deepest ancestor whose hash matches some NSEC3 owner label exactly
/// (spec §4.5.2 step 1). Stops at the zone apex (root-guarded by
/// `Name::ancestors_inclusive` already terminating at the root).
fn find_closest_encloser(
    env: &ValidationEnv<'_>,
    records: &[(String, Nsec3)],
    name: &Name,
    alg: u8,
    salt: &[u8],
    iterations: u16,
) -> Result<Option<Name>, DnssecErrorKind> {
    for ancestor in name.ancestors_inclusive() {
        let hash = env.nsec3.hash(&ancestor, alg, salt, iterations)?;
        if records.iter().any(|(owner_hash, _)| owner_hash == &hash) {
            return Ok(Some(ancestor));
        }
    }
    Ok(None)
}

/// NXDOMAIN / NODATA outcome for one NSEC3-covered negative response
/// (RFC 5155, spec §4.5.2). Requires the authority-section NSEC3 RRset to
/// have already been cryptographically verified by the caller — this
/// function only tests the denial-of-existence proof shape.
pub fn prove_nsec3(
    env: &ValidationEnv<'_>,
    authority: &[ResourceRecord],
    question_name: &Name,
    question_type: RecordType,
    is_nxdomain: bool,
) -> Result<ValidationOutcome, DnssecErrorKind> {
    let records = parsed_nsec3(authority);
    if records.is_empty() {
        return Ok(ValidationOutcome::Insecure);
    }
    check_nsec3_preconditions(env, &records)?;
    let (_, sample) = &records[0];
    let (alg, salt, iterations) = (sample.hash_algorithm, sample.salt.clone(), sample.iterations);

    let name_hash = env.nsec3.hash(question_name, alg, &salt, iterations)?;

    if is_nxdomain {
        let closest_encloser =
            find_closest_encloser(env, &records, question_name, alg, &salt, iterations)?.ok_or_else(|| {
                DnssecErrorKind::DenialProofInvalid(format!("no closest encloser found for {question_name}"))
            })?;

        // Next-closer name: one label below the closest encloser, taken
        // from the query name itself.
        let query_labels = question_name.label_count();
        let encloser_labels = closest_encloser.label_count();
        if query_labels <= encloser_labels {
            // closest encloser is the query name itself: not a valid NXDOMAIN shape.
            return Err(DnssecErrorKind::WildcardProofMissing);
        }
        let next_closer = question_name
            .ancestors_inclusive()
            .into_iter()
            .find(|n| n.label_count() == encloser_labels + 1)
            .ok_or(DnssecErrorKind::WildcardProofMissing)?;
        let next_closer_hash = env.nsec3.hash(&next_closer, alg, &salt, iterations)?;

        if env.nsec3.covers_with_opt_out(&as_refs(&records), &next_closer_hash)? {
            return Ok(ValidationOutcome::Insecure);
        }
        if !env.nsec3.covers(&as_refs(&records), &next_closer_hash)? {
            return Err(DnssecErrorKind::WildcardProofMissing);
        }

        let wildcard_hash = env.nsec3.hash(&closest_encloser.wildcard(), alg, &salt, iterations)?;
        if !env.nsec3.covers(&as_refs(&records), &wildcard_hash)? {
            return Err(DnssecErrorKind::WildcardProofMissing);
        }

        Ok(ValidationOutcome::Secure)
    } else {
        // NODATA: direct match first.
        if let Some((_, record)) = records.iter().find(|(owner_hash, _)| owner_hash == &name_hash) {
            return if record.type_bitmap.contains(question_type.to_u16()) {
                Err(DnssecErrorKind::DenialProofInvalid(format!(
                    "NSEC3 owner for {question_name} lists type {question_type} as present"
                )))
            } else {
                Ok(ValidationOutcome::Secure)
            };
        }

        // Wildcard NODATA: closest encloser + *.encloser match.
        if let Some(closest_encloser) =
            find_closest_encloser(env, &records, question_name, alg, &salt, iterations)?
        {
            let wildcard_hash =
                env.nsec3.hash(&closest_encloser.wildcard(), alg, &salt, iterations)?;
            if let Some((_, record)) = records.iter().find(|(owner_hash, _)| owner_hash == &wildcard_hash) {
                return if record.type_bitmap.contains(question_type.to_u16()) {
                    Err(DnssecErrorKind::DenialProofInvalid(format!(
                        "NSEC3 wildcard owner for {question_name} lists type {question_type} as present"
                    )))
                } else {
                    Ok(ValidationOutcome::Secure)
                };
            }
        }

        // DS-specific Opt-Out escape hatch (spec §4.5.2).
        if question_type == RecordType::Ds
            && env.nsec3.covers_with_opt_out(&as_refs(&records), &name_hash)?
        {
            return Ok(ValidationOutcome::Insecure);
        }

        Err(DnssecErrorKind::DenialProofInvalid(format!(
            "no NSEC3 record proves NODATA for {question_name}"
        )))
    }
}

pub(crate) fn as_refs(records: &[(String, Nsec3)]) -> Vec<(String, &Nsec3)> {
    records.iter().map(|(hash, record)| (hash.clone(), record)).collect()
}

/// NXDOMAIN / NODATA outcome for one NSEC-covered negative response
/// (RFC 4035 §5.4, spec §4.5.1).
pub fn prove_nsec(
    authority: &[ResourceRecord],
    question_name: &Name,
    question_type: RecordType,
    is_nxdomain: bool,
) -> Result<ValidationOutcome, DnssecErrorKind> {
    let records = parsed_nsec(authority);
    if records.is_empty() {
        return Ok(ValidationOutcome::Insecure);
    }

    if is_nxdomain {
        if nsec_covers(&records, question_name) {
            Ok(ValidationOutcome::Secure)
        } else {
            Err(DnssecErrorKind::WildcardProofMissing)
        }
    } else {
        let exact = records.iter().find(|(owner, _)| owner == question_name);
        match exact {
            Some((_, nsec)) if !nsec.type_bitmap.contains(question_type.to_u16()) => {
                Ok(ValidationOutcome::Secure)
            }
            Some(_) => Err(DnssecErrorKind::DenialProofInvalid(format!(
                "NSEC owner for {question_name} lists type {question_type} as present"
            ))),
            None => Err(DnssecErrorKind::DenialProofInvalid(format!(
                "no NSEC record at {question_name} proves NODATA"
            ))),
        }
    }
}

/// Top-level denial-of-existence entry point (spec §4.5, C5). Verifies the
/// authority-section RRsets as a unit first (no signatures ⇒ Insecure,
/// per §4.5 step 1), then dispatches to NSEC or NSEC3 proof construction.
pub async fn prove_denial(
    env: &ValidationEnv<'_>,
    budget: QueryBudget,
    authority: &[ResourceRecord],
    question_name: &Name,
    question_type: RecordType,
    is_nxdomain: bool,
) -> (ValidationOutcome, QueryBudget) {
    let rrsigs: Vec<ResourceRecord> = authority
        .iter()
        .filter(|rr| rr.rtype == RecordType::Rrsig)
        .cloned()
        .collect();

    let mut owners: Vec<(Name, RecordType)> = Vec::new();
    for rr in authority {
        if rr.rtype == RecordType::Rrsig {
            continue;
        }
        let key = (rr.name.clone(), rr.rtype);
        if !owners.contains(&key) {
            owners.push(key);
        }
    }

    let mut budget = budget;
    let mut outcomes = Vec::new();
    for (owner, rtype) in &owners {
        let rrset: Vec<ResourceRecord> = authority
            .iter()
            .filter(|rr| rr.name == *owner && rr.rtype == *rtype)
            .cloned()
            .collect();
        let (outcome, next_budget) =
            verify_rrset(env, budget, owner, *rtype, &rrset, &rrsigs, &[], authority, question_name).await;
        budget = next_budget;
        outcomes.push(outcome);
    }

    let authority_outcome = if outcomes.is_empty() {
        ValidationOutcome::Insecure
    } else {
        ValidationOutcome::combine_answer(outcomes)
    };

    match authority_outcome {
        ValidationOutcome::Bogus | ValidationOutcome::Indeterminate => {
            return (authority_outcome, budget);
        }
        _ => {}
    }

    let has_nsec3 = authority.iter().any(|rr| rr.rtype == RecordType::Nsec3);
    let has_nsec = authority.iter().any(|rr| rr.rtype == RecordType::Nsec);

    let proof = if has_nsec3 {
        prove_nsec3(env, authority, question_name, question_type, is_nxdomain)
    } else if has_nsec {
        prove_nsec(authority, question_name, question_type, is_nxdomain)
    } else {
        Ok(ValidationOutcome::Insecure)
    };

    let outcome = match proof {
        Ok(outcome) => outcome,
        Err(err) => match err.recovery() {
            dnssec_validator_domain::Recovery::Insecure => ValidationOutcome::Insecure,
            dnssec_validator_domain::Recovery::Bogus => ValidationOutcome::Bogus,
            dnssec_validator_domain::Recovery::Indeterminate => ValidationOutcome::Indeterminate,
        },
    };

    // The proof's own cryptographic standing can only weaken the
    // authority-section result, never strengthen an already-broken one.
    let final_outcome = match (authority_outcome, outcome) {
        (ValidationOutcome::Secure, proof_outcome) => proof_outcome,
        (weaker, _) => weaker,
    };

    (final_outcome, budget)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nsec_covers_simple_gap() {
        let owner = Name::parse("a.example.com").unwrap();
        let next = Name::parse("z.example.com").unwrap();
        let nsec = dnssec_validator_domain::Nsec {
            next_owner_name: next,
            type_bitmap: dnssec_validator_domain::TypeBitmap::parse(&[0, 1, 0]).unwrap(),
        };
        let records = vec![(owner, nsec)];
        let covered = Name::parse("m.example.com").unwrap();
        let uncovered = Name::parse("zz.example.com").unwrap();
        assert!(nsec_covers(&records, &covered));
        assert!(!nsec_covers(&records, &uncovered));
    }

    #[test]
    fn nsec_covers_wraparound_at_end_of_zone() {
        let owner = Name::parse("z.example.com").unwrap();
        let next = Name::parse("a.example.com").unwrap();
        let nsec = dnssec_validator_domain::Nsec {
            next_owner_name: next,
            type_bitmap: dnssec_validator_domain::TypeBitmap::parse(&[0, 1, 0]).unwrap(),
        };
        let records = vec![(owner, nsec)];
        let wrapped = Name::parse("zz.example.com").unwrap();
        assert!(nsec_covers(&records, &wrapped));
    }
}
