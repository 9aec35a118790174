use std::future::Future;
use std::pin::Pin;

use dnssec_validator_domain::{
    canonical_rrset_bytes, DnssecAlgorithm, DnssecErrorKind, Dnskey, Name, Question, RecordType,
    ResourceRecord, Rrsig, ValidationOutcome,
};

use crate::chain::zone_security;
use crate::env::ValidationEnv;
use crate::services::budget::QueryBudget;
use crate::services::gateway;

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The RRset verifier (spec §4.4, C4): given one RRset and the RRSIGs
/// found alongside it, decides whether it is authentically signed.
///
/// `self_dnskeys` short-circuits the DNSKEY lookup when `owner` and
/// `rtype` already *are* the DNSKEY RRset under verification (its own
/// RRSIGs are self-signed by a key drawn from the same set), avoiding an
/// unbounded recursive re-query of the zone's own keys.
#[allow(clippy::too_many_arguments)]
pub fn verify_rrset<'a>(
    env: &'a ValidationEnv<'a>,
    budget: QueryBudget,
    owner: &'a Name,
    rtype: RecordType,
    rrset: &'a [ResourceRecord],
    rrsigs: &'a [ResourceRecord],
    self_dnskeys: &'a [ResourceRecord],
    authority: &'a [ResourceRecord],
    question_name: &'a Name,
) -> BoxFuture<'a, (ValidationOutcome, QueryBudget)> {
    Box::pin(async move {
        let candidates: Vec<Rrsig> = rrsigs
            .iter()
            .filter_map(|rr| Rrsig::parse(&rr.rdata).ok())
            .filter(|rrsig| rrsig.type_covered == rtype.to_u16())
            .collect();

        if candidates.is_empty() {
            // No signature at all: legitimate only if the owning zone
            // doesn't sign its data (spec §4.4 step 3).
            let (zone_outcome, budget) = zone_security(env, budget, owner).await;
            let outcome = match zone_outcome {
                ValidationOutcome::Insecure => ValidationOutcome::Insecure,
                ValidationOutcome::Secure => ValidationOutcome::Bogus,
                other => other,
            };
            return (outcome, budget);
        }

        let mut sorted = candidates;
        sorted.sort_by_key(|rrsig| std::cmp::Reverse(rrsig.algorithm.strength()));

        let mut budget = budget;
        let mut attempts: Vec<Result<ValidationOutcome, DnssecErrorKind>> = Vec::new();

        for rrsig in &sorted {
            let (result, next_budget) = attempt_rrsig(
                env,
                budget,
                owner,
                rrset,
                rrsig,
                self_dnskeys,
                authority,
                question_name,
            )
            .await;
            budget = next_budget;
            if let Ok(ValidationOutcome::Secure) = result {
                env.metrics.record_validation(ValidationOutcome::Secure);
                return (ValidationOutcome::Secure, budget);
            }
            attempts.push(result);
        }

        let outcome = aggregate_attempts(attempts);
        (outcome, budget)
    })
}

/// Folds every failed RRSIG attempt into one outcome (spec §4.4 step 3,
/// §7): a hard cryptographic/structural failure anywhere is Bogus; a
/// network/budget/cancellation failure anywhere is Indeterminate (it
/// could have been the attempt that would have succeeded); only when
/// every attempt failed solely because its algorithm or digest is
/// unsupported does the whole RRset resolve to Insecure.
fn aggregate_attempts(attempts: Vec<Result<ValidationOutcome, DnssecErrorKind>>) -> ValidationOutcome {
    use dnssec_validator_domain::Recovery;

    let mut saw_bogus = false;
    let mut saw_indeterminate = false;
    let mut saw_insecure_chain = false;

    for attempt in attempts {
        match attempt {
            Ok(ValidationOutcome::Insecure) => saw_insecure_chain = true,
            Ok(ValidationOutcome::Secure) => unreachable!("Secure short-circuits before aggregation"),
            Ok(ValidationOutcome::Bogus) => saw_bogus = true,
            Ok(ValidationOutcome::Indeterminate) => saw_indeterminate = true,
            Err(err) => match err.recovery() {
                Recovery::Insecure => {}
                Recovery::Bogus => saw_bogus = true,
                Recovery::Indeterminate => saw_indeterminate = true,
            },
        }
    }

    if saw_bogus {
        ValidationOutcome::Bogus
    } else if saw_indeterminate {
        ValidationOutcome::Indeterminate
    } else if saw_insecure_chain {
        ValidationOutcome::Insecure
    } else {
        // Every attempt failed purely on unsupported algorithm/digest.
        ValidationOutcome::Insecure
    }
}

#[allow(clippy::too_many_arguments)]
async fn attempt_rrsig<'a>(
    env: &'a ValidationEnv<'a>,
    budget: QueryBudget,
    owner: &'a Name,
    rrset: &'a [ResourceRecord],
    rrsig: &Rrsig,
    self_dnskeys: &'a [ResourceRecord],
    authority: &'a [ResourceRecord],
    question_name: &'a Name,
) -> (Result<ValidationOutcome, DnssecErrorKind>, QueryBudget) {
    let signer = &rrsig.signer_name;

    // DNSKEY RRsets are self-signed at the zone apex (RFC 4035 §2.2): the
    // signer must equal the owner exactly, not merely be an ancestor of it.
    let bailiwick_ok = if rrsig.type_covered == RecordType::Dnskey.to_u16() {
        owner == signer
    } else {
        owner.is_subdomain_of(signer)
    };
    if !bailiwick_ok {
        return (
            Err(DnssecErrorKind::SignerNotInBailiwick {
                signer: signer.to_string(),
                owner: owner.to_string(),
            }),
            budget,
        );
    }

    let (effective_owner, budget) = match resolve_wildcard_owner(env, budget, owner, rrsig, question_name, authority).await {
        (Ok(name), budget) => (name, budget),
        (Err(err), budget) => return (Err(err), budget),
    };

    if !rrsig.algorithm.is_supported() {
        return (Err(DnssecErrorKind::UnsupportedAlgorithm(rrsig.algorithm.to_u8())), budget);
    }

    if let Err(err) = rrsig.is_time_valid(env.now, env.config.clock_skew_tolerance_sec) {
        return (Err(err), budget);
    }

    let (dnskey_candidates, mut budget) = if self_dnskeys.is_empty() {
        match fetch_dnskeys(env, budget, signer).await {
            Ok(result) => result,
            Err((err, budget)) => return (Err(err), budget),
        }
    } else {
        (self_dnskeys.to_vec(), budget)
    };

    let matching_key = dnskey_candidates
        .iter()
        .filter_map(|rr| Dnskey::parse(&rr.rdata).ok())
        .find(|key| key.is_usable() && key.algorithm == rrsig.algorithm && key.key_tag() == rrsig.key_tag);

    let Some(dnskey) = matching_key else {
        return (Err(DnssecErrorKind::NoMatchingDnskey), budget);
    };

    let mut signed_data = rrsig.signed_data_prefix();
    signed_data.extend_from_slice(&canonical_rrset_bytes(rrset, &effective_owner, rrsig.original_ttl));

    let verified = match env
        .crypto
        .verify_signature(rrsig.algorithm, &dnskey.public_key, &signed_data, &rrsig.signature)
    {
        Ok(verified) => verified,
        Err(err) => return (Err(err), budget),
    };

    if !verified {
        return (Err(DnssecErrorKind::SignatureInvalid), budget);
    }

    if !self_dnskeys.is_empty() {
        // `self_dnskeys` is only non-empty when verifying a zone's own
        // DNSKEY RRset against a key the chain walker has already anchored
        // (a matching trust anchor, or a DS-verified key) one level up —
        // that anchoring *is* the chain-of-trust establishment for this
        // zone. Recursing into `zone_security(signer)` here would just call
        // back into the same zone's own validation in progress.
        return (Ok(ValidationOutcome::Secure), budget);
    }

    // The signature checks out; whether that signature *means anything*
    // depends on whether the signer's zone itself is part of a validated
    // chain of trust.
    let (zone_outcome, next_budget) = zone_security(env, budget, signer).await;
    budget = next_budget;

    (Ok(zone_outcome), budget)
}

/// Detects and resolves RFC 4035 §5.3.4 wildcard expansion: when the
/// RRSIG's `labels` field is smaller than the RRset owner's label count,
/// the signature was computed over the synthesizing wildcard name, not
/// the literal owner — and the literal name must be separately proven
/// not to exist via the authority-section NSEC/NSEC3 records (spec
/// §4.4.1).
async fn resolve_wildcard_owner(
    env: &ValidationEnv<'_>,
    budget: QueryBudget,
    owner: &Name,
    rrsig: &Rrsig,
    question_name: &Name,
    authority: &[ResourceRecord],
) -> (Result<Name, DnssecErrorKind>, QueryBudget) {
    let owner_labels = owner.label_count();
    let rrsig_labels = rrsig.labels;

    if owner_labels == rrsig_labels {
        return (Ok(owner.clone()), budget);
    }
    if owner_labels < rrsig_labels {
        return (
            Err(DnssecErrorKind::Malformed(format!(
                "RRSIG labels field {rrsig_labels} exceeds owner {owner}'s {owner_labels} labels"
            ))),
            budget,
        );
    }

    let suffix = match owner
        .ancestors_inclusive()
        .into_iter()
        .find(|ancestor| ancestor.label_count() == rrsig_labels)
        .ok_or_else(|| DnssecErrorKind::Malformed(format!("no ancestor of {owner} has {rrsig_labels} labels")))
    {
        Ok(suffix) => suffix,
        Err(err) => return (Err(err), budget),
    };
    let wildcard_owner = suffix.wildcard();

    let (proof, budget) = verify_wildcard_proof(env, budget, question_name, authority).await;
    match proof {
        Ok(()) => (Ok(wildcard_owner), budget),
        Err(err) => (Err(err), budget),
    }
}

/// Proves and authenticates the original query name's non-existence (spec
/// §4.4.1(b)): NSEC must *cover* `question_name` in canonical order; NSEC3
/// must cover its hash. Either way, the covering RRset's own RRSIG is then
/// verified through the normal RRset verifier rather than merely trusted
/// by its presence — an unrelated, validly-signed NSEC/NSEC3 replayed
/// alongside a wildcard-expanded answer must not pass this check.
async fn verify_wildcard_proof(
    env: &ValidationEnv<'_>,
    budget: QueryBudget,
    question_name: &Name,
    authority: &[ResourceRecord],
) -> (Result<(), DnssecErrorKind>, QueryBudget) {
    let has_nsec3 = authority.iter().any(|rr| rr.rtype == RecordType::Nsec3);
    let has_nsec = authority.iter().any(|rr| rr.rtype == RecordType::Nsec);

    let covering_owner = if has_nsec3 {
        match nsec3_covering_owner(env, authority, question_name) {
            Ok(Some(owner)) => owner,
            Ok(None) => return (Err(DnssecErrorKind::WildcardProofMissing), budget),
            Err(err) => return (Err(err), budget),
        }
    } else if has_nsec {
        let records = crate::prover::parsed_nsec(authority);
        match crate::prover::find_covering_nsec(&records, question_name) {
            Some(owner) => owner,
            None => return (Err(DnssecErrorKind::WildcardProofMissing), budget),
        }
    } else {
        return (Err(DnssecErrorKind::WildcardProofMissing), budget);
    };

    let proof_type = if has_nsec3 { RecordType::Nsec3 } else { RecordType::Nsec };
    let rrset: Vec<ResourceRecord> = authority
        .iter()
        .filter(|rr| rr.name == covering_owner && rr.rtype == proof_type)
        .cloned()
        .collect();
    let rrsigs = rrsigs_for(authority, proof_type);

    let (outcome, budget) = verify_rrset(
        env,
        budget,
        &covering_owner,
        proof_type,
        &rrset,
        &rrsigs,
        &[],
        authority,
        question_name,
    )
    .await;

    match outcome {
        ValidationOutcome::Secure => (Ok(()), budget),
        _ => (Err(DnssecErrorKind::WildcardProofMissing), budget),
    }
}

/// Finds the NSEC3 record (if any) that covers `question_name`'s hash,
/// returning its owner name for the caller to fetch and verify the
/// covering RRset.
fn nsec3_covering_owner(
    env: &ValidationEnv<'_>,
    authority: &[ResourceRecord],
    question_name: &Name,
) -> Result<Option<Name>, DnssecErrorKind> {
    let records = crate::prover::parsed_nsec3(authority);
    if records.is_empty() {
        return Ok(None);
    }
    crate::prover::check_nsec3_preconditions(env, &records)?;
    let (_, sample) = &records[0];
    let (alg, salt, iterations) = (sample.hash_algorithm, sample.salt.clone(), sample.iterations);

    let hash = env.nsec3.hash(question_name, alg, &salt, iterations)?;
    let as_refs = crate::prover::as_refs(&records);
    let Some(owner_label) = env.nsec3.covering_owner(&as_refs, &hash)? else {
        return Ok(None);
    };

    let owner = authority
        .iter()
        .filter(|rr| rr.rtype == RecordType::Nsec3)
        .find(|rr| crate::prover::owner_hash_label(&rr.name).as_deref() == Some(owner_label.as_str()))
        .map(|rr| rr.name.clone());
    Ok(owner)
}

/// Fetches the DNSKEY RRset for `zone` through the query-budget-guarded
/// gateway (spec §4.4 step 7, C2).
pub async fn fetch_dnskeys(
    env: &ValidationEnv<'_>,
    budget: QueryBudget,
    zone: &Name,
) -> Result<(Vec<ResourceRecord>, QueryBudget), (DnssecErrorKind, QueryBudget)> {
    let (dnskeys, _rrsigs, budget) = fetch_dnskeys_with_rrsigs(env, budget, zone).await?;
    Ok((dnskeys, budget))
}

/// Same upstream round trip as [`fetch_dnskeys`], but also returns the
/// RRSIGs covering the DNSKEY RRset — needed by the chain walker, which
/// must verify that RRset rather than merely look a key up by tag.
pub async fn fetch_dnskeys_with_rrsigs(
    env: &ValidationEnv<'_>,
    budget: QueryBudget,
    zone: &Name,
) -> Result<(Vec<ResourceRecord>, Vec<ResourceRecord>, QueryBudget), (DnssecErrorKind, QueryBudget)> {
    let question = Question {
        name: zone.clone(),
        qtype: RecordType::Dnskey,
    };
    match gateway::query(env.resolver, &env.cancellation, budget, &question).await {
        Ok((message, budget)) => {
            let dnskeys: Vec<ResourceRecord> = message
                .records_of_type(RecordType::Dnskey)
                .cloned()
                .collect();
            let rrsigs = rrsigs_for(&message.answer, RecordType::Dnskey);
            Ok((dnskeys, rrsigs, budget))
        }
        Err(err) => Err((err, budget)),
    }
}

/// Every RRSIG accompanying `rrset` inside `section`, regardless of
/// what else is mixed into that section.
pub fn rrsigs_for(section: &[ResourceRecord], rtype: RecordType) -> Vec<ResourceRecord> {
    section
        .iter()
        .filter(|rr| rr.rtype == RecordType::Rrsig)
        .filter(|rr| {
            Rrsig::parse(&rr.rdata)
                .map(|rrsig| rrsig.type_covered == rtype.to_u16())
                .unwrap_or(false)
        })
        .cloned()
        .collect()
}
