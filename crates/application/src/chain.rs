use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use dnssec_validator_domain::{
    DigestType, DnssecErrorKind, Dnskey, Ds, Name, Question, Recovery, RecordType, ResourceRecord,
    ValidationOutcome,
};

use crate::env::ValidationEnv;
use crate::prover;
use crate::services::budget::QueryBudget;
use crate::services::gateway;
use crate::verifier::{fetch_dnskeys_with_rrsigs, verify_rrset};

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The chain-of-trust walker (spec §4.6, C6): determines whether `zone`
/// is covered by a validated signing chain (`Secure`), legitimately
/// unsigned (`Insecure`), or broken (`Bogus`/`Indeterminate`).
///
/// Only `Insecure` and `Indeterminate` results are read from or written
/// to the [`crate::ports::ZoneOutcomeCache`] — `Secure` is always
/// re-derived since it depends on RRSIGs whose validity window moves
/// underneath a cached value.
pub fn zone_security<'a>(
    env: &'a ValidationEnv<'a>,
    budget: QueryBudget,
    zone: &'a Name,
) -> BoxFuture<'a, (ValidationOutcome, QueryBudget)> {
    Box::pin(async move {
        if let Some(cached) = env.cache.get(zone) {
            env.metrics.record_cache_hit();
            return (cached, budget);
        }

        if zone.label_count() > env.config.max_chain_depth {
            return (ValidationOutcome::Bogus, budget);
        }

        let (outcome, budget) = if zone.is_root() {
            validate_root(env, budget, zone).await
        } else {
            validate_delegation(env, budget, zone).await
        };

        // A cancelled call must not leave a cache entry behind for
        // concurrent or later validations to inherit (spec §5): the
        // Indeterminate it produces reflects this call's own abort, not a
        // durable fact about the zone.
        if outcome.is_cacheable_directly() && !env.cancellation.is_cancelled() {
            let ttl = Duration::from_secs(env.config.cache_expiration_hours * 3600);
            env.cache.put(zone, outcome, ttl);
        }

        (outcome, budget)
    })
}

/// The root zone's DNSKEY RRset is authenticated against the configured
/// trust anchors directly (spec §4.6 step 1, RFC 4033 §2), not via a DS
/// record from a non-existent parent.
async fn validate_root(
    env: &ValidationEnv<'_>,
    budget: QueryBudget,
    zone: &Name,
) -> (ValidationOutcome, QueryBudget) {
    if !env.trust_anchors.has(zone) {
        return (ValidationOutcome::Indeterminate, budget);
    }

    let (dnskey_records, rrsigs, budget) = match fetch_dnskeys_with_rrsigs(env, budget, zone).await {
        Ok(result) => result,
        Err((err, budget)) => return (classify_error(err), budget),
    };

    let trusted_keys: Vec<&ResourceRecord> = dnskey_records
        .iter()
        .filter(|rr| {
            Dnskey::parse(&rr.rdata)
                .map(|candidate| {
                    candidate.is_usable()
                        && env
                            .trust_anchors
                            .get(zone)
                            .iter()
                            .any(|anchor| anchor.matches(&candidate))
                })
                .unwrap_or(false)
        })
        .collect();

    if trusted_keys.is_empty() {
        return (ValidationOutcome::Bogus, budget);
    }

    // Re-query isn't needed: trust anchors authenticate the keys
    // themselves, so the DNSKEY RRset can verify against itself.
    let (outcome, budget) = verify_rrset(
        env,
        budget,
        zone,
        RecordType::Dnskey,
        &dnskey_records,
        &rrsigs,
        &dnskey_records,
        &[],
        zone,
    )
    .await;

    (outcome, budget)
}

/// A non-root zone: walk the parent first, then authenticate this zone's
/// DS/DNSKEY pair against it (spec §4.6 steps 2-6).
async fn validate_delegation(
    env: &ValidationEnv<'_>,
    budget: QueryBudget,
    zone: &Name,
) -> (ValidationOutcome, QueryBudget) {
    let parent = zone.parent().expect("non-root zone has a parent");
    let (parent_outcome, budget) = zone_security(env, budget, &parent).await;

    match parent_outcome {
        ValidationOutcome::Insecure => return (ValidationOutcome::Insecure, budget),
        ValidationOutcome::Bogus => return (ValidationOutcome::Bogus, budget),
        ValidationOutcome::Indeterminate => return (ValidationOutcome::Indeterminate, budget),
        ValidationOutcome::Secure => {}
    }

    let ds_question = Question {
        name: zone.clone(),
        qtype: RecordType::Ds,
    };
    let (message, budget) = match gateway::query(env.resolver, &env.cancellation, budget, &ds_question).await
    {
        Ok(result) => result,
        Err(err) => return (classify_error(err), budget),
    };

    let ds_records: Vec<ResourceRecord> = message.records_of_type(RecordType::Ds).cloned().collect();

    if ds_records.is_empty() {
        // No DS at all: must be proven, not assumed (spec §4.6 step 3).
        // A secure proof of absence means the zone is a legitimate
        // unsigned island (Insecure); anything short of that is treated
        // conservatively as Indeterminate, since the parent zone we just
        // validated as Secure means this isn't a forged delegation — only
        // an inconclusive one.
        let is_nxdomain = message.is_nxdomain();
        let (proof, budget) =
            prover::prove_denial(env, budget, &message.authority, zone, RecordType::Ds, is_nxdomain).await;
        let outcome = match proof {
            ValidationOutcome::Secure => ValidationOutcome::Insecure,
            _ => ValidationOutcome::Indeterminate,
        };
        return (outcome, budget);
    }

    let ds_rrsigs: Vec<ResourceRecord> = message
        .answer
        .iter()
        .filter(|rr| rr.rtype == RecordType::Rrsig)
        .cloned()
        .collect();

    let (ds_outcome, budget) =
        verify_rrset(env, budget, zone, RecordType::Ds, &ds_records, &ds_rrsigs, &[], &[], zone).await;

    match ds_outcome {
        ValidationOutcome::Secure => {}
        other => return (other, budget),
    }

    let (child_dnskeys, dnskey_rrsigs, budget) = match fetch_dnskeys_with_rrsigs(env, budget, zone).await {
        Ok(result) => result,
        Err((err, budget)) => return (classify_error(err), budget),
    };

    let parsed_ds: Vec<Ds> = ds_records.iter().filter_map(|rr| Ds::parse(&rr.rdata).ok()).collect();
    let parsed_keys: Vec<Dnskey> = child_dnskeys
        .iter()
        .filter_map(|rr| Dnskey::parse(&rr.rdata).ok())
        .collect();

    let mut any_digest_matched = false;
    for ds in &parsed_ds {
        if ds.digest_type == DigestType::Sha1 && !env.config.allow_sha1_digest {
            continue;
        }
        let Some(candidate) = parsed_keys
            .iter()
            .filter(|key| key.is_usable())
            .find(|key| key.key_tag() == ds.key_tag && key.algorithm == ds.algorithm)
        else {
            continue;
        };

        let mut digest_input = zone.to_wire();
        digest_input.extend_from_slice(&candidate.to_wire());
        let digest = match env.crypto.digest(ds.digest_type, &digest_input) {
            Ok(digest) => digest,
            Err(err) => return (classify_error(err), budget),
        };

        if digest == ds.digest {
            any_digest_matched = true;
            break;
        }
    }

    if !any_digest_matched {
        return (ValidationOutcome::Bogus, budget);
    }

    let (outcome, budget) = verify_rrset(
        env,
        budget,
        zone,
        RecordType::Dnskey,
        &child_dnskeys,
        &dnskey_rrsigs,
        &child_dnskeys,
        &[],
        zone,
    )
    .await;

    (outcome, budget)
}

fn classify_error(err: DnssecErrorKind) -> ValidationOutcome {
    match err.recovery() {
        Recovery::Insecure => ValidationOutcome::Insecure,
        Recovery::Bogus => ValidationOutcome::Bogus,
        Recovery::Indeterminate => ValidationOutcome::Indeterminate,
    }
}

#[cfg(test)]
mod tests {
    use dnssec_validator_domain::DnssecConfig;

    #[test]
    fn cache_expiration_hours_drives_the_zone_outcome_ttl() {
        let config = DnssecConfig {
            cache_expiration_hours: 2,
            ..Default::default()
        };
        let ttl = std::time::Duration::from_secs(config.cache_expiration_hours * 3600);
        assert_eq!(ttl.as_secs(), 7200);
    }
}
