use dnssec_validator_domain::{Message, Name, RecordType, ResourceRecord, ValidationOutcome};

use crate::env::ValidationEnv;
use crate::prover;
use crate::services::budget::QueryBudget;
use crate::verifier::verify_rrset;

/// The top-level dispatcher (spec §4.7, C7): the validator's single
/// public entry point. Classifies the response shape, drives the RRset
/// verifier and denial-of-existence prover accordingly, and records
/// metrics for the attempt.
pub async fn validate(env: &ValidationEnv<'_>, response: &Message) -> ValidationOutcome {
    let started = std::time::Instant::now();
    let budget = QueryBudget::new(env.config.max_upstream_queries);

    let outcome = if !response.has_any_rrsig() {
        ValidationOutcome::Insecure
    } else if response.is_nxdomain() || response.is_nodata() {
        let (outcome, _budget) = prover::prove_denial(
            env,
            budget,
            &response.authority,
            &response.question.name,
            response.question.qtype,
            response.is_nxdomain(),
        )
        .await;
        outcome
    } else if !response.answer.is_empty() {
        validate_answer(env, budget, response).await
    } else {
        validate_referral(env, budget, response).await
    };

    env.metrics.record_validation(outcome);
    env.metrics.record_duration(outcome, started.elapsed());

    outcome
}

/// Positive answer: group by (owner, type), verify each RRset, and
/// combine per spec §4.7 — Bogus/Indeterminate anywhere short-circuits;
/// a mix of Secure and Insecure (e.g. a CNAME chain crossing a zone
/// boundary) resolves to Secure if at least one RRset is Secure.
async fn validate_answer(env: &ValidationEnv<'_>, budget: QueryBudget, response: &Message) -> ValidationOutcome {
    let groups = group_by_owner_and_type(&response.answer);
    let rrsigs: Vec<ResourceRecord> = response
        .answer
        .iter()
        .filter(|rr| rr.rtype == RecordType::Rrsig)
        .cloned()
        .collect();

    let mut budget = budget;
    let mut outcomes = Vec::with_capacity(groups.len());
    for (owner, rtype, rrset) in &groups {
        let (outcome, next_budget) = verify_rrset(
            env,
            budget,
            owner,
            *rtype,
            rrset,
            &rrsigs,
            &[],
            &response.authority,
            &response.question.name,
        )
        .await;
        budget = next_budget;
        outcomes.push(outcome);
    }

    ValidationOutcome::combine_answer(outcomes)
}

/// A referral or other response shape with no answer records: authority
/// and additional sections are validated together as one RRset
/// collection (spec §4.7 "otherwise" branch).
async fn validate_referral(env: &ValidationEnv<'_>, budget: QueryBudget, response: &Message) -> ValidationOutcome {
    let mut combined: Vec<ResourceRecord> = response.authority.clone();
    combined.extend(response.additional.clone());

    let groups = group_by_owner_and_type(&combined);
    let rrsigs: Vec<ResourceRecord> = combined
        .iter()
        .filter(|rr| rr.rtype == RecordType::Rrsig)
        .cloned()
        .collect();

    if groups.is_empty() {
        return ValidationOutcome::Insecure;
    }

    let mut budget = budget;
    let mut outcomes = Vec::with_capacity(groups.len());
    for (owner, rtype, rrset) in &groups {
        let (outcome, next_budget) = verify_rrset(
            env,
            budget,
            owner,
            *rtype,
            rrset,
            &rrsigs,
            &[],
            &response.authority,
            &response.question.name,
        )
        .await;
        budget = next_budget;
        outcomes.push(outcome);
    }

    ValidationOutcome::combine_answer(outcomes)
}

/// Partitions `records` into RRsets by (owner name, type), skipping
/// RRSIGs themselves (they ride alongside, never as their own group).
fn group_by_owner_and_type(records: &[ResourceRecord]) -> Vec<(Name, RecordType, Vec<ResourceRecord>)> {
    let mut groups: Vec<(Name, RecordType, Vec<ResourceRecord>)> = Vec::new();
    for rr in records {
        if rr.rtype == RecordType::Rrsig {
            continue;
        }
        if let Some(group) = groups
            .iter_mut()
            .find(|(owner, rtype, _)| *owner == rr.name && *rtype == rr.rtype)
        {
            group.2.push(rr.clone());
        } else {
            groups.push((rr.name.clone(), rr.rtype, vec![rr.clone()]));
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use dnssec_validator_domain::Rcode;

    fn empty_message(name: &str, qtype: RecordType, rcode: Rcode) -> Message {
        Message {
            rcode,
            question: dnssec_validator_domain::Question {
                name: Name::parse(name).unwrap(),
                qtype,
            },
            answer: vec![],
            authority: vec![],
            additional: vec![],
        }
    }

    #[test]
    fn group_by_owner_and_type_skips_rrsigs() {
        let owner = Name::parse("example.com").unwrap();
        let records = vec![
            ResourceRecord::new(owner.clone(), RecordType::Ns, 1, 3600, vec![1]),
            ResourceRecord::new(owner.clone(), RecordType::Rrsig, 1, 3600, vec![2]),
            ResourceRecord::new(owner.clone(), RecordType::Ns, 1, 3600, vec![3]),
        ];
        let groups = group_by_owner_and_type(&records);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].2.len(), 2);
    }

    #[test]
    fn unsigned_message_shape_has_no_rrsig() {
        let message = empty_message("example.com", RecordType::Other(1), Rcode::NoError);
        assert!(!message.has_any_rrsig());
    }
}
