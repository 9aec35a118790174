use dnssec_validator_domain::{DnssecErrorKind, Message, Question};

use crate::ports::{CancellationToken, UpstreamResolver};

use super::budget::QueryBudget;

/// The query-budget-guarded upstream gateway (spec §4.2, C2): the single
/// chokepoint every other component uses to fetch DNSKEY/DS/NSEC(3)
/// RRsets. Every query is charged against the caller's [`QueryBudget`]
/// before it is issued; a failed round trip does not consume budget — the
/// failure itself is the cost signal (spec §4.2).
pub async fn query(
    resolver: &dyn UpstreamResolver,
    cancellation: &CancellationToken,
    budget: QueryBudget,
    question: &Question,
) -> Result<(Message, QueryBudget), DnssecErrorKind> {
    if cancellation.is_cancelled() {
        return Err(DnssecErrorKind::Cancelled);
    }
    budget.check()?;

    match resolver.resolve(question).await {
        Ok(message) => {
            let budget = budget.spend()?;
            Ok((message, budget))
        }
        Err(err) => Err(DnssecErrorKind::UpstreamError(err.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use dnssec_validator_domain::{DomainError, Name, RecordType};

    use super::*;

    struct AlwaysFails;

    #[async_trait]
    impl UpstreamResolver for AlwaysFails {
        async fn resolve(&self, _question: &Question) -> Result<Message, DomainError> {
            Err(DomainError::QueryTimeout)
        }
    }

    struct AlwaysSucceeds;

    #[async_trait]
    impl UpstreamResolver for AlwaysSucceeds {
        async fn resolve(&self, question: &Question) -> Result<Message, DomainError> {
            Ok(Message {
                rcode: dnssec_validator_domain::Rcode::NoError,
                question: question.clone(),
                answer: vec![],
                authority: vec![],
                additional: vec![],
            })
        }
    }

    fn question() -> Question {
        Question {
            name: Name::parse("example.com").unwrap(),
            qtype: RecordType::Dnskey,
        }
    }

    #[tokio::test]
    async fn failed_query_does_not_spend_budget() {
        let budget = QueryBudget::new(1);
        let cancellation = CancellationToken::new();
        let result = query(&AlwaysFails, &cancellation, budget, &question()).await;
        assert!(result.is_err());
        // Budget untouched: a second failed attempt still succeeds in spending check.
        assert!(budget.check().is_ok());
    }

    #[tokio::test]
    async fn successful_query_spends_budget() {
        let budget = QueryBudget::new(1);
        let cancellation = CancellationToken::new();
        let (_, budget) = query(&AlwaysSucceeds, &cancellation, budget, &question())
            .await
            .unwrap();
        assert_eq!(budget.remaining(), 0);
    }

    #[tokio::test]
    async fn cancelled_token_short_circuits() {
        let budget = QueryBudget::new(5);
        let cancellation = CancellationToken::new();
        cancellation.cancel();
        let result = query(&AlwaysSucceeds, &cancellation, budget, &question()).await;
        assert!(matches!(result, Err(DnssecErrorKind::Cancelled)));
    }
}
