use async_trait::async_trait;
use dnssec_validator_domain::{DomainError, Message, Question};

/// The validator's single external collaborator for fetching records: a
/// resolver that performs the actual query (over whatever transport) and
/// hands back an already-decoded [`Message`].
///
/// The validator always sets the DO bit and requests an EDNS UDP size of
/// 4096 on every query it issues through this port (spec §4.2, §6); it is
/// the resolver's job to honor that when building the outgoing request.
#[async_trait]
pub trait UpstreamResolver: Send + Sync {
    /// Issues one query and awaits the response.
    ///
    /// # Errors
    /// Returns [`DomainError::QueryTimeout`] or
    /// [`DomainError::Dnssec`]`(`[`dnssec_validator_domain::DnssecErrorKind::UpstreamError`]`)`
    /// style failures on transport or protocol errors; callers map these to
    /// query-budget consumption per spec §4.2 (failures do not decrement
    /// the budget — only successful round trips do).
    async fn resolve(&self, question: &Question) -> Result<Message, DomainError>;
}
