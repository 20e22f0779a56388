use std::io;

use thiserror::Error;

/// Failures a [`MxResolver`](super::MxResolver) reports to the orchestrator.
///
/// Either of them fails the MX gate; an empty `Ok` list is the "no mail
/// server" answer instead.
#[derive(Debug, Error)]
pub enum MxError {
    #[error("system resolver unavailable: {source}")]
    ResolverInit {
        #[source]
        source: io::Error,
    },
    #[error("MX records for {domain} unavailable: {reason}")]
    Unavailable { domain: String, reason: String },
}

impl MxError {
    /// For resolvers that could not produce an answer for `domain`.
    pub fn unavailable(domain: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Unavailable {
            domain: domain.into(),
            reason: reason.into(),
        }
    }
}
