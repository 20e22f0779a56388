use thiserror::Error;

use crate::mx::MxError;

/// A check that could not be carried out, as opposed to a negative verdict.
///
/// The underlying cause is logged and then dropped: callers only learn which
/// gate failed.
#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("MX record check failed.")]
    MxCheckFailed,
    #[error("Mailbox check failed.")]
    MailboxCheckFailed,
    #[error("resolver initialization failed: {source}")]
    ResolverInit {
        #[source]
        source: MxError,
    },
}
