//! The three-gate verification pipeline: pattern, MX, mailbox.
//!
//! Each gate short-circuits. Negative answers are ordinary
//! [`VerificationResult`]s; only a resolver or probe failure becomes a
//! [`VerifyError`].

mod error;
mod request;
mod types;

pub use error::VerifyError;
pub use request::VerificationRequest;
pub use types::{Verdict, VerificationResult};

use crate::mx::{DnsMxResolver, MxResolver};
use crate::pattern::{domain_part, is_valid_pattern};
use crate::smtp::{SMTP_PORT, SmtpExchange, probe_mailbox};

/// Status code of an accepted `RCPT TO`.
const MAILBOX_ACCEPTED: u16 = 250;

/// Runs verification requests against one MX collaborator.
///
/// Holds no per-request state; a shared `Verifier` can serve concurrent
/// requests when its resolver can.
pub struct Verifier<R> {
    resolver: R,
    port: u16,
}

impl Verifier<DnsMxResolver> {
    /// Verifier backed by the system DNS configuration.
    pub fn from_system_conf() -> Result<Self, VerifyError> {
        let resolver = DnsMxResolver::from_system_conf()
            .map_err(|source| VerifyError::ResolverInit { source })?;
        Ok(Self::new(resolver))
    }
}

impl<R: MxResolver> Verifier<R> {
    pub fn new(resolver: R) -> Self {
        Self {
            resolver,
            port: SMTP_PORT,
        }
    }

    /// Port probed on the mail exchanger (25 unless overridden).
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn verify(&self, request: &VerificationRequest) -> Result<VerificationResult, VerifyError> {
        let email = request.email_address();

        if !is_valid_pattern(email, request.invalid_mailbox_keywords()) {
            tracing::info!(email, "pattern rejected");
            return Ok(VerificationResult::new(request, Verdict::InvalidPattern));
        }

        let domain = domain_part(email);
        let mx_records = self.resolver.resolve_mx(domain).map_err(|err| {
            tracing::warn!(email, domain, error = %err, "MX resolution failed");
            VerifyError::MxCheckFailed
        })?;
        if mx_records.is_empty() {
            tracing::info!(email, domain, "no mail server");
            return Ok(VerificationResult {
                is_valid_pattern: true,
                ..VerificationResult::new(request, Verdict::NoMailServer)
            });
        }

        let options = request.probe_options(self.port);
        let smtp_messages = probe_mailbox(email, &mx_records, &options).map_err(|err| {
            tracing::warn!(email, exchange = %mx_records[0].exchange, error = %err, "SMTP probe failed");
            VerifyError::MailboxCheckFailed
        })?;

        let verdict = mailbox_verdict(&smtp_messages);
        tracing::info!(email, verdict = %verdict, "mailbox checked");
        Ok(VerificationResult {
            is_valid_pattern: true,
            is_valid_mx: true,
            is_valid_mailbox: verdict.is_positive(),
            mx_records,
            smtp_messages,
            ..VerificationResult::new(request, verdict)
        })
    }
}

/// Checks `request` with a system-DNS [`Verifier`] on the standard SMTP port.
pub fn verify_email(request: &VerificationRequest) -> Result<VerificationResult, VerifyError> {
    Verifier::from_system_conf()?.verify(request)
}

/// Only a completed three-step transcript is conclusive; its last entry is
/// the `RCPT TO` answer.
fn mailbox_verdict(messages: &[SmtpExchange]) -> Verdict {
    match messages {
        [_, _, rcpt] if rcpt.status_code == MAILBOX_ACCEPTED => Verdict::ValidMailbox,
        [_, _, _] => Verdict::InvalidMailbox,
        _ => Verdict::Unverified,
    }
}
