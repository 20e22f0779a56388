//! Partial SMTP handshake used to ask a mail exchanger about one mailbox.
//!
//! The public entry point is [`probe_mailbox`]: it connects to the best MX
//! candidate, walks `HELO` / `MAIL FROM` / `RCPT TO` and stops before any
//! message data is sent.

mod error;
mod options;
mod probe;
mod session;
mod types;

pub use error::ProbeError;
pub use options::{DEFAULT_MAIL_FROM, DEFAULT_TIMEOUT_MS, ProbeOptions, SMTP_PORT};
pub use probe::probe_mailbox;
pub use types::{ProbeState, SmtpExchange, SmtpReply};

#[cfg(test)]
pub(crate) mod tests;
