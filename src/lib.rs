#![forbid(unsafe_code)]
//! mailprobe_lib — pattern, MX and SMTP mailbox checks for e-mail addresses

pub mod mx;
pub mod pattern;
pub mod smtp;
pub mod verify;

pub use mx::{DnsMxResolver, MxError, MxRecord, MxResolver, check_mx};
pub use pattern::{is_valid_pattern, matches_pattern};
pub use smtp::{ProbeError, ProbeOptions, ProbeState, SmtpExchange, probe_mailbox};
pub use verify::{
    Verdict, VerificationRequest, VerificationResult, Verifier, VerifyError, verify_email,
};
