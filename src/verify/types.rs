use std::fmt;

use crate::mx::MxRecord;
use crate::smtp::SmtpExchange;

use super::VerificationRequest;

/// Final word of a completed check.
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    #[cfg_attr(feature = "with-serde", serde(rename = "Email pattern is invalid."))]
    InvalidPattern,
    #[cfg_attr(
        feature = "with-serde",
        serde(rename = "Email server is invalid or not available.")
    )]
    NoMailServer,
    #[cfg_attr(feature = "with-serde", serde(rename = "Mailbox is valid."))]
    ValidMailbox,
    #[cfg_attr(feature = "with-serde", serde(rename = "Mailbox is invalid."))]
    InvalidMailbox,
    #[cfg_attr(feature = "with-serde", serde(rename = "Could not validate mailbox."))]
    Unverified,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidPattern => "Email pattern is invalid.",
            Self::NoMailServer => "Email server is invalid or not available.",
            Self::ValidMailbox => "Mailbox is valid.",
            Self::InvalidMailbox => "Mailbox is invalid.",
            Self::Unverified => "Could not validate mailbox.",
        }
    }

    pub fn is_positive(&self) -> bool {
        matches!(self, Self::ValidMailbox)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything learned while checking one [`VerificationRequest`].
///
/// Gate flags stay `false` for gates that were never reached.
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "with-serde", serde(rename_all = "camelCase"))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationResult {
    pub email_address: String,
    pub mail_from: String,
    pub invalid_mailbox_keywords: Vec<String>,
    pub timeout_ms: u64,
    pub is_valid_pattern: bool,
    pub is_valid_mx: bool,
    pub is_valid_mailbox: bool,
    pub mx_records: Vec<MxRecord>,
    pub smtp_messages: Vec<SmtpExchange>,
    pub result: Verdict,
}

impl VerificationResult {
    pub(crate) fn new(request: &VerificationRequest, result: Verdict) -> Self {
        Self {
            email_address: request.email_address().to_string(),
            mail_from: request.mail_from().to_string(),
            invalid_mailbox_keywords: request.invalid_mailbox_keywords().to_vec(),
            timeout_ms: request.timeout_ms(),
            is_valid_pattern: false,
            is_valid_mx: false,
            is_valid_mailbox: false,
            mx_records: Vec::new(),
            smtp_messages: Vec::new(),
            result,
        }
    }
}
