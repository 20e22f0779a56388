use std::time::Duration;

use crate::smtp::{DEFAULT_MAIL_FROM, DEFAULT_TIMEOUT_MS, ProbeOptions};

/// One address to check, plus the knobs of the check.
///
/// Built once with [`VerificationRequest::new`] and the `with_*` setters,
/// then only read.
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "with-serde", serde(rename_all = "camelCase", default))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationRequest {
    email_address: String,
    mail_from: String,
    invalid_mailbox_keywords: Vec<String>,
    timeout_ms: u64,
}

impl Default for VerificationRequest {
    fn default() -> Self {
        Self {
            email_address: String::new(),
            mail_from: DEFAULT_MAIL_FROM.to_string(),
            invalid_mailbox_keywords: Vec::new(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

impl VerificationRequest {
    pub fn new(email_address: impl Into<String>) -> Self {
        Self {
            email_address: email_address.into(),
            ..Self::default()
        }
    }

    pub fn with_mail_from(mut self, mail_from: impl Into<String>) -> Self {
        self.mail_from = mail_from.into();
        self
    }

    pub fn with_invalid_mailbox_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.invalid_mailbox_keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn email_address(&self) -> &str {
        &self.email_address
    }

    pub fn mail_from(&self) -> &str {
        &self.mail_from
    }

    pub fn invalid_mailbox_keywords(&self) -> &[String] {
        &self.invalid_mailbox_keywords
    }

    pub fn timeout_ms(&self) -> u64 {
        self.timeout_ms
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub(crate) fn probe_options(&self, port: u16) -> ProbeOptions {
        ProbeOptions::new(self.mail_from.clone(), self.timeout_ms).with_port(port)
    }
}
