use std::time::Duration;

/// Envelope sender used when the caller does not provide one.
pub const DEFAULT_MAIL_FROM: &str = "email@example.org";
/// Overall session budget, in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 2_000;
pub const SMTP_PORT: u16 = 25;

/// Knobs for [`probe_mailbox`](super::probe_mailbox).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeOptions {
    pub mail_from: String,
    /// Covers the whole session: connect, every write and every read. A
    /// zero budget expires before the connection is attempted.
    pub timeout: Duration,
    pub port: u16,
}

impl Default for ProbeOptions {
    fn default() -> Self {
        Self {
            mail_from: DEFAULT_MAIL_FROM.to_string(),
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            port: SMTP_PORT,
        }
    }
}

impl ProbeOptions {
    pub fn new(mail_from: impl Into<String>, timeout_ms: u64) -> Self {
        Self {
            mail_from: mail_from.into(),
            timeout: Duration::from_millis(timeout_ms),
            ..Self::default()
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Envelope sender for `MAIL FROM`, falling back to [`DEFAULT_MAIL_FROM`]
    /// when blank.
    pub fn mail_from(&self) -> &str {
        if self.mail_from.trim().is_empty() {
            DEFAULT_MAIL_FROM
        } else {
            self.mail_from.as_str()
        }
    }
}
