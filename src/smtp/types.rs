use std::fmt;

/// A complete SMTP reply: the status code and the raw reply lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmtpReply {
    pub code: u16,
    /// Reply lines as received, status code included, joined with `\n`.
    pub raw: String,
}

/// One command of the probe script paired with the server's answer.
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "with-serde", serde(rename_all = "camelCase"))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmtpExchange {
    pub command: String,
    pub status_code: u16,
    pub raw_message: String,
}

impl SmtpExchange {
    pub fn new(command: impl Into<String>, reply: &SmtpReply) -> Self {
        Self {
            command: command.into(),
            status_code: reply.code,
            raw_message: reply.raw.clone(),
        }
    }
}

/// Where a probe session stands.
///
/// `AwaitingReply(n)` counts the script commands already written; `0` is the
/// wait for the unsolicited greeting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeState {
    Connecting,
    AwaitingReply(usize),
    Complete,
    Failed,
}

impl ProbeState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete | Self::Failed)
    }
}

impl fmt::Display for ProbeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connecting => f.write_str("connecting"),
            Self::AwaitingReply(0) => f.write_str("awaiting greeting"),
            Self::AwaitingReply(sent) => write!(f, "awaiting reply #{sent}"),
            Self::Complete => f.write_str("complete"),
            Self::Failed => f.write_str("failed"),
        }
    }
}
