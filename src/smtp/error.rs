use std::io;
use std::time::Duration;

use thiserror::Error;

/// Reasons a probe session ends without a transcript.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("no MX candidate to probe")]
    NoCandidates,
    #[error("connection to {host} failed: {source}")]
    Connect {
        host: String,
        #[source]
        source: io::Error,
    },
    #[error("I/O error: {source}")]
    Io {
        #[source]
        source: io::Error,
    },
    #[error("SMTP session timed out after {}ms", .after.as_millis())]
    Timeout { after: Duration },
    #[error("protocol error: {0}")]
    Protocol(String),
}

impl ProbeError {
    pub(crate) fn connect(host: impl Into<String>, source: io::Error) -> Self {
        Self::Connect {
            host: host.into(),
            source,
        }
    }

    pub(crate) fn io(source: io::Error) -> Self {
        Self::Io { source }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}
