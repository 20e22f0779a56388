use crate::mx::MxRecord;

use super::error::ProbeError;
use super::options::ProbeOptions;
use super::session::{Deadline, SmtpSession};
use super::types::{ProbeState, SmtpExchange};

/// Replies at or below this code are recorded but do not move the script
/// forward; the session then waits for the deadline.
const ADVANCE_ABOVE: u16 = 200;

/// Runs `HELO` / `MAIL FROM` / `RCPT TO` against the first candidate and
/// returns one [`SmtpExchange`] per command answered.
///
/// Only `candidates[0]` is contacted. A full run yields three entries, the
/// last one carrying the `RCPT TO` verdict; fewer entries mean the server
/// hung up before the script finished. Socket errors and an elapsed
/// `options.timeout` fail the whole probe and drop whatever was recorded.
pub fn probe_mailbox(
    email: &str,
    candidates: &[MxRecord],
    options: &ProbeOptions,
) -> Result<Vec<SmtpExchange>, ProbeError> {
    let target = candidates.first().ok_or(ProbeError::NoCandidates)?;
    let script = ProbeScript::new(&target.exchange, options.mail_from(), email);
    Probe::new(&target.exchange, options, script).run()
}

/// The fixed command sequence of a probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ProbeScript {
    commands: [String; 3],
}

impl ProbeScript {
    pub(crate) fn new(exchange: &str, mail_from: &str, recipient: &str) -> Self {
        Self {
            commands: [
                format!("HELO {exchange}"),
                format!("MAIL FROM: <{mail_from}>"),
                format!("RCPT TO: <{recipient}>"),
            ],
        }
    }

    pub(crate) fn command(&self, index: usize) -> Option<&str> {
        self.commands.get(index).map(String::as_str)
    }
}

struct Probe<'a> {
    host: &'a str,
    port: u16,
    script: ProbeScript,
    deadline: Deadline,
    session: Option<SmtpSession>,
    state: ProbeState,
    transcript: Vec<SmtpExchange>,
}

impl<'a> Probe<'a> {
    fn new(host: &'a str, options: &ProbeOptions, script: ProbeScript) -> Self {
        Self {
            host,
            port: options.port,
            script,
            deadline: Deadline::after(options.timeout),
            session: None,
            state: ProbeState::Connecting,
            transcript: Vec::new(),
        }
    }

    fn run(mut self) -> Result<Vec<SmtpExchange>, ProbeError> {
        while !self.state.is_terminal() {
            match self.advance() {
                Ok(next) => self.transition(next),
                Err(err) => {
                    self.transition(ProbeState::Failed);
                    drop(self.session.take());
                    tracing::debug!(host = self.host, error = %err, "probe aborted");
                    return Err(err);
                }
            }
        }
        if let Some(mut session) = self.session.take() {
            session.quit(&self.deadline);
        }
        Ok(self.transcript)
    }

    fn transition(&mut self, next: ProbeState) {
        if next != self.state {
            tracing::debug!(host = self.host, from = %self.state, to = %next, "probe state");
        }
        self.state = next;
    }

    fn advance(&mut self) -> Result<ProbeState, ProbeError> {
        match self.state {
            ProbeState::Connecting => {
                let session = SmtpSession::connect(self.host, self.port, &self.deadline)?;
                self.session = Some(session);
                Ok(ProbeState::AwaitingReply(0))
            }
            ProbeState::AwaitingReply(sent) => self.on_reply(sent),
            terminal => Ok(terminal),
        }
    }

    fn on_reply(&mut self, sent: usize) -> Result<ProbeState, ProbeError> {
        let session = self
            .session
            .as_mut()
            .ok_or_else(|| ProbeError::Protocol("reply awaited without a connection".into()))?;

        let Some(reply) = session.read_reply(&self.deadline)? else {
            tracing::debug!(
                host = self.host,
                answered = self.transcript.len(),
                "server closed the connection"
            );
            return Ok(ProbeState::Complete);
        };

        match sent.checked_sub(1).and_then(|i| self.script.command(i)) {
            Some(command) => self.transcript.push(SmtpExchange::new(command, &reply)),
            None => tracing::debug!(host = self.host, code = reply.code, "greeting received"),
        }

        if reply.code <= ADVANCE_ABOVE {
            tracing::debug!(host = self.host, code = reply.code, "reply does not advance the script");
            return Ok(ProbeState::AwaitingReply(sent));
        }

        match self.script.command(sent) {
            Some(next) => {
                session.send_command(next, &self.deadline)?;
                Ok(ProbeState::AwaitingReply(sent + 1))
            }
            None => Ok(ProbeState::Complete),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_greets_with_exchange_name() {
        let script = ProbeScript::new("mx1.example.com", "me@example.org", "you@example.com");
        assert_eq!(script.command(0), Some("HELO mx1.example.com"));
        assert_eq!(script.command(1), Some("MAIL FROM: <me@example.org>"));
        assert_eq!(script.command(2), Some("RCPT TO: <you@example.com>"));
        assert_eq!(script.command(3), None);
    }

    #[test]
    fn empty_candidate_list_is_rejected() {
        let err = probe_mailbox("you@example.com", &[], &ProbeOptions::default())
            .expect_err("nothing to probe");
        assert!(matches!(err, ProbeError::NoCandidates));
    }
}
