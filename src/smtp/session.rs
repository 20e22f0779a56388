use std::io::{self, Read, Write};
use std::net::{IpAddr, Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use super::error::ProbeError;
use super::types::SmtpReply;

/// Absolute end of a probe session, shared by address lookup, connect, writes and reads.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Deadline {
    at: Instant,
    budget: Duration,
}

impl Deadline {
    pub(crate) fn after(budget: Duration) -> Self {
        Self {
            at: Instant::now() + budget,
            budget,
        }
    }

    /// Time left before the deadline; an elapsed deadline is a timeout.
    pub(crate) fn remaining(&self) -> Result<Duration, ProbeError> {
        let left = self.at.saturating_duration_since(Instant::now());
        if left.is_zero() {
            Err(self.expired())
        } else {
            Ok(left)
        }
    }

    pub(crate) fn expired(&self) -> ProbeError {
        ProbeError::Timeout { after: self.budget }
    }

    fn map_io(&self, err: io::Error) -> ProbeError {
        match err.kind() {
            io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => self.expired(),
            _ => ProbeError::io(err),
        }
    }
}

/// Plain TCP SMTP connection. The socket is released when the session is
/// dropped, whichever way the probe ends.
pub(crate) struct SmtpSession {
    host: String,
    stream: TcpStream,
    buffer: Vec<u8>,
}

impl SmtpSession {
    pub(crate) fn connect(host: &str, port: u16, deadline: &Deadline) -> Result<Self, ProbeError> {
        let addrs = resolve_addrs(host, port, deadline, system_lookup)?;

        let mut last_err = None;
        for addr in &addrs {
            let remaining = deadline.remaining()?;
            match TcpStream::connect_timeout(addr, remaining) {
                Ok(stream) => {
                    tracing::debug!(host, %addr, "SMTP connection established");
                    return Ok(Self {
                        host: host.to_string(),
                        stream,
                        buffer: Vec::new(),
                    });
                }
                Err(err) if err.kind() == io::ErrorKind::TimedOut => {
                    return Err(deadline.expired());
                }
                Err(err) => {
                    tracing::debug!(host, %addr, error = %err, "connect attempt failed");
                    last_err = Some(err);
                }
            }
        }
        Err(ProbeError::connect(
            host,
            last_err.unwrap_or_else(|| {
                io::Error::new(
                    io::ErrorKind::AddrNotAvailable,
                    "no socket address available",
                )
            }),
        ))
    }

    pub(crate) fn send_command(
        &mut self,
        command: &str,
        deadline: &Deadline,
    ) -> Result<(), ProbeError> {
        let remaining = deadline.remaining()?;
        self.stream
            .set_write_timeout(Some(remaining))
            .map_err(ProbeError::io)?;
        let mut line = command.as_bytes().to_vec();
        line.extend_from_slice(b"\r\n");
        self.stream
            .write_all(&line)
            .and_then(|()| self.stream.flush())
            .map_err(|err| deadline.map_io(err))?;
        tracing::debug!(host = %self.host, command, "C");
        Ok(())
    }

    /// Reads one complete reply, grouping `NNN-` continuation lines.
    ///
    /// Returns `Ok(None)` when the server closed the connection.
    pub(crate) fn read_reply(&mut self, deadline: &Deadline) -> Result<Option<SmtpReply>, ProbeError> {
        let mut code: Option<u16> = None;
        let mut lines = Vec::new();
        loop {
            let Some(line) = self.read_line(deadline)? else {
                return Ok(None);
            };
            let parsed_code = parse_code(&line)?;
            if let Some(existing) = code {
                if existing != parsed_code {
                    return Err(ProbeError::Protocol(format!(
                        "inconsistent reply codes: {existing} vs {parsed_code}"
                    )));
                }
            } else {
                code = Some(parsed_code);
            }
            let continuation = line.as_bytes().get(3).copied() == Some(b'-');
            lines.push(line);
            if !continuation {
                break;
            }
        }
        let reply = SmtpReply {
            code: code.ok_or_else(|| ProbeError::Protocol("reply missing status code".into()))?,
            raw: lines.join("\n"),
        };
        tracing::debug!(host = %self.host, code = reply.code, raw = %reply.raw, "S");
        Ok(Some(reply))
    }

    /// Ends the session politely. Failures are ignored: the socket is about
    /// to be dropped anyway.
    pub(crate) fn quit(&mut self, deadline: &Deadline) {
        if let Err(err) = self.send_command("QUIT", deadline) {
            tracing::debug!(host = %self.host, error = %err, "QUIT not delivered");
        }
        self.stream.shutdown(Shutdown::Both).ok();
    }

    fn read_line(&mut self, deadline: &Deadline) -> Result<Option<String>, ProbeError> {
        loop {
            if let Some(pos) = self.buffer.iter().position(|byte| *byte == b'\n') {
                let mut line = self.buffer.drain(..=pos).collect::<Vec<_>>();
                line.pop();
                if line.ends_with(b"\r") {
                    line.pop();
                }
                return Ok(Some(String::from_utf8_lossy(&line).into_owned()));
            }

            let remaining = deadline.remaining()?;
            self.stream
                .set_read_timeout(Some(remaining))
                .map_err(ProbeError::io)?;
            let mut buf = [0u8; 512];
            let read = match self.stream.read(&mut buf) {
                Ok(read) => read,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(deadline.map_io(err)),
            };
            if read == 0 {
                if !self.buffer.is_empty() {
                    tracing::debug!(host = %self.host, pending = self.buffer.len(), "unterminated reply discarded");
                }
                return Ok(None);
            }
            self.buffer.extend_from_slice(&buf[..read]);
        }
    }
}

impl Drop for SmtpSession {
    fn drop(&mut self) {
        tracing::debug!(host = %self.host, "SMTP connection closed");
    }
}

fn system_lookup(host: &str, port: u16) -> io::Result<Vec<SocketAddr>> {
    Ok((host, port).to_socket_addrs()?.collect())
}

/// Resolves `host` on a helper thread so a stalled system resolver cannot
/// outlive `deadline`. IP literals skip the lookup.
pub(crate) fn resolve_addrs<F>(
    host: &str,
    port: u16,
    deadline: &Deadline,
    lookup: F,
) -> Result<Vec<SocketAddr>, ProbeError>
where
    F: FnOnce(&str, u16) -> io::Result<Vec<SocketAddr>> + Send + 'static,
{
    if let Ok(ip) = host.parse::<IpAddr>() {
        return Ok(vec![SocketAddr::new(ip, port)]);
    }

    let remaining = deadline.remaining()?;
    let (tx, rx) = mpsc::channel();
    let name = host.to_string();
    thread::Builder::new()
        .name("mx-addr-lookup".into())
        .spawn(move || {
            // The receiver is gone once the deadline passed.
            let _ = tx.send(lookup(&name, port));
        })
        .map_err(|err| ProbeError::connect(host, err))?;

    match rx.recv_timeout(remaining) {
        Ok(result) => result.map_err(|err| ProbeError::connect(host, err)),
        Err(RecvTimeoutError::Timeout) => {
            tracing::debug!(host, "address lookup outlived the deadline");
            Err(deadline.expired())
        }
        Err(RecvTimeoutError::Disconnected) => Err(ProbeError::connect(
            host,
            io::Error::other("address lookup thread exited without an answer"),
        )),
    }
}

fn parse_code(line: &str) -> Result<u16, ProbeError> {
    let bytes = line.as_bytes();
    if bytes.len() < 3 || !bytes[..3].iter().all(u8::is_ascii_digit) {
        return Err(ProbeError::Protocol(format!("invalid reply: '{line}'")));
    }
    line[..3]
        .parse::<u16>()
        .map_err(|_| ProbeError::Protocol(format!("invalid code in line: '{line}'")))
}
