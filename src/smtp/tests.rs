use std::io::{self, BufRead, BufReader, Write};
use std::net::{Shutdown, TcpListener, TcpStream};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use super::{ProbeError, ProbeOptions, probe_mailbox};
use crate::mx::MxRecord;

/// What the mock server does once its script is exhausted.
#[derive(Debug, Clone, Copy)]
pub(crate) enum AfterScript {
    /// Keep reading (and recording) client lines until the client hangs up.
    Drain,
    /// Send FIN, then drain until the client hangs up as well.
    Close,
}

/// Loopback SMTP server answering `script` in order. The join handle yields
/// every line the client sent.
pub(crate) fn spawn_mock_server(
    greeting: &'static str,
    script: Vec<(&'static str, &'static str)>,
    after: AfterScript,
) -> (u16, thread::JoinHandle<Vec<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind mock server");
    let port = listener.local_addr().expect("addr").port();
    let (ready_tx, ready_rx) = mpsc::channel();
    let handle = thread::spawn(move || {
        ready_tx.send(()).ok();
        let mut received = Vec::new();
        if let Ok((mut stream, _)) = listener.accept() {
            let _ = handle_session(&mut stream, greeting, script, after, &mut received);
        }
        received
    });
    ready_rx.recv().expect("server ready");
    (port, handle)
}

fn handle_session(
    stream: &mut TcpStream,
    greeting: &str,
    script: Vec<(&'static str, &'static str)>,
    after: AfterScript,
    received: &mut Vec<String>,
) -> io::Result<()> {
    stream.set_read_timeout(Some(Duration::from_secs(10)))?;
    let mut reader = BufReader::new(stream.try_clone()?);
    write_split(stream, greeting)?;
    for (expected, response) in script {
        let line = read_client_line(&mut reader)?;
        assert!(
            line.starts_with(expected),
            "expected command starting with '{expected}', got '{line}'"
        );
        received.push(line);
        write_split(stream, response)?;
    }
    if let AfterScript::Close = after {
        stream.shutdown(Shutdown::Write)?;
    }
    loop {
        let line = read_client_line(&mut reader)?;
        if line.is_empty() {
            break;
        }
        received.push(line);
    }
    Ok(())
}

fn read_client_line(reader: &mut BufReader<TcpStream>) -> io::Result<String> {
    let mut line = String::new();
    reader.read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

/// Sends `data` in two TCP writes so replies reach the client in pieces.
fn write_split(stream: &mut TcpStream, data: &str) -> io::Result<()> {
    let (head, tail) = data.split_at(data.len() / 2);
    stream.write_all(head.as_bytes())?;
    stream.flush()?;
    thread::sleep(Duration::from_millis(15));
    stream.write_all(tail.as_bytes())?;
    stream.flush()
}

pub(crate) fn loopback() -> Vec<MxRecord> {
    vec![MxRecord::new(10, "127.0.0.1")]
}

fn options(port: u16, timeout_ms: u64) -> ProbeOptions {
    ProbeOptions::new("probe@example.org", timeout_ms).with_port(port)
}

#[test]
fn full_script_yields_three_exchanges() {
    let (port, handle) = spawn_mock_server(
        "220 mock.smtp.test ESMTP\r\n",
        vec![
            ("HELO", "250 mock.smtp.test\r\n"),
            ("MAIL FROM:", "250 2.1.0 Ok\r\n"),
            ("RCPT TO:", "250 2.1.5 Ok\r\n"),
        ],
        AfterScript::Drain,
    );

    let transcript =
        probe_mailbox("user@example.com", &loopback(), &options(port, 5_000)).expect("probe");

    let commands: Vec<&str> = transcript.iter().map(|e| e.command.as_str()).collect();
    assert_eq!(
        commands,
        [
            "HELO 127.0.0.1",
            "MAIL FROM: <probe@example.org>",
            "RCPT TO: <user@example.com>",
        ]
    );
    assert!(transcript.iter().all(|e| e.status_code == 250));
    assert_eq!(transcript[2].raw_message, "250 2.1.5 Ok");

    let received = handle.join().expect("server thread");
    assert_eq!(received.last().map(String::as_str), Some("QUIT"));
}

#[test]
fn rcpt_rejection_is_recorded_as_third_exchange() {
    let (port, handle) = spawn_mock_server(
        "220 mock.smtp.test ESMTP\r\n",
        vec![
            ("HELO", "250 mock.smtp.test\r\n"),
            ("MAIL FROM:", "250 2.1.0 Ok\r\n"),
            ("RCPT TO:", "550 5.1.1 User unknown\r\n"),
        ],
        AfterScript::Drain,
    );

    let transcript =
        probe_mailbox("ghost@example.com", &loopback(), &options(port, 5_000)).expect("probe");
    assert_eq!(transcript.len(), 3);
    assert_eq!(transcript[2].status_code, 550);
    assert_eq!(transcript[2].raw_message, "550 5.1.1 User unknown");
    handle.join().expect("server thread");
}

#[test]
fn negative_replies_above_threshold_still_advance() {
    let (port, handle) = spawn_mock_server(
        "220 mock.smtp.test ESMTP\r\n",
        vec![
            ("HELO", "250 mock.smtp.test\r\n"),
            ("MAIL FROM:", "553 5.7.1 Sender rejected\r\n"),
            ("RCPT TO:", "503 5.5.1 Need MAIL first\r\n"),
        ],
        AfterScript::Drain,
    );

    let transcript =
        probe_mailbox("user@example.com", &loopback(), &options(port, 5_000)).expect("probe");
    let codes: Vec<u16> = transcript.iter().map(|e| e.status_code).collect();
    assert_eq!(codes, [250, 553, 503]);
    handle.join().expect("server thread");
}

#[test]
fn multiline_replies_are_grouped() {
    let (port, handle) = spawn_mock_server(
        "220-mock.smtp.test ESMTP\r\n220 no UCE\r\n",
        vec![
            ("HELO", "250-mock.smtp.test\r\n250-SIZE 1000000\r\n250 8BITMIME\r\n"),
            ("MAIL FROM:", "250 2.1.0 Ok\r\n"),
            ("RCPT TO:", "250 2.1.5 Ok\r\n"),
        ],
        AfterScript::Drain,
    );

    let transcript =
        probe_mailbox("user@example.com", &loopback(), &options(port, 5_000)).expect("probe");
    assert_eq!(transcript.len(), 3);
    assert_eq!(
        transcript[0].raw_message,
        "250-mock.smtp.test\n250-SIZE 1000000\n250 8BITMIME"
    );
    handle.join().expect("server thread");
}

#[test]
fn server_hangup_returns_partial_transcript() {
    let (port, handle) = spawn_mock_server(
        "220 mock.smtp.test ESMTP\r\n",
        vec![("HELO", "250 mock.smtp.test\r\n")],
        AfterScript::Close,
    );

    let transcript =
        probe_mailbox("user@example.com", &loopback(), &options(port, 5_000)).expect("probe");
    assert_eq!(transcript.len(), 1);
    assert_eq!(transcript[0].command, "HELO 127.0.0.1");
    handle.join().expect("server thread");
}

#[test]
fn greeting_at_or_below_200_stalls_until_timeout() {
    let (port, handle) =
        spawn_mock_server("200 please hold\r\n", Vec::new(), AfterScript::Drain);

    let err = probe_mailbox("user@example.com", &loopback(), &options(port, 300))
        .expect_err("stalled session must time out");
    assert!(err.is_timeout(), "unexpected error: {err}");

    let received = handle.join().expect("server thread");
    assert!(received.is_empty(), "no command expected, got {received:?}");
}

#[test]
fn stall_mid_script_discards_partial_transcript() {
    let (port, handle) = spawn_mock_server(
        "220 mock.smtp.test ESMTP\r\n",
        vec![("HELO", "200 odd but valid\r\n")],
        AfterScript::Drain,
    );

    let err = probe_mailbox("user@example.com", &loopback(), &options(port, 300))
        .expect_err("stalled session must time out");
    assert!(matches!(err, ProbeError::Timeout { .. }));
    let received = handle.join().expect("server thread");
    assert_eq!(received, ["HELO 127.0.0.1"]);
}

#[test]
fn refused_connection_is_a_connect_error() {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().expect("addr").port();
    drop(listener);

    let err = probe_mailbox("user@example.com", &loopback(), &options(port, 2_000))
        .expect_err("nothing listens");
    assert!(matches!(err, ProbeError::Connect { .. }), "unexpected error: {err}");
}

#[test]
fn malformed_greeting_is_a_protocol_error() {
    let (port, handle) = spawn_mock_server("hello there\r\n", Vec::new(), AfterScript::Drain);

    let err = probe_mailbox("user@example.com", &loopback(), &options(port, 2_000))
        .expect_err("garbage greeting");
    assert!(matches!(err, ProbeError::Protocol(_)), "unexpected error: {err}");
    handle.join().expect("server thread");
}

#[test]
fn only_first_candidate_is_contacted() {
    let (port, handle) = spawn_mock_server(
        "220 mock.smtp.test ESMTP\r\n",
        vec![
            ("HELO 127.0.0.1", "250 mock.smtp.test\r\n"),
            ("MAIL FROM:", "250 2.1.0 Ok\r\n"),
            ("RCPT TO:", "250 2.1.5 Ok\r\n"),
        ],
        AfterScript::Drain,
    );
    let candidates = vec![
        MxRecord::new(10, "127.0.0.1"),
        MxRecord::new(20, "backup.invalid"),
    ];

    let transcript =
        probe_mailbox("user@example.com", &candidates, &options(port, 5_000)).expect("probe");
    assert_eq!(transcript.len(), 3);
    handle.join().expect("server thread");
}
