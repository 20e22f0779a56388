#[cfg(any(feature = "with-serde", feature = "with-csv"))]
use anyhow::Context;
use anyhow::{Result, bail};

use crate::args::Cli;
use mailprobe_lib::{MxRecord, VerificationResult, VerifyError};

#[cfg_attr(feature = "with-serde", derive(serde::Serialize))]
#[derive(Debug, Clone)]
pub struct OutputRow {
    pub email: String,
    #[cfg_attr(feature = "with-serde", serde(flatten))]
    pub verification: Option<VerificationResult>,
    #[cfg_attr(feature = "with-serde", serde(skip_serializing_if = "Option::is_none"))]
    pub error: Option<String>,
}

impl OutputRow {
    pub fn new(email: &str, outcome: Result<VerificationResult, VerifyError>) -> Self {
        match outcome {
            Ok(verification) => Self {
                email: email.to_string(),
                verification: Some(verification),
                error: None,
            },
            Err(err) => Self {
                email: email.to_string(),
                verification: None,
                error: Some(err.to_string()),
            },
        }
    }

    pub fn is_positive(&self) -> bool {
        self.verification
            .as_ref()
            .is_some_and(|v| v.result.is_positive())
    }
}

pub fn any_error(rows: &[OutputRow]) -> bool {
    rows.iter().any(|row| row.error.is_some())
}

pub fn any_negative(rows: &[OutputRow]) -> bool {
    rows.iter().any(|row| !row.is_positive())
}

pub fn write_reports(rows: &[OutputRow], cli: &Cli) -> Result<()> {
    match cli.format.as_str() {
        "human" => {
            let text = render_human(rows);
            if !text.is_empty() {
                println!("{text}");
            }
            Ok(())
        }
        "json" => write_json(rows, cli),
        "ndjson" => write_ndjson(rows, cli),
        "csv" => write_csv(rows, cli),
        other => bail!("unknown --format '{other}', use: human|json|ndjson|csv"),
    }
}

pub fn format_mx(records: &[MxRecord], sep: &str) -> String {
    records
        .iter()
        .map(|r| format!("{}:{}", r.preference, r.exchange))
        .collect::<Vec<_>>()
        .join(sep)
}

pub fn render_human(rows: &[OutputRow]) -> String {
    let mut lines = Vec::new();
    for row in rows {
        let Some(verification) = &row.verification else {
            let error = row.error.as_deref().unwrap_or("unknown");
            lines.push(format!("[ERROR]   {} :: {error}", row.email));
            continue;
        };

        let tag = if verification.result.is_positive() {
            "[VALID]  "
        } else {
            "[INVALID]"
        };
        lines.push(format!("{tag} {} :: {}", row.email, verification.result));

        if !verification.mx_records.is_empty() {
            lines.push(format!(
                "        mx: {}",
                format_mx(&verification.mx_records, ", ")
            ));
        }
        for (idx, exchange) in verification.smtp_messages.iter().enumerate() {
            let prefix = if idx == 0 { "        smtp:" } else { "             " };
            lines.push(format!(
                "{prefix} {} -> {}",
                exchange.command, exchange.status_code
            ));
        }
    }
    lines.join("\n")
}

#[cfg(feature = "with-serde")]
fn write_json(rows: &[OutputRow], cli: &Cli) -> Result<()> {
    let s = serde_json::to_string_pretty(rows)?;
    if let Some(path) = &cli.out {
        write_all_atomically(path, s.as_bytes())?;
    } else {
        println!("{s}");
    }
    Ok(())
}

#[cfg(not(feature = "with-serde"))]
fn write_json(_: &[OutputRow], _: &Cli) -> Result<()> {
    bail!("format=json nécessite la feature 'with-serde'")
}

#[cfg(feature = "with-serde")]
fn write_ndjson(rows: &[OutputRow], cli: &Cli) -> Result<()> {
    if let Some(path) = &cli.out {
        let mut buf = Vec::new();
        for row in rows {
            let line = serde_json::to_string(row)?;
            buf.extend_from_slice(line.as_bytes());
            buf.push(b'\n');
        }
        write_all_atomically(path, &buf)?;
    } else {
        for row in rows {
            println!("{}", serde_json::to_string(row)?);
        }
    }
    Ok(())
}

#[cfg(not(feature = "with-serde"))]
fn write_ndjson(_: &[OutputRow], _: &Cli) -> Result<()> {
    bail!("format=ndjson nécessite la feature 'with-serde'")
}

#[cfg(feature = "with-csv")]
fn write_csv(rows: &[OutputRow], cli: &Cli) -> Result<()> {
    if let Some(path) = &cli.out {
        let mut wtr = csv::Writer::from_writer(Vec::new());
        for row in rows {
            wtr.write_record(csv_record(row))?;
        }
        let data = wtr.into_inner()?;
        write_all_atomically(path, &data)?;
    } else {
        let mut wtr = csv::Writer::from_writer(std::io::stdout());
        for row in rows {
            wtr.write_record(csv_record(row))?;
        }
        wtr.flush()?;
    }
    Ok(())
}

#[cfg(not(feature = "with-csv"))]
fn write_csv(_: &[OutputRow], _: &Cli) -> Result<()> {
    bail!("format=csv nécessite la feature 'with-csv'")
}

#[cfg(feature = "with-csv")]
fn csv_record(row: &OutputRow) -> Vec<String> {
    let flag = |b: bool| b.to_string();
    match &row.verification {
        Some(v) => vec![
            row.email.clone(),
            flag(v.is_valid_pattern),
            flag(v.is_valid_mx),
            flag(v.is_valid_mailbox),
            v.result.to_string(),
            format_mx(&v.mx_records, ";"),
            v.smtp_messages
                .last()
                .map(|e| e.status_code.to_string())
                .unwrap_or_default(),
            String::new(),
        ],
        None => vec![
            row.email.clone(),
            String::new(),
            String::new(),
            String::new(),
            String::new(),
            String::new(),
            String::new(),
            row.error.clone().unwrap_or_default(),
        ],
    }
}

#[cfg(any(feature = "with-serde", feature = "with-csv"))]
fn write_all_atomically(path: &str, bytes: &[u8]) -> Result<()> {
    use std::io::Write;

    let tmp = format!("{path}.tmp");
    {
        let mut f = std::fs::File::create(&tmp)?;
        f.write_all(bytes)?;
        f.sync_all()?;
    }
    std::fs::rename(&tmp, path).with_context(|| format!("rename {tmp} -> {path}"))?;
    Ok(())
}
