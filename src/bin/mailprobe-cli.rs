#[path = "mailprobe-cli/args.rs"]
mod args;
#[path = "mailprobe-cli/output.rs"]
mod output;

use std::io::{self, BufRead};

use anyhow::{Context, Result};
use mailprobe_lib::{Verifier, check_mx, is_valid_pattern};
use tracing_subscriber::EnvFilter;

use crate::args::{Cli, Commands};
use crate::output::{OutputRow, any_error, any_negative, format_mx, write_reports};

fn init_tracing(verbose: bool) {
    let fallback = if verbose { "mailprobe_lib=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let emails: Vec<String> = match &cli.cmd {
        Some(Commands::Mx { domain }) => return run_mx(domain),
        Some(Commands::Pattern { email }) => return run_pattern(email, &cli),
        Some(Commands::Verify { email }) => vec![email.clone()],
        None if cli.stdin => {
            let mut emails = Vec::new();
            for line in io::stdin().lock().lines() {
                let line = line.context("read stdin")?;
                if !line.trim().is_empty() {
                    emails.push(line);
                }
            }
            emails
        }
        None => {
            Cli::clap_command().print_help()?;
            println!();
            return Ok(());
        }
    };

    let verifier = Verifier::from_system_conf()
        .context("DNS resolver")?
        .with_port(cli.port);

    let rows: Vec<OutputRow> = emails
        .iter()
        .map(|email| {
            let request = cli.request(email);
            OutputRow::new(request.email_address(), verifier.verify(&request))
        })
        .collect();

    write_reports(&rows, &cli)?;

    // codes de sortie : 0 OK, 2 négatif, 1 échec d'une vérification
    if any_error(&rows) {
        std::process::exit(1);
    }
    if any_negative(&rows) {
        std::process::exit(2);
    }
    Ok(())
}

fn run_mx(domain: &str) -> Result<()> {
    let records = check_mx(domain).context("DNS resolver")?;
    if records.is_empty() {
        println!("[NO MX] {domain}");
        std::process::exit(2);
    }
    println!("[MX]    {domain} :: {}", format_mx(&records, ", "));
    Ok(())
}

fn run_pattern(email: &str, cli: &Cli) -> Result<()> {
    let email = email.trim();
    if is_valid_pattern(email, &cli.keywords) {
        println!("[OK]      {email}");
        Ok(())
    } else {
        println!("[INVALID] {email}");
        std::process::exit(2);
    }
}
