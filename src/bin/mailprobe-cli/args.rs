use clap::{Parser, Subcommand};
use mailprobe_lib::VerificationRequest;
use mailprobe_lib::smtp::{DEFAULT_MAIL_FROM, DEFAULT_TIMEOUT_MS, SMTP_PORT};

#[derive(Parser)]
#[command(name = "mailprobe-cli")]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Option<Commands>,

    /// lit des adresses depuis stdin (une par ligne) et les vérifie
    #[arg(long)]
    pub stdin: bool,

    /// write report to file (JSON/NDJSON/CSV selon --format)
    #[arg(long, global = true)]
    pub out: Option<String>,

    /// format: human|json|ndjson|csv
    #[arg(long, global = true, default_value = "human")]
    pub format: String,

    /// enveloppe MAIL FROM
    #[arg(long = "from", global = true, default_value = DEFAULT_MAIL_FROM)]
    pub mail_from: String,

    /// partie locale refusée (répétable)
    #[arg(long = "keyword", global = true)]
    pub keywords: Vec<String>,

    /// timeout de la session SMTP (ms)
    #[arg(long = "timeout", global = true, default_value_t = DEFAULT_TIMEOUT_MS)]
    pub timeout_ms: u64,

    /// port SMTP interrogé
    #[arg(long, global = true, default_value_t = SMTP_PORT)]
    pub port: u16,

    /// logs détaillés (debug) sur stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// pattern + MX + sonde SMTP
    Verify {
        /// adresse e-mail à tester
        email: String,
    },
    /// résout les enregistrements MX du domaine
    Mx { domain: String },
    /// vérifie uniquement le format de l'adresse
    Pattern { email: String },
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    pub fn clap_command() -> clap::Command {
        <Self as clap::CommandFactory>::command()
    }

    pub fn request(&self, email: &str) -> VerificationRequest {
        VerificationRequest::new(email.trim())
            .with_mail_from(self.mail_from.as_str())
            .with_invalid_mailbox_keywords(self.keywords.iter().map(String::as_str))
            .with_timeout_ms(self.timeout_ms)
    }
}
