//! Syntactic gate: address grammar plus a deny-list of local parts.
//!
//! The public entry point is [`is_valid_pattern`]. It carries no state of its
//! own; the compiled grammar is an immutable static shared by every call.

use std::sync::LazyLock;

use regex::Regex;

/// dot-atom or quoted local part, then a bracketed IPv4 literal or a dotted
/// host name ending in an alphabetic TLD.
const ADDRESS_GRAMMAR: &str = r#"^(([^<>()\[\]\\.,;:\s@"]+(\.[^<>()\[\]\\.,;:\s@"]+)*)|(".+"))@((\[[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}\])|(([a-zA-Z\-0-9]+\.)+[a-zA-Z]{2,}))$"#;

static ADDRESS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(ADDRESS_GRAMMAR).expect("address grammar compiles"));

/// Returns `true` when `email` matches the address grammar **or** its local
/// part is not listed in `invalid_mailbox_keywords`.
///
/// The two tests are OR-ed: a grammatical address passes even when its local
/// part is denied, and a non-grammatical one passes unless it is denied.
pub fn is_valid_pattern<S: AsRef<str>>(email: &str, invalid_mailbox_keywords: &[S]) -> bool {
    matches_pattern(email) || !is_denied(local_part(email), invalid_mailbox_keywords)
}

/// Grammar test alone, without the deny-list.
pub fn matches_pattern(email: &str) -> bool {
    ADDRESS_RE.is_match(email)
}

/// Everything before the first `@`, or the whole input when there is none.
pub fn local_part(email: &str) -> &str {
    email.split('@').next().unwrap_or(email)
}

/// Text between the first and the second `@`; empty when there is no `@`.
pub fn domain_part(email: &str) -> &str {
    email.split('@').nth(1).unwrap_or("")
}

fn is_denied<S: AsRef<str>>(local: &str, invalid_mailbox_keywords: &[S]) -> bool {
    invalid_mailbox_keywords
        .iter()
        .any(|keyword| keyword.as_ref() == local)
}
