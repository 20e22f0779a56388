use trust_dns_resolver::{
    Resolver,
    error::{ResolveError, ResolveErrorKind},
};

use super::{MxError, MxRecord};

/// Source of mail-exchanger candidates for the verification pipeline.
///
/// Implementations return candidates sorted best-first. An `Err` is treated
/// by the orchestrator as a failed check, not as "no mail server".
pub trait MxResolver {
    fn resolve_mx(&self, hostname: &str) -> Result<Vec<MxRecord>, MxError>;
}

impl<F> MxResolver for F
where
    F: Fn(&str) -> Result<Vec<MxRecord>, MxError>,
{
    fn resolve_mx(&self, hostname: &str) -> Result<Vec<MxRecord>, MxError> {
        self(hostname)
    }
}

/// [`MxResolver`] backed by the system DNS configuration.
pub struct DnsMxResolver {
    resolver: Resolver,
}

impl DnsMxResolver {
    pub fn from_system_conf() -> Result<Self, MxError> {
        let resolver =
            Resolver::from_system_conf().map_err(|source| MxError::ResolverInit { source })?;
        Ok(Self { resolver })
    }
}

impl MxResolver for DnsMxResolver {
    /// Never fails: lookup problems of any kind yield an empty list.
    fn resolve_mx(&self, hostname: &str) -> Result<Vec<MxRecord>, MxError> {
        Ok(resolve_with(&self.resolver, hostname))
    }
}

/// Lookup MX records for `domain` using the system resolver.
///
/// Only resolver initialization can fail; the records come back sorted by
/// ascending preference and empty when the domain has no usable MX.
pub fn check_mx(domain: &str) -> Result<Vec<MxRecord>, MxError> {
    DnsMxResolver::from_system_conf()?.resolve_mx(domain)
}

pub(crate) fn resolve_with<R>(resolver: &R, hostname: &str) -> Vec<MxRecord>
where
    R: LookupMx,
{
    let Some(ascii) = normalize_domain(hostname) else {
        return Vec::new();
    };

    let mut records = match resolver.lookup_mx(&ascii) {
        Ok(records) => records,
        Err(err) => {
            if is_no_records(&err) {
                tracing::debug!(domain = %ascii, "no MX records");
            } else {
                tracing::debug!(domain = %ascii, error = %err, "MX lookup failed");
            }
            return Vec::new();
        }
    };

    records.sort();
    records.dedup();
    tracing::debug!(domain = %ascii, count = records.len(), "MX records resolved");
    records
}

/// ASCII form of `domain`, or `None` when there is nothing to look up.
pub(crate) fn normalize_domain(domain: &str) -> Option<String> {
    let trimmed = domain.trim();
    if trimmed.is_empty() {
        tracing::debug!("MX lookup skipped: empty domain");
        return None;
    }
    match idna::domain_to_ascii(trimmed) {
        Ok(ascii) => Some(ascii),
        Err(err) => {
            tracing::debug!(domain = trimmed, error = %err, "MX lookup skipped: IDNA conversion failed");
            None
        }
    }
}

pub(crate) fn normalize_exchange(exchange: String) -> String {
    let trimmed = exchange.trim_end_matches('.');
    trimmed.to_ascii_lowercase()
}

fn is_no_records(err: &ResolveError) -> bool {
    matches!(err.kind(), ResolveErrorKind::NoRecordsFound { .. })
}

pub(crate) trait LookupMx {
    fn lookup_mx(&self, domain: &str) -> Result<Vec<MxRecord>, ResolveError>;
}

impl LookupMx for Resolver {
    fn lookup_mx(&self, domain: &str) -> Result<Vec<MxRecord>, ResolveError> {
        let lookup = Resolver::mx_lookup(self, domain)?;
        let mut records = Vec::new();
        for mx in lookup.iter() {
            let exchange = normalize_exchange(mx.exchange().to_utf8());
            records.push(MxRecord::new(mx.preference(), exchange));
        }
        Ok(records)
    }
}

#[cfg(test)]
impl LookupMx for crate::mx::tests::StubResolver {
    fn lookup_mx(&self, domain: &str) -> Result<Vec<MxRecord>, ResolveError> {
        (self.on_lookup)(domain)
    }
}
