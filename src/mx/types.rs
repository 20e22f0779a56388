/// One mail exchanger for a domain.
///
/// Resolvers hand these out best-first and the SMTP probe only ever contacts
/// the head of the list; later entries are reported but never dialed.
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct MxRecord {
    #[cfg_attr(feature = "with-serde", serde(rename = "priority"))]
    pub preference: u16,
    pub exchange: String,
}

impl MxRecord {
    pub fn new(preference: u16, exchange: impl Into<String>) -> Self {
        Self {
            preference,
            exchange: exchange.into(),
        }
    }
}
