//! DNS MX resolution.
//!
//! The orchestrator only talks to the [`MxResolver`] trait. The default
//! implementation, [`DnsMxResolver`], queries the system resolver and never
//! reports lookup failures: "no mail server" and "lookup failed" both come
//! back as an empty list.

mod error;
mod resolver;
mod types;

pub use error::MxError;
pub use resolver::{DnsMxResolver, MxResolver, check_mx};
pub use types::MxRecord;
