//! Pairing selection and the vote ledger.
//!
//! Both sit directly on [`Database`](crate::db::Database): the selector reads
//! vote history to prefer unseen pairings, the ledger appends votes and
//! derives tallies from them.

pub mod ledger;
pub mod selector;

pub use ledger::{cast_vote, get_vote_counts};
pub use selector::select_pairing;

use crate::error::{Error, Result};

/// Visitor keys are opaque: blank ones are rejected, anything else is used
/// byte for byte.
pub(crate) fn require_visitor_key(visitor_key: &str) -> Result<&str> {
    if visitor_key.trim().is_empty() {
        return Err(Error::InvalidArgument("visitor key must not be empty".into()));
    }
    Ok(visitor_key)
}
