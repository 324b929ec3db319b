use log::{debug, warn};

use super::require_visitor_key;
use crate::db::Database;
use crate::error::{Error, Result};
use crate::models::Pairing;

/// Pick a pairing for `visitor_key`, preferring ones they have not voted on.
///
/// Once every pairing has a vote from this visitor, any pairing may come
/// back. `NotFound` means there are no pairings at all, which is a seeding
/// problem rather than an exhausted visitor.
pub async fn select_pairing(database: &Database, visitor_key: &str) -> Result<Pairing> {
    let visitor_key = require_visitor_key(visitor_key)?;

    if let Some(pairing) = database.random_unvoted_pairing(visitor_key).await? {
        return Ok(pairing);
    }

    debug!("Visitor {} has voted on every pairing, falling back", visitor_key);
    match database.random_pairing().await? {
        Some(pairing) => Ok(pairing),
        None => {
            warn!("Pairing selection requested but no pairings exist");
            Err(Error::NotFound("no pairings have been created".into()))
        }
    }
}
