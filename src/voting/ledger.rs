use chrono::Utc;
use log::info;

use super::require_visitor_key;
use crate::db::Database;
use crate::error::{Error, Result};
use crate::models::{Side, VoteCounts};

/// Record `side` for (`pairing_id`, `visitor_key`) and return fresh counts.
///
/// A repeat vote is not an error: nothing is written and the current counts
/// come back unchanged. Concurrent repeats are settled by the storage
/// uniqueness constraint, so at most one of them is ever counted.
pub async fn cast_vote(
    database: &Database,
    pairing_id: i64,
    visitor_key: &str,
    side: &str,
) -> Result<VoteCounts> {
    let side: Side = side.parse()?;
    check_pairing_id(pairing_id)?;
    let visitor_key = require_visitor_key(visitor_key)?;

    if !database.pairing_exists(pairing_id).await? {
        return Err(Error::NotFound(format!("pairing {}", pairing_id)));
    }

    if database
        .insert_vote(pairing_id, visitor_key, side, Utc::now())
        .await?
    {
        info!("Recorded {} vote on pairing {}", side, pairing_id);
    } else {
        info!("Ignoring repeat vote on pairing {} from {}", pairing_id, visitor_key);
    }

    database.vote_counts(pairing_id).await
}

/// Current tallies for a pairing. An existing pairing with no votes yields
/// zero counts.
pub async fn get_vote_counts(database: &Database, pairing_id: i64) -> Result<VoteCounts> {
    check_pairing_id(pairing_id)?;

    if !database.pairing_exists(pairing_id).await? {
        return Err(Error::NotFound(format!("pairing {}", pairing_id)));
    }

    database.vote_counts(pairing_id).await
}

fn check_pairing_id(pairing_id: i64) -> Result<()> {
    if pairing_id <= 0 {
        return Err(Error::InvalidArgument(format!(
            "pairing id must be positive, got {}",
            pairing_id
        )));
    }
    Ok(())
}
