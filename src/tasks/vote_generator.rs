use chrono::{Duration, Utc};
use log::info;
use rand::Rng;
use rand::seq::SliceRandom;

use crate::db::Database;
use crate::error::{Error, Result};
use crate::models::Side;

/// How far back generated votes may be dated: one week.
const MAX_MINUTES_AGO: i64 = 10_080;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GenerationReport {
    pub inserted: u64,
    /// Draws that hit an existing (pairing, visitor) vote.
    pub skipped: u64,
}

/// Fill the ledger with `count` synthetic votes from random IPv4 visitors.
pub async fn generate_random_votes(database: &Database, count: u64) -> Result<GenerationReport> {
    let pairing_ids = database.pairing_ids().await?;

    let mut report = GenerationReport::default();
    for _ in 0..count {
        let (pairing_id, visitor_key, side, minutes_ago) = {
            let mut rng = rand::thread_rng();
            let pairing_id = *pairing_ids
                .choose(&mut rng)
                .ok_or_else(|| Error::NotFound("no pairings to vote on".into()))?;
            let ip: [u8; 4] = std::array::from_fn(|_| rng.gen_range(0..=255));
            let side = if rng.gen_bool(0.5) { Side::Left } else { Side::Right };
            let minutes_ago = rng.gen_range(0..MAX_MINUTES_AGO);
            (pairing_id, format!("{}.{}.{}.{}", ip[0], ip[1], ip[2], ip[3]), side, minutes_ago)
        };

        let created_at = Utc::now() - Duration::minutes(minutes_ago);
        if database.insert_vote(pairing_id, &visitor_key, side, created_at).await? {
            report.inserted += 1;
        } else {
            report.skipped += 1;
        }
    }

    info!(
        "Generated {} random votes ({} duplicates skipped)",
        report.inserted, report.skipped
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::tests::test_db;
    use crate::voting::get_vote_counts;

    #[tokio::test]
    async fn requires_pairings() {
        let (db, _dir) = test_db().await;
        let res = generate_random_votes(&db, 10).await;
        assert!(matches!(res, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn generated_votes_land_in_the_ledger() {
        let (db, _dir) = test_db().await;
        db.seed_default_pairings().await.unwrap();

        let report = generate_random_votes(&db, 50).await.unwrap();
        assert_eq!(report.inserted + report.skipped, 50);

        let mut total = 0;
        for id in db.pairing_ids().await.unwrap() {
            total += get_vote_counts(&db, id).await.unwrap().total();
            for vote in db.get_pairing_votes(id).await.unwrap() {
                let age = Utc::now() - vote.created_at;
                assert!(age <= Duration::minutes(MAX_MINUTES_AGO));
                assert_eq!(vote.visitor_key.split('.').count(), 4);
            }
        }
        assert_eq!(total as u64, report.inserted);
    }
}
