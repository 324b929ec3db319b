use std::future::Future;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::{debug, info};
use sqlx::{
    Row, Sqlite,
    migrate::MigrateDatabase,
    sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow},
};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::models::{NewPairing, Pairing, Side, Vote, VoteCounts};

/// Process-wide storage handle. Opened once at startup and shared by every
/// request.
pub struct Database {
    pool: SqlitePool,
    timeout: Duration,
}

impl Database {
    pub async fn new(config: &Config) -> Result<Self> {
        let db_url = &config.database_url;

        // Create database if it doesn't exist
        if !Sqlite::database_exists(db_url).await.unwrap_or(false) {
            info!("Creating database at {}", db_url);
            Sqlite::create_database(db_url).await?;
        }

        let options = SqliteConnectOptions::from_str(db_url)?
            .foreign_keys(true)
            .busy_timeout(config.db_timeout);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.db_timeout)
            .connect_with(options)
            .await?;

        let database = Self {
            pool,
            timeout: config.db_timeout,
        };
        database.init_schema().await?;

        Ok(database)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    // Bound every storage call so a stalled database surfaces as Unavailable.
    async fn timed<T, F>(&self, fut: F) -> Result<T>
    where
        F: Future<Output = std::result::Result<T, sqlx::Error>>,
    {
        Ok(tokio::time::timeout(self.timeout, fut).await??)
    }

    async fn init_schema(&self) -> Result<()> {
        self.timed(
            sqlx::query(
                r#"
                CREATE TABLE IF NOT EXISTS pairings (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    left_label TEXT NOT NULL,
                    right_label TEXT NOT NULL,
                    left_img_url TEXT NOT NULL,
                    right_img_url TEXT NOT NULL
                );
                "#,
            )
            .execute(&self.pool),
        )
        .await?;

        // UNIQUE (pairing_id, visitor_key) is the only thing standing between
        // two concurrent first votes and a double count.
        self.timed(
            sqlx::query(
                r#"
                CREATE TABLE IF NOT EXISTS votes (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    pairing_id INTEGER NOT NULL,
                    visitor_key TEXT NOT NULL,
                    side TEXT NOT NULL CHECK (side IN ('left', 'right')),
                    created_at TEXT NOT NULL DEFAULT (datetime('now')),
                    UNIQUE (pairing_id, visitor_key),
                    FOREIGN KEY (pairing_id) REFERENCES pairings(id)
                );
                "#,
            )
            .execute(&self.pool),
        )
        .await?;

        Ok(())
    }

    pub async fn pairing_count(&self) -> Result<i64> {
        let row = self
            .timed(sqlx::query("SELECT COUNT(*) AS count FROM pairings").fetch_one(&self.pool))
            .await?;
        Ok(row.get::<i64, _>("count"))
    }

    /// Insert the stock pairings when the table is empty. Returns how many
    /// were inserted.
    pub async fn seed_default_pairings(&self) -> Result<u64> {
        if self.pairing_count().await? > 0 {
            return Ok(0);
        }

        let defaults = [
            NewPairing::new("Pizza", "Sushi", "/images/pizza.jpg", "/images/sushi.jpg"),
            NewPairing::new("Tacos", "Hamburger", "/images/tacos.jpg", "/images/hamburger.jpg"),
        ];
        for pairing in &defaults {
            self.create_pairing(pairing).await?;
        }

        info!("Seeded {} default pairings", defaults.len());
        Ok(defaults.len() as u64)
    }

    pub async fn create_pairing(&self, pairing: &NewPairing) -> Result<Pairing> {
        let result = self
            .timed(
                sqlx::query(
                    r#"
                    INSERT INTO pairings (left_label, right_label, left_img_url, right_img_url)
                    VALUES (?, ?, ?, ?)
                    "#,
                )
                .bind(&pairing.left_label)
                .bind(&pairing.right_label)
                .bind(&pairing.left_img_url)
                .bind(&pairing.right_img_url)
                .execute(&self.pool),
            )
            .await?;

        Ok(Pairing {
            id: result.last_insert_rowid(),
            left_label: pairing.left_label.clone(),
            right_label: pairing.right_label.clone(),
            left_img_url: pairing.left_img_url.clone(),
            right_img_url: pairing.right_img_url.clone(),
        })
    }

    pub async fn get_pairing(&self, pairing_id: i64) -> Result<Option<Pairing>> {
        self.timed(
            sqlx::query_as::<_, Pairing>(
                r#"
                SELECT id, left_label, right_label, left_img_url, right_img_url
                FROM pairings
                WHERE id = ?
                "#,
            )
            .bind(pairing_id)
            .fetch_optional(&self.pool),
        )
        .await
    }

    pub async fn pairing_exists(&self, pairing_id: i64) -> Result<bool> {
        let row = self
            .timed(
                sqlx::query("SELECT 1 FROM pairings WHERE id = ?")
                    .bind(pairing_id)
                    .fetch_optional(&self.pool),
            )
            .await?;
        Ok(row.is_some())
    }

    pub async fn pairing_ids(&self) -> Result<Vec<i64>> {
        let rows = self
            .timed(sqlx::query("SELECT id FROM pairings ORDER BY id").fetch_all(&self.pool))
            .await?;
        Ok(rows.into_iter().map(|row| row.get::<i64, _>("id")).collect())
    }

    /// Uniformly random pairing with no vote from `visitor_key`.
    pub async fn random_unvoted_pairing(&self, visitor_key: &str) -> Result<Option<Pairing>> {
        self.timed(
            sqlx::query_as::<_, Pairing>(
                r#"
                SELECT p.id, p.left_label, p.right_label, p.left_img_url, p.right_img_url
                FROM pairings p
                WHERE NOT EXISTS (
                    SELECT 1
                    FROM votes v
                    WHERE v.pairing_id = p.id
                    AND v.visitor_key = ?
                )
                ORDER BY RANDOM()
                LIMIT 1
                "#,
            )
            .bind(visitor_key)
            .fetch_optional(&self.pool),
        )
        .await
    }

    /// Uniformly random pairing, ignoring vote history.
    pub async fn random_pairing(&self) -> Result<Option<Pairing>> {
        self.timed(
            sqlx::query_as::<_, Pairing>(
                r#"
                SELECT id, left_label, right_label, left_img_url, right_img_url
                FROM pairings
                ORDER BY RANDOM()
                LIMIT 1
                "#,
            )
            .fetch_optional(&self.pool),
        )
        .await
    }

    /// Append a vote. Returns `false` when (pairing, visitor) already has
    /// one; the uniqueness constraint decides, not a prior read.
    pub async fn insert_vote(
        &self,
        pairing_id: i64,
        visitor_key: &str,
        side: Side,
        created_at: DateTime<Utc>,
    ) -> Result<bool> {
        let result = tokio::time::timeout(
            self.timeout,
            sqlx::query(
                r#"
                INSERT INTO votes (pairing_id, visitor_key, side, created_at)
                VALUES (?, ?, ?, ?)
                "#,
            )
            .bind(pairing_id)
            .bind(visitor_key)
            .bind(side.as_str())
            .bind(created_at)
            .execute(&self.pool),
        )
        .await?;

        match result {
            Ok(_) => Ok(true),
            Err(sqlx::Error::Database(db_err)) if db_err.is_foreign_key_violation() => {
                Err(Error::NotFound(format!("pairing {}", pairing_id)))
            }
            Err(e) => match Error::from(e) {
                Error::Conflict(msg) => {
                    debug!("Duplicate vote for pairing {} by {}: {}", pairing_id, visitor_key, msg);
                    Ok(false)
                }
                other => Err(other),
            },
        }
    }

    /// Aggregate straight from the vote rows.
    pub async fn vote_counts(&self, pairing_id: i64) -> Result<VoteCounts> {
        let row = self
            .timed(
                sqlx::query(
                    r#"
                    SELECT
                        COALESCE(SUM(CASE WHEN side = 'left' THEN 1 ELSE 0 END), 0) AS left_votes,
                        COALESCE(SUM(CASE WHEN side = 'right' THEN 1 ELSE 0 END), 0) AS right_votes
                    FROM votes
                    WHERE pairing_id = ?
                    "#,
                )
                .bind(pairing_id)
                .fetch_one(&self.pool),
            )
            .await?;

        Ok(VoteCounts::new(
            row.get::<i64, _>("left_votes"),
            row.get::<i64, _>("right_votes"),
        ))
    }

    pub async fn get_pairing_votes(&self, pairing_id: i64) -> Result<Vec<Vote>> {
        let rows = self
            .timed(
                sqlx::query(
                    r#"
                    SELECT id, pairing_id, visitor_key, side, created_at
                    FROM votes
                    WHERE pairing_id = ?
                    ORDER BY id
                    "#,
                )
                .bind(pairing_id)
                .fetch_all(&self.pool),
            )
            .await?;

        rows.iter().map(vote_from_row).collect()
    }
}

fn vote_from_row(row: &SqliteRow) -> Result<Vote> {
    Ok(Vote {
        id: row.try_get("id")?,
        pairing_id: row.try_get("pairing_id")?,
        visitor_key: row.try_get("visitor_key")?,
        side: row.try_get::<String, _>("side")?.parse()?,
        created_at: row.try_get("created_at")?,
    })
}
