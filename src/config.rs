use std::{env, fmt::Display, str::FromStr, time::Duration};

use log::info;

use crate::error::{Error, Result};

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub public_dir: String,
    pub max_connections: u32,
    pub db_timeout: Duration,
    pub seed_default_pairings: bool,
    pub trust_forwarded_for: bool,
}

impl Config {
    pub fn load() -> Result<Self> {
        Ok(Self {
            database_url: try_load("DATABASE_URL", "sqlite:which_is_better.db")?,
            port: try_load("PORT", "3000")?,
            public_dir: try_load("PUBLIC_DIR", "public")?,
            max_connections: try_load("DB_MAX_CONNECTIONS", "5")?,
            db_timeout: db_timeout(try_load("DB_TIMEOUT_SECS", "5")?)?,
            seed_default_pairings: try_load("SEED_DEFAULT_PAIRINGS", "true")?,
            trust_forwarded_for: try_load("TRUST_FORWARDED_FOR", "true")?,
        })
    }

    /// Settings for a database at `database_url`, everything else defaulted.
    pub fn for_database(database_url: &str) -> Self {
        Self {
            database_url: database_url.to_string(),
            port: 3000,
            public_dir: "public".to_string(),
            max_connections: 5,
            db_timeout: Duration::from_secs(5),
            seed_default_pairings: false,
            trust_forwarded_for: true,
        }
    }
}

/// A zero timeout would fail every storage call, so it is refused up front.
fn db_timeout(secs: u64) -> Result<Duration> {
    if secs == 0 {
        return Err(Error::InvalidArgument("DB_TIMEOUT_SECS must be at least 1".into()));
    }
    Ok(Duration::from_secs(secs))
}

fn try_load<T: FromStr>(key: &str, default: &str) -> Result<T>
where
    T::Err: Display,
{
    let raw = env::var(key).unwrap_or_else(|_| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });

    raw.parse()
        .map_err(|e| Error::InvalidArgument(format!("invalid {key} value {raw:?}: {e}")))
}
