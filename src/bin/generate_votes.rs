//! Populate the configured database with random votes.
//!
//! ```sh
//! cargo run --bin generate-votes -- 500
//! ```

use std::env;

use log::{error, info};
use which_is_better::config::Config;
use which_is_better::db::Database;
use which_is_better::tasks::vote_generator::generate_random_votes;

const DEFAULT_VOTES: u64 = 500;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    env_logger::init();

    if let Err(e) = run().await {
        error!("Vote generation failed: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let count = match env::args().nth(1) {
        Some(arg) => arg
            .parse::<u64>()
            .map_err(|e| format!("invalid vote count {:?}: {}", arg, e))?,
        None => DEFAULT_VOTES,
    };

    let config = Config::load()?;
    let database = Database::new(&config).await?;
    if config.seed_default_pairings {
        database.seed_default_pairings().await?;
    }

    let report = generate_random_votes(&database, count).await?;
    info!("{} random votes generated", report.inserted);
    Ok(())
}
