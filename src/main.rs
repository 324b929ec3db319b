use log::error;
use which_is_better::config::Config;

#[tokio::main]
async fn main() {
    // Initialize logging
    dotenvy::dotenv().ok();
    env_logger::init();

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = which_is_better::start_server(config).await {
        error!("Server error: {}", e);
        std::process::exit(1);
    }
}
