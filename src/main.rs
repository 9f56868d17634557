use campanile::api::{build_router, start_api_server, AppState};
use campanile::config::AppConfig;
use campanile::observability::init_logging;
use campanile::storage::create_pool;
use tracing::info;

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{} failed to start: {}", campanile::APP_NAME, err);
        std::process::exit(1);
    }
}

async fn run() -> campanile::Result<()> {
    dotenvy::dotenv().ok();
    init_logging()?;

    let config = AppConfig::from_env()?;
    info!(version = campanile::VERSION, "Starting Campanile backend");

    let pool = create_pool(&config.database).await?;
    let state = AppState::new(pool, &config.platform);
    let router = build_router(state);

    start_api_server(&config.server, router).await
}
