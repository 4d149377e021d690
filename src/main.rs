use anyhow::Context;
use tracing_subscriber::EnvFilter;

use quiz_client::config::AppConfig;
use quiz_client::console::Console;
use quiz_client::controller::AppController;
use quiz_client::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // stdout belongs to the interactive screens
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let config = AppConfig::load().context("Failed to load configuration")?;
    tracing::info!(
        "Configuration loaded (env: {}, backend: {})",
        std::env::var("RUN_ENV").unwrap_or_else(|_| "development".into()),
        config.backend.base_url
    );

    let state = AppState::from_config(config).context("Failed to initialise services")?;
    let mut controller = AppController::new(state);

    let result = Console::new().run(&mut controller).await;

    controller.logout().await;
    result
}
