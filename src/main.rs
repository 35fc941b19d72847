use price_king::{
    bot,
    config::{self, database},
    errors::{Error, Result},
    web::{self, AppState},
};
use dotenvy::dotenv;
use std::{env, sync::Arc};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file, non-fatal since env vars can be set externally
    dotenv().ok();

    // 3. Load the application configuration
    let app_config = Arc::new(config::load_app_configuration()?);
    info!(
        bind_addr = %app_config.server.bind_addr,
        timezone = %app_config.rules.timezone,
        "Loaded application configuration"
    );

    // 4. Connect, create tables and seed defaults
    if database::get_database_url().starts_with("sqlite://data/") {
        std::fs::create_dir_all("data")?;
    }
    let db = database::create_connection()
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    database::create_tables(&db).await?;
    database::seed_defaults(&db, &app_config.seed).await?;
    info!("Database initialized successfully.");

    // 5. Chat bot, only when a token is configured
    match env::var("DISCORD_BOT_TOKEN") {
        Ok(token) => {
            let bot_config = Arc::clone(&app_config);
            let bot_db = db.clone();
            tokio::spawn(async move {
                if let Err(e) = bot::run_bot(token, bot_config, bot_db).await {
                    error!(error = %e, "Chat bot stopped");
                }
            });
        }
        Err(_) => warn!("DISCORD_BOT_TOKEN not set, chat bot disabled"),
    }

    // 6. Serve the HTTP API
    let listener = tokio::net::TcpListener::bind(&app_config.server.bind_addr).await?;
    info!(addr = %app_config.server.bind_addr, "Listening");
    let app = web::router(AppState {
        db,
        config: app_config,
    });
    axum::serve(listener, app).await.map_err(Error::from)?;

    Ok(())
}
