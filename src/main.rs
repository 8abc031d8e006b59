// src/main.rs

use std::{sync::Arc, time::Duration};

use bible_trivia::{
    config::Config,
    routes,
    services::{
        fallback::FallbackSet,
        plans::PlanCatalog,
        provider::{HttpQuestionProvider, QuestionProvider, UnavailableProvider},
    },
    state::AppState,
    store::PgStore,
    utils::period::SystemClock,
};
use dotenvy::dotenv;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file (if present)
    dotenv().ok();

    // Load configuration from environment
    let config = Config::from_env()?;

    let file_appender = tracing_appender::rolling::daily("logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = EnvFilter::new(&config.rust_log);
    let stdout_layer = fmt::layer().with_writer(std::io::stdout).with_target(false);
    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);

    // Initialize Tracing (Logging)
    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    let pool = connect_with_retry(&config.database_url).await?;
    tracing::info!("Database connected...");

    // Run Migrations Automatically
    tracing::info!("Running migrations...");
    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("Migrations applied successfully.");

    let plans = match &config.plan_limits_path {
        Some(path) => {
            tracing::info!("Loading plan limits from {}", path);
            PlanCatalog::load(path)?
        }
        None => PlanCatalog::builtin(),
    };

    let fallback = FallbackSet::builtin()?;
    tracing::info!("Loaded {} built-in questions", fallback.len());

    let provider: Arc<dyn QuestionProvider> = match &config.question_provider_url {
        Some(url) => {
            tracing::info!("Generating questions via {}", url);
            Arc::new(HttpQuestionProvider::new(
                url.clone(),
                config.question_provider_timeout,
            )?)
        }
        None => {
            tracing::warn!("QUESTION_PROVIDER_URL not set; serving built-in questions only");
            Arc::new(UnavailableProvider)
        }
    };

    let bind_addr = config.bind_addr.clone();
    let state = AppState::new(
        config,
        Arc::new(PgStore::new(pool)),
        provider,
        fallback,
        plans,
        Arc::new(SystemClock),
    );

    // Create the Axum application router
    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("Listening on {}", bind_addr);

    // Start the server
    axum::serve(listener, app).await?;

    Ok(())
}

/// Waits for the database to come up, giving up after 5 retries.
async fn connect_with_retry(database_url: &str) -> Result<PgPool, sqlx::Error> {
    let mut retry_count = 0;
    loop {
        match PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(database_url)
            .await
        {
            Ok(pool) => return Ok(pool),
            Err(e) => {
                retry_count += 1;
                if retry_count > 5 {
                    tracing::error!("Failed to connect to database after 5 retries: {}", e);
                    return Err(e);
                }
                tracing::warn!(
                    "Database not ready, retrying in 2s... (Attempt {})",
                    retry_count
                );
                tokio::time::sleep(Duration::from_secs(2)).await;
            }
        }
    }
}
