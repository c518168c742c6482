use std::sync::Arc;
use std::time::Duration;
use sqlx::sqlite::SqlitePoolOptions;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use nird::{
    api,
    config::Settings,
    service::{leaderboard_service::LeaderboardService, ServiceContext},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "nird=debug,tower_http=debug,axum=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let settings = Settings::new().unwrap_or_else(|e| {
        tracing::warn!("Failed to load config: {}. Using defaults.", e);
        Settings::default()
    });

    tracing::info!("Starting NIRD server on {}:{}", settings.server.host, settings.server.port);

    // Initialize database
    let db_pool = SqlitePoolOptions::new()
        .max_connections(settings.database.max_connections)
        .connect(&settings.database.url)
        .await?;

    // Run migrations
    sqlx::migrate!("./migrations")
        .run(&db_pool)
        .await?;

    let service_context = Arc::new(ServiceContext::new(db_pool, &settings.leaderboard).await);

    // Background work: leaderboard stream and periodic rank snapshots
    let shutdown = CancellationToken::new();
    let leaderboard = service_context.leaderboard_service.clone();

    tokio::spawn(
        leaderboard
            .broadcaster()
            .run(leaderboard.clone(), shutdown.clone()),
    );
    tokio::spawn(snapshot_loop(
        leaderboard,
        Duration::from_secs(settings.leaderboard.snapshot_interval_minutes.max(1) * 60),
        shutdown.clone(),
    ));

    let app = api::create_app(service_context, Arc::new(settings.clone()));

    let listener = tokio::net::TcpListener::bind(
        format!("{}:{}", settings.server.host, settings.server.port)
    ).await?;

    tracing::info!("Server listening on http://{}:{}", settings.server.host, settings.server.port);

    let server_shutdown = shutdown.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for shutdown signal: {}", e);
            }
            tracing::info!("Shutting down");
            server_shutdown.cancel();
        })
        .await?;

    Ok(())
}

async fn snapshot_loop(service: Arc<LeaderboardService>, every: Duration, shutdown: CancellationToken) {
    let mut ticker = tokio::time::interval(every);
    // The first tick fires immediately; skip it so a restart does not add a snapshot.
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = ticker.tick() => {
                if let Err(e) = service.capture_snapshots("daily").await {
                    tracing::error!("Leaderboard snapshot failed: {:?}", e);
                }
            }
        }
    }
}
