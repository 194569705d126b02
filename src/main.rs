//! Leadline server binary.
//!
//! Wires the adapters to the conversation engine, starts the notification
//! worker pool, and serves the channel entry points until shutdown. On
//! shutdown the HTTP surface stops first, then the notification queue is
//! drained so no confirmed lead loses its report.

use std::sync::Arc;
use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use tower_http::timeout::TimeoutLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use leadline::adapters::ai::{HttpOracle, HttpOracleConfig};
use leadline::adapters::email::SmtpMailSender;
use leadline::adapters::http::{router, AppState};
use leadline::adapters::postgres::{PostgresCompanyDirectory, PostgresConversationStore};
use leadline::adapters::telegram::TelegramSender;
use leadline::application::{
    spawn_notification_workers, ConversationEngine, NotificationDispatcher,
};
use leadline::config::AppConfig;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    config.validate()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.server.log_level.clone())),
        )
        .init();

    info!(
        environment = ?config.server.environment,
        "starting leadline"
    );

    let pool = PgPoolOptions::new()
        .min_connections(config.database.min_connections)
        .max_connections(config.database.max_connections)
        .acquire_timeout(config.database.acquire_timeout())
        .connect(&config.database.url)
        .await?;

    if config.database.run_migrations {
        sqlx::migrate!("./migrations").run(&pool).await?;
        info!("migrations applied");
    }

    let store = Arc::new(PostgresConversationStore::new(pool.clone()));
    let directory = Arc::new(PostgresCompanyDirectory::new(pool.clone()));
    let oracle = Arc::new(HttpOracle::new(HttpOracleConfig::from_app_config(&config.ai)));
    let bot = Arc::new(TelegramSender::new(Duration::from_secs(15)));
    let mail = Arc::new(SmtpMailSender::new(config.notify.smtp()));

    let dispatcher = Arc::new(NotificationDispatcher::new(
        directory.clone(),
        bot,
        mail,
        config.notify.clone(),
    ));
    let (queue, workers) = spawn_notification_workers(
        dispatcher,
        config.notify.queue_capacity,
        config.notify.workers,
    );

    let engine = ConversationEngine::new(store, directory, oracle, queue);
    let state = AppState::new(Arc::new(engine));

    let app = router(state).layer(TimeoutLayer::new(Duration::from_secs(
        config.server.request_timeout_secs,
    )));

    let addr = config.server.socket_addr();
    info!(%addr, "listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // The router (and with it the engine and its queue handle) is gone;
    // the workers finish whatever is still queued and stop.
    info!("draining pending notifications");
    workers.drain().await;
    info!("shutdown complete");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("shutdown signal received");
}
