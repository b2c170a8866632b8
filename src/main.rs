//! CampusFlow server
//!
//! Main application entry point

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{info, warn};

use CampusFlow::{
    config::{Settings, StorageBackend},
    create_router,
    database::{create_pool, run_migrations, DatabaseService, MemoryStore, Store},
    services::{
        email::dispatcher_from_config, BroadcastPushChannel, CompletionClient, EmailQueue, GroqClient, PushChannel,
        RedisPushChannel, ServiceFactory,
    },
    utils::logging,
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    // Load configuration
    let settings = Settings::new().context("failed to load configuration")?;
    settings.validate()?;

    // Initialize logging
    let _log_guard = logging::init_logging(&settings.logging)?;

    info!("Starting {}...", CampusFlow::info());

    let store = open_store(&settings).await?;
    let push = open_push_channel(&settings).await;

    let dispatcher = dispatcher_from_config(&settings.email)?;
    let (email_queue, email_worker) = EmailQueue::start(dispatcher, settings.email.queue_capacity);

    let groq = GroqClient::new(&settings.ai)?;
    if !groq.is_configured() {
        warn!("No language model API key configured, chat will use local replies only");
    }
    let completion: Arc<dyn CompletionClient> = Arc::new(groq);

    info!("Initializing services...");
    let services = ServiceFactory::new(&settings, store, push, email_queue, completion)?;

    let bind_address = settings.bind_address();
    let state = AppState::new(settings, services);
    spawn_limiter_cleanup(&state);

    let app = create_router(state);
    let listener = TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("failed to bind {}", bind_address))?;

    info!("CampusFlow listening on {}", bind_address);

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Dropping the router closed the queue; let pending mail drain
    if tokio::time::timeout(Duration::from_secs(5), email_worker).await.is_err() {
        warn!("E-mail worker did not drain before shutdown");
    }

    info!("CampusFlow has been shut down.");

    Ok(())
}

async fn open_store(settings: &Settings) -> anyhow::Result<Arc<dyn Store>> {
    match settings.database.backend {
        StorageBackend::Memory => {
            warn!("Using in-memory store, data will not survive a restart");
            Ok(Arc::new(MemoryStore::new()))
        }
        StorageBackend::Postgres => {
            info!("Connecting to database...");
            let pool = create_pool(&settings.database).await?;

            info!("Running database migrations...");
            run_migrations(&pool).await?;

            Ok(Arc::new(DatabaseService::new(pool)))
        }
    }
}

/// Redis when configured and reachable, otherwise an in-process channel
async fn open_push_channel(settings: &Settings) -> Arc<dyn PushChannel> {
    if let Some(url) = &settings.redis.url {
        info!("Connecting to Redis...");
        match RedisPushChannel::connect(url, settings.redis.prefix.clone()).await {
            Ok(channel) => return Arc::new(channel),
            Err(e) => warn!(error = %e, "Redis unavailable, falling back to in-process push"),
        }
    }

    Arc::new(BroadcastPushChannel::default())
}

fn spawn_limiter_cleanup(state: &AppState) {
    let limiter = state.chat_limiter.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(300));
        loop {
            interval.tick().await;
            limiter.cleanup();
        }
    });
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
