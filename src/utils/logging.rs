//! Logging configuration and setup
//!
//! This module provides logging initialization and structured logging utilities
//! for the CampusFlow application.

use tracing::{info, warn, error, debug};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};
use uuid::Uuid;
use crate::config::LoggingConfig;
use crate::models::RegistrationStatus;
use crate::utils::errors::Result;

/// Initialize logging based on configuration
///
/// The returned guard flushes the file writer when dropped and must be kept
/// alive for as long as the process logs.
pub fn init_logging(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.level));

    let stdout_layer = if config.json {
        tracing_subscriber::fmt::layer().json().with_writer(std::io::stdout).boxed()
    } else {
        tracing_subscriber::fmt::layer().with_writer(std::io::stdout).boxed()
    };

    let (file_layer, guard) = match &config.file_path {
        Some(path) => {
            let file_appender = tracing_appender::rolling::daily(path, "campusflow.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(non_blocking)
                .boxed();
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    info!("Logging initialized with level: {}", config.level);
    Ok(guard)
}

/// Log event management actions
pub fn log_event_action(event_id: Uuid, action: &str, user_id: Uuid, details: Option<&str>) {
    info!(
        event_id = %event_id,
        action = action,
        user_id = %user_id,
        details = details,
        "Event action performed"
    );
}

/// Log a registration status change
pub fn log_registration_change(registration_id: Uuid, actor_id: Uuid, old: RegistrationStatus, new: RegistrationStatus) {
    info!(
        registration_id = %registration_id,
        actor_id = %actor_id,
        old_status = %old,
        new_status = %new,
        "Registration status changed"
    );
}

/// Log a vote cast or replacement
pub fn log_vote_cast(event_id: Uuid, user_id: Uuid, target_id: &str, created: bool) {
    debug!(
        event_id = %event_id,
        user_id = %user_id,
        target_id = target_id,
        created = created,
        "Vote recorded"
    );
}

/// Log that the concierge answered from the local responder
pub fn log_chat_fallback(reason: &str) {
    warn!(reason = reason, "Language model unavailable, using local responder");
}

/// Log API errors with context
pub fn log_api_error(api: &str, error: &str, context: Option<&str>) {
    error!(
        api = api,
        error = error,
        context = context,
        "API error occurred"
    );
}
