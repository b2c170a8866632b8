//! Configuration validation module
//!
//! This module provides validation functions for application configuration
//! to ensure all required settings are properly configured.

use crate::utils::errors::{CampusFlowError, Result};
use super::{Settings, StorageBackend};

/// Validate all configuration settings
pub fn validate_settings(settings: &Settings) -> Result<()> {
    validate_database_config(&settings.database)?;
    validate_redis_config(&settings.redis)?;
    validate_auth_config(&settings.auth)?;
    validate_ai_config(&settings.ai)?;
    validate_email_config(&settings.email)?;
    validate_logging_config(&settings.logging)?;

    Ok(())
}

/// Validate database configuration
fn validate_database_config(config: &super::DatabaseConfig) -> Result<()> {
    if config.backend == StorageBackend::Postgres && config.url.is_empty() {
        return Err(CampusFlowError::Config(
            "Database URL is required for the postgres backend".to_string()
        ));
    }

    if config.max_connections == 0 {
        return Err(CampusFlowError::Config(
            "Max connections must be greater than 0".to_string()
        ));
    }

    if config.min_connections > config.max_connections {
        return Err(CampusFlowError::Config(
            "Min connections cannot be greater than max connections".to_string()
        ));
    }

    Ok(())
}

/// Validate Redis configuration
fn validate_redis_config(config: &super::RedisConfig) -> Result<()> {
    if let Some(url) = &config.url {
        if url.is_empty() {
            return Err(CampusFlowError::Config(
                "Redis URL must not be empty when set".to_string()
            ));
        }
    }

    Ok(())
}

/// Validate token verification settings
fn validate_auth_config(config: &super::AuthConfig) -> Result<()> {
    if config.jwt_secret.is_empty() {
        return Err(CampusFlowError::Config(
            "JWT secret is required".to_string()
        ));
    }

    Ok(())
}

/// Validate language model settings
fn validate_ai_config(config: &super::AiConfig) -> Result<()> {
    url::Url::parse(&config.api_url)?;

    if config.model.is_empty() {
        return Err(CampusFlowError::Config(
            "AI model name is required".to_string()
        ));
    }

    if config.timeout_seconds == 0 {
        return Err(CampusFlowError::Config(
            "AI timeout must be greater than 0".to_string()
        ));
    }

    if config.history_limit == 0 {
        return Err(CampusFlowError::Config(
            "AI history limit must be greater than 0".to_string()
        ));
    }

    if config.rate_limit_per_minute == 0 {
        return Err(CampusFlowError::Config(
            "AI rate limit must be greater than 0".to_string()
        ));
    }

    Ok(())
}

/// Validate outbound e-mail settings
fn validate_email_config(config: &super::EmailConfig) -> Result<()> {
    if let Some(relay_url) = &config.relay_url {
        url::Url::parse(relay_url)?;
    }

    if config.queue_capacity == 0 {
        return Err(CampusFlowError::Config(
            "E-mail queue capacity must be greater than 0".to_string()
        ));
    }

    Ok(())
}

/// Validate logging configuration
fn validate_logging_config(config: &super::LoggingConfig) -> Result<()> {
    if config.level.is_empty() {
        return Err(CampusFlowError::Config(
            "Log level is required".to_string()
        ));
    }

    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_levels.contains(&config.level.as_str()) {
        return Err(CampusFlowError::Config(
            format!("Invalid log level: {}. Valid levels: {:?}", config.level, valid_levels)
        ));
    }

    Ok(())
}
