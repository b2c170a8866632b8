//! Rate limiting middleware
//!
//! Keeps concierge traffic within the upstream provider's budget. Callers are
//! keyed by user id when signed in, otherwise by client address.

use std::net::SocketAddr;
use std::num::NonZeroU32;
use std::sync::Arc;
use axum::async_trait;
use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::request::Parts;
use governor::clock::DefaultClock;
use governor::state::keyed::DefaultKeyedStateStore;
use governor::{Quota, RateLimiter};
use tracing::{debug, warn};
use crate::middleware::auth::OptionalAuthUser;
use crate::models::Principal;
use crate::state::AppState;
use crate::utils::errors::{CampusFlowError, Result};

type KeyedLimiter = RateLimiter<String, DefaultKeyedStateStore<String>, DefaultClock>;

/// Per-caller limiter for the chat endpoint
#[derive(Clone)]
pub struct ChatRateLimiter {
    limiter: Arc<KeyedLimiter>,
}

impl ChatRateLimiter {
    pub fn per_minute(requests: u32) -> Self {
        let quota = Quota::per_minute(NonZeroU32::new(requests).unwrap_or(NonZeroU32::MIN));
        Self {
            limiter: Arc::new(RateLimiter::keyed(quota)),
        }
    }

    /// Count one request for `key`
    pub fn check(&self, key: &str) -> Result<()> {
        match self.limiter.check_key(&key.to_string()) {
            Ok(()) => {
                debug!(key = key, "Rate limit check passed");
                Ok(())
            }
            Err(_) => {
                warn!(key = key, "Rate limit exceeded");
                Err(CampusFlowError::RateLimitExceeded)
            }
        }
    }

    /// Drop state for keys that have fully recovered
    pub fn cleanup(&self) {
        self.limiter.retain_recent();
    }
}

/// Rate limit key for a request
pub fn caller_key(principal: Option<&Principal>, parts: &Parts) -> String {
    if let Some(principal) = principal {
        return format!("user:{}", principal.id);
    }

    let forwarded = parts
        .headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty());

    if let Some(address) = forwarded {
        return format!("addr:{}", address);
    }

    match parts.extensions.get::<ConnectInfo<SocketAddr>>() {
        Some(ConnectInfo(address)) => format!("addr:{}", address.ip()),
        None => "anonymous".to_string(),
    }
}

/// A chat caller that has passed the rate limiter
#[derive(Debug, Clone)]
pub struct RateLimitedCaller {
    pub principal: Option<Principal>,
    pub key: String,
}

#[async_trait]
impl FromRequestParts<AppState> for RateLimitedCaller {
    type Rejection = CampusFlowError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> std::result::Result<Self, Self::Rejection> {
        let OptionalAuthUser(principal) = OptionalAuthUser::from_request_parts(parts, state).await?;
        let key = caller_key(principal.as_ref(), parts);

        state.chat_limiter.check(&key)?;

        Ok(Self { principal, key })
    }
}
