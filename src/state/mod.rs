//! Shared application state
//!
//! Everything a request handler needs, constructed once at startup and
//! cloned into each request.

use std::sync::Arc;
use crate::config::Settings;
use crate::middleware::{ChatRateLimiter, JwtAuth};
use crate::services::ServiceFactory;

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub services: ServiceFactory,
    pub auth: JwtAuth,
    pub chat_limiter: ChatRateLimiter,
}

impl AppState {
    pub fn new(settings: Settings, services: ServiceFactory) -> Self {
        let auth = JwtAuth::new(&settings.auth);
        let chat_limiter = ChatRateLimiter::per_minute(settings.ai.rate_limit_per_minute);

        Self {
            settings: Arc::new(settings),
            services,
            auth,
            chat_limiter,
        }
    }
}
