//! Middleware module
//!
//! This module contains middleware for request processing

pub mod auth;
pub mod logging;
pub mod rate_limit;

// Re-export commonly used middleware
pub use auth::{AuthUser, Claims, JwtAuth, OptionalAuthUser};
pub use logging::with_request_tracing;
pub use rate_limit::{ChatRateLimiter, RateLimitedCaller};
