//! CampusFlow
//!
//! Campus event service. Events carry pluggable participation modules
//! (registration with an optional seat limit, voting over declared polls),
//! and a conversational concierge can register a signed-in user for an
//! event once they confirm.

#![allow(non_snake_case)]

pub mod config;
pub mod database;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod modules;
pub mod services;
pub mod state;
pub mod utils;

// Re-export commonly used types
pub use config::Settings;
pub use utils::errors::{CampusFlowError, Result};

// Re-export main components for easy access
pub use database::{DatabaseService, MemoryStore, Store};
pub use handlers::create_router;
pub use services::ServiceFactory;
pub use state::AppState;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Get library information
pub fn info() -> String {
    format!("{} v{}", NAME, VERSION)
}
