//! Database module
//!
//! Storage for events, registrations and votes behind the [`Store`] trait,
//! with a PostgreSQL implementation and an in-memory one.

pub mod connection;
pub mod memory;
pub mod repositories;
pub mod service;
pub mod store;

// Re-export commonly used database components
pub use connection::{DatabasePool, create_pool, run_migrations, health_check};
pub use memory::MemoryStore;
pub use repositories::{EventRepository, RegistrationRepository, VoteRepository};
pub use service::DatabaseService;
pub use store::{check_admission, check_status_change, Store};
