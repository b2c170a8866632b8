//! Database repositories module
//!
//! This module contains all repository implementations for data access

pub mod event;
pub mod registration;
pub mod vote;

// Re-export repositories
pub use event::EventRepository;
pub use registration::RegistrationRepository;
pub use vote::VoteRepository;
