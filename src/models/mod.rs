//! Data models module
//!
//! This module contains all data structures used throughout the application

pub mod chat;
pub mod event;
pub mod module;
pub mod principal;
pub mod registration;
pub mod vote;

// Re-export commonly used models
pub use chat::{ActionOutcome, ChatRequest, ChatResponse, ChatRole, ChatTurn, ReplySource};
pub use event::{CreateEventRequest, Event, EventFilter, EventStatus, EventSummary, NewEvent, Timeline, UpdateEventRequest};
pub use module::{Module, ModuleKind, ModuleSpec, PollSpec, RegistrationConfig, VotingConfig};
pub use principal::{Principal, Role};
pub use registration::{NewRegistration, RegisterRequest, Registration, RegistrationStatus, RegistrationWithEvent, StatusChange, UpdateStatusRequest};
pub use vote::{is_scalar, CastVoteRequest, Vote, VoteOutcome, VoteTally};
