//! Test helpers module
//!
//! This module provides utilities and helpers for testing the CampusFlow application.
//! It includes an in-memory application context, a scripted language model,
//! a PostgreSQL container helper and fake data builders.

#![allow(dead_code)]

pub mod database_helper;
pub mod mock_llm;
pub mod test_context;
pub mod test_data;

#[allow(unused_imports)]
pub use database_helper::*;
#[allow(unused_imports)]
pub use mock_llm::*;
#[allow(unused_imports)]
pub use test_context::*;
#[allow(unused_imports)]
pub use test_data::*;
