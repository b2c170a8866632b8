//! Participation modules
//!
//! Attach-time validation of the module configurations carried by events.

pub mod registry;

pub use registry::ModuleRegistry;
