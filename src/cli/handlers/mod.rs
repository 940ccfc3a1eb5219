//! Command handlers for CLI operations
//!
//! This module contains handlers for different CLI commands,
//! separating command execution logic from parsing and validation.

pub mod resolve;
pub mod serve;

pub use resolve::ResolveCommandHandler;
pub use serve::ServeCommandHandler;
