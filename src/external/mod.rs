//! Outbound HTTP clients and streaming platform resolvers.

pub mod client;
mod error;
pub mod json;
pub mod live;
pub mod user_agent;

pub use error::{PlatformError, PlatformResultExt};
