//! Data Transfer Objects for API requests and responses.
//!
//! Room, quality and board payloads reuse the service views in
//! `crate::services::views`; the types here exist only on the HTTP surface.

mod error;
mod health;
mod setting;

pub use error::ErrorResponse;
pub use health::{ComponentHealth, HealthResponse, HealthStatus};
pub use setting::{CookieResponse, UpdateCookieRequest};
