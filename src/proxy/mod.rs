//! Local CORS reverse proxy.
//!
//! The standalone [`ProxyServer`] listens on its own loopback port and is
//! what resolved cover and avatar URLs point at. [`cors_routes`] mounts the
//! same resend core on the API server under `/cors`.

mod error;
mod handler;
mod server;

pub use error::ProxyError;
pub use handler::{CORS_PATH, HeaderPolicy, ORIGIN_QUERY_KEY, Resender, cors_routes};
pub use server::{DEFAULT_PROXY_PORT, ProxyConfig, ProxyServer};
