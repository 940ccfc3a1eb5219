//! asmblive library
//!
//! Live room resolution for streaming platforms plus a loopback CORS proxy,
//! exposed through a local HTTP API and a CLI.

use shadow_rs::shadow;
shadow!(build);

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod external;
pub mod logger;
pub mod proxy;
pub mod server;
pub mod services;
pub mod state;
pub mod store;
pub mod utils;

#[cfg(test)]
mod test_support;

pub use state::AppState;

pub fn pkg_version() -> &'static str {
    build::PKG_VERSION
}

pub fn clap_long_version() -> &'static str {
    build::CLAP_LONG_VERSION
}
