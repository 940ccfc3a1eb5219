mod client;
mod types;

pub use client::{BilibiliLive, DEFAULT_API_BASE};
