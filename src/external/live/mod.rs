mod bilibili;
mod provider;
mod types;

pub use bilibili::{BilibiliLive, DEFAULT_API_BASE as BILIBILI_API_BASE};
pub use provider::LivePlatformProvider;
pub use types::{MAX_QUALITIES, Owner, Quality, Room};
