//! Payload shapes of the bilibili live web-room API.
//!
//! Every nested level defaults to empty so an offline room, which comes back
//! with `playurl_info: null`, walks to an empty result instead of failing.

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub(super) struct BiliH5Info {
    pub room_info: BiliRoomInfo,
    pub anchor_info: BiliAnchorInfo,
}

#[derive(Debug, Deserialize)]
pub(super) struct BiliRoomInfo {
    pub uid: u64,
    pub room_id: u64,
    #[serde(default)]
    pub short_id: u64,
    pub title: String,
    #[serde(default)]
    pub cover: String,
    pub live_status: u8,
}

#[derive(Debug, Deserialize)]
pub(super) struct BiliAnchorInfo {
    pub base_info: BiliAnchorBaseInfo,
}

#[derive(Debug, Deserialize)]
pub(super) struct BiliAnchorBaseInfo {
    pub uname: String,
    #[serde(default)]
    pub face: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct BiliPlayInfo {
    #[serde(default)]
    pub playurl_info: Option<BiliPlayUrlInfo>,
}

#[derive(Debug, Deserialize)]
pub(super) struct BiliPlayUrlInfo {
    #[serde(default)]
    pub playurl: Option<BiliPlayUrl>,
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct BiliPlayUrl {
    #[serde(default)]
    pub g_qn_desc: Vec<BiliQnDesc>,
    #[serde(default)]
    pub stream: Vec<BiliStream>,
}

#[derive(Debug, Deserialize)]
pub(super) struct BiliQnDesc {
    pub qn: u32,
    pub desc: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct BiliStream {
    #[serde(default)]
    pub protocol_name: String,
    #[serde(default)]
    pub format: Vec<BiliFormat>,
}

#[derive(Debug, Deserialize)]
pub(super) struct BiliFormat {
    #[serde(default)]
    pub format_name: String,
    #[serde(default)]
    pub codec: Vec<BiliCodec>,
}

#[derive(Debug, Deserialize)]
pub(super) struct BiliCodec {
    #[serde(default)]
    pub codec_name: String,
    #[serde(default)]
    pub accept_qn: Vec<u32>,
    #[serde(default)]
    pub base_url: String,
    #[serde(default)]
    pub url_info: Vec<BiliUrlInfo>,
}

#[derive(Debug, Deserialize)]
pub(super) struct BiliUrlInfo {
    pub host: String,
    #[serde(default)]
    pub extra: String,
}

impl BiliPlayInfo {
    /// The playback graph, or `None` when the room has none.
    pub fn playurl(self) -> Option<BiliPlayUrl> {
        self.playurl_info.and_then(|info| info.playurl)
    }
}
