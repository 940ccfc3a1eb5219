use std::collections::{HashMap, HashSet};
use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, REFERER, USER_AGENT};
use url::Url;

use super::types::{BiliH5Info, BiliPlayInfo, BiliPlayUrl};
use crate::external::client::HttpClient;
use crate::external::error::{PlatformError, PlatformResultExt};
use crate::external::json::{CookieProvider, JsonClient};
use crate::external::live::provider::LivePlatformProvider;
use crate::external::live::types::{Owner, Quality, Room};

pub const PLATFORM_ID: &str = "bili";
const PLATFORM_NAME: &str = "哔哩哔哩直播";
static ICON: LazyLock<Url> =
    LazyLock::new(|| Url::parse("https://www.bilibili.com/favicon.ico").expect("Invalid icon URL"));

pub const DEFAULT_API_BASE: &str = "https://api.live.bilibili.com";
const H5_INFO_PATH: &str = "/xlive/web-room/v1/index/getH5InfoByRoom";
const PLAY_INFO_PATH: &str = "/xlive/web-room/v2/index/getRoomPlayInfo";

const BILI_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/93.0.4577.82 Safari/537.36 OPR/79.0.4143.50";
const BILI_REFERER: &str = "https://live.bilibili.com/";

/// Hosts containing this marker are slower peer CDN nodes and go last.
const LOW_PRIORITY_HOST_MARKER: &str = "mcdn";
const UNKNOWN_QUALITY_NAME: &str = "unknown";

pub struct BilibiliLive {
    client: JsonClient,
    api_base: Url,
}

impl BilibiliLive {
    pub fn new(client: JsonClient, api_base: Url) -> Self {
        Self { client, api_base }
    }

    /// Resolver against `api_base` using the shared HTTP client.
    pub fn connect(
        api_base: &str,
        cookies: Option<Arc<dyn CookieProvider>>,
    ) -> Result<Self, PlatformError> {
        let api_base = Url::parse(api_base).map_err(|source| PlatformError::UrlParse {
            url: api_base.to_string(),
            source,
        })?;
        let mut client = JsonClient::new(HttpClient::new(Self::default_headers()));
        if let Some(cookies) = cookies {
            client = client.with_cookie_provider(cookies);
        }
        Ok(Self::new(client, api_base))
    }

    pub fn default_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(BILI_USER_AGENT));
        headers.insert(REFERER, HeaderValue::from_static(BILI_REFERER));
        headers
    }

    fn endpoint(&self, path: &str, query: &[(&str, &str)]) -> Result<Url, PlatformError> {
        let mut url = self
            .api_base
            .join(path)
            .map_err(|source| PlatformError::UrlParse {
                url: path.to_string(),
                source,
            })?;
        url.query_pairs_mut().extend_pairs(query);
        Ok(url)
    }

    async fn fetch_room(&self, room_id: &str) -> Result<Room, PlatformError> {
        let request = self
            .client
            .http()
            .get(self.endpoint(H5_INFO_PATH, &[("room_id", room_id)])?)
            .build()
            .map_err(PlatformError::RequestFailed)?;
        let info: BiliH5Info = self.client.get_json(request).await?;

        let room = info.room_info;
        let anchor = info.anchor_info.base_info;
        tracing::debug!(
            requested = %room_id,
            room_id = room.room_id,
            short_id = room.short_id,
            "Resolved bilibili room"
        );

        Ok(Room {
            id: room.room_id.to_string(),
            title: room.title,
            is_online: room.live_status == 1,
            cover_url: parse_url(&room.cover)?,
            owner: Owner {
                id: room.uid.to_string(),
                name: anchor.uname,
                avatar_url: parse_url(&anchor.face)?,
            },
        })
    }

    async fn fetch_play_url(
        &self,
        room_id: &str,
        quality_id: Option<&str>,
    ) -> Result<BiliPlayUrl, PlatformError> {
        let mut query = vec![
            ("room_id", room_id),
            ("protocol", "0,1"),
            ("format", "0,1,2"),
            ("codec", "0,1"),
            ("platform", "web"),
        ];
        if let Some(qn) = quality_id {
            query.push(("qn", qn));
        }
        let request = self
            .client
            .http()
            .get(self.endpoint(PLAY_INFO_PATH, &query)?)
            .build()
            .map_err(PlatformError::RequestFailed)?;
        let info: BiliPlayInfo = self.client.get_json(request).await?;
        Ok(info.playurl().unwrap_or_default())
    }
}

#[async_trait]
impl LivePlatformProvider for BilibiliLive {
    fn id(&self) -> &str {
        PLATFORM_ID
    }

    fn name(&self) -> &str {
        PLATFORM_NAME
    }

    fn icon_url(&self) -> Url {
        ICON.clone()
    }

    async fn get_room(&self, room_id: &str) -> Result<Room, PlatformError> {
        self.fetch_room(room_id).await.context("failed to get room")
    }

    async fn get_qualities(&self, room_id: &str) -> Result<Vec<Quality>, PlatformError> {
        let play = self
            .fetch_play_url(room_id, None)
            .await
            .context("failed to get qualities")?;
        Ok(rank_qualities(play))
    }

    async fn get_live_urls(
        &self,
        room_id: &str,
        quality_id: &str,
    ) -> Result<Vec<Url>, PlatformError> {
        let play = self
            .fetch_play_url(room_id, Some(quality_id))
            .await
            .context("failed to get live urls")?;
        Ok(demote_hosts(collect_live_urls(play), LOW_PRIORITY_HOST_MARKER))
    }
}

fn parse_url(raw: &str) -> Result<Url, PlatformError> {
    Url::parse(raw).map_err(|source| PlatformError::UrlParse {
        url: raw.to_string(),
        source,
    })
}

/// Qualities accepted by the first stream/format/codec triple, in payload order.
fn rank_qualities(play: BiliPlayUrl) -> Vec<Quality> {
    let names: HashMap<u32, String> = play
        .g_qn_desc
        .into_iter()
        .map(|d| (d.qn, d.desc))
        .collect();

    let Some(codec) = play
        .stream
        .into_iter()
        .next()
        .and_then(|s| s.format.into_iter().next())
        .and_then(|f| f.codec.into_iter().next())
    else {
        return Vec::new();
    };

    Quality::ranked(codec.accept_qn.into_iter().map(|qn| {
        let name = names
            .get(&qn)
            .cloned()
            .unwrap_or_else(|| UNKNOWN_QUALITY_NAME.to_string());
        (qn.to_string(), name)
    }))
}

/// Every `host + base_url + extra` in the playback graph, in payload order.
///
/// Unparsable URLs and exact duplicates are dropped.
fn collect_live_urls(play: BiliPlayUrl) -> Vec<Url> {
    let mut seen = HashSet::new();
    let mut urls = Vec::new();
    for stream in play.stream {
        for format in stream.format {
            for codec in format.codec {
                tracing::trace!(
                    protocol = %stream.protocol_name,
                    format = %format.format_name,
                    codec = %codec.codec_name,
                    hosts = codec.url_info.len(),
                    "Collecting stream urls"
                );
                for info in codec.url_info {
                    let raw = format!("{}{}{}", info.host, codec.base_url, info.extra);
                    match Url::parse(&raw) {
                        Ok(url) => {
                            if seen.insert(url.as_str().to_owned()) {
                                urls.push(url);
                            }
                        }
                        Err(e) => tracing::debug!(url = %raw, error = %e, "Dropping unparsable live url"),
                    }
                }
            }
        }
    }
    urls
}

/// Stable partition: urls whose host contains `marker` move behind the rest,
/// both groups keep their relative order.
fn demote_hosts(urls: Vec<Url>, marker: &str) -> Vec<Url> {
    let (mut preferred, demoted): (Vec<Url>, Vec<Url>) = urls
        .into_iter()
        .partition(|u| !u.host_str().is_some_and(|h| h.contains(marker)));
    preferred.extend(demoted);
    preferred
}
