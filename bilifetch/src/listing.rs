//! Walks the paged space search api until every upload of a user is collected

use reqwest::header::ORIGIN;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::models::{ArcSearchData, BiliVideo};
use crate::session::{HeaderTemplate, Transport};

pub const SPACE_SEARCH_URL: &str = "https://api.bilibili.com/x/space/arc/search";
pub const WEB_ORIGIN: &str = "https://www.bilibili.com";

/// Position in the listing. `total` and `last_page` stay unknown until the
/// first successful response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageCursor {
    pub page: u32,
    pub page_size: u32,
    pub total: Option<u64>,
    pub last_page: Option<u32>,
}

impl PageCursor {
    pub fn new(page_size: u32) -> Self {
        Self {
            page: 1,
            page_size,
            total: None,
            last_page: None,
        }
    }

    /// Records the reported item count. Only the first call counts.
    pub fn learn(&mut self, count: u64) {
        if self.total.is_some() {
            return;
        }
        let last = count.div_ceil(u64::from(self.page_size.max(1)));
        self.total = Some(count);
        self.last_page = Some(u32::try_from(last).unwrap_or(u32::MAX));
    }

    /// Moves to the next page and tells whether it may be fetched.
    pub fn advance(&mut self) -> bool {
        self.page += 1;
        match self.last_page {
            Some(last) => self.page <= last,
            None => true,
        }
    }
}

/// Every upload of one user, with what the api said about the paging.
#[derive(Debug)]
pub struct Listing<V = BiliVideo> {
    pub videos: Vec<V>,
    /// item count reported by the api, if any page succeeded
    pub total: Option<u64>,
    pub last_page: Option<u32>,
    pub pages_fetched: u32,
    /// set when the api rejected a page and the walk ended early
    pub rejected: Option<Error>,
}

impl<V> Default for Listing<V> {
    fn default() -> Self {
        Self {
            videos: Vec::new(),
            total: None,
            last_page: None,
            pages_fetched: 0,
            rejected: None,
        }
    }
}

pub(crate) fn page_url(mid: u64, cursor: &PageCursor, order: &str) -> String {
    format!(
        "{}?mid={}&ps={}&tid=0&pn={}&keyword=&order={}&jsonp=jsonp",
        SPACE_SEARCH_URL, mid, cursor.page_size, cursor.page, order
    )
}

/// Fails with `UpstreamRejected` unless the response carries the success code.
pub fn check_code(json: &Value, success_code: i64) -> Result<()> {
    let code = json.get("code").and_then(Value::as_i64);
    if code == Some(success_code) {
        return Ok(());
    }
    Err(Error::UpstreamRejected {
        code: code.unwrap_or(-1),
        message: json
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("missing code")
            .to_string(),
    })
}

pub async fn search_by_user(
    transport: &dyn Transport,
    headers: &HeaderTemplate,
    config: &Config,
    mid: u64,
) -> Result<Listing<BiliVideo>> {
    let mut cursor = PageCursor::new(config.page_size);
    let mut listing = Listing::default();

    loop {
        let url = page_url(mid, &cursor, &config.order);
        let body = transport
            .fetch(&url, headers.with(&[(ORIGIN, WEB_ORIGIN)])?)
            .await?;
        listing.pages_fetched += 1;

        let mut response: Value = serde_json::from_slice(&body)?;
        if let Err(err) = check_code(&response, config.success_code) {
            warn!("Listing of {} stopped at page {}: {}", mid, cursor.page, err);
            warn!("Raw response: {}", response);
            listing.rejected = Some(err);
            break;
        }

        let data = response
            .get_mut("data")
            .map(Value::take)
            .unwrap_or(Value::Null);
        let data: ArcSearchData = serde_json::from_value(data)?;
        cursor.learn(data.page.count);

        let entries = data.list.vlist.unwrap_or_default();
        debug!("Page {} of {} held {} videos", cursor.page, mid, entries.len());
        listing.videos.extend(entries.into_iter().map(BiliVideo::from));

        if !cursor.advance() {
            break;
        }
    }

    listing.total = cursor.total;
    listing.last_page = cursor.last_page;
    info!(
        "Listing finished: {} videos reported, {} per page, {} pages, {} requested, {} collected",
        cursor.total.map_or("?".to_string(), |t| t.to_string()),
        cursor.page_size,
        cursor.last_page.map_or("?".to_string(), |p| p.to_string()),
        listing.pages_fetched,
        listing.videos.len()
    );
    Ok(listing)
}
