//! Pulls the `window.__playinfo__` descriptor out of a watch page and picks the
//! stream urls from its dash manifest.

use flate2::read::GzDecoder;
use regex::Regex;
use scraper::{Html, Selector};
use serde::Deserialize;
use std::io::Read;
use std::sync::LazyLock;

use crate::error::{Error, Result};

static PLAYINFO_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)^\s*window\.__playinfo__\s*=(.*)$").expect("valid regex"));

#[derive(Debug, Deserialize)]
pub struct PlayInfo {
    pub data: PlayData,
}

#[derive(Debug, Deserialize)]
pub struct PlayData {
    #[serde(default)]
    pub dash: Option<Dash>,
}

#[derive(Debug, Deserialize)]
pub struct Dash {
    // either list can come back as null
    #[serde(default)]
    pub video: Option<Vec<Rendition>>,
    #[serde(default)]
    pub audio: Option<Vec<Rendition>>,
}

/// One encoded variant of a track. The site sends every key twice, in
/// camelCase and snake_case; only `baseUrl` is read.
#[derive(Debug, Clone, Deserialize)]
pub struct Rendition {
    #[serde(rename = "baseUrl")]
    pub base_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamUrls {
    pub video: String,
    pub audio: String,
}

/// Page bodies sometimes arrive gzipped even though we never asked for it.
pub fn decode_page(body: &[u8]) -> Result<String> {
    if body.len() >= 2 && body[0] == 0x1F && body[1] == 0x8B {
        let mut decoder = GzDecoder::new(body);
        let mut text = String::new();
        decoder.read_to_string(&mut text)?;
        return Ok(text);
    }
    Ok(String::from_utf8_lossy(body).into_owned())
}

/// Returns the raw json text assigned to `window.__playinfo__`.
pub fn extract_playinfo(html: &str) -> Result<String> {
    let document = Html::parse_document(html);
    let script_selector = Selector::parse("script").expect("Failed to parse selector");
    document
        .select(&script_selector)
        .map(|script| script.text().collect::<String>())
        .find_map(|text| {
            PLAYINFO_RE
                .captures(&text)
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str().trim().to_string())
        })
        .ok_or_else(|| Error::MalformedPage("no window.__playinfo__ script block".into()))
}

pub fn parse_playinfo(payload: &str) -> Result<PlayInfo> {
    serde_json::from_str(payload)
        .map_err(|e| Error::MalformedPage(format!("playinfo is not valid json: {e}")))
}

/// Always the first rendition of each track, whatever its quality.
pub fn select_streams(info: &PlayInfo, bvid: &str) -> Result<StreamUrls> {
    let no_stream = |track| Error::NoPlayableStream {
        bvid: bvid.to_string(),
        track,
    };
    let dash = info.data.dash.as_ref().ok_or_else(|| no_stream("video"))?;
    let video = dash
        .video
        .as_deref()
        .and_then(<[Rendition]>::first)
        .ok_or_else(|| no_stream("video"))?;
    let audio = dash
        .audio
        .as_deref()
        .and_then(<[Rendition]>::first)
        .ok_or_else(|| no_stream("audio"))?;
    Ok(StreamUrls {
        video: video.base_url.clone(),
        audio: audio.base_url.clone(),
    })
}

/// Watch page html to stream urls.
pub fn resolve(html: &str, bvid: &str) -> Result<StreamUrls> {
    let payload = extract_playinfo(html)?;
    let info = parse_playinfo(&payload)?;
    select_streams(&info, bvid)
}
