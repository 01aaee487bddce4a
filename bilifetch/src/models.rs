//! Video records and the shapes of the listing api responses

use serde::{Deserialize, Serialize};

/// Anything that can be shown as one line in the picker.
pub trait HasTitle {
    fn get_title(&self) -> &str;
    fn get_overview(&self) -> &str;
}

/// Platform independent part of a video record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Video {
    pub id: String,
    pub name: String,
    pub pic: String,
    pub desc: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BiliVideo {
    #[serde(flatten)]
    pub video: Video,
    /// legacy numeric archive id, not used for downloads
    pub aid: u64,
    pub bvid: String,
}

impl BiliVideo {
    /// A record carrying only the canonical id, enough for a download.
    pub fn from_bvid(bvid: impl Into<String>) -> Self {
        let bvid = bvid.into();
        Self {
            video: Video {
                id: bvid.clone(),
                ..Video::default()
            },
            aid: 0,
            bvid,
        }
    }
}

impl HasTitle for BiliVideo {
    fn get_title(&self) -> &str {
        &self.video.name
    }

    fn get_overview(&self) -> &str {
        &self.video.desc
    }
}

impl From<VlistEntry> for BiliVideo {
    fn from(entry: VlistEntry) -> Self {
        Self {
            video: Video {
                id: entry.bvid.clone(),
                name: entry.title,
                pic: entry.pic,
                desc: entry.description,
            },
            aid: entry.aid,
            bvid: entry.bvid,
        }
    }
}

/// `data` of a successful space search response
#[derive(Debug, Deserialize)]
pub struct ArcSearchData {
    pub list: VideoList,
    pub page: PageInfo,
}

#[derive(Debug, Default, Deserialize)]
pub struct VideoList {
    // null when the uploader has nothing on this page
    #[serde(default)]
    pub vlist: Option<Vec<VlistEntry>>,
}

#[derive(Debug, Deserialize)]
pub struct PageInfo {
    pub count: u64,
}

#[derive(Debug, Deserialize)]
pub struct VlistEntry {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub pic: String,
    #[serde(default)]
    pub description: String,
    pub aid: u64,
    pub bvid: String,
}
