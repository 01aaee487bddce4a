use async_trait::async_trait;
use tracing::info;

use crate::config::Config;
use crate::downloader::{self, DownloadedStreams};
use crate::error::{Error, Result};
use crate::listing::{self, Listing};
use crate::models::BiliVideo;
use crate::session::{HeaderTemplate, HttpSession, Transport};

/// What a video site has to offer to the cli
#[async_trait]
pub trait VideoPlatform: Send + Sync {
    type Video: Send + Sync;

    /// Keyword search
    async fn search_video(&self, keyword: &str) -> Result<Vec<Self::Video>>;

    /// Every upload of one user, in the order the site lists them
    async fn search_by_user(&self, user_id: u64) -> Result<Listing<Self::Video>>;

    async fn download(&self, video: &Self::Video) -> Result<DownloadedStreams>;
}

pub struct Bilibili {
    transport: Box<dyn Transport>,
    headers: HeaderTemplate,
    config: Config,
}

impl Bilibili {
    pub fn new(config: Config) -> Result<Self> {
        let transport = HttpSession::new(&config)?;
        Self::with_transport(config, Box::new(transport))
    }

    pub fn with_transport(config: Config, transport: Box<dyn Transport>) -> Result<Self> {
        config.validate()?;
        let headers = HeaderTemplate::new(&config.user_agent)?;
        Ok(Self {
            transport,
            headers,
            config,
        })
    }
}

#[async_trait]
impl VideoPlatform for Bilibili {
    type Video = BiliVideo;

    async fn search_video(&self, keyword: &str) -> Result<Vec<BiliVideo>> {
        info!("Keyword search for {:?} requested", keyword);
        Err(Error::NotSupported("keyword search"))
    }

    async fn search_by_user(&self, user_id: u64) -> Result<Listing<BiliVideo>> {
        listing::search_by_user(self.transport.as_ref(), &self.headers, &self.config, user_id)
            .await
    }

    async fn download(&self, video: &BiliVideo) -> Result<DownloadedStreams> {
        downloader::download(
            self.transport.as_ref(),
            &self.headers,
            video,
            &self.config.output_dir,
        )
        .await
    }
}
