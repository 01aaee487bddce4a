use reqwest::header::{HeaderMap, REFERER};
use std::path::{Path, PathBuf};
use tokio::fs as tokio_fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::models::BiliVideo;
use crate::playinfo::{self, StreamUrls};
use crate::session::{HeaderTemplate, Transport};

pub const WATCH_URL: &str = "https://www.bilibili.com/video/";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedStreams {
    pub video_path: PathBuf,
    pub audio_path: PathBuf,
    pub video_bytes: usize,
    pub audio_bytes: usize,
}

pub fn watch_url(bvid: &str) -> String {
    format!("{}{}", WATCH_URL, bvid)
}

/// The id ends up in a url path and in file names, so only plain ascii
/// alphanumerics are let through.
pub fn validate_bvid(bvid: &str) -> Result<()> {
    if bvid.is_empty() || !bvid.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(Error::InvalidVideoId(bvid.to_string()));
    }
    Ok(())
}

async fn ensure_directory(path: &Path) -> Result<()> {
    if !path.exists() {
        tokio_fs::create_dir_all(path).await?;
    }
    Ok(())
}

async fn write_stream(path: &Path, content: &[u8]) -> Result<()> {
    let mut file = tokio_fs::File::create(path).await?;
    file.write_all(content).await?;
    file.flush().await?;
    Ok(())
}

async fn discard(paths: &[&Path]) {
    for path in paths {
        if path.is_file() {
            if let Err(err) = tokio_fs::remove_file(path).await {
                warn!("Could not remove partial output {:?}: {}", path, err);
            }
        }
    }
}

/// Fetches the watch page and picks the stream urls. Returns the referer
/// headers the media hosts expect along with them.
pub async fn resolve_streams(
    transport: &dyn Transport,
    headers: &HeaderTemplate,
    bvid: &str,
) -> Result<(StreamUrls, HeaderMap)> {
    validate_bvid(bvid)?;
    let url = watch_url(bvid);
    let with_referer = headers.with(&[(REFERER, url.as_str())])?;

    let body = transport.fetch(&url, with_referer.clone()).await?;
    let html = playinfo::decode_page(&body)?;
    debug!("Watch page for {} is {} bytes", bvid, html.len());

    let urls = playinfo::resolve(&html, bvid)?;
    debug!("Video stream: {}", urls.video);
    debug!("Audio stream: {}", urls.audio);
    Ok((urls, with_referer))
}

/// Saves `{bvid}.mp4` and `{bvid}.mp3` into `out_dir`. Both streams are fetched
/// before anything is written, and a failed write removes whatever this call
/// already wrote, so a failed call leaves no files behind.
pub async fn download(
    transport: &dyn Transport,
    headers: &HeaderTemplate,
    video: &BiliVideo,
    out_dir: &Path,
) -> Result<DownloadedStreams> {
    let bvid = video.bvid.as_str();
    let (urls, with_referer) = resolve_streams(transport, headers, bvid).await?;

    info!("Fetching video stream of {}", bvid);
    let video_body = transport.fetch(&urls.video, with_referer.clone()).await?;
    info!("Fetching audio stream of {}", bvid);
    let audio_body = transport.fetch(&urls.audio, with_referer).await?;

    ensure_directory(out_dir).await?;
    let video_path = out_dir.join(format!("{bvid}.mp4"));
    let audio_path = out_dir.join(format!("{bvid}.mp3"));
    if let Err(err) = write_stream(&video_path, &video_body).await {
        discard(&[video_path.as_path()]).await;
        return Err(err);
    }
    if let Err(err) = write_stream(&audio_path, &audio_body).await {
        discard(&[video_path.as_path(), audio_path.as_path()]).await;
        return Err(err);
    }

    info!(
        "Saved {:?} ({} bytes) and {:?} ({} bytes)",
        video_path,
        video_body.len(),
        audio_path,
        audio_body.len()
    );
    info!("Video and audio are separate streams, mux them (e.g. with ffmpeg) for a single file");

    Ok(DownloadedStreams {
        video_path,
        audio_path,
        video_bytes: video_body.len(),
        audio_bytes: audio_body.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playinfo::tests::{playinfo, watch_page};
    use crate::testing::FakeTransport;

    const BVID: &str = "BV1P7411H7tX";
    const VIDEO_URL: &str = "https://upos-sz.bilivideo.com/v-80.m4s?deadline=1";
    const AUDIO_URL: &str = "https://upos-sz.bilivideo.com/a-280.m4s?deadline=1";

    fn template() -> HeaderTemplate {
        HeaderTemplate::new("ua").unwrap()
    }

    fn files_in(dir: &Path) -> usize {
        std::fs::read_dir(dir).unwrap().count()
    }

    #[tokio::test]
    async fn writes_both_bodies_verbatim() {
        let video_bytes: Vec<u8> = (0..=255u8).cycle().take(4096).collect();
        let audio_bytes = vec![0x1F, 0x8B, 0x00, 0xFF, 0x42];
        let fake = FakeTransport::new()
            .respond(
                watch_url(BVID),
                watch_page(&playinfo(
                    &[VIDEO_URL, "https://upos/v-120.m4s"],
                    &[AUDIO_URL, "https://upos/a-320.m4s"],
                )),
            )
            .respond(VIDEO_URL, video_bytes.clone())
            .respond(AUDIO_URL, audio_bytes.clone());
        let dir = tempfile::tempdir().unwrap();

        let saved = download(&fake, &template(), &BiliVideo::from_bvid(BVID), dir.path())
            .await
            .unwrap();

        assert_eq!(saved.video_path, dir.path().join("BV1P7411H7tX.mp4"));
        assert_eq!(saved.audio_path, dir.path().join("BV1P7411H7tX.mp3"));
        assert_eq!(std::fs::read(&saved.video_path).unwrap(), video_bytes);
        assert_eq!(std::fs::read(&saved.audio_path).unwrap(), audio_bytes);
        assert_eq!(saved.video_bytes, 4096);
        assert_eq!(fake.urls(), vec![watch_url(BVID), VIDEO_URL.to_string(), AUDIO_URL.to_string()]);
    }

    #[tokio::test]
    async fn every_request_carries_the_watch_referer() {
        let fake = FakeTransport::new()
            .respond(watch_url(BVID), watch_page(&playinfo(&[VIDEO_URL], &[AUDIO_URL])))
            .respond(VIDEO_URL, b"v".to_vec())
            .respond(AUDIO_URL, b"a".to_vec());
        let dir = tempfile::tempdir().unwrap();
        download(&fake, &template(), &BiliVideo::from_bvid(BVID), dir.path())
            .await
            .unwrap();
        for request in fake.requests() {
            assert_eq!(request.headers[REFERER], "https://www.bilibili.com/video/BV1P7411H7tX");
        }
    }

    #[tokio::test]
    async fn empty_video_list_writes_nothing() {
        let fake = FakeTransport::new()
            .respond(watch_url(BVID), watch_page(&playinfo(&[], &[AUDIO_URL])))
            .respond(AUDIO_URL, b"a".to_vec());
        let dir = tempfile::tempdir().unwrap();
        let err = download(&fake, &template(), &BiliVideo::from_bvid(BVID), dir.path())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NoPlayableStream { track: "video", .. }));
        assert_eq!(files_in(dir.path()), 0);
        assert_eq!(fake.urls().len(), 1);
    }

    #[tokio::test]
    async fn missing_marker_writes_nothing() {
        let fake = FakeTransport::new().respond(
            watch_url(BVID),
            "<html><head><title>404</title></head><body>gone</body></html>",
        );
        let dir = tempfile::tempdir().unwrap();
        let err = download(&fake, &template(), &BiliVideo::from_bvid(BVID), dir.path())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::MalformedPage(_)));
        assert_eq!(files_in(dir.path()), 0);
    }

    #[tokio::test]
    async fn failed_audio_fetch_writes_nothing() {
        let fake = FakeTransport::new()
            .respond(watch_url(BVID), watch_page(&playinfo(&[VIDEO_URL], &[AUDIO_URL])))
            .respond(VIDEO_URL, b"v".to_vec());
        let dir = tempfile::tempdir().unwrap();
        let result = download(&fake, &template(), &BiliVideo::from_bvid(BVID), dir.path()).await;
        assert!(result.is_err());
        assert_eq!(files_in(dir.path()), 0);
    }

    #[tokio::test]
    async fn failed_audio_write_removes_the_video_file() {
        let fake = FakeTransport::new()
            .respond(watch_url(BVID), watch_page(&playinfo(&[VIDEO_URL], &[AUDIO_URL])))
            .respond(VIDEO_URL, b"v".to_vec())
            .respond(AUDIO_URL, b"a".to_vec());
        let dir = tempfile::tempdir().unwrap();
        // a directory in the way makes creating the .mp3 fail
        std::fs::create_dir(dir.path().join("BV1P7411H7tX.mp3")).unwrap();

        let err = download(&fake, &template(), &BiliVideo::from_bvid(BVID), dir.path())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Io(_)));
        assert!(!dir.path().join("BV1P7411H7tX.mp4").exists());
        assert!(dir.path().join("BV1P7411H7tX.mp3").is_dir());
        assert_eq!(files_in(dir.path()), 1);
    }

    #[tokio::test]
    async fn creates_missing_output_dir() {
        let fake = FakeTransport::new()
            .respond(watch_url(BVID), watch_page(&playinfo(&[VIDEO_URL], &[AUDIO_URL])))
            .respond(VIDEO_URL, b"v".to_vec())
            .respond(AUDIO_URL, b"a".to_vec());
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested/out");
        let saved = download(&fake, &template(), &BiliVideo::from_bvid(BVID), &out)
            .await
            .unwrap();
        assert!(saved.video_path.starts_with(&out));
        assert_eq!(std::fs::read(saved.audio_path).unwrap(), b"a");
    }

    #[tokio::test]
    async fn invalid_id_is_rejected_before_any_request() {
        let fake = FakeTransport::new();
        let dir = tempfile::tempdir().unwrap();
        for bad in ["", "../etc/passwd", "BV1 2", "BV1/x"] {
            let err = download(&fake, &template(), &BiliVideo::from_bvid(bad), dir.path())
                .await
                .unwrap_err();
            assert!(matches!(err, Error::InvalidVideoId(_)));
        }
        assert!(fake.requests().is_empty());
    }
}
