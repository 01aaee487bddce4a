//! Error type shared by the lister, the resolver and the CLI

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The listing api answered with a `code` other than the success sentinel
    #[error("upstream rejected the request (code {code}): {message}")]
    UpstreamRejected { code: i64, message: String },

    #[error("watch page is malformed: {0}")]
    MalformedPage(String),

    #[error("no playable {track} stream advertised for {bvid}")]
    NoPlayableStream { bvid: String, track: &'static str },

    #[error("invalid video id: {0:?}")]
    InvalidVideoId(String),

    #[error("{0} is not supported")]
    NotSupported(&'static str),

    #[error("picker failed: {0}")]
    Picker(String),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("invalid header value: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),

    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("config error: {0}")]
    Config(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
