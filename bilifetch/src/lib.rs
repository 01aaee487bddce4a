//! Lists a bilibili uploader's videos and downloads their dash streams.

pub mod config;
pub mod downloader;
pub mod error;
pub mod listing;
pub mod models;
pub mod picker;
pub mod platform;
pub mod playinfo;
pub mod session;

#[cfg(test)]
mod testing;

pub use config::Config;
pub use error::{Error, Result};
pub use listing::Listing;
pub use models::{BiliVideo, Video};
pub use platform::{Bilibili, VideoPlatform};
