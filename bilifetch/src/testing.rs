//! In-memory transport for unit tests

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::error::{Error, Result};
use crate::session::Transport;

#[derive(Debug, Clone)]
pub struct Request {
    pub url: String,
    pub headers: HeaderMap,
}

/// Replays canned bodies by exact url and records every request it sees.
/// Unknown urls fail like a connection error would.
#[derive(Default)]
pub struct FakeTransport {
    responses: HashMap<String, Vec<u8>>,
    requests: Mutex<Vec<Request>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(mut self, url: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        self.responses.insert(url.into(), body.into());
        self
    }

    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().unwrap().clone()
    }

    pub fn urls(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.url).collect()
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn fetch(&self, url: &str, headers: HeaderMap) -> Result<Vec<u8>> {
        self.requests.lock().unwrap().push(Request {
            url: url.to_string(),
            headers,
        });
        self.responses.get(url).cloned().ok_or_else(|| {
            Error::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                format!("no canned response for {url}"),
            ))
        })
    }
}
