use std::thread;
use std::time::Duration;

use anyhow::{Result, anyhow};
use rand::Rng;
use reqwest::blocking::Client;
use thiserror::Error;

use crate::config::Settings;
use crate::http_client::http_client;
use crate::page_cache;

const BASE_BACKOFF_MS: u64 = 250;
const MAX_JITTER_MS: u64 = 150;

/// Raw markup for one URL, with the address the server finally answered from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub requested_url: String,
    pub final_url: String,
    pub body: String,
}

impl Page {
    /// The site redirects profile pages of players absent from a season.
    pub fn was_redirected(&self) -> bool {
        self.final_url.trim_end_matches('/') != self.requested_url.trim_end_matches('/')
    }
}

/// Where pages come from. Implementations must be callable from worker threads.
pub trait PageSource: Sync {
    fn fetch(&self, url: &str) -> Result<Page>;
}

#[derive(Debug, Error)]
#[error("http {status} for {url}")]
pub struct HttpStatusError {
    pub url: String,
    pub status: u16,
}

impl HttpStatusError {
    pub fn is_transient(&self) -> bool {
        self.status == 429 || self.status >= 500
    }
}

pub struct HttpPageSource {
    client: &'static Client,
    max_attempts: u32,
    use_cache: bool,
}

impl HttpPageSource {
    pub fn new(settings: &Settings) -> Result<Self> {
        Ok(Self {
            client: http_client(settings.timeout())?,
            max_attempts: settings.max_attempts.max(1),
            use_cache: settings.use_page_cache,
        })
    }
}

impl PageSource for HttpPageSource {
    fn fetch(&self, url: &str) -> Result<Page> {
        with_retry(self.max_attempts, || {
            page_cache::fetch_page(self.client, url, self.use_cache)
        })
    }
}

/// Runs `operation` up to `max_attempts` times with exponential backoff and
/// random jitter. HTTP statuses other than 429 and 5xx are not retried.
pub fn with_retry<T, F>(max_attempts: u32, mut operation: F) -> Result<T>
where
    F: FnMut() -> Result<T>,
{
    let mut last_error = None;
    for attempt in 0..max_attempts {
        match operation() {
            Ok(result) => return Ok(result),
            Err(err) => {
                let permanent = err
                    .downcast_ref::<HttpStatusError>()
                    .is_some_and(|status| !status.is_transient());
                if permanent {
                    return Err(err);
                }
                log::warn!("attempt {} failed: {err:#}", attempt + 1);
                last_error = Some(err);
                if attempt + 1 < max_attempts {
                    thread::sleep(backoff(attempt));
                }
            }
        }
    }
    Err(last_error.unwrap_or_else(|| anyhow!("no fetch attempts made")))
}

fn backoff(attempt: u32) -> Duration {
    let base = BASE_BACKOFF_MS.saturating_mul(2u64.saturating_pow(attempt));
    let jitter = rand::thread_rng().gen_range(0..=MAX_JITTER_MS);
    Duration::from_millis(base + jitter)
}
