//! On-disk cache of fetched pages, one JSON file per URL, revalidated with
//! ETag / Last-Modified.

use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result, anyhow};
use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::header::{ETAG, IF_MODIFIED_SINCE, IF_NONE_MATCH, LAST_MODIFIED};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::fetch::{HttpStatusError, Page};

const CACHE_VERSION: u32 = 1;
const CACHE_DIR: &str = "volley_ingest";
const PAGES_DIR: &str = "pages";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheEntry {
    version: u32,
    url: String,
    final_url: String,
    body: String,
    etag: Option<String>,
    last_modified: Option<String>,
    fetched_at: u64,
}

/// One GET of `url`. With `use_cache`, a stored copy is revalidated and a 304
/// answers from disk.
pub fn fetch_page(client: &Client, url: &str, use_cache: bool) -> Result<Page> {
    let cached_entry = if use_cache { load_entry(url) } else { None };

    let mut req = client.get(url);
    if let Some(entry) = cached_entry.as_ref() {
        if let Some(etag) = entry.etag.as_ref() {
            req = req.header(IF_NONE_MATCH, etag);
        }
        if let Some(last_modified) = entry.last_modified.as_ref() {
            req = req.header(IF_MODIFIED_SINCE, last_modified);
        }
    }

    let resp = req.send().with_context(|| format!("request {url} failed"))?;
    let status = resp.status();
    let final_url = resp.url().to_string();
    let headers = resp.headers().clone();

    if status == StatusCode::NOT_MODIFIED {
        let entry = cached_entry.ok_or_else(|| anyhow!("received 304 without cache body"))?;
        return Ok(Page {
            requested_url: url.to_string(),
            final_url: entry.final_url,
            body: entry.body,
        });
    }
    if !status.is_success() {
        return Err(HttpStatusError {
            url: url.to_string(),
            status: status.as_u16(),
        }
        .into());
    }

    let body = resp.text().context("failed reading body")?;
    if use_cache {
        let entry = CacheEntry {
            version: CACHE_VERSION,
            url: url.to_string(),
            final_url: final_url.clone(),
            body: body.clone(),
            etag: header_string(&headers, ETAG),
            last_modified: header_string(&headers, LAST_MODIFIED),
            fetched_at: system_time_to_secs(SystemTime::now()).unwrap_or_default(),
        };
        if let Err(err) = save_entry(&entry) {
            log::debug!("page cache write for {url} failed: {err:#}");
        }
    }

    Ok(Page {
        requested_url: url.to_string(),
        final_url,
        body,
    })
}

fn header_string(
    headers: &reqwest::header::HeaderMap,
    name: reqwest::header::HeaderName,
) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string())
}

fn load_entry(url: &str) -> Option<CacheEntry> {
    let raw = fs::read_to_string(entry_path(url)?).ok()?;
    let entry = serde_json::from_str::<CacheEntry>(&raw).ok()?;
    (entry.version == CACHE_VERSION && entry.url == url).then_some(entry)
}

fn save_entry(entry: &CacheEntry) -> Result<()> {
    let Some(path) = entry_path(&entry.url) else {
        return Ok(());
    };
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).ok();
    }
    let tmp = path.with_extension("json.tmp");
    let json = serde_json::to_string(entry).context("serialize page cache entry")?;
    fs::write(&tmp, json).context("write page cache entry")?;
    fs::rename(&tmp, &path).context("swap page cache entry")?;
    Ok(())
}

fn entry_path(url: &str) -> Option<PathBuf> {
    let digest = Sha256::digest(url.as_bytes());
    let name: String = digest.iter().map(|b| format!("{b:02x}")).collect();
    Some(app_cache_dir()?.join(PAGES_DIR).join(format!("{name}.json")))
}

/// `$XDG_CACHE_HOME/volley_ingest`, else `~/.cache/volley_ingest`.
pub fn app_cache_dir() -> Option<PathBuf> {
    if let Ok(base) = std::env::var("XDG_CACHE_HOME")
        && !base.trim().is_empty()
    {
        return Some(PathBuf::from(base).join(CACHE_DIR));
    }
    let home = std::env::var("HOME").ok()?;
    if home.trim().is_empty() {
        return None;
    }
    Some(PathBuf::from(home).join(".cache").join(CACHE_DIR))
}

fn system_time_to_secs(time: SystemTime) -> Option<u64> {
    time.duration_since(UNIX_EPOCH).ok().map(|d| d.as_secs())
}
