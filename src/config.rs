use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::league::League;
use crate::page_cache::app_cache_dir;

const DEFAULT_CONFIG_FILE: &str = "config.json";
const DEFAULT_PARALLELISM: usize = 6;
const DEFAULT_MAX_ATTEMPTS: u32 = 3;
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Runtime settings: defaults, then an optional JSON file, then environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub leagues: Vec<League>,
    /// First season ingested by the history run, per league.
    pub first_season: BTreeMap<League, u16>,
    pub db_path: Option<PathBuf>,
    pub fetch_parallelism: usize,
    pub max_attempts: u32,
    pub timeout_secs: u64,
    pub use_page_cache: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            leagues: League::ALL.to_vec(),
            first_season: BTreeMap::from([
                (League::PlusLiga, 2008),
                (League::TauronLiga, 2008),
                (League::Tauron1Liga, 2019),
            ]),
            db_path: None,
            fetch_parallelism: DEFAULT_PARALLELISM,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            use_page_cache: true,
        }
    }
}

impl Settings {
    /// Loads `.env.local` and `.env`, then the JSON file at `path` (or
    /// `config.json` when present), then applies environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Settings> {
        load_env_files();
        let mut settings = match path {
            Some(path) => Settings::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
                Settings::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Settings::default(),
        };
        settings.apply_env();
        settings.normalize();
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> Result<Settings> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("parse config {}", path.display()))
    }

    fn apply_env(&mut self) {
        if let Some(path) = env_string("VOLLEY_DB_PATH") {
            self.db_path = Some(PathBuf::from(path));
        }
        if let Some(n) = env_parsed("FETCH_PARALLELISM") {
            self.fetch_parallelism = n;
        }
        if let Some(n) = env_parsed("FETCH_MAX_ATTEMPTS") {
            self.max_attempts = n;
        }
        if let Some(n) = env_parsed("HTTP_TIMEOUT_SECS") {
            self.timeout_secs = n;
        }
        if let Some(raw) = env_string("VOLLEY_PAGE_CACHE") {
            self.use_page_cache = !matches!(raw.to_lowercase().as_str(), "0" | "false" | "off");
        }
    }

    fn normalize(&mut self) {
        self.fetch_parallelism = self.fetch_parallelism.clamp(2, 32);
        self.max_attempts = self.max_attempts.max(1);
        self.timeout_secs = self.timeout_secs.max(1);
        let mut seen = Vec::with_capacity(self.leagues.len());
        self.leagues.retain(|league| {
            if seen.contains(league) {
                false
            } else {
                seen.push(*league);
                true
            }
        });
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn first_season_of(&self, league: League) -> u16 {
        self.first_season.get(&league).copied().unwrap_or(2008)
    }

    pub fn resolved_db_path(&self) -> Option<PathBuf> {
        self.db_path
            .clone()
            .or_else(|| app_cache_dir().map(|dir| dir.join("volley.sqlite")))
    }
}

pub fn load_env_files() {
    dotenvy::from_filename(".env.local").ok();
    dotenvy::dotenv().ok();
}

fn env_string(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_parsed<T: std::str::FromStr>(key: &str) -> Option<T> {
    env_string(key).and_then(|v| v.parse::<T>().ok())
}

/// Value of `--name value` or `--name=value` in the process arguments.
pub fn arg_value(name: &str) -> Option<String> {
    let args = env::args().skip(1).collect::<Vec<_>>();
    find_arg(&args, name)
}

pub fn find_arg(args: &[String], name: &str) -> Option<String> {
    let prefix = format!("{name}=");
    for (idx, arg) in args.iter().enumerate() {
        if let Some(value) = arg.strip_prefix(&prefix) {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
        if arg == name {
            let Some(next) = args.get(idx + 1) else {
                continue;
            };
            if !next.trim().is_empty() {
                return Some(next.trim().to_string());
            }
        }
    }
    None
}
