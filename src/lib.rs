pub mod config;
pub mod dedup;
pub mod error;
pub mod export;
pub mod fetch;
pub mod fingerprint;
pub mod html;
pub mod http_client;
pub mod identity;
pub mod ingest;
pub mod league;
pub mod matches;
pub mod page_cache;
pub mod percent;
pub mod players;
pub mod records;
pub mod stats_table;
pub mod storage;
pub mod teams;
pub mod vocab;
