use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use chrono::Utc;

use volley_ingest::config::{Settings, arg_value};
use volley_ingest::fetch::HttpPageSource;
use volley_ingest::ingest::ingest_scopes;
use volley_ingest::league::{League, LeagueSeason, current_season};
use volley_ingest::storage;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config_path = arg_value("--config").map(PathBuf::from);
    let settings = Settings::load(config_path.as_deref())?;
    let leagues = match arg_value("--league") {
        Some(raw) => vec![raw.parse::<League>()?],
        None => settings.leagues.clone(),
    };
    if leagues.is_empty() {
        return Err(anyhow!("no leagues configured for ingest"));
    }
    let season = match arg_value("--season") {
        Some(raw) => raw
            .parse::<u16>()
            .with_context(|| format!("invalid --season {raw:?}"))?,
        None => current_season(Utc::now().date_naive()),
    };

    let db_path = arg_value("--db")
        .map(PathBuf::from)
        .or_else(|| settings.resolved_db_path())
        .context("unable to resolve sqlite path")?;
    let mut conn = storage::open_db(&db_path)?;
    let source = HttpPageSource::new(&settings)?;

    println!("DB: {}", db_path.display());
    let scopes: Vec<LeagueSeason> = leagues
        .into_iter()
        .map(|league| LeagueSeason::new(league, season))
        .collect();
    for (scope, result) in ingest_scopes(&mut conn, &source, scopes, &settings) {
        let summary = match result {
            Ok(summary) => summary,
            Err(err) => {
                println!("{scope}: failed: {err:#}");
                continue;
            }
        };
        println!("{scope}");
        for (table, counts) in &summary.tables {
            println!(
                "  {table:<16} inserted={:<6} skipped={}",
                counts.inserted, counts.skipped
            );
        }
        for err in &summary.errors {
            println!("  error: {err}");
        }
    }
    Ok(())
}
