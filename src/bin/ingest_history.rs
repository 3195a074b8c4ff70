use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use chrono::Utc;

use volley_ingest::config::{Settings, arg_value};
use volley_ingest::fetch::HttpPageSource;
use volley_ingest::ingest::{IngestSummary, ingest_scopes};
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

    let db_path = arg_value("--db")
        .map(PathBuf::from)
        .or_else(|| settings.resolved_db_path())
        .context("unable to resolve sqlite path")?;
    let mut conn = storage::open_db(&db_path)?;
    let source = HttpPageSource::new(&settings)?;
    let current = current_season(Utc::now().date_naive());

    println!("Historical ingest");
    println!("DB: {}", db_path.display());
    let scopes = leagues.into_iter().flat_map(|league| {
        (settings.first_season_of(league)..current)
            .map(move |season| LeagueSeason::new(league, season))
    });
    for (scope, result) in ingest_scopes(&mut conn, &source, scopes, &settings) {
        match result {
            Ok(summary) => print_summary(&summary),
            Err(err) => println!("{scope}: failed: {err:#}"),
        }
    }
    Ok(())
}

fn print_summary(summary: &IngestSummary) {
    println!(
        "{}: inserted={} skipped={} redirected_players={}",
        summary.scope,
        summary.inserted(),
        summary.skipped(),
        summary.players_redirected
    );
    if !summary.errors.is_empty() {
        println!("  errors: {}", summary.errors.len());
        for err in summary.errors.iter().take(6) {
            println!("   - {err}");
        }
    }
}
