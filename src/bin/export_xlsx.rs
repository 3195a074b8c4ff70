use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};

use volley_ingest::config::{Settings, arg_value};
use volley_ingest::export::export_xlsx;
use volley_ingest::league::{League, LeagueSeason};
use volley_ingest::storage;

const DEFAULT_OUT: &str = "volley_export.xlsx";

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config_path = arg_value("--config").map(PathBuf::from);
    let settings = Settings::load(config_path.as_deref())?;
    let db_path = arg_value("--db")
        .map(PathBuf::from)
        .or_else(|| settings.resolved_db_path())
        .context("unable to resolve sqlite path")?;
    let out = arg_value("--out").map_or_else(|| PathBuf::from(DEFAULT_OUT), PathBuf::from);

    let scope = match (arg_value("--league"), arg_value("--season")) {
        (Some(league), Some(season)) => Some(LeagueSeason::new(
            league.parse::<League>()?,
            season
                .parse::<u16>()
                .with_context(|| format!("invalid --season {season:?}"))?,
        )),
        (None, None) => None,
        _ => return Err(anyhow!("--league and --season must be given together")),
    };

    let conn = storage::open_db(&db_path)?;
    let report = export_xlsx(&conn, &out, scope)?;
    println!("Exported {} to {}", db_path.display(), out.display());
    for (table, rows) in report.sheets {
        println!("  {table}: {rows} rows");
    }
    Ok(())
}
