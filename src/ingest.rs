//! One (league, season) run: fetch and parse every page, then dedup and store
//! all tables in a single transaction.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rayon::prelude::*;
use rusqlite::Connection;

use crate::config::Settings;
use crate::dedup::filter_new;
use crate::error::{ExtractResult, UnitError, UnitKind};
use crate::fetch::{Page, PageSource};
use crate::identity::filter_valid_ids;
use crate::league::LeagueSeason;
use crate::matches::{MatchBundle, parse_match, parse_matches_list};
use crate::players::{parse_player_info, parse_players_list};
use crate::records::{
    MatchListRow, MatchRecord, MatchResultRow, MatchStatRow, PlayerListRow, PlayerRecord,
    RosterRow, TableKind, TableRow, TeamListRow, TeamRecord,
};
use crate::storage::{self, RunOutcome, SqliteStore};
use crate::teams::{TeamInfo, parse_team_info, parse_teams_list};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TableCounts {
    pub inserted: usize,
    pub skipped: usize,
}

#[derive(Debug)]
pub struct IngestSummary {
    pub scope: LeagueSeason,
    pub tables: BTreeMap<TableKind, TableCounts>,
    pub errors: Vec<UnitError>,
    /// Player pages that redirected away, i.e. players absent that season.
    pub players_redirected: usize,
}

impl IngestSummary {
    pub fn inserted(&self) -> usize {
        self.tables.values().map(|c| c.inserted).sum()
    }

    pub fn skipped(&self) -> usize {
        self.tables.values().map(|c| c.skipped).sum()
    }
}

/// Every record parsed for one season, before dedup.
#[derive(Debug)]
pub struct SeasonBatch {
    pub scope: LeagueSeason,
    pub players_list: Vec<PlayerListRow>,
    pub players_info: Vec<PlayerRecord>,
    pub teams_list: Vec<TeamListRow>,
    pub teams_info: Vec<TeamRecord>,
    pub teams_roster: Vec<RosterRow>,
    pub matches_list: Vec<MatchListRow>,
    pub matches_info: Vec<MatchRecord>,
    pub matches_stats: Vec<MatchStatRow>,
    pub matches_results: Vec<MatchResultRow>,
    pub errors: Vec<UnitError>,
    pub players_redirected: usize,
}

impl SeasonBatch {
    pub fn new(scope: LeagueSeason) -> Self {
        Self {
            scope,
            players_list: Vec::new(),
            players_info: Vec::new(),
            teams_list: Vec::new(),
            teams_info: Vec::new(),
            teams_roster: Vec::new(),
            matches_list: Vec::new(),
            matches_info: Vec::new(),
            matches_stats: Vec::new(),
            matches_results: Vec::new(),
            errors: Vec::new(),
            players_redirected: 0,
        }
    }
}

pub fn build_fetch_pool(threads: usize) -> Option<rayon::ThreadPool> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .ok()
}

fn with_fetch_pool<T>(pool: Option<&rayon::ThreadPool>, action: impl FnOnce() -> T + Send) -> T
where
    T: Send,
{
    if let Some(pool) = pool {
        pool.install(action)
    } else {
        action()
    }
}

/// Full run for `scope`, recorded in the run ledger.
pub fn ingest_season<P>(
    conn: &mut Connection,
    source: &P,
    scope: LeagueSeason,
    settings: &Settings,
) -> Result<IngestSummary>
where
    P: PageSource + ?Sized,
{
    let started_at = Utc::now();
    let run_id = storage::begin_run(conn, scope, started_at)?;
    let pool = build_fetch_pool(settings.fetch_parallelism);

    log::info!("{scope}: fetching pages");
    let batch = collect_season(source, scope, pool.as_ref());
    let stored = store_batch(conn, batch, started_at);

    let outcome = match &stored {
        Ok(summary) => RunOutcome {
            rows_inserted: summary.inserted(),
            rows_skipped: summary.skipped(),
            errors: summary.errors.iter().map(|e| e.to_string()).collect(),
        },
        Err(err) => RunOutcome {
            errors: vec![format!("store: {err:#}")],
            ..RunOutcome::default()
        },
    };
    storage::finish_run(conn, run_id, &outcome)?;

    let summary = stored?;
    log::info!(
        "{scope}: {} rows inserted, {} skipped, {} unit errors",
        summary.inserted(),
        summary.skipped(),
        summary.errors.len()
    );
    Ok(summary)
}

/// Runs every scope in order. A scope that fails to store is logged and
/// reported; the remaining scopes still run.
pub fn ingest_scopes<P>(
    conn: &mut Connection,
    source: &P,
    scopes: impl IntoIterator<Item = LeagueSeason>,
    settings: &Settings,
) -> Vec<(LeagueSeason, Result<IngestSummary>)>
where
    P: PageSource + ?Sized,
{
    scopes
        .into_iter()
        .map(|scope| {
            let result = ingest_season(conn, source, scope, settings);
            if let Err(err) = &result {
                log::error!("{scope}: ingest failed: {err:#}");
            }
            (scope, result)
        })
        .collect()
}

/// Fetches and parses matches, then teams, then players. Failures are kept
/// per unit and never stop the season.
pub fn collect_season<P>(
    source: &P,
    scope: LeagueSeason,
    pool: Option<&rayon::ThreadPool>,
) -> SeasonBatch
where
    P: PageSource + ?Sized,
{
    let mut batch = SeasonBatch::new(scope);

    let url = scope.matches_list_url();
    match load_unit(source, UnitKind::MatchesList, 0, url, |page| {
        Ok(parse_matches_list(&page.body, scope)?)
    }) {
        Ok(rows) => batch.matches_list = rows,
        Err(err) => batch.errors.push(err),
    }
    let match_ids: Vec<u32> = batch.matches_list.iter().map(|r| r.match_id).collect();
    log::info!("{scope}: {} matches listed", match_ids.len());
    let bundles = fetch_all(source, pool, &match_ids, UnitKind::Match, |id| {
        (scope.match_url(id), move |page: &Page| -> ExtractResult<MatchBundle> {
            parse_match(&page.body, scope, id)
        })
    });
    for bundle in collect_ok(bundles, &mut batch.errors) {
        batch.matches_info.push(bundle.info);
        batch.matches_stats.extend(bundle.stats.unwrap_or_default());
        batch.matches_results.extend(bundle.results.unwrap_or_default());
    }

    let url = scope.teams_list_url();
    match load_unit(source, UnitKind::TeamsList, 0, url, |page| {
        Ok(parse_teams_list(&page.body, scope)?)
    }) {
        Ok(rows) => batch.teams_list = rows,
        Err(err) => batch.errors.push(err),
    }
    let team_ids: Vec<u32> = batch.teams_list.iter().map(|r| r.team_id).collect();
    log::info!("{scope}: {} teams listed", team_ids.len());
    let teams = fetch_all(source, pool, &team_ids, UnitKind::Team, |id| {
        (scope.team_url(id), move |page: &Page| -> ExtractResult<TeamInfo> {
            parse_team_info(&page.body, scope, id)
        })
    });
    for info in collect_ok(teams, &mut batch.errors) {
        batch.teams_info.push(info.team);
        batch.teams_roster.extend(info.roster);
    }

    let url = scope.players_list_url();
    match load_unit(source, UnitKind::PlayersList, 0, url, |page| {
        Ok(parse_players_list(&page.body, scope)?)
    }) {
        Ok(rows) => batch.players_list = rows,
        Err(err) => batch.errors.push(err),
    }
    let player_ids = players_to_fetch(&batch.players_list, &batch.matches_stats);
    log::info!("{scope}: {} players to fetch", player_ids.len());
    let players = fetch_all(source, pool, &player_ids, UnitKind::Player, |id| {
        (scope.player_url(id), move |page: &Page| -> ExtractResult<Option<PlayerRecord>> {
            if page.was_redirected() {
                return Ok(None);
            }
            parse_player_info(&page.body, scope, id).map(Some)
        })
    });
    for player in collect_ok(players, &mut batch.errors) {
        match player {
            Some(record) => batch.players_info.push(record),
            None => batch.players_redirected += 1,
        }
    }

    for err in &batch.errors {
        log::warn!("{scope}: {err}");
    }
    batch
}

/// Listed players first, then anyone who only shows up in match statistics.
/// The unnamed placeholder (id 0) is never fetched.
pub fn players_to_fetch(listed: &[PlayerListRow], stats: &[MatchStatRow]) -> Vec<u32> {
    filter_valid_ids(
        listed
            .iter()
            .map(|r| r.player_id)
            .chain(stats.iter().map(|r| r.player_id)),
    )
}

fn load_unit<P, T>(
    source: &P,
    kind: UnitKind,
    id: u32,
    url: String,
    parse: impl FnOnce(&Page) -> Result<T>,
) -> std::result::Result<T, UnitError>
where
    P: PageSource + ?Sized,
{
    source
        .fetch(&url)
        .and_then(|page| parse(&page))
        .map_err(|cause| UnitError::new(kind, id, url, cause))
}

fn fetch_all<P, T, F, G>(
    source: &P,
    pool: Option<&rayon::ThreadPool>,
    ids: &[u32],
    kind: UnitKind,
    unit: G,
) -> Vec<std::result::Result<T, UnitError>>
where
    P: PageSource + ?Sized,
    T: Send,
    F: FnOnce(&Page) -> ExtractResult<T>,
    G: Fn(u32) -> (String, F) + Sync,
{
    with_fetch_pool(pool, || {
        ids.par_iter()
            .map(|&id| {
                let (url, parse) = unit(id);
                load_unit(source, kind, id, url, |page| Ok(parse(page)?))
            })
            .collect()
    })
}

fn collect_ok<T>(
    results: Vec<std::result::Result<T, UnitError>>,
    errors: &mut Vec<UnitError>,
) -> Vec<T> {
    let mut out = Vec::with_capacity(results.len());
    for result in results {
        match result {
            Ok(item) => out.push(item),
            Err(err) => errors.push(err),
        }
    }
    out
}

/// Dedups every table against what is stored and inserts the rest, all in
/// one transaction.
pub fn store_batch(
    conn: &mut Connection,
    batch: SeasonBatch,
    ingested_at: DateTime<Utc>,
) -> Result<IngestSummary> {
    let tx = conn.transaction().context("begin ingest transaction")?;
    let mut tables = BTreeMap::new();
    store_table(&tx, batch.players_list, ingested_at, &mut tables)?;
    store_table(&tx, batch.players_info, ingested_at, &mut tables)?;
    store_table(&tx, batch.teams_list, ingested_at, &mut tables)?;
    store_table(&tx, batch.teams_info, ingested_at, &mut tables)?;
    store_table(&tx, batch.teams_roster, ingested_at, &mut tables)?;
    store_table(&tx, batch.matches_list, ingested_at, &mut tables)?;
    store_table(&tx, batch.matches_info, ingested_at, &mut tables)?;
    store_table(&tx, batch.matches_stats, ingested_at, &mut tables)?;
    store_table(&tx, batch.matches_results, ingested_at, &mut tables)?;
    tx.commit().context("commit ingest transaction")?;

    Ok(IngestSummary {
        scope: batch.scope,
        tables,
        errors: batch.errors,
        players_redirected: batch.players_redirected,
    })
}

fn store_table<R: TableRow>(
    conn: &Connection,
    rows: Vec<R>,
    ingested_at: DateTime<Utc>,
    tables: &mut BTreeMap<TableKind, TableCounts>,
) -> Result<()> {
    let store = SqliteStore::new(conn);
    let outcome = filter_new(rows, &store, ingested_at)?;
    let inserted = storage::insert_stamped(conn, &outcome.fresh)?;
    tables.insert(
        R::TABLE,
        TableCounts {
            inserted,
            skipped: outcome.skipped,
        },
    );
    Ok(())
}
