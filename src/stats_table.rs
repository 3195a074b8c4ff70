//! Per-match player statistics tables.
//!
//! The published columns changed in the 2020/21 season. Each era is a fixed
//! column list; parsing walks that list, so a future layout only needs a new
//! [`Era`] entry and schema.

use std::ops::RangeInclusive;

use crate::error::{ExtractError, ExtractResult};
use crate::identity::extract_id;
use crate::league::LeagueSeason;
use crate::percent::{is_no_data, reconstruct_count, serve_slashes};
use crate::records::MatchStatRow;

const REGULAR_SETS: usize = 5;

/// Header abbreviation, or a word in the long form, announcing a golden set.
const GOLDEN_SET_ABBREV: &str = "gs";
const GOLDEN_SET_WORD: &str = "złoty";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatColumn {
    Points,
    BreakPoints,
    PointsRatio,
    ServeTotal,
    ServeAces,
    ServeErrors,
    AcesPerSet,
    ServeEfficiencyPct,
    ReceptionTotal,
    ReceptionErrors,
    ReceptionNegative,
    ReceptionPositive,
    ReceptionPositivePct,
    ReceptionPerfect,
    ReceptionPerfectPct,
    AttackTotal,
    AttackErrors,
    AttackBlocked,
    AttackKills,
    AttackKillPct,
    AttackEfficiencyPct,
    BlockPoints,
    BlockPerSet,
    BlockAssists,
}

use StatColumn::*;

/// Columns after the set markers, seasons 2008/09 through 2019/20.
static LEGACY_SCHEMA: &[StatColumn] = &[
    Points,
    ServeTotal,
    ServeAces,
    ServeErrors,
    AcesPerSet,
    ReceptionTotal,
    ReceptionErrors,
    ReceptionNegative,
    ReceptionPositive,
    ReceptionPositivePct,
    ReceptionPerfect,
    ReceptionPerfectPct,
    AttackTotal,
    AttackErrors,
    AttackBlocked,
    AttackKills,
    AttackKillPct,
    BlockPoints,
    BlockPerSet,
];

/// Columns after the set markers, seasons from 2020/21.
static MODERN_SCHEMA: &[StatColumn] = &[
    Points,
    BreakPoints,
    PointsRatio,
    ServeTotal,
    ServeErrors,
    ServeAces,
    ServeEfficiencyPct,
    ReceptionTotal,
    ReceptionErrors,
    ReceptionPositivePct,
    ReceptionPerfectPct,
    AttackTotal,
    AttackBlocked,
    AttackErrors,
    AttackKills,
    AttackKillPct,
    AttackEfficiencyPct,
    BlockPoints,
    BlockAssists,
];

/// A contiguous range of seasons sharing one column schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Era {
    Legacy,
    Modern,
}

static ERA_SEASONS: &[(RangeInclusive<u16>, Era)] = &[
    (2008..=2019, Era::Legacy),
    (2020..=u16::MAX, Era::Modern),
];

impl Era {
    pub fn for_season(season: u16) -> ExtractResult<Era> {
        ERA_SEASONS
            .iter()
            .find(|(range, _)| range.contains(&season))
            .map(|(_, era)| *era)
            .ok_or(ExtractError::UnsupportedEra { season })
    }

    pub fn schema(self) -> &'static [StatColumn] {
        match self {
            Era::Legacy => LEGACY_SCHEMA,
            Era::Modern => MODERN_SCHEMA,
        }
    }

    pub fn publishes(self, column: StatColumn) -> bool {
        self.schema().contains(&column)
    }
}

/// One statistics table as lifted out of the page, before any typing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawStatsTable {
    /// Text of every header cell, all header rows flattened.
    pub header: Vec<String>,
    pub rows: Vec<RawStatsRow>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawStatsRow {
    /// Link on the player cell; the unnamed-player placeholder has none.
    pub player_href: Option<String>,
    /// Cell texts, player cell first.
    pub cells: Vec<String>,
}

pub fn has_golden_set(header: &[String]) -> bool {
    header.iter().any(|cell| {
        let text = cell.trim().to_lowercase();
        text == GOLDEN_SET_ABBREV || text.contains(GOLDEN_SET_WORD)
    })
}

/// Parses one team's table. The trailing totals row is dropped.
pub fn parse_stats_table(
    table: &RawStatsTable,
    scope: LeagueSeason,
    match_id: u32,
) -> ExtractResult<Vec<MatchStatRow>> {
    let era = Era::for_season(scope.season)?;
    let set_columns = if has_golden_set(&table.header) {
        REGULAR_SETS + 1
    } else {
        REGULAR_SETS
    };

    let Some((_totals, players)) = table.rows.split_last() else {
        return Err(ExtractError::structural(
            "statistics table",
            format!("match {match_id}: no rows, not even totals"),
        ));
    };

    players
        .iter()
        .map(|row| parse_row(row, era, set_columns, scope, match_id))
        .collect()
}

fn parse_row(
    raw: &RawStatsRow,
    era: Era,
    set_columns: usize,
    scope: LeagueSeason,
    match_id: u32,
) -> ExtractResult<MatchStatRow> {
    let schema = era.schema();
    let expected = 1 + set_columns + schema.len();
    if raw.cells.len() != expected {
        return Err(ExtractError::structural(
            "statistics row",
            format!(
                "match {match_id}: expected {expected} cells for {era:?} layout, found {}",
                raw.cells.len()
            ),
        ));
    }

    // Link-less rows are the site's unnamed-player bucket. They all get id 0,
    // so (match, player) is not a key for them; rows with equal stat lines
    // fold together in dedup.
    let player_id = match raw.player_href.as_deref() {
        Some(href) => extract_id(href)?,
        None => 0,
    };
    let mut row = MatchStatRow::new(scope, match_id, player_id);

    let set_cells = &raw.cells[1..1 + set_columns];
    for (slot, cell) in row.sets.iter_mut().zip(set_cells) {
        *slot = non_empty(cell);
    }

    let mut serve_efficiency = None;
    let mut reception_positive_pct = None;
    let mut reception_perfect_pct = None;

    for (column, cell) in schema.iter().zip(&raw.cells[1 + set_columns..]) {
        let cell = cell.as_str();
        match column {
            Points => row.points = parse_count(cell)?,
            BreakPoints => row.break_points = parse_count(cell)?,
            PointsRatio => row.points_ratio = parse_signed(cell)?,
            ServeTotal => row.serve_total = parse_count(cell)?,
            ServeAces => row.serve_aces = parse_count(cell)?,
            ServeErrors => row.serve_errors = parse_count(cell)?,
            ServeEfficiencyPct => serve_efficiency = Some(cell),
            ReceptionTotal => row.reception_total = parse_count(cell)?,
            ReceptionErrors => row.reception_errors = parse_count(cell)?,
            ReceptionNegative => row.reception_negative = parse_count(cell)?,
            ReceptionPositive => row.reception_positive = parse_count(cell)?,
            ReceptionPositivePct => reception_positive_pct = Some(cell),
            ReceptionPerfect => row.reception_perfect = parse_count(cell)?,
            ReceptionPerfectPct => reception_perfect_pct = Some(cell),
            AttackTotal => row.attack_total = parse_count(cell)?,
            AttackErrors => row.attack_errors = parse_count(cell)?,
            AttackBlocked => row.attack_blocked = parse_count(cell)?,
            AttackKills => row.attack_kills = parse_count(cell)?,
            BlockPoints => row.block_points = parse_count(cell)?,
            BlockAssists => row.block_assists = parse_count(cell)?,
            // Ratios are recomputable from the counts; not stored.
            AcesPerSet | AttackKillPct | AttackEfficiencyPct | BlockPerSet => {}
        }
    }

    if let Some(eff) = serve_efficiency {
        row.serve_slashes = Some(serve_slashes(
            eff,
            row.serve_total.unwrap_or(0),
            row.serve_aces.unwrap_or(0),
            row.serve_errors.unwrap_or(0),
        )?);
    }
    let reception_total = row.reception_total.unwrap_or(0);
    if !era.publishes(ReceptionPositive)
        && let Some(pct) = reception_positive_pct
    {
        row.reception_positive = Some(reconstruct_count(pct, reception_total)?);
    }
    if !era.publishes(ReceptionPerfect)
        && let Some(pct) = reception_perfect_pct
    {
        row.reception_perfect = Some(reconstruct_count(pct, reception_total)?);
    }

    Ok(row)
}

fn non_empty(cell: &str) -> Option<String> {
    let trimmed = cell.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn is_placeholder(cell: &str) -> bool {
    cell.is_empty() || is_no_data(cell)
}

fn parse_count(cell: &str) -> ExtractResult<Option<u32>> {
    let trimmed = cell.trim();
    if is_placeholder(trimmed) {
        return Ok(None);
    }
    trimmed
        .parse::<u32>()
        .map(Some)
        .map_err(|_| ExtractError::structural("statistics cell", format!("not a count: {cell:?}")))
}

fn parse_signed(cell: &str) -> ExtractResult<Option<i32>> {
    let trimmed = cell.trim();
    if is_placeholder(trimmed) {
        return Ok(None);
    }
    let digits = trimmed.strip_prefix('+').unwrap_or(trimmed);
    digits
        .parse::<i32>()
        .map(Some)
        .map_err(|_| ExtractError::structural("statistics cell", format!("not a number: {cell:?}")))
}
