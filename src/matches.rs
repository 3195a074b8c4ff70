use chrono::{NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};

use crate::error::{ExtractError, ExtractResult};
use crate::html::{first_href, href_has_segments, selector, text_of};
use crate::identity::{extract_id, extract_ids, filter_valid_ids};
use crate::league::LeagueSeason;
use crate::records::{MatchListRow, MatchRecord, MatchResultRow, MatchStatRow};
use crate::stats_table::{RawStatsRow, RawStatsTable, parse_stats_table};
use crate::vocab::{MatchDetailField, translate_match_detail};

static CLICKABLE: Lazy<Selector> = Lazy::new(|| selector("[onclick]"));
static LINKS: Lazy<Selector> = Lazy::new(|| selector("a[href]"));
static TEAM_LINKS: Lazy<Selector> = Lazy::new(|| selector(".game-team a[href]"));
static DATE: Lazy<Selector> = Lazy::new(|| selector("div.date"));
static DETAIL_ROWS: Lazy<Selector> = Lazy::new(|| selector("table.game-details tr"));
static STATS_TABLES: Lazy<Selector> = Lazy::new(|| selector("table.rs-standings-table"));
static RESULT_TABLE: Lazy<Selector> = Lazy::new(|| selector("table.game-results"));
static ROWS: Lazy<Selector> = Lazy::new(|| selector("tr"));
static TH: Lazy<Selector> = Lazy::new(|| selector("th"));
static TD: Lazy<Selector> = Lazy::new(|| selector("td"));
static CELLS: Lazy<Selector> = Lazy::new(|| selector("th, td"));

/// Kick-off as printed on match pages; older pages drop the time.
const KICKOFF_FORMAT: &str = "%d.%m.%Y, %H:%M";
const DATE_ONLY_FORMAT: &str = "%d.%m.%Y";

const ROMAN_SETS: &[&str] = &["I", "II", "III", "IV", "V"];
const GOLDEN_SET_NUMBER: u8 = 6;

/// Everything one match page yields. Blocks a page does not carry are `None`
/// independently of each other.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchBundle {
    pub info: MatchRecord,
    /// `None` when the page has no statistics table (match not played yet).
    pub stats: Option<Vec<MatchStatRow>>,
    /// `None` when the page has no per-set result table.
    pub results: Option<Vec<MatchResultRow>>,
}

/// Match ids from the season's game list. Tiles navigate through `onclick`
/// handlers; plain links are used when a page has no such tiles.
pub fn parse_matches_list(html: &str, scope: LeagueSeason) -> ExtractResult<Vec<MatchListRow>> {
    let doc = Html::parse_document(html);
    let handlers: Vec<&str> = doc
        .select(&CLICKABLE)
        .filter_map(|el| el.value().attr("onclick"))
        .filter(|handler| handler.contains("games/"))
        .collect();
    let ids = if handlers.is_empty() {
        let hrefs = doc
            .select(&LINKS)
            .filter_map(|a| a.value().attr("href"))
            .filter(|href| href_has_segments(href, &["games", "id"]));
        extract_ids(hrefs)?
    } else {
        extract_ids(handlers)?
    };
    Ok(filter_valid_ids(ids)
        .into_iter()
        .map(|match_id| MatchListRow { scope, match_id })
        .collect())
}

pub fn parse_match(html: &str, scope: LeagueSeason, match_id: u32) -> ExtractResult<MatchBundle> {
    let doc = Html::parse_document(html);

    let mut info = MatchRecord::new(scope, match_id);
    if let Some((home, away)) = parse_pairing(&doc)? {
        info.home_team_id = Some(home);
        info.away_team_id = Some(away);
    }
    info.date = doc
        .select(&DATE)
        .last()
        .and_then(|el| parse_kickoff(&text_of(el)));
    parse_details(&doc, &mut info)?;

    let stats = parse_stats(&doc, scope, match_id)?;
    let results = parse_results(&doc, scope, match_id)?;

    Ok(MatchBundle {
        info,
        stats,
        results,
    })
}

/// Accepts both published formats; anything else is an unknown date.
pub fn parse_kickoff(raw: &str) -> Option<NaiveDateTime> {
    let trimmed = raw.trim();
    NaiveDateTime::parse_from_str(trimmed, KICKOFF_FORMAT)
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(trimmed, DATE_ONLY_FORMAT)
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Home and away team ids, or `None` while the pairing is still undecided.
fn parse_pairing(doc: &Html) -> ExtractResult<Option<(u32, u32)>> {
    let hrefs: Vec<&str> = doc
        .select(&TEAM_LINKS)
        .filter_map(|a| a.value().attr("href"))
        .filter(|href| href_has_segments(href, &["teams", "id"]))
        .collect();
    match hrefs.as_slice() {
        [home, away, ..] => Ok(Some((extract_id(home)?, extract_id(away)?))),
        _ => Ok(None),
    }
}

fn parse_details(doc: &Html, info: &mut MatchRecord) -> ExtractResult<()> {
    for row in doc.select(&DETAIL_ROWS) {
        let Some(label) = row.select(&TH).next().map(text_of) else {
            continue;
        };
        let Some(cell) = row.select(&TD).next() else {
            continue;
        };
        let value = text_of(cell);
        match translate_match_detail(&label)? {
            MatchDetailField::Stage => info.stage = non_empty(value),
            MatchDetailField::Round => info.round = parse_number(&value, "round")?,
            MatchDetailField::MatchNumber => info.match_number = non_empty(value),
            MatchDetailField::Mvp => info.mvp = parse_mvp(cell)?,
            MatchDetailField::Spectators => {
                info.spectators = parse_number(&value, "spectators")?;
            }
            MatchDetailField::FirstReferee => info.first_referee = non_empty(value),
            MatchDetailField::SecondReferee => info.second_referee = non_empty(value),
            MatchDetailField::Commissioner => info.commissioner = non_empty(value),
            MatchDetailField::Arena => info.arena = non_empty(value),
            MatchDetailField::Address => info.address = non_empty(value),
            MatchDetailField::City => info.city = non_empty(value),
            MatchDetailField::ArenaSize => {
                info.arena_size = parse_number(&value, "arena size")?;
            }
        }
    }
    Ok(())
}

fn parse_mvp(cell: ElementRef<'_>) -> ExtractResult<Option<u32>> {
    match first_href(cell, &LINKS) {
        Some(href) => Ok(Some(extract_id(&href)?).filter(|id| *id != 0)),
        None => Ok(None),
    }
}

fn parse_stats(
    doc: &Html,
    scope: LeagueSeason,
    match_id: u32,
) -> ExtractResult<Option<Vec<MatchStatRow>>> {
    let tables: Vec<ElementRef<'_>> = doc.select(&STATS_TABLES).collect();
    if tables.is_empty() {
        return Ok(None);
    }
    let mut out = Vec::new();
    for table in tables {
        let raw = raw_stats_table(table);
        out.extend(parse_stats_table(&raw, scope, match_id)?);
    }
    Ok(Some(out))
}

/// Rows made only of `th` cells are header rows; the rest carry data.
pub fn raw_stats_table(table: ElementRef<'_>) -> RawStatsTable {
    let mut raw = RawStatsTable::default();
    for row in table.select(&ROWS) {
        if row.select(&TD).next().is_none() {
            raw.header.extend(row.select(&TH).map(text_of));
            continue;
        }
        let cells: Vec<ElementRef<'_>> = row.select(&CELLS).collect();
        let player_href = cells.first().and_then(|cell| first_href(*cell, &LINKS));
        raw.rows.push(RawStatsRow {
            player_href,
            cells: cells.into_iter().map(text_of).collect(),
        });
    }
    raw
}

fn parse_results(
    doc: &Html,
    scope: LeagueSeason,
    match_id: u32,
) -> ExtractResult<Option<Vec<MatchResultRow>>> {
    let Some(table) = doc.select(&RESULT_TABLE).next() else {
        return Ok(None);
    };
    let mut out = Vec::new();
    for row in table.select(&ROWS) {
        let cells: Vec<String> = row.select(&TD).map(text_of).collect();
        if cells.is_empty() {
            continue;
        }
        let [set, time, points, result] = cells.as_slice() else {
            return Err(ExtractError::structural(
                "result table",
                format!("match {match_id}: expected 4 cells, found {}", cells.len()),
            ));
        };
        out.push(MatchResultRow {
            scope,
            match_id,
            set_number: parse_set_number(set)?,
            time: non_empty(time.clone()),
            points: non_empty(points.clone()),
            result: non_empty(result.clone()),
        });
    }
    Ok(Some(out))
}

/// "1".."6", "I".."V", or the golden set.
pub fn parse_set_number(raw: &str) -> ExtractResult<u8> {
    let trimmed = raw.trim();
    if let Ok(n) = trimmed.parse::<u8>()
        && (1..=GOLDEN_SET_NUMBER).contains(&n)
    {
        return Ok(n);
    }
    if let Some(idx) = ROMAN_SETS.iter().position(|r| r.eq_ignore_ascii_case(trimmed)) {
        return Ok(idx as u8 + 1);
    }
    let lower = trimmed.to_lowercase();
    if lower == "gs" || lower.contains("złoty") {
        return Ok(GOLDEN_SET_NUMBER);
    }
    Err(ExtractError::structural(
        "result table",
        format!("unrecognised set label {raw:?}"),
    ))
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed == "-" {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Integers such as "3 200"; blank and "-" are unknown.
fn parse_number(raw: &str, what: &'static str) -> ExtractResult<Option<u32>> {
    let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.is_empty() || compact == "-" {
        return Ok(None);
    }
    compact
        .parse::<u32>()
        .map(Some)
        .map_err(|_| ExtractError::structural("match details", format!("{what}: {raw:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kickoff_accepts_both_formats() {
        let full = parse_kickoff("12.10.2022, 17:30").unwrap();
        assert_eq!(full.format("%Y-%m-%d %H:%M").to_string(), "2022-10-12 17:30");
        let day = parse_kickoff("01.03.2015").unwrap();
        assert_eq!(day.format("%Y-%m-%d %H:%M").to_string(), "2015-03-01 00:00");
        assert!(parse_kickoff("termin do ustalenia").is_none());
    }

    #[test]
    fn set_labels() {
        assert_eq!(parse_set_number("III").unwrap(), 3);
        assert_eq!(parse_set_number("5").unwrap(), 5);
        assert_eq!(parse_set_number("Złoty set").unwrap(), 6);
        assert!(parse_set_number("VII").is_err());
    }

    #[test]
    fn numbers_with_thousands_gaps() {
        assert_eq!(parse_number("3 200", "x").unwrap(), Some(3200));
        assert_eq!(parse_number("-", "x").unwrap(), None);
        assert!(parse_number("dużo", "x").is_err());
    }
}
