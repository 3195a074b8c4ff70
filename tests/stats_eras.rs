use std::fs;
use std::path::PathBuf;

use volley_ingest::error::ExtractError;
use volley_ingest::league::{League, LeagueSeason};
use volley_ingest::matches::parse_match;
use volley_ingest::records::MatchStatRow;
use volley_ingest::stats_table::{RawStatsRow, RawStatsTable, parse_stats_table};

fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

fn modern_stats() -> Vec<MatchStatRow> {
    let raw = read_fixture("match_2021_golden_set.html");
    parse_match(&raw, LeagueSeason::new(League::PlusLiga, 2021), 1102216)
        .expect("fixture should parse")
        .stats
        .expect("statistics present")
}

#[test]
fn modern_row_reconstructs_counts() {
    let stats = modern_stats();
    let row = &stats[0];
    assert_eq!(row.player_id, 2104197);
    assert_eq!(row.points, Some(22));
    assert_eq!(row.break_points, Some(9));
    assert_eq!(row.points_ratio, Some(14));
    assert_eq!(row.serve_total, Some(10));
    assert_eq!(row.serve_errors, Some(1));
    assert_eq!(row.serve_aces, Some(2));
    // 50% of 10, minus 2 aces, plus 1 error
    assert_eq!(row.serve_slashes, Some(4));
    assert_eq!(row.reception_total, Some(8));
    assert_eq!(row.reception_positive, Some(4));
    assert_eq!(row.reception_perfect, Some(2));
    assert_eq!(row.reception_negative, None);
    assert_eq!(row.attack_kills, Some(15));
    assert_eq!(row.block_assists, Some(1));
}

#[test]
fn golden_set_marker_lands_in_sixth_slot() {
    let stats = modern_stats();
    assert_eq!(stats[0].sets[4], None);
    assert_eq!(stats[0].sets[5].as_deref(), Some("1"));
    assert!(stats[2].sets.iter().all(Option::is_none));
}

#[test]
fn placeholders_in_modern_rows() {
    let stats = modern_stats();
    let libero = &stats[1];
    assert_eq!(libero.serve_total, None);
    assert_eq!(libero.serve_slashes, Some(0));
    // 58% and 33% of 12
    assert_eq!(libero.reception_positive, Some(7));
    assert_eq!(libero.reception_perfect, Some(4));

    let unnamed = &stats[2];
    assert_eq!(unnamed.player_id, 0);
    assert_eq!(unnamed.reception_positive, Some(0));
}

#[test]
fn negative_serve_efficiency() {
    let stats = modern_stats();
    let away = &stats[3];
    // round(-8% of 12) = -1; -1 - 1 ace + 3 errors
    assert_eq!(away.serve_slashes, Some(1));
}

#[test]
fn legacy_row_reads_published_counts() {
    let raw = read_fixture("match_2019_legacy.html");
    let stats = parse_match(&raw, LeagueSeason::new(League::PlusLiga, 2019), 1101001)
        .unwrap()
        .stats
        .expect("statistics present");
    assert_eq!(stats.len(), 2);

    let row = &stats[0];
    assert_eq!(row.points, Some(18));
    assert_eq!(row.serve_total, Some(14));
    assert_eq!(row.serve_aces, Some(3));
    assert_eq!(row.serve_errors, Some(2));
    assert_eq!(row.serve_slashes, None);
    assert_eq!(row.reception_negative, Some(1));
    assert_eq!(row.reception_positive, Some(3));
    assert_eq!(row.reception_perfect, Some(2));
    assert_eq!(row.attack_errors, Some(2));
    assert_eq!(row.attack_blocked, Some(1));
    assert_eq!(row.block_points, Some(3));
    assert_eq!(row.break_points, None);
    assert_eq!(row.block_assists, None);
    assert_eq!(row.sets[3], None);
}

#[test]
fn same_layout_in_both_eras_reads_differently() {
    let raw = read_fixture("match_2019_legacy.html");
    let as_legacy = parse_match(&raw, LeagueSeason::new(League::PlusLiga, 2019), 1101001);
    assert!(as_legacy.is_ok());
    let as_modern = parse_match(&raw, LeagueSeason::new(League::PlusLiga, 2020), 1101001);
    assert!(matches!(as_modern, Err(ExtractError::Structural { .. })));
}

#[test]
fn season_before_first_era_is_rejected() {
    let raw = read_fixture("match_2019_legacy.html");
    let err = parse_match(&raw, LeagueSeason::new(League::PlusLiga, 2007), 1101001).unwrap_err();
    assert_eq!(err, ExtractError::UnsupportedEra { season: 2007 });
}

#[test]
fn short_row_is_structural() {
    let table = RawStatsTable {
        header: vec!["Zawodnik".into()],
        rows: vec![
            RawStatsRow {
                player_href: Some("/players/tour/2021/id/5.html".into()),
                cells: vec!["Jan".into(), "1".into()],
            },
            RawStatsRow::default(),
        ],
    };
    let err = parse_stats_table(&table, LeagueSeason::new(League::TauronLiga, 2021), 9).unwrap_err();
    assert!(matches!(err, ExtractError::Structural { .. }));
}

#[test]
fn totals_only_table_has_no_rows() {
    let table = RawStatsTable {
        header: Vec::new(),
        rows: vec![RawStatsRow::default()],
    };
    let rows = parse_stats_table(&table, LeagueSeason::new(League::TauronLiga, 2021), 9).unwrap();
    assert!(rows.is_empty());

    let empty = RawStatsTable::default();
    assert!(parse_stats_table(&empty, LeagueSeason::new(League::TauronLiga, 2021), 9).is_err());
}

fn unnamed_row(points: &str) -> RawStatsRow {
    let mut cells = vec!["Zawodnik nieznany".to_string()];
    cells.extend(["1", "", "", "", ""].map(String::from));
    cells.extend(
        [
            points, "0", "+1", "0", "0", "0", "-", "0", "0", "-", "-", "1", "0", "0", "1", "100%",
            "100%", "0", "0",
        ]
        .map(String::from),
    );
    RawStatsRow {
        player_href: None,
        cells,
    }
}

#[test]
fn unnamed_players_share_id_zero() {
    use volley_ingest::dedup::{MemoryFingerprints, filter_new};

    let scope = LeagueSeason::new(League::PlusLiga, 2022);
    let table = RawStatsTable {
        header: vec!["Zawodnik".into()],
        rows: vec![unnamed_row("1"), unnamed_row("2"), unnamed_row("1"), RawStatsRow::default()],
    };
    let rows = parse_stats_table(&table, scope, 1104010).unwrap();
    let ids: Vec<u32> = rows.iter().map(|r| r.player_id).collect();
    assert_eq!(ids, vec![0, 0, 0]);

    // distinct stat lines stay apart, an identical one folds into the first
    let outcome = filter_new(rows, &MemoryFingerprints::new(), chrono::Utc::now()).unwrap();
    assert_eq!(outcome.fresh.len(), 2);
    assert_eq!(outcome.skipped, 1);
}
