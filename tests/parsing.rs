use std::fs;
use std::path::PathBuf;

use chrono::NaiveDate;

use volley_ingest::error::ExtractError;
use volley_ingest::league::{League, LeagueSeason};
use volley_ingest::matches::{parse_match, parse_matches_list};
use volley_ingest::players::{parse_player_info, parse_players_list};
use volley_ingest::teams::{parse_team_info, parse_teams_list};
use volley_ingest::vocab::Position;

fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

fn plusliga(season: u16) -> LeagueSeason {
    LeagueSeason::new(League::PlusLiga, season)
}

#[test]
fn players_list_yields_unique_valid_ids() {
    let raw = read_fixture("players_list_2021.html");
    let rows = parse_players_list(&raw, plusliga(2021)).expect("fixture should parse");
    let ids: Vec<u32> = rows.iter().map(|r| r.player_id).collect();
    assert_eq!(ids, vec![2104197, 2100544]);
    assert!(rows.iter().all(|r| r.scope == plusliga(2021)));
}

#[test]
fn player_profile_fields() {
    let raw = read_fixture("player_2021.html");
    let player = parse_player_info(&raw, plusliga(2021), 2104197).expect("fixture should parse");
    assert_eq!(player.name, "Jan Nowak");
    assert_eq!(player.team_id, 1410);
    assert_eq!(player.position, Position::OppositeHitter);
    assert_eq!(player.date_of_birth, NaiveDate::from_ymd_opt(1994, 8, 29));
    assert_eq!(player.height, Some(205));
    assert_eq!(player.weight, Some(98));
    assert_eq!(player.reach, None);
}

#[test]
fn uppercase_middle_blocker_label_translates() {
    let raw = read_fixture("player_middle_2021.html");
    let player = parse_player_info(&raw, plusliga(2021), 2200001).expect("fixture should parse");
    assert_eq!(player.position, Position::MiddleBlocker);
    assert_eq!(player.date_of_birth, None);
    assert_eq!(player.height, Some(201));
    assert_eq!(player.weight, None);
}

#[test]
fn unseen_profile_label_fails_naming_it() {
    let raw = read_fixture("player_unknown_label_2021.html");
    let err = parse_player_info(&raw, plusliga(2021), 2104197).unwrap_err();
    match err {
        ExtractError::TranslationMiss { label, .. } => assert_eq!(label, "Trener"),
        other => panic!("expected a translation miss, got {other:?}"),
    }
}

#[test]
fn teams_list_and_team_page() {
    let scope = plusliga(2021);
    let list = parse_teams_list(&read_fixture("teams_list_2021.html"), scope).unwrap();
    let ids: Vec<u32> = list.iter().map(|r| r.team_id).collect();
    assert_eq!(ids, vec![1410, 1411]);

    let info = parse_team_info(&read_fixture("team_2021.html"), scope, 1410).unwrap();
    assert_eq!(info.team.name, "ZAKSA Kędzierzyn-Koźle");
    let roster: Vec<u32> = info.roster.iter().map(|r| r.player_id).collect();
    assert_eq!(roster, vec![2104197, 2100544]);
    assert!(info.roster.iter().all(|r| r.team_id == 1410));
}

#[test]
fn matches_list_reads_tile_handlers() {
    let raw = read_fixture("matches_list_2021.html");
    let rows = parse_matches_list(&raw, plusliga(2021)).unwrap();
    let ids: Vec<u32> = rows.iter().map(|r| r.match_id).collect();
    assert_eq!(ids, vec![1102216, 1102217]);
}

#[test]
fn played_match_details_and_results() {
    let raw = read_fixture("match_2021_golden_set.html");
    let bundle = parse_match(&raw, plusliga(2021), 1102216).expect("fixture should parse");

    let info = &bundle.info;
    assert_eq!(info.home_team_id, Some(1410));
    assert_eq!(info.away_team_id, Some(1411));
    assert_eq!(
        info.date.map(|d| d.format("%Y-%m-%d %H:%M").to_string()),
        Some("2021-10-12 17:30".to_string())
    );
    assert_eq!(info.stage.as_deref(), Some("Faza zasadnicza"));
    assert_eq!(info.round, Some(3));
    assert_eq!(info.match_number.as_deref(), Some("17"));
    assert_eq!(info.mvp, Some(2104197));
    assert_eq!(info.spectators, Some(3200));
    assert_eq!(info.first_referee.as_deref(), Some("Anna Kowalska"));
    assert_eq!(info.second_referee, None);
    assert_eq!(info.arena_size, Some(3500));
    assert_eq!(info.commissioner, None);

    let results = bundle.results.expect("results table present");
    let sets: Vec<u8> = results.iter().map(|r| r.set_number).collect();
    assert_eq!(sets, vec![1, 2, 3, 4, 6]);
    assert_eq!(results[0].points.as_deref(), Some("25:21"));
    assert_eq!(results[4].result, None);

    let stats = bundle.stats.expect("statistics present");
    let players: Vec<u32> = stats.iter().map(|r| r.player_id).collect();
    assert_eq!(players, vec![2104197, 2100544, 0, 2200001]);
}

#[test]
fn unplayed_match_has_only_header_data() {
    let raw = read_fixture("match_unplayed_2021.html");
    let bundle = parse_match(&raw, plusliga(2021), 1102217).expect("fixture should parse");
    assert_eq!(bundle.info.home_team_id, None);
    assert_eq!(bundle.info.away_team_id, None);
    assert_eq!(bundle.info.date, None);
    assert_eq!(bundle.info.stage.as_deref(), Some("Finał"));
    assert_eq!(bundle.info.spectators, None);
    assert!(bundle.stats.is_none());
    assert!(bundle.results.is_none());
}

#[test]
fn date_only_kickoff_is_midnight() {
    let raw = read_fixture("match_2019_legacy.html");
    let bundle = parse_match(&raw, plusliga(2019), 1101001).unwrap();
    assert_eq!(
        bundle.info.date.map(|d| d.format("%Y-%m-%d %H:%M:%S").to_string()),
        Some("2020-03-01 00:00:00".to_string())
    );
    assert_eq!(bundle.info.mvp, None);
    assert_eq!(bundle.info.match_number.as_deref(), Some("P-3"));
    assert!(bundle.results.is_none());
}
