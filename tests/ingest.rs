use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use anyhow::{Result, anyhow};

use volley_ingest::config::Settings;
use volley_ingest::error::UnitKind;
use volley_ingest::fetch::{Page, PageSource};
use volley_ingest::ingest::{collect_season, ingest_scopes, ingest_season};
use volley_ingest::league::{League, LeagueSeason};
use volley_ingest::records::TableKind;
use volley_ingest::storage;

fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

/// Serves fixtures by URL; anything unknown fails like a dead link.
struct FixturePages {
    pages: HashMap<String, Page>,
}

impl FixturePages {
    fn season_2021() -> Self {
        let scope = scope();
        let mut pages = HashMap::new();
        let mut serve = |url: String, fixture: &str| {
            pages.insert(
                url.clone(),
                Page {
                    requested_url: url.clone(),
                    final_url: url,
                    body: read_fixture(fixture),
                },
            );
        };
        serve(scope.matches_list_url(), "matches_list_2021.html");
        serve(scope.match_url(1102216), "match_2021_golden_set.html");
        serve(scope.match_url(1102217), "match_unplayed_2021.html");
        serve(scope.teams_list_url(), "teams_list_2021.html");
        serve(scope.team_url(1410), "team_2021.html");
        serve(scope.players_list_url(), "players_list_2021.html");
        serve(scope.player_url(2104197), "player_2021.html");
        serve(scope.player_url(2200001), "player_middle_2021.html");

        // profile of a player absent that season bounces to the list
        let absent = scope.player_url(2100544);
        pages.insert(
            absent.clone(),
            Page {
                requested_url: absent,
                final_url: scope.players_list_url(),
                body: read_fixture("players_list_2021.html"),
            },
        );
        Self { pages }
    }
}

impl PageSource for FixturePages {
    fn fetch(&self, url: &str) -> Result<Page> {
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| anyhow!("http 404 for {url}"))
    }
}

fn scope() -> LeagueSeason {
    LeagueSeason::new(League::PlusLiga, 2021)
}

#[test]
fn season_collects_every_table() {
    let batch = collect_season(&FixturePages::season_2021(), scope(), None);

    assert_eq!(batch.matches_list.len(), 2);
    assert_eq!(batch.matches_info.len(), 2);
    assert_eq!(batch.matches_stats.len(), 4);
    assert_eq!(batch.matches_results.len(), 5);
    assert_eq!(batch.teams_list.len(), 2);
    assert_eq!(batch.teams_info.len(), 1);
    assert_eq!(batch.teams_roster.len(), 2);
    assert_eq!(batch.players_list.len(), 2);

    let fetched: Vec<u32> = batch.players_info.iter().map(|p| p.player_id).collect();
    assert_eq!(fetched, vec![2104197, 2200001]);
    assert_eq!(batch.players_redirected, 1);

    assert_eq!(batch.errors.len(), 1);
    let err = &batch.errors[0];
    assert_eq!(err.kind, UnitKind::Team);
    assert_eq!(err.id, 1411);
    assert_eq!(err.url, scope().team_url(1411));
    assert!(err.extract_error().is_none());
}

#[test]
fn second_run_skips_everything() {
    let mut conn = storage::open_in_memory().unwrap();
    let source = FixturePages::season_2021();
    let settings = Settings::default();

    let first = ingest_season(&mut conn, &source, scope(), &settings).unwrap();
    assert_eq!(first.inserted(), 2 + 2 + 2 + 1 + 2 + 2 + 2 + 4 + 5);
    assert_eq!(first.skipped(), 0);
    assert_eq!(first.tables[&TableKind::MatchesStats].inserted, 4);

    let second = ingest_season(&mut conn, &source, scope(), &settings).unwrap();
    assert_eq!(second.inserted(), 0);
    assert_eq!(second.skipped(), first.inserted());
    assert_eq!(storage::count_rows(&conn, TableKind::MatchesStats).unwrap(), 4);

    let runs: i64 = conn
        .query_row("SELECT COUNT(*) FROM ingest_runs WHERE finished_at IS NOT NULL", [], |row| {
            row.get(0)
        })
        .unwrap();
    assert_eq!(runs, 2);
}

#[test]
fn missing_list_page_is_a_unit_error() {
    let mut source = FixturePages::season_2021();
    source.pages.remove(&scope().matches_list_url());
    let batch = collect_season(&source, scope(), None);
    assert!(batch.matches_list.is_empty());
    assert!(batch.matches_stats.is_empty());
    assert!(batch.errors.iter().any(|e| e.kind == UnitKind::MatchesList));
    // players are still fetched from the list page alone
    assert_eq!(batch.players_info.len(), 1);
}

#[test]
fn failed_scope_does_not_stop_the_rest() {
    let mut conn = storage::open_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TRIGGER reject_2021 BEFORE INSERT ON teams_list WHEN NEW.Season = 2021
         BEGIN SELECT RAISE(ABORT, 'disk full'); END;",
    )
    .unwrap();
    let source = FixturePages::season_2021();
    let other = LeagueSeason::new(League::TauronLiga, 2021);

    let outcomes = ingest_scopes(&mut conn, &source, [scope(), other], &Settings::default());
    assert_eq!(outcomes.len(), 2);
    assert_eq!(outcomes[0].0, scope());
    assert!(outcomes[0].1.is_err());
    // nothing of the failed scope is kept
    assert_eq!(storage::count_rows(&conn, TableKind::MatchesStats).unwrap(), 0);

    assert_eq!(outcomes[1].0, other);
    let summary = outcomes[1].1.as_ref().unwrap();
    assert_eq!(summary.inserted(), 0);
    assert!(summary.errors.iter().any(|e| e.kind == UnitKind::MatchesList));

    let failed_runs: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM ingest_runs WHERE errors_json LIKE '%disk full%'",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(failed_runs, 1);
}
