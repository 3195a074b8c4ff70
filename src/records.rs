//! Normalized record shapes, one per storage table.
//!
//! Column order in [`TableKind::columns`] and in each `values()` is the
//! contract shared by storage and fingerprinting; keep them in step.

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::league::LeagueSeason;
use crate::vocab::Position;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TableKind {
    PlayersList,
    PlayersInfo,
    TeamsList,
    TeamsInfo,
    TeamsRoster,
    MatchesList,
    MatchesInfo,
    MatchesStats,
    MatchesResults,
}

impl TableKind {
    pub const ALL: [TableKind; 9] = [
        TableKind::PlayersList,
        TableKind::PlayersInfo,
        TableKind::TeamsList,
        TableKind::TeamsInfo,
        TableKind::TeamsRoster,
        TableKind::MatchesList,
        TableKind::MatchesInfo,
        TableKind::MatchesStats,
        TableKind::MatchesResults,
    ];

    pub fn name(self) -> &'static str {
        match self {
            TableKind::PlayersList => "players_list",
            TableKind::PlayersInfo => "players_info",
            TableKind::TeamsList => "teams_list",
            TableKind::TeamsInfo => "teams_info",
            TableKind::TeamsRoster => "teams_roster",
            TableKind::MatchesList => "matches_list",
            TableKind::MatchesInfo => "matches_info",
            TableKind::MatchesStats => "matches_stats",
            TableKind::MatchesResults => "matches_results",
        }
    }

    /// Content columns, without the fingerprint and timestamp storage adds.
    pub fn columns(self) -> &'static [&'static str] {
        match self {
            TableKind::PlayersList => &["League", "Season", "PlayerID"],
            TableKind::PlayersInfo => &[
                "League",
                "Season",
                "PlayerID",
                "PlayerName",
                "TeamID",
                "DateOfBirth",
                "Position",
                "Height",
                "Weight",
                "Reach",
            ],
            TableKind::TeamsList => &["League", "Season", "TeamID"],
            TableKind::TeamsInfo => &["League", "Season", "TeamID", "TeamName"],
            TableKind::TeamsRoster => &["League", "Season", "TeamID", "PlayerID"],
            TableKind::MatchesList => &["League", "Season", "MatchID"],
            TableKind::MatchesInfo => &[
                "League",
                "Season",
                "MatchID",
                "Home",
                "Away",
                "Date",
                "Stage",
                "Round",
                "MatchNumber",
                "MVP",
                "Spectators",
                "FirstReferee",
                "SecondReferee",
                "Commissioner",
                "Arena",
                "Address",
                "City",
                "ArenaSize",
            ],
            TableKind::MatchesStats => &[
                "League",
                "Season",
                "MatchID",
                "PlayerID",
                "SetI",
                "SetII",
                "SetIII",
                "SetIV",
                "SetV",
                "SetGolden",
                "Points",
                "BreakPoints",
                "PointsRatio",
                "ServeTotal",
                "ServeErrors",
                "ServeAces",
                "ServeSlashes",
                "ReceptionTotal",
                "ReceptionErrors",
                "ReceptionNegative",
                "ReceptionPositive",
                "ReceptionPerfect",
                "AttackTotal",
                "AttackBlocked",
                "AttackErrors",
                "AttackKills",
                "BlockPoints",
                "BlockAssists",
            ],
            TableKind::MatchesResults => &[
                "League",
                "Season",
                "MatchID",
                "SetNumber",
                "Time",
                "Points",
                "Result",
            ],
        }
    }

    /// Columns holding integers; everything else is text.
    pub fn is_integer_column(self, column: &str) -> bool {
        match column {
            // set score text in results, a counter in stats
            "Points" => self == TableKind::MatchesStats,
            "League" | "PlayerName" | "DateOfBirth" | "Position" | "TeamName" | "Date"
            | "Stage" | "MatchNumber" | "FirstReferee" | "SecondReferee" | "Commissioner"
            | "Arena" | "Address" | "City" | "SetI" | "SetII" | "SetIII" | "SetIV" | "SetV"
            | "SetGolden" | "Time" | "Result" => false,
            _ => true,
        }
    }
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One cell of a normalized row.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldValue {
    Null,
    Int(i64),
    Text(String),
}

impl FieldValue {
    pub fn int<T: Into<i64>>(value: Option<T>) -> Self {
        value.map_or(FieldValue::Null, |v| FieldValue::Int(v.into()))
    }

    pub fn text<T: AsRef<str>>(value: Option<T>) -> Self {
        value.map_or(FieldValue::Null, |v| FieldValue::Text(v.as_ref().to_string()))
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Null => Ok(()),
            FieldValue::Int(v) => write!(f, "{v}"),
            FieldValue::Text(v) => f.write_str(v),
        }
    }
}

/// A normalized row bound for one storage table.
pub trait TableRow {
    const TABLE: TableKind;

    fn scope(&self) -> LeagueSeason;

    /// Content values in [`TableKind::columns`] order.
    fn values(&self) -> Vec<FieldValue>;
}

fn scope_values(scope: LeagueSeason) -> [FieldValue; 2] {
    [
        FieldValue::Text(scope.league.label().to_string()),
        FieldValue::Int(i64::from(scope.season)),
    ]
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PlayerListRow {
    pub scope: LeagueSeason,
    pub player_id: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerRecord {
    pub scope: LeagueSeason,
    pub player_id: u32,
    pub name: String,
    pub team_id: u32,
    pub date_of_birth: Option<NaiveDate>,
    pub position: Position,
    pub height: Option<u16>,
    pub weight: Option<u16>,
    pub reach: Option<u16>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TeamListRow {
    pub scope: LeagueSeason,
    pub team_id: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamRecord {
    pub scope: LeagueSeason,
    pub team_id: u32,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RosterRow {
    pub scope: LeagueSeason,
    pub team_id: u32,
    pub player_id: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MatchListRow {
    pub scope: LeagueSeason,
    pub match_id: u32,
}

/// Match header and details. Unplayed or unscheduled matches leave most of
/// this empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchRecord {
    pub scope: LeagueSeason,
    pub match_id: u32,
    pub home_team_id: Option<u32>,
    pub away_team_id: Option<u32>,
    pub date: Option<NaiveDateTime>,
    pub stage: Option<String>,
    pub round: Option<u32>,
    pub match_number: Option<String>,
    pub mvp: Option<u32>,
    pub spectators: Option<u32>,
    pub first_referee: Option<String>,
    pub second_referee: Option<String>,
    pub commissioner: Option<String>,
    pub arena: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub arena_size: Option<u32>,
}

/// Per-player statistics for one match, in the superset schema: fields an
/// era does not publish stay `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchStatRow {
    pub scope: LeagueSeason,
    pub match_id: u32,
    pub player_id: u32,
    /// Set markers I..V, then the golden set.
    pub sets: [Option<String>; 6],
    pub points: Option<u32>,
    pub break_points: Option<u32>,
    pub points_ratio: Option<i32>,
    pub serve_total: Option<u32>,
    pub serve_errors: Option<u32>,
    pub serve_aces: Option<u32>,
    pub serve_slashes: Option<u32>,
    pub reception_total: Option<u32>,
    pub reception_errors: Option<u32>,
    pub reception_negative: Option<u32>,
    pub reception_positive: Option<u32>,
    pub reception_perfect: Option<u32>,
    pub attack_total: Option<u32>,
    pub attack_blocked: Option<u32>,
    pub attack_errors: Option<u32>,
    pub attack_kills: Option<u32>,
    pub block_points: Option<u32>,
    pub block_assists: Option<u32>,
}

impl MatchRecord {
    pub fn new(scope: LeagueSeason, match_id: u32) -> Self {
        Self {
            scope,
            match_id,
            home_team_id: None,
            away_team_id: None,
            date: None,
            stage: None,
            round: None,
            match_number: None,
            mvp: None,
            spectators: None,
            first_referee: None,
            second_referee: None,
            commissioner: None,
            arena: None,
            address: None,
            city: None,
            arena_size: None,
        }
    }
}

impl MatchStatRow {
    pub fn new(scope: LeagueSeason, match_id: u32, player_id: u32) -> Self {
        Self {
            scope,
            match_id,
            player_id,
            sets: Default::default(),
            points: None,
            break_points: None,
            points_ratio: None,
            serve_total: None,
            serve_errors: None,
            serve_aces: None,
            serve_slashes: None,
            reception_total: None,
            reception_errors: None,
            reception_negative: None,
            reception_positive: None,
            reception_perfect: None,
            attack_total: None,
            attack_blocked: None,
            attack_errors: None,
            attack_kills: None,
            block_points: None,
            block_assists: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchResultRow {
    pub scope: LeagueSeason,
    pub match_id: u32,
    pub set_number: u8,
    pub time: Option<String>,
    pub points: Option<String>,
    pub result: Option<String>,
}

impl TableRow for PlayerListRow {
    const TABLE: TableKind = TableKind::PlayersList;

    fn scope(&self) -> LeagueSeason {
        self.scope
    }

    fn values(&self) -> Vec<FieldValue> {
        let mut out = scope_values(self.scope).to_vec();
        out.push(FieldValue::Int(i64::from(self.player_id)));
        out
    }
}

impl TableRow for PlayerRecord {
    const TABLE: TableKind = TableKind::PlayersInfo;

    fn scope(&self) -> LeagueSeason {
        self.scope
    }

    fn values(&self) -> Vec<FieldValue> {
        let mut out = scope_values(self.scope).to_vec();
        out.extend([
            FieldValue::Int(i64::from(self.player_id)),
            FieldValue::Text(self.name.clone()),
            FieldValue::Int(i64::from(self.team_id)),
            FieldValue::text(self.date_of_birth.map(|d| d.format("%Y-%m-%d").to_string())),
            FieldValue::Text(self.position.code().to_string()),
            FieldValue::int(self.height),
            FieldValue::int(self.weight),
            FieldValue::int(self.reach),
        ]);
        out
    }
}

impl TableRow for TeamListRow {
    const TABLE: TableKind = TableKind::TeamsList;

    fn scope(&self) -> LeagueSeason {
        self.scope
    }

    fn values(&self) -> Vec<FieldValue> {
        let mut out = scope_values(self.scope).to_vec();
        out.push(FieldValue::Int(i64::from(self.team_id)));
        out
    }
}

impl TableRow for TeamRecord {
    const TABLE: TableKind = TableKind::TeamsInfo;

    fn scope(&self) -> LeagueSeason {
        self.scope
    }

    fn values(&self) -> Vec<FieldValue> {
        let mut out = scope_values(self.scope).to_vec();
        out.push(FieldValue::Int(i64::from(self.team_id)));
        out.push(FieldValue::Text(self.name.clone()));
        out
    }
}

impl TableRow for RosterRow {
    const TABLE: TableKind = TableKind::TeamsRoster;

    fn scope(&self) -> LeagueSeason {
        self.scope
    }

    fn values(&self) -> Vec<FieldValue> {
        let mut out = scope_values(self.scope).to_vec();
        out.push(FieldValue::Int(i64::from(self.team_id)));
        out.push(FieldValue::Int(i64::from(self.player_id)));
        out
    }
}

impl TableRow for MatchListRow {
    const TABLE: TableKind = TableKind::MatchesList;

    fn scope(&self) -> LeagueSeason {
        self.scope
    }

    fn values(&self) -> Vec<FieldValue> {
        let mut out = scope_values(self.scope).to_vec();
        out.push(FieldValue::Int(i64::from(self.match_id)));
        out
    }
}

impl TableRow for MatchRecord {
    const TABLE: TableKind = TableKind::MatchesInfo;

    fn scope(&self) -> LeagueSeason {
        self.scope
    }

    fn values(&self) -> Vec<FieldValue> {
        let mut out = scope_values(self.scope).to_vec();
        out.extend([
            FieldValue::Int(i64::from(self.match_id)),
            FieldValue::int(self.home_team_id),
            FieldValue::int(self.away_team_id),
            FieldValue::text(self.date.map(|d| d.format("%Y-%m-%d %H:%M:%S").to_string())),
            FieldValue::text(self.stage.as_deref()),
            FieldValue::int(self.round),
            FieldValue::text(self.match_number.as_deref()),
            FieldValue::int(self.mvp),
            FieldValue::int(self.spectators),
            FieldValue::text(self.first_referee.as_deref()),
            FieldValue::text(self.second_referee.as_deref()),
            FieldValue::text(self.commissioner.as_deref()),
            FieldValue::text(self.arena.as_deref()),
            FieldValue::text(self.address.as_deref()),
            FieldValue::text(self.city.as_deref()),
            FieldValue::int(self.arena_size),
        ]);
        out
    }
}

impl TableRow for MatchStatRow {
    const TABLE: TableKind = TableKind::MatchesStats;

    fn scope(&self) -> LeagueSeason {
        self.scope
    }

    fn values(&self) -> Vec<FieldValue> {
        let mut out = scope_values(self.scope).to_vec();
        out.push(FieldValue::Int(i64::from(self.match_id)));
        out.push(FieldValue::Int(i64::from(self.player_id)));
        out.extend(self.sets.iter().map(|s| FieldValue::text(s.as_deref())));
        out.extend([
            FieldValue::int(self.points),
            FieldValue::int(self.break_points),
            FieldValue::int(self.points_ratio),
            FieldValue::int(self.serve_total),
            FieldValue::int(self.serve_errors),
            FieldValue::int(self.serve_aces),
            FieldValue::int(self.serve_slashes),
            FieldValue::int(self.reception_total),
            FieldValue::int(self.reception_errors),
            FieldValue::int(self.reception_negative),
            FieldValue::int(self.reception_positive),
            FieldValue::int(self.reception_perfect),
            FieldValue::int(self.attack_total),
            FieldValue::int(self.attack_blocked),
            FieldValue::int(self.attack_errors),
            FieldValue::int(self.attack_kills),
            FieldValue::int(self.block_points),
            FieldValue::int(self.block_assists),
        ]);
        out
    }
}

impl TableRow for MatchResultRow {
    const TABLE: TableKind = TableKind::MatchesResults;

    fn scope(&self) -> LeagueSeason {
        self.scope
    }

    fn values(&self) -> Vec<FieldValue> {
        let mut out = scope_values(self.scope).to_vec();
        out.extend([
            FieldValue::Int(i64::from(self.match_id)),
            FieldValue::Int(i64::from(self.set_number)),
            FieldValue::text(self.time.as_deref()),
            FieldValue::text(self.points.as_deref()),
            FieldValue::text(self.result.as_deref()),
        ]);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::league::League;

    #[test]
    fn values_line_up_with_columns() {
        let scope = LeagueSeason::new(League::PlusLiga, 2021);
        let stat = MatchStatRow::new(scope, 1, 2);
        assert_eq!(stat.values().len(), TableKind::MatchesStats.columns().len());
        let info = MatchRecord::new(scope, 1);
        assert_eq!(info.values().len(), TableKind::MatchesInfo.columns().len());
        let result = MatchResultRow {
            scope,
            match_id: 1,
            set_number: 1,
            time: None,
            points: None,
            result: None,
        };
        assert_eq!(result.values().len(), TableKind::MatchesResults.columns().len());
        let player = PlayerRecord {
            scope,
            player_id: 1,
            name: "A".into(),
            team_id: 2,
            date_of_birth: None,
            position: Position::Libero,
            height: None,
            weight: None,
            reach: None,
        };
        assert_eq!(player.values().len(), TableKind::PlayersInfo.columns().len());
    }
}
