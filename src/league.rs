use std::fmt;
use std::str::FromStr;

use anyhow::anyhow;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Month in which a new season's pages go live.
const SEASON_ROLLOVER_MONTH: u32 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum League {
    PlusLiga,
    TauronLiga,
    Tauron1Liga,
}

impl League {
    pub const ALL: [League; 3] = [League::PlusLiga, League::TauronLiga, League::Tauron1Liga];

    pub fn base_url(self) -> &'static str {
        match self {
            League::PlusLiga => "https://www.plusliga.pl",
            League::TauronLiga => "https://www.tauronliga.pl",
            League::Tauron1Liga => "https://tauron1liga.pl",
        }
    }

    /// Label written into the `League` column.
    pub fn label(self) -> &'static str {
        match self {
            League::PlusLiga => "PlusLiga",
            League::TauronLiga => "Tauron Liga",
            League::Tauron1Liga => "Tauron 1. Liga",
        }
    }

    /// Joins path segments under the league site and appends `.html`.
    pub fn url(self, segments: &[String]) -> String {
        let mut out = self.base_url().to_string();
        for seg in segments {
            out.push('/');
            out.push_str(seg);
        }
        out.push_str(".html");
        out
    }
}

impl fmt::Display for League {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for League {
    type Err = anyhow::Error;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let key = raw
            .trim()
            .to_lowercase()
            .replace(['.', ' ', '-', '_'], "");
        match key.as_str() {
            "plusliga" => Ok(League::PlusLiga),
            "tauronliga" => Ok(League::TauronLiga),
            "tauron1liga" => Ok(League::Tauron1Liga),
            _ => Err(anyhow!("unknown league {raw:?}")),
        }
    }
}

/// (league, season start year). Scopes every fetch and every dedup query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LeagueSeason {
    pub league: League,
    pub season: u16,
}

impl LeagueSeason {
    pub fn new(league: League, season: u16) -> Self {
        Self { league, season }
    }

    pub fn players_list_url(&self) -> String {
        self.league
            .url(&["players/tour".into(), self.season.to_string()])
    }

    pub fn player_url(&self, player_id: u32) -> String {
        self.league.url(&[
            "players/tour".into(),
            self.season.to_string(),
            "id".into(),
            player_id.to_string(),
        ])
    }

    pub fn teams_list_url(&self) -> String {
        self.league
            .url(&["teams/tour".into(), self.season.to_string()])
    }

    pub fn team_url(&self, team_id: u32) -> String {
        self.league.url(&[
            "teams/id".into(),
            team_id.to_string(),
            "tour".into(),
            self.season.to_string(),
        ])
    }

    pub fn matches_list_url(&self) -> String {
        self.league
            .url(&["games/tour".into(), self.season.to_string()])
    }

    pub fn match_url(&self, match_id: u32) -> String {
        self.league.url(&[
            "games/id".into(),
            match_id.to_string(),
            "tour".into(),
            self.season.to_string(),
        ])
    }
}

impl fmt::Display for LeagueSeason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}/{}",
            self.league,
            self.season,
            u32::from(self.season) + 1
        )
    }
}

/// Start year of the season running on `today`. Seasons roll over in August.
pub fn current_season(today: NaiveDate) -> u16 {
    let year = today.year();
    let start = if today.month() >= SEASON_ROLLOVER_MONTH {
        year
    } else {
        year - 1
    };
    u16::try_from(start).unwrap_or(u16::MAX)
}
