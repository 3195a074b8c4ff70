use once_cell::sync::Lazy;
use scraper::{Html, Selector};

use crate::error::{ExtractError, ExtractResult};
use crate::html::{href_has_segments, selector, text_of};
use crate::identity::{extract_ids, filter_valid_ids};
use crate::league::LeagueSeason;
use crate::records::{RosterRow, TeamListRow, TeamRecord};

static LINKS: Lazy<Selector> = Lazy::new(|| selector("a[href]"));
static TEAM_NAME: Lazy<Selector> = Lazy::new(|| selector("h1"));
static ROSTER_LINKS: Lazy<Selector> = Lazy::new(|| selector(".team-roster a[href]"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamInfo {
    pub team: TeamRecord,
    pub roster: Vec<RosterRow>,
}

pub fn parse_teams_list(html: &str, scope: LeagueSeason) -> ExtractResult<Vec<TeamListRow>> {
    let doc = Html::parse_document(html);
    let hrefs = doc
        .select(&LINKS)
        .filter_map(|a| a.value().attr("href"))
        .filter(|href| href_has_segments(href, &["teams", "id"]));
    let ids = extract_ids(hrefs)?;
    Ok(filter_valid_ids(ids)
        .into_iter()
        .map(|team_id| TeamListRow { scope, team_id })
        .collect())
}

/// Team name and the season's roster, one row per rostered player.
pub fn parse_team_info(html: &str, scope: LeagueSeason, team_id: u32) -> ExtractResult<TeamInfo> {
    let doc = Html::parse_document(html);

    let name = doc
        .select(&TEAM_NAME)
        .map(text_of)
        .find(|name| !name.is_empty())
        .ok_or_else(|| ExtractError::structural("team page", format!("team {team_id}: no name")))?;

    let hrefs = doc
        .select(&ROSTER_LINKS)
        .filter_map(|a| a.value().attr("href"))
        .filter(|href| href_has_segments(href, &["players", "id"]));
    let roster = filter_valid_ids(extract_ids(hrefs)?)
        .into_iter()
        .map(|player_id| RosterRow {
            scope,
            team_id,
            player_id,
        })
        .collect();

    Ok(TeamInfo {
        team: TeamRecord {
            scope,
            team_id,
            name,
        },
        roster,
    })
}
