use chrono::NaiveDate;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};

use crate::error::{ExtractError, ExtractResult};
use crate::html::{href_has_segments, selector, text_of};
use crate::identity::{extract_id, extract_ids, filter_valid_ids};
use crate::league::LeagueSeason;
use crate::records::{PlayerListRow, PlayerRecord};
use crate::vocab::{PlayerInfoField, translate_player_info, translate_position};

static LINKS: Lazy<Selector> = Lazy::new(|| selector("a[href]"));
static PLAYER_NAME: Lazy<Selector> = Lazy::new(|| selector(".playername"));
static PLAYER_TEAM: Lazy<Selector> = Lazy::new(|| selector(".playerteamname a[href]"));
static DATA_INFO: Lazy<Selector> = Lazy::new(|| selector("div.datainfo"));
static DATA_LABEL: Lazy<Selector> = Lazy::new(|| selector("small"));
static DATA_VALUE: Lazy<Selector> = Lazy::new(|| selector("span"));

const DATE_OF_BIRTH_FORMAT: &str = "%d.%m.%Y";

/// Every player linked from the season's player list, each once.
pub fn parse_players_list(html: &str, scope: LeagueSeason) -> ExtractResult<Vec<PlayerListRow>> {
    let doc = Html::parse_document(html);
    let hrefs = doc
        .select(&LINKS)
        .filter_map(|a| a.value().attr("href"))
        .filter(|href| href_has_segments(href, &["players", "id"]));
    let ids = extract_ids(hrefs)?;
    Ok(filter_valid_ids(ids)
        .into_iter()
        .map(|player_id| PlayerListRow { scope, player_id })
        .collect())
}

/// Player profile for one season.
pub fn parse_player_info(
    html: &str,
    scope: LeagueSeason,
    player_id: u32,
) -> ExtractResult<PlayerRecord> {
    let doc = Html::parse_document(html);

    let name = doc
        .select(&PLAYER_NAME)
        .next()
        .map(text_of)
        .filter(|name| !name.is_empty())
        .ok_or_else(|| {
            ExtractError::structural("player page", format!("player {player_id}: no name"))
        })?;

    let team_href = doc
        .select(&PLAYER_TEAM)
        .find_map(|a| a.value().attr("href"))
        .ok_or_else(|| {
            ExtractError::structural("player page", format!("player {player_id}: no team link"))
        })?;
    let team_id = extract_id(team_href)?;

    let mut date_of_birth = None;
    let mut position = None;
    let mut height = None;
    let mut weight = None;
    let mut reach = None;

    for block in doc.select(&DATA_INFO) {
        let Some(label) = block.select(&DATA_LABEL).next().map(text_of) else {
            continue;
        };
        let value = block
            .select(&DATA_VALUE)
            .next()
            .map(text_of)
            .unwrap_or_default();
        match translate_player_info(&label)? {
            PlayerInfoField::DateOfBirth => {
                date_of_birth = NaiveDate::parse_from_str(&value, DATE_OF_BIRTH_FORMAT).ok();
            }
            PlayerInfoField::Position => position = Some(translate_position(&value)?),
            PlayerInfoField::Height => height = parse_measure(&value),
            PlayerInfoField::Weight => weight = parse_measure(&value),
            PlayerInfoField::Reach => reach = parse_measure(&value),
        }
    }

    let position = position.ok_or_else(|| {
        ExtractError::structural("player page", format!("player {player_id}: no position"))
    })?;

    Ok(PlayerRecord {
        scope,
        player_id,
        name,
        team_id,
        date_of_birth,
        position,
        height,
        weight,
        reach,
    })
}

/// Leading digits of "205", "205 cm"; anything else is unknown.
fn parse_measure(raw: &str) -> Option<u16> {
    let digits: String = raw
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse::<u16>().ok().filter(|v| *v > 0)
}

#[cfg(test)]
mod tests {
    use super::parse_measure;

    #[test]
    fn measures_tolerate_units_and_blanks() {
        assert_eq!(parse_measure("205"), Some(205));
        assert_eq!(parse_measure(" 98 kg"), Some(98));
        assert_eq!(parse_measure("-"), None);
        assert_eq!(parse_measure("0"), None);
    }
}
