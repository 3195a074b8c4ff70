use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{ExtractError, ExtractResult};

/// Every entity link on the league sites carries its id as `.../id/<digits>`.
static ID_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"id/([0-9]+)").expect("static regex"));

/// First id embedded in `raw`.
pub fn extract_id(raw: &str) -> ExtractResult<u32> {
    let caps = ID_MARKER
        .captures(raw)
        .ok_or_else(|| ExtractError::structural("entity link", format!("no id/ marker in {raw:?}")))?;
    parse_id(&caps[1], raw)
}

/// All ids from all inputs, concatenated in the order encountered. A string
/// without any marker fails the whole call: it means the markup moved.
pub fn extract_ids<I, S>(inputs: I) -> ExtractResult<Vec<u32>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out = Vec::new();
    for input in inputs {
        let raw = input.as_ref();
        let before = out.len();
        for caps in ID_MARKER.captures_iter(raw) {
            out.push(parse_id(&caps[1], raw)?);
        }
        if out.len() == before {
            return Err(ExtractError::structural(
                "entity link",
                format!("no id/ marker in {raw:?}"),
            ));
        }
    }
    Ok(out)
}

/// Drops the reserved id 0 and repeats, keeping first-seen order.
pub fn filter_valid_ids(ids: impl IntoIterator<Item = u32>) -> Vec<u32> {
    let mut seen = HashSet::new();
    ids.into_iter()
        .filter(|id| *id != 0 && seen.insert(*id))
        .collect()
}

fn parse_id(digits: &str, raw: &str) -> ExtractResult<u32> {
    digits.parse::<u32>().map_err(|_| {
        ExtractError::structural("entity link", format!("id out of range in {raw:?}"))
    })
}
