//! Polish labels used on the league sites, mapped onto a fixed vocabulary.
//!
//! Lookups fail closed: an unseen label is an error naming the label, so
//! vocabulary drift shows up at once instead of leaking raw text into typed
//! columns.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ExtractError, ExtractResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Position {
    OutsideHitter,
    OppositeHitter,
    MiddleBlocker,
    Libero,
    Setter,
}

impl Position {
    pub fn code(self) -> &'static str {
        match self {
            Position::OutsideHitter => "OH",
            Position::OppositeHitter => "OPP",
            Position::MiddleBlocker => "MB",
            Position::Libero => "L",
            Position::Setter => "S",
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Rows of the match details block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchDetailField {
    Stage,
    Round,
    MatchNumber,
    Mvp,
    Spectators,
    FirstReferee,
    SecondReferee,
    Commissioner,
    Arena,
    Address,
    City,
    ArenaSize,
}

/// Rows of the player profile block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlayerInfoField {
    DateOfBirth,
    Position,
    Height,
    Weight,
    Reach,
}

// Keyed by gender-neutral stem: the sites print "przyjmujący" for men and
// "przyjmująca" for women.
static POSITION_STEMS: &[(&str, Position)] = &[
    ("przyjmując", Position::OutsideHitter),
    ("atakując", Position::OppositeHitter),
    ("środkow", Position::MiddleBlocker),
    ("rozgrywając", Position::Setter),
    ("libero", Position::Libero),
];

static MATCH_DETAIL_LABELS: &[(&str, MatchDetailField)] = &[
    ("Faza", MatchDetailField::Stage),
    ("Kolejka", MatchDetailField::Round),
    ("Numer meczu", MatchDetailField::MatchNumber),
    ("MVP", MatchDetailField::Mvp),
    ("Liczba widzów", MatchDetailField::Spectators),
    ("Sędzia I", MatchDetailField::FirstReferee),
    ("Sędzia II", MatchDetailField::SecondReferee),
    ("Komisarz", MatchDetailField::Commissioner),
    ("Hala", MatchDetailField::Arena),
    ("Adres", MatchDetailField::Address),
    ("Miasto", MatchDetailField::City),
    ("Pojemność hali", MatchDetailField::ArenaSize),
];

static PLAYER_INFO_LABELS: &[(&str, PlayerInfoField)] = &[
    ("Data urodzenia", PlayerInfoField::DateOfBirth),
    ("Pozycja", PlayerInfoField::Position),
    ("Wzrost", PlayerInfoField::Height),
    ("Waga", PlayerInfoField::Weight),
    ("Zasięg", PlayerInfoField::Reach),
];

/// Case-insensitive; male and female spellings map to the same position.
pub fn translate_position(label: &str) -> ExtractResult<Position> {
    let stem = position_stem(label);
    POSITION_STEMS
        .iter()
        .find(|(key, _)| *key == stem)
        .map(|(_, pos)| *pos)
        .ok_or_else(|| miss("position", label))
}

pub fn translate_match_detail(label: &str) -> ExtractResult<MatchDetailField> {
    lookup(MATCH_DETAIL_LABELS, "match detail", label)
}

pub fn translate_player_info(label: &str) -> ExtractResult<PlayerInfoField> {
    lookup(PLAYER_INFO_LABELS, "player info", label)
}

fn position_stem(label: &str) -> String {
    let mut stem = label.trim().to_lowercase();
    if stem.ends_with(['y', 'a']) {
        stem.pop();
    }
    stem
}

fn lookup<T: Copy>(table: &[(&str, T)], vocabulary: &'static str, label: &str) -> ExtractResult<T> {
    let key = clean_label(label);
    table
        .iter()
        .find(|(known, _)| *known == key)
        .map(|(_, value)| *value)
        .ok_or_else(|| miss(vocabulary, label))
}

fn clean_label(label: &str) -> &str {
    let trimmed = label.trim();
    trimmed.strip_suffix(':').unwrap_or(trimmed).trim_end()
}

fn miss(vocabulary: &'static str, label: &str) -> ExtractError {
    ExtractError::TranslationMiss {
        vocabulary,
        label: label.trim().to_string(),
    }
}
