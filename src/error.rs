use std::fmt;

use thiserror::Error;

/// Failures raised by the extraction engine. Each one is fatal to the single
/// page being parsed and never to the batch it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    /// Expected markup shape is missing; usually a site redesign.
    #[error("structural parse error in {what}: {detail}")]
    Structural { what: &'static str, detail: String },

    /// A label the vocabulary tables do not know.
    #[error("untranslated {vocabulary} label: {label:?}")]
    TranslationMiss {
        vocabulary: &'static str,
        label: String,
    },

    #[error("season {season} falls outside every known statistics era")]
    UnsupportedEra { season: u16 },
}

impl ExtractError {
    pub fn structural(what: &'static str, detail: impl Into<String>) -> Self {
        ExtractError::Structural {
            what,
            detail: detail.into(),
        }
    }
}

pub type ExtractResult<T> = std::result::Result<T, ExtractError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnitKind {
    PlayersList,
    Player,
    TeamsList,
    Team,
    MatchesList,
    Match,
}

impl fmt::Display for UnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            UnitKind::PlayersList => "players list",
            UnitKind::Player => "player",
            UnitKind::TeamsList => "teams list",
            UnitKind::Team => "team",
            UnitKind::MatchesList => "matches list",
            UnitKind::Match => "match",
        };
        f.write_str(label)
    }
}

/// A fetch-and-parse unit that failed, with enough context to find the page
/// again.
#[derive(Debug, Error)]
#[error("{kind} {id} ({url}): {cause:#}")]
pub struct UnitError {
    pub kind: UnitKind,
    pub id: u32,
    pub url: String,
    pub cause: anyhow::Error,
}

impl UnitError {
    pub fn new(kind: UnitKind, id: u32, url: impl Into<String>, cause: anyhow::Error) -> Self {
        Self {
            kind,
            id,
            url: url.into(),
            cause,
        }
    }

    /// The engine error behind this failure, if it was not a transport problem.
    pub fn extract_error(&self) -> Option<&ExtractError> {
        self.cause.downcast_ref::<ExtractError>()
    }
}
