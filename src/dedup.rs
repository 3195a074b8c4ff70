//! Drops rows whose content is already stored, so re-running an ingest over
//! an overlapping window only inserts new or changed rows.
//!
//! The check reads stored fingerprints and the caller writes afterwards; two
//! concurrent runs over one (league, season) must be serialized by the caller.

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};

use anyhow::Result;
use chrono::{DateTime, Utc};

use crate::fingerprint::Fingerprint;
use crate::league::LeagueSeason;
use crate::records::{TableKind, TableRow};

/// Read side of the storage collaborator.
pub trait FingerprintStore {
    fn stored_fingerprints(
        &self,
        table: TableKind,
        scope: LeagueSeason,
    ) -> Result<HashSet<Fingerprint>>;
}

/// A row ready for insertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stamped<R> {
    pub row: R,
    pub fingerprint: Fingerprint,
    pub ingested_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct DedupOutcome<R> {
    pub fresh: Vec<Stamped<R>>,
    pub skipped: usize,
}

/// Keeps rows whose fingerprint is neither stored for their scope nor seen
/// earlier in `rows`. Stored fingerprints are queried once per scope present.
pub fn filter_new<R, S>(rows: Vec<R>, store: &S, ingested_at: DateTime<Utc>) -> Result<DedupOutcome<R>>
where
    R: TableRow,
    S: FingerprintStore + ?Sized,
{
    let mut known: HashMap<LeagueSeason, HashSet<Fingerprint>> = HashMap::new();
    let mut fresh = Vec::with_capacity(rows.len());
    let mut skipped = 0usize;

    for row in rows {
        let scope = row.scope();
        let seen = match known.entry(scope) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                entry.insert(store.stored_fingerprints(R::TABLE, scope)?)
            }
        };
        let fingerprint = Fingerprint::of(&row);
        if seen.insert(fingerprint) {
            fresh.push(Stamped {
                row,
                fingerprint,
                ingested_at,
            });
        } else {
            skipped += 1;
        }
    }

    if skipped > 0 {
        log::debug!("{}: {} duplicate rows skipped", R::TABLE, skipped);
    }
    Ok(DedupOutcome { fresh, skipped })
}

/// In-process store, for dry runs and tests.
#[derive(Debug, Default, Clone)]
pub struct MemoryFingerprints {
    tables: HashMap<(TableKind, LeagueSeason), HashSet<Fingerprint>>,
}

impl MemoryFingerprints {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record<R: TableRow>(&mut self, stamped: &[Stamped<R>]) {
        for item in stamped {
            self.tables
                .entry((R::TABLE, item.row.scope()))
                .or_default()
                .insert(item.fingerprint);
        }
    }
}

impl FingerprintStore for MemoryFingerprints {
    fn stored_fingerprints(
        &self,
        table: TableKind,
        scope: LeagueSeason,
    ) -> Result<HashSet<Fingerprint>> {
        Ok(self
            .tables
            .get(&(table, scope))
            .cloned()
            .unwrap_or_default())
    }
}
