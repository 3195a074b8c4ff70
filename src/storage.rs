use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::types::{ToSqlOutput, ValueRef};
use rusqlite::{Connection, ToSql, params, params_from_iter};

use crate::dedup::{FingerprintStore, Stamped};
use crate::fingerprint::Fingerprint;
use crate::league::LeagueSeason;
use crate::records::{FieldValue, TableKind, TableRow};

pub const FINGERPRINT_COLUMN: &str = "Fingerprint";
pub const INGESTED_AT_COLUMN: &str = "IngestedAt";

pub fn open_db(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).ok();
    }
    let conn =
        Connection::open(path).with_context(|| format!("open sqlite db {}", path.display()))?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn open_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory().context("open in-memory sqlite db")?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    let mut ddl = String::from("PRAGMA journal_mode = WAL;\n");
    for table in TableKind::ALL {
        ddl.push_str(&create_table_sql(table));
    }
    ddl.push_str(
        r#"
        CREATE TABLE IF NOT EXISTS ingest_runs (
            run_id INTEGER PRIMARY KEY AUTOINCREMENT,
            started_at TEXT NOT NULL,
            finished_at TEXT NULL,
            league TEXT NOT NULL,
            season INTEGER NOT NULL,
            rows_inserted INTEGER NOT NULL,
            rows_skipped INTEGER NOT NULL,
            units_failed INTEGER NOT NULL,
            errors_json TEXT NOT NULL
        );
        "#,
    );
    conn.execute_batch(&ddl).context("create sqlite schema")?;
    Ok(())
}

fn create_table_sql(table: TableKind) -> String {
    let columns = table
        .columns()
        .iter()
        .map(|col| {
            let ty = if table.is_integer_column(col) {
                "INTEGER"
            } else {
                "TEXT"
            };
            format!("\"{col}\" {ty} NULL")
        })
        .collect::<Vec<_>>()
        .join(",\n            ");
    let name = table.name();
    format!(
        r#"
        CREATE TABLE IF NOT EXISTS {name} (
            {columns},
            {FINGERPRINT_COLUMN} TEXT NOT NULL,
            {INGESTED_AT_COLUMN} TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_{name}_scope ON {name}(League, Season, {FINGERPRINT_COLUMN});
        "#
    )
}

impl ToSql for FieldValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            FieldValue::Null => ToSqlOutput::Borrowed(ValueRef::Null),
            FieldValue::Int(v) => ToSqlOutput::Borrowed(ValueRef::Integer(*v)),
            FieldValue::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
        })
    }
}

fn field_from_sql(value: ValueRef<'_>) -> FieldValue {
    match value {
        ValueRef::Null => FieldValue::Null,
        ValueRef::Integer(v) => FieldValue::Int(v),
        ValueRef::Real(v) => FieldValue::Text(v.to_string()),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
            FieldValue::Text(String::from_utf8_lossy(bytes).into_owned())
        }
    }
}

/// Fingerprint lookups against a connection or an open transaction.
pub struct SqliteStore<'c> {
    conn: &'c Connection,
}

impl<'c> SqliteStore<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }
}

impl FingerprintStore for SqliteStore<'_> {
    fn stored_fingerprints(
        &self,
        table: TableKind,
        scope: LeagueSeason,
    ) -> Result<HashSet<Fingerprint>> {
        let sql = format!(
            "SELECT DISTINCT {FINGERPRINT_COLUMN} FROM {} WHERE League = ?1 AND Season = ?2",
            table.name()
        );
        let mut stmt = self
            .conn
            .prepare_cached(&sql)
            .with_context(|| format!("prepare fingerprint query on {table}"))?;
        let rows = stmt
            .query_map(params![scope.league.label(), i64::from(scope.season)], |row| {
                row.get::<_, String>(0)
            })
            .with_context(|| format!("query fingerprints of {table}"))?;
        let mut out = HashSet::new();
        for raw in rows {
            let raw = raw.with_context(|| format!("read fingerprint of {table}"))?;
            out.insert(raw.parse::<Fingerprint>()?);
        }
        Ok(out)
    }
}

/// Appends stamped rows. Callers wrap this in their transaction.
pub fn insert_stamped<R: TableRow>(conn: &Connection, rows: &[Stamped<R>]) -> Result<usize> {
    if rows.is_empty() {
        return Ok(0);
    }
    let table = R::TABLE;
    let columns = table.columns();
    let names = columns
        .iter()
        .map(|col| format!("\"{col}\""))
        .chain([FINGERPRINT_COLUMN.to_string(), INGESTED_AT_COLUMN.to_string()])
        .collect::<Vec<_>>()
        .join(", ");
    let placeholders = (1..=columns.len() + 2)
        .map(|idx| format!("?{idx}"))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!("INSERT INTO {} ({names}) VALUES ({placeholders})", table.name());
    let mut stmt = conn
        .prepare_cached(&sql)
        .with_context(|| format!("prepare insert into {table}"))?;

    for item in rows {
        let mut values = item.row.values();
        values.push(FieldValue::Text(item.fingerprint.to_hex()));
        values.push(FieldValue::Text(format_timestamp(item.ingested_at)));
        stmt.execute(params_from_iter(values.iter()))
            .with_context(|| format!("insert into {table}"))?;
    }
    Ok(rows.len())
}

pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339()
}

/// Opens a row in the run ledger and returns its id.
pub fn begin_run(conn: &Connection, scope: LeagueSeason, started_at: DateTime<Utc>) -> Result<i64> {
    conn.execute(
        "INSERT INTO ingest_runs(started_at, finished_at, league, season, rows_inserted, rows_skipped, units_failed, errors_json)
         VALUES (?1, NULL, ?2, ?3, 0, 0, 0, '[]')",
        params![
            format_timestamp(started_at),
            scope.league.label(),
            i64::from(scope.season)
        ],
    )
    .context("insert ingest run")?;
    Ok(conn.last_insert_rowid())
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOutcome {
    pub rows_inserted: usize,
    pub rows_skipped: usize,
    pub errors: Vec<String>,
}

pub fn finish_run(conn: &Connection, run_id: i64, outcome: &RunOutcome) -> Result<()> {
    let errors_json = serde_json::to_string(&outcome.errors).unwrap_or_else(|_| "[]".to_string());
    conn.execute(
        "UPDATE ingest_runs
         SET finished_at = ?1, rows_inserted = ?2, rows_skipped = ?3, units_failed = ?4, errors_json = ?5
         WHERE run_id = ?6",
        params![
            format_timestamp(Utc::now()),
            outcome.rows_inserted as i64,
            outcome.rows_skipped as i64,
            outcome.errors.len() as i64,
            errors_json,
            run_id
        ],
    )
    .context("update ingest run")?;
    Ok(())
}

/// A stored table as plain values, storage columns included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<FieldValue>>,
}

pub fn load_table(
    conn: &Connection,
    table: TableKind,
    scope: Option<LeagueSeason>,
) -> Result<StoredTable> {
    let columns: Vec<String> = table
        .columns()
        .iter()
        .map(|c| c.to_string())
        .chain([FINGERPRINT_COLUMN.to_string(), INGESTED_AT_COLUMN.to_string()])
        .collect();
    let select = columns
        .iter()
        .map(|c| format!("\"{c}\""))
        .collect::<Vec<_>>()
        .join(", ");
    let mut sql = format!("SELECT {select} FROM {}", table.name());
    if scope.is_some() {
        sql.push_str(" WHERE League = ?1 AND Season = ?2");
    }
    sql.push_str(" ORDER BY rowid");

    let mut stmt = conn
        .prepare(&sql)
        .with_context(|| format!("prepare load of {table}"))?;
    let width = columns.len();
    let map_row = |row: &rusqlite::Row<'_>| -> rusqlite::Result<Vec<FieldValue>> {
        (0..width)
            .map(|idx| row.get_ref(idx).map(field_from_sql))
            .collect()
    };
    let mapped = match scope {
        Some(scope) => stmt
            .query_map(params![scope.league.label(), i64::from(scope.season)], map_row)
            .with_context(|| format!("load {table}"))?
            .collect::<rusqlite::Result<Vec<_>>>(),
        None => stmt
            .query_map([], map_row)
            .with_context(|| format!("load {table}"))?
            .collect::<rusqlite::Result<Vec<_>>>(),
    };
    let rows = mapped.with_context(|| format!("read rows of {table}"))?;
    Ok(StoredTable { columns, rows })
}

pub fn count_rows(conn: &Connection, table: TableKind) -> Result<usize> {
    let count: i64 = conn
        .query_row(&format!("SELECT COUNT(*) FROM {}", table.name()), [], |row| {
            row.get(0)
        })
        .with_context(|| format!("count rows of {table}"))?;
    Ok(count as usize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dedup::filter_new;
    use crate::league::League;
    use crate::records::TeamRecord;

    #[test]
    fn inserted_rows_become_stored_fingerprints() {
        let conn = open_in_memory().unwrap();
        let scope = LeagueSeason::new(League::TauronLiga, 2021);
        let rows = vec![TeamRecord {
            scope,
            team_id: 30290,
            name: "Grupa Azoty Chemik Police".into(),
        }];
        let store = SqliteStore::new(&conn);
        let outcome = filter_new(rows.clone(), &store, Utc::now()).unwrap();
        assert_eq!(insert_stamped(&conn, &outcome.fresh).unwrap(), 1);

        let stored = store
            .stored_fingerprints(TableKind::TeamsInfo, scope)
            .unwrap();
        assert!(stored.contains(&Fingerprint::of(&rows[0])));

        let other = LeagueSeason::new(League::TauronLiga, 2022);
        assert!(
            store
                .stored_fingerprints(TableKind::TeamsInfo, other)
                .unwrap()
                .is_empty()
        );

        let loaded = load_table(&conn, TableKind::TeamsInfo, Some(scope)).unwrap();
        assert_eq!(loaded.rows.len(), 1);
        assert_eq!(loaded.rows[0][0], FieldValue::Text("Tauron Liga".into()));
        assert_eq!(loaded.columns.last().map(String::as_str), Some(INGESTED_AT_COLUMN));
    }

    #[test]
    fn run_ledger_records_errors() {
        let conn = open_in_memory().unwrap();
        let scope = LeagueSeason::new(League::PlusLiga, 2020);
        let run_id = begin_run(&conn, scope, Utc::now()).unwrap();
        let outcome = RunOutcome {
            rows_inserted: 5,
            rows_skipped: 2,
            errors: vec!["match 1: boom".into()],
        };
        finish_run(&conn, run_id, &outcome).unwrap();
        let (failed, json): (i64, String) = conn
            .query_row(
                "SELECT units_failed, errors_json FROM ingest_runs WHERE run_id = ?1",
                params![run_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .unwrap();
        assert_eq!(failed, 1);
        assert_eq!(json, r#"["match 1: boom"]"#);
    }
}
