// SPDX-License-Identifier: Apache-2.0

use crate::snapshot::Snapshot;
use crate::LoadError;
use marketpulse_model::{
    Cell, SectorStats, COL_DATE, COL_SECTOR, COL_SYMBOL, COMPANIES_TABLE, INDEX_HISTORY_TABLE,
    META_COMPANIES_ROWS, META_INDEX_HISTORY_ROWS, META_INDEX_VALUE_COLUMN, META_LOAD_COMPLETED,
    META_SCHEMA_VERSION, META_SECTOR_STATS_ROWS, META_TABLE, SECTOR_STATS_TABLE,
    STORE_SCHEMA_VERSION,
};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, TransactionBehavior};
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::warn;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

pub struct WriteStoreInput<'a> {
    pub companies: &'a Snapshot,
    pub index_history: &'a Snapshot,
    pub index_value_column: &'a str,
    pub sector_stats: &'a [SectorStats],
}

pub fn open_store(path: &Path) -> Result<Connection, LoadError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| {
            LoadError::storage(format!("cannot create store directory {}: {e}", parent.display()))
        })?;
    }
    let conn = Connection::open(path)
        .map_err(|e| LoadError::storage(format!("cannot open store {}: {e}", path.display())))?;
    conn.busy_timeout(BUSY_TIMEOUT)
        .map_err(|e| LoadError::storage(e.to_string()))?;
    Ok(conn)
}

/// True when the store already holds a completed load of the current schema.
/// Any read failure counts as "not loaded".
#[must_use]
pub fn store_is_loaded(conn: &Connection) -> bool {
    let read = |k: &str| -> Option<String> {
        conn.query_row(
            &format!("SELECT v FROM {META_TABLE} WHERE k = ?1"),
            params![k],
            |row| row.get::<_, String>(0),
        )
        .optional()
        .ok()
        .flatten()
    };
    let version = STORE_SCHEMA_VERSION.to_string();
    read(META_LOAD_COMPLETED).as_deref() == Some("true")
        && read(META_SCHEMA_VERSION).as_deref() == Some(version.as_str())
}

/// Replaces all three tables and the metadata in a single transaction. On
/// error nothing is committed and the previous load stays readable.
pub fn write_store(conn: &mut Connection, input: &WriteStoreInput<'_>) -> Result<(), LoadError> {
    let tx = conn
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .map_err(|e| LoadError::storage(format!("cannot begin replace transaction: {e}")))?;

    tx.execute_batch(&format!(
        "
        DROP TABLE IF EXISTS {COMPANIES_TABLE};
        DROP TABLE IF EXISTS {INDEX_HISTORY_TABLE};
        DROP TABLE IF EXISTS {SECTOR_STATS_TABLE};
        CREATE TABLE IF NOT EXISTS {META_TABLE} (
          k TEXT PRIMARY KEY,
          v TEXT NOT NULL
        ) WITHOUT ROWID;
        DELETE FROM {META_TABLE};
        "
    ))
    .map_err(storage)?;

    replace_snapshot_table(&tx, COMPANIES_TABLE, input.companies)?;
    replace_snapshot_table(&tx, INDEX_HISTORY_TABLE, input.index_history)?;

    tx.execute_batch(&format!(
        "CREATE TABLE {SECTOR_STATS_TABLE} (
          {COL_SECTOR} TEXT PRIMARY KEY,
          n_companies INTEGER NOT NULL,
          avg_marketcap REAL,
          total_weight REAL NOT NULL
        ) WITHOUT ROWID;"
    ))
    .map_err(storage)?;
    {
        let mut stmt = tx
            .prepare(&format!(
                "INSERT INTO {SECTOR_STATS_TABLE} ({COL_SECTOR}, n_companies, avg_marketcap, total_weight)
                 VALUES (?1, ?2, ?3, ?4)"
            ))
            .map_err(storage)?;
        for s in input.sector_stats {
            stmt.execute(params![
                s.sector,
                s.n_companies as i64,
                s.avg_marketcap,
                s.total_weight
            ])
            .map_err(storage)?;
        }
    }

    tx.execute_batch(&format!(
        "
        CREATE INDEX idx_companies_symbol ON {COMPANIES_TABLE}({COL_SYMBOL});
        CREATE INDEX idx_companies_sector ON {COMPANIES_TABLE}({COL_SECTOR});
        CREATE INDEX idx_index_history_date ON {INDEX_HISTORY_TABLE}({COL_DATE});
        "
    ))
    .map_err(storage)?;

    let meta = [
        (META_SCHEMA_VERSION, STORE_SCHEMA_VERSION.to_string()),
        (META_INDEX_VALUE_COLUMN, input.index_value_column.to_string()),
        (META_COMPANIES_ROWS, input.companies.rows.len().to_string()),
        (META_INDEX_HISTORY_ROWS, input.index_history.rows.len().to_string()),
        (META_SECTOR_STATS_ROWS, input.sector_stats.len().to_string()),
        (META_LOAD_COMPLETED, "true".to_string()),
    ];
    {
        let mut stmt = tx
            .prepare(&format!("INSERT INTO {META_TABLE} (k, v) VALUES (?1, ?2)"))
            .map_err(storage)?;
        for (k, v) in &meta {
            stmt.execute(params![k, v]).map_err(storage)?;
        }
    }

    tx.commit()
        .map_err(|e| LoadError::storage(format!("cannot commit replace transaction: {e}")))?;

    if let Err(e) = conn.execute_batch("ANALYZE;") {
        warn!(error = %e, "store analyze failed; continuing without statistics");
    }
    Ok(())
}

fn replace_snapshot_table(
    tx: &rusqlite::Transaction<'_>,
    table: &str,
    snapshot: &Snapshot,
) -> Result<(), LoadError> {
    // Column names were validated as safe identifiers at decode time.
    let defs = snapshot
        .columns
        .iter()
        .map(|c| format!("\"{}\" {}", c.name, c.kind.sql_type()))
        .collect::<Vec<_>>()
        .join(", ");
    tx.execute_batch(&format!("CREATE TABLE {table} ({defs});"))
        .map_err(storage)?;

    let names = snapshot
        .columns
        .iter()
        .map(|c| format!("\"{}\"", c.name))
        .collect::<Vec<_>>()
        .join(", ");
    let placeholders = vec!["?"; snapshot.columns.len()].join(", ");
    let mut stmt = tx
        .prepare(&format!("INSERT INTO {table} ({names}) VALUES ({placeholders})"))
        .map_err(storage)?;
    for row in &snapshot.rows {
        stmt.execute(params_from_iter(row.iter().map(cell_value)))
            .map_err(storage)?;
    }
    Ok(())
}

fn cell_value(cell: &Cell) -> Value {
    match cell {
        Cell::Null => Value::Null,
        Cell::Integer(v) => Value::Integer(*v),
        Cell::Real(v) => Value::Real(*v),
        Cell::Text(v) => Value::Text(v.clone()),
    }
}

fn storage(e: rusqlite::Error) -> LoadError {
    LoadError::storage(e.to_string())
}
