// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

mod builder;
mod query_error;
mod row_decode;

use marketpulse_model::{
    is_safe_identifier, normalize_symbol, Table, COL_CURRENT_PRICE, COL_DATE, COL_INDUSTRY,
    COL_MARKET_CAP, COL_SECTOR, COL_SHORT_NAME, COL_SYMBOL, COMPANIES_TABLE, COMPANY_COLUMNS,
    INDEX_HISTORY_TABLE, INDEX_VALUE_ALIAS, META_COMPANIES_ROWS, META_INDEX_HISTORY_ROWS,
    META_INDEX_VALUE_COLUMN, META_LOAD_COMPLETED, META_SCHEMA_VERSION, META_SECTOR_STATS_ROWS,
    META_TABLE, SECTOR_STATS_COLUMNS, SECTOR_STATS_TABLE,
};
use rusqlite::types::Value;
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use std::collections::BTreeMap;

pub use builder::SelectBuilder;
pub use query_error::{QueryError, QueryErrorCode};
pub use row_decode::query_table;

pub const CRATE_NAME: &str = "marketpulse-query";

/// Company listing ordered by market cap, largest first. `limit == 0`
/// returns every row; `sector` filters on an exact match.
pub fn list_companies(
    conn: &Connection,
    limit: usize,
    sector: Option<&str>,
) -> Result<Table, QueryError> {
    require_tables(conn, &[COMPANIES_TABLE])?;
    let mut select = SelectBuilder::new(COMPANIES_TABLE).columns(COMPANY_COLUMNS);
    if let Some(sector) = sector {
        select = select.where_eq(COL_SECTOR, Value::Text(sector.to_string()));
    }
    let (sql, params) = select
        .order_by(format!("{COL_MARKET_CAP} DESC"))
        .order_by(format!("{COL_SYMBOL} ASC"))
        .limit(limit)
        .build();
    query_table(conn, &sql, &params)
}

/// Every stored column of one company. An unknown symbol yields an empty
/// table, not an error.
pub fn get_company(conn: &Connection, symbol: &str) -> Result<Table, QueryError> {
    require_tables(conn, &[COMPANIES_TABLE])?;
    let (sql, params) = SelectBuilder::new(COMPANIES_TABLE)
        .where_eq(COL_SYMBOL, Value::Text(normalize_symbol(symbol)))
        .limit(1)
        .build();
    query_table(conn, &sql, &params)
}

pub fn list_sectors(conn: &Connection) -> Result<Table, QueryError> {
    require_tables(conn, &[COMPANIES_TABLE])?;
    let (sql, params) = SelectBuilder::new(COMPANIES_TABLE)
        .column(format!("DISTINCT {COL_SECTOR}"))
        .where_not_null(COL_SECTOR)
        .order_by(format!("{COL_SECTOR} ASC"))
        .build();
    query_table(conn, &sql, &params)
}

/// Companies joined with their sector aggregates, heaviest sector first and
/// largest company first within a sector.
pub fn list_sector_companies(conn: &Connection, sector: Option<&str>) -> Result<Table, QueryError> {
    require_tables(conn, &[COMPANIES_TABLE, SECTOR_STATS_TABLE])?;
    let mut select = SelectBuilder::new(format!(
        "{COMPANIES_TABLE} c JOIN {SECTOR_STATS_TABLE} s ON c.{COL_SECTOR} = s.{COL_SECTOR}"
    ));
    for col in [
        COL_SYMBOL,
        COL_SHORT_NAME,
        COL_SECTOR,
        COL_INDUSTRY,
        COL_CURRENT_PRICE,
        COL_MARKET_CAP,
    ] {
        select = select.column(format!("c.{col} AS {col}"));
    }
    for col in &SECTOR_STATS_COLUMNS[1..] {
        select = select.column(format!("s.{col} AS {col}"));
    }
    if let Some(sector) = sector {
        select = select.where_eq(&format!("c.{COL_SECTOR}"), Value::Text(sector.to_string()));
    }
    let (sql, params) = select
        .order_by("s.total_weight DESC")
        .order_by(format!("c.{COL_MARKET_CAP} DESC"))
        .order_by(format!("c.{COL_SYMBOL} ASC"))
        .build();
    query_table(conn, &sql, &params)
}

/// Most recent index levels first, the value column exposed as `sp500`.
/// Unlike the company listing, `limit == 0` returns no rows.
pub fn list_index_history(conn: &Connection, limit: usize) -> Result<Table, QueryError> {
    require_tables(conn, &[META_TABLE, INDEX_HISTORY_TABLE])?;
    let value_column = index_value_column(conn)?;
    let (sql, params) = SelectBuilder::new(INDEX_HISTORY_TABLE)
        .column(COL_DATE)
        .column(format!("\"{value_column}\" AS {INDEX_VALUE_ALIAS}"))
        .order_by(format!("{COL_DATE} DESC"))
        .limit_exact(limit)
        .build();
    query_table(conn, &sql, &params)
}

/// A store without its tables has never completed a load.
fn require_tables(conn: &Connection, tables: &[&str]) -> Result<(), QueryError> {
    let mut stmt =
        conn.prepare_cached("SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1")?;
    for table in tables {
        if !stmt.exists(params![table])? {
            return Err(QueryError::new(
                QueryErrorCode::Schema,
                format!("store has no `{table}` table"),
            ));
        }
    }
    Ok(())
}

fn index_value_column(conn: &Connection) -> Result<String, QueryError> {
    let column: Option<String> = conn
        .query_row(
            &format!("SELECT v FROM {META_TABLE} WHERE k = ?1"),
            params![META_INDEX_VALUE_COLUMN],
            |row| row.get(0),
        )
        .optional()?;
    match column {
        Some(c) if is_safe_identifier(&c) => Ok(c),
        Some(c) => Err(QueryError::new(
            QueryErrorCode::Schema,
            format!("store metadata names an invalid index value column `{c}`"),
        )),
        None => Err(QueryError::new(
            QueryErrorCode::Schema,
            "store metadata has no index value column",
        )),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoreMetadata {
    pub schema_version: Option<i64>,
    pub load_completed: bool,
    pub index_value_column: Option<String>,
    pub companies_rows: u64,
    pub index_history_rows: u64,
    pub sector_stats_rows: u64,
}

/// Reads the load bookkeeping. A store that was never loaded has no meta
/// table and reports `Schema`.
pub fn store_metadata(conn: &Connection) -> Result<StoreMetadata, QueryError> {
    require_tables(conn, &[META_TABLE])?;
    let mut stmt = conn.prepare(&format!("SELECT k, v FROM {META_TABLE}"))?;
    let entries = stmt
        .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?
        .collect::<Result<BTreeMap<_, _>, _>>()?;
    let count = |k: &str| entries.get(k).and_then(|v| v.parse().ok()).unwrap_or(0);
    Ok(StoreMetadata {
        schema_version: entries.get(META_SCHEMA_VERSION).and_then(|v| v.parse().ok()),
        load_completed: entries.get(META_LOAD_COMPLETED).map(String::as_str) == Some("true"),
        index_value_column: entries.get(META_INDEX_VALUE_COLUMN).cloned(),
        companies_rows: count(META_COMPANIES_ROWS),
        index_history_rows: count(META_INDEX_HISTORY_ROWS),
        sector_stats_rows: count(META_SECTOR_STATS_ROWS),
    })
}

#[cfg(test)]
mod query_tests;
