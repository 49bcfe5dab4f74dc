// SPDX-License-Identifier: Apache-2.0

use crate::QueryError;
use marketpulse_model::{Cell, Table};
use rusqlite::types::{Value, ValueRef};
use rusqlite::{params_from_iter, Connection};

/// Runs `sql` and materializes every row, keeping the statement's column
/// names and order.
pub fn query_table(conn: &Connection, sql: &str, params: &[Value]) -> Result<Table, QueryError> {
    let mut stmt = conn.prepare(sql)?;
    let columns: Vec<String> = stmt.column_names().into_iter().map(str::to_string).collect();
    let width = columns.len();
    let mut table = Table::new(columns);
    let mut rows = stmt.query(params_from_iter(params.iter()))?;
    while let Some(row) = rows.next()? {
        let mut cells = Vec::with_capacity(width);
        for idx in 0..width {
            cells.push(cell_from_ref(row.get_ref(idx)?));
        }
        table.rows.push(cells);
    }
    Ok(table)
}

fn cell_from_ref(value: ValueRef<'_>) -> Cell {
    match value {
        ValueRef::Null => Cell::Null,
        ValueRef::Integer(v) => Cell::Integer(v),
        ValueRef::Real(v) => Cell::Real(v),
        ValueRef::Text(v) | ValueRef::Blob(v) => Cell::Text(String::from_utf8_lossy(v).into_owned()),
    }
}
