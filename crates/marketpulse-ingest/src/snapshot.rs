// SPDX-License-Identifier: Apache-2.0

use crate::LoadError;
use marketpulse_model::{canonical_column_name, Cell};
use std::collections::BTreeSet;
use std::path::Path;

/// Inferred storage class of one snapshot column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Integer,
    Real,
    Text,
}

impl ColumnKind {
    #[must_use]
    pub const fn sql_type(self) -> &'static str {
        match self {
            Self::Integer => "INTEGER",
            Self::Real => "REAL",
            Self::Text => "TEXT",
        }
    }

    #[must_use]
    pub const fn is_numeric(self) -> bool {
        matches!(self, Self::Integer | Self::Real)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotColumn {
    pub name: String,
    pub kind: ColumnKind,
}

/// A decoded snapshot: normalized columns plus typed cells.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub source: String,
    pub columns: Vec<SnapshotColumn>,
    pub rows: Vec<Vec<Cell>>,
}

impl Snapshot {
    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn require_column(&self, name: &str) -> Result<usize, LoadError> {
        self.column_index(name).ok_or_else(|| {
            LoadError::data_source(format!("{}: missing required column `{name}`", self.source))
        })
    }

    /// A column with no values at all has no inferred type; it is widened to
    /// REAL so the store keeps a numeric column of NULLs.
    pub fn require_numeric(&mut self, name: &str) -> Result<usize, LoadError> {
        let idx = self.require_column(name)?;
        if self.rows.iter().all(|row| row[idx] == Cell::Null) {
            self.columns[idx].kind = ColumnKind::Real;
        }
        if !self.columns[idx].kind.is_numeric() {
            return Err(LoadError::data_source(format!(
                "{}: column `{name}` must be numeric",
                self.source
            )));
        }
        Ok(idx)
    }

    /// Rewrites one column cell-by-cell, e.g. to canonicalize dates.
    pub fn map_column(
        &mut self,
        idx: usize,
        mut f: impl FnMut(usize, Cell) -> Result<Cell, LoadError>,
    ) -> Result<(), LoadError> {
        for (row_no, row) in self.rows.iter_mut().enumerate() {
            let cell = std::mem::replace(&mut row[idx], Cell::Null);
            row[idx] = f(row_no, cell)?;
        }
        Ok(())
    }
}

/// Reads a CSV snapshot with a header row. Columns named in `text_columns`
/// are kept as text regardless of their content.
pub fn read_snapshot(path: &Path, text_columns: &[&str]) -> Result<Snapshot, LoadError> {
    let source = path.display().to_string();
    if !path.is_file() {
        return Err(LoadError::data_source(format!(
            "snapshot file not found: {source}"
        )));
    }
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| LoadError::data_source(format!("{source}: {e}")))?;

    let headers = reader
        .headers()
        .map_err(|e| LoadError::data_source(format!("{source}: {e}")))?
        .clone();
    if headers.is_empty() || headers.iter().all(str::is_empty) {
        return Err(LoadError::data_source(format!("{source}: empty header row")));
    }
    let mut names = Vec::with_capacity(headers.len());
    let mut seen = BTreeSet::new();
    for raw in &headers {
        let name = canonical_column_name(raw)
            .map_err(|e| LoadError::data_source(format!("{source}: {e}")))?;
        if !seen.insert(name.to_ascii_lowercase()) {
            return Err(LoadError::data_source(format!(
                "{source}: duplicate column `{name}` after normalization"
            )));
        }
        names.push(name);
    }

    let mut raw_rows: Vec<Vec<String>> = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let record = record.map_err(|e| {
            LoadError::data_source(format!("{source}: malformed row {}: {e}", idx + 2))
        })?;
        raw_rows.push(record.iter().map(str::to_string).collect());
    }

    let columns: Vec<SnapshotColumn> = names
        .into_iter()
        .enumerate()
        .map(|(idx, name)| {
            let kind = if text_columns.contains(&name.as_str()) {
                ColumnKind::Text
            } else {
                infer_kind(raw_rows.iter().map(|r| r[idx].as_str()))
            };
            SnapshotColumn { name, kind }
        })
        .collect();

    let rows = raw_rows
        .into_iter()
        .map(|row| {
            row.into_iter()
                .zip(&columns)
                .map(|(value, col)| to_cell(value, col.kind))
                .collect()
        })
        .collect();

    Ok(Snapshot {
        source,
        columns,
        rows,
    })
}

fn infer_kind<'a>(values: impl Iterator<Item = &'a str>) -> ColumnKind {
    let mut kind = None;
    for v in values.filter(|v| !v.is_empty()) {
        let this = if v.parse::<i64>().is_ok() {
            ColumnKind::Integer
        } else if v.parse::<f64>().is_ok() {
            ColumnKind::Real
        } else {
            return ColumnKind::Text;
        };
        kind = match (kind, this) {
            (Some(ColumnKind::Real), _) | (_, ColumnKind::Real) => Some(ColumnKind::Real),
            _ => Some(ColumnKind::Integer),
        };
    }
    kind.unwrap_or(ColumnKind::Text)
}

fn to_cell(value: String, kind: ColumnKind) -> Cell {
    if value.is_empty() {
        return Cell::Null;
    }
    match kind {
        ColumnKind::Integer => value.parse().map_or(Cell::Text(value), Cell::Integer),
        ColumnKind::Real => value.parse().map_or(Cell::Null, Cell::Real),
        ColumnKind::Text => Cell::Text(value),
    }
}
