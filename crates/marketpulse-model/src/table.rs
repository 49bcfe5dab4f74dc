// SPDX-License-Identifier: Apache-2.0

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use std::fmt::{Display, Formatter};

/// One stored value. Serializes as the bare JSON scalar.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl Cell {
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Integer(v) => Some(*v as f64),
            Self::Real(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(v) => Some(v),
            _ => None,
        }
    }
}

impl Display for Cell {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Integer(v) => write!(f, "{v}"),
            Self::Real(v) => write!(f, "{v}"),
            Self::Text(v) => write!(f, "{v}"),
        }
    }
}

impl Serialize for Cell {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_none(),
            Self::Integer(v) => serializer.serialize_i64(*v),
            // NaN and infinities have no JSON form.
            Self::Real(v) if !v.is_finite() => serializer.serialize_none(),
            Self::Real(v) => serializer.serialize_f64(*v),
            Self::Text(v) => serializer.serialize_str(v),
        }
    }
}

/// Ordered query result. `columns` fixes the field order of every row.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    #[must_use]
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Values of one column, top to bottom. Empty when the column is absent.
    #[must_use]
    pub fn column(&self, name: &str) -> Vec<&Cell> {
        match self.column_index(name) {
            Some(idx) => self.rows.iter().filter_map(|r| r.get(idx)).collect(),
            None => Vec::new(),
        }
    }

    pub fn records(&self) -> impl Iterator<Item = Record<'_>> {
        self.rows.iter().map(move |values| Record {
            columns: &self.columns,
            values,
        })
    }

    #[must_use]
    pub fn first(&self) -> Option<Record<'_>> {
        self.records().next()
    }
}

/// A row viewed as a column-keyed JSON object, keys in column order.
#[derive(Debug, Clone, Copy)]
pub struct Record<'a> {
    pub columns: &'a [String],
    pub values: &'a [Cell],
}

impl Record<'_> {
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Cell> {
        let idx = self.columns.iter().position(|c| c == name)?;
        self.values.get(idx)
    }
}

impl Serialize for Record<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (name, value) in self.columns.iter().zip(self.values) {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl Serialize for Table {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.rows.len()))?;
        for record in self.records() {
            seq.serialize_element(&record)?;
        }
        seq.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        Table {
            columns: vec!["Symbol".to_string(), "Marketcap".to_string(), "Weight".to_string()],
            rows: vec![
                vec![Cell::Text("AAPL".to_string()), Cell::Integer(3_000), Cell::Real(0.06)],
                vec![Cell::Text("XOM".to_string()), Cell::Null, Cell::Real(f64::NAN)],
            ],
        }
    }

    #[test]
    fn table_serializes_as_array_of_records() {
        let json = serde_json::to_value(sample()).expect("json");
        assert_eq!(
            json,
            serde_json::json!([
                {"Symbol": "AAPL", "Marketcap": 3000, "Weight": 0.06},
                {"Symbol": "XOM", "Marketcap": null, "Weight": null}
            ])
        );
    }

    #[test]
    fn record_serialization_keeps_column_order() {
        let table = sample();
        let text = serde_json::to_string(&table.first().expect("row")).expect("json");
        assert_eq!(text, r#"{"Symbol":"AAPL","Marketcap":3000,"Weight":0.06}"#);
    }

    #[test]
    fn column_lookup_reads_values_in_row_order() {
        let table = sample();
        let symbols: Vec<_> = table.column("Symbol").into_iter().filter_map(Cell::as_str).collect();
        assert_eq!(symbols, vec!["AAPL", "XOM"]);
        assert!(table.column("Missing").is_empty());
        assert_eq!(table.first().and_then(|r| r.get("Marketcap").cloned()), Some(Cell::Integer(3000)));
    }
}
