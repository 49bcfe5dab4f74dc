// SPDX-License-Identifier: Apache-2.0

use crate::snapshot::Snapshot;
use crate::LoadError;
use chrono::NaiveDate;
use marketpulse_model::{
    normalize_symbol, Cell, Company, COL_CURRENT_PRICE, COL_DATE, COL_INDUSTRY, COL_MARKET_CAP,
    COL_SECTOR, COL_SHORT_NAME, COL_SYMBOL, COL_WEIGHT,
};
use std::collections::BTreeSet;

pub const COMPANY_TEXT_COLUMNS: [&str; 4] = [COL_SYMBOL, COL_SHORT_NAME, COL_SECTOR, COL_INDUSTRY];
pub const INDEX_TEXT_COLUMNS: [&str; 1] = [COL_DATE];

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Validates the company snapshot and extracts the typed view used for
/// sector aggregation.
pub fn extract_companies(snapshot: &mut Snapshot) -> Result<Vec<Company>, LoadError> {
    let symbol = snapshot.require_column(COL_SYMBOL)?;
    let short_name = snapshot.require_column(COL_SHORT_NAME)?;
    let sector = snapshot.require_column(COL_SECTOR)?;
    let industry = snapshot.require_column(COL_INDUSTRY)?;
    let price = snapshot.require_numeric(COL_CURRENT_PRICE)?;
    let cap = snapshot.require_numeric(COL_MARKET_CAP)?;
    let weight = snapshot.require_numeric(COL_WEIGHT)?;

    let mut seen = BTreeSet::new();
    let mut out = Vec::with_capacity(snapshot.rows.len());
    for (idx, row) in snapshot.rows.iter().enumerate() {
        let Some(sym) = row[symbol].as_str() else {
            return Err(LoadError::data_source(format!(
                "{}: row {} has an empty Symbol",
                snapshot.source,
                idx + 2
            )));
        };
        if !seen.insert(normalize_symbol(sym)) {
            return Err(LoadError::data_source(format!(
                "{}: duplicate Symbol `{sym}` at row {}",
                snapshot.source,
                idx + 2
            )));
        }
        out.push(Company {
            symbol: sym.to_string(),
            short_name: row[short_name].as_str().map(str::to_string),
            sector: row[sector].as_str().map(str::to_string),
            industry: row[industry].as_str().map(str::to_string),
            current_price: row[price].as_f64(),
            market_cap: row[cap].as_f64(),
            weight: row[weight].as_f64(),
        });
    }
    Ok(out)
}

/// Canonicalizes dates to ISO form so text order is date order, and returns
/// the name of the index value column (first column after `Date`).
pub fn prepare_index_history(snapshot: &mut Snapshot) -> Result<String, LoadError> {
    let date = snapshot.require_column(COL_DATE)?;
    let value_column = snapshot
        .columns
        .iter()
        .find(|c| c.name != COL_DATE)
        .map(|c| c.name.clone())
        .ok_or_else(|| {
            LoadError::data_source(format!(
                "{}: index snapshot needs a value column besides `Date`",
                snapshot.source
            ))
        })?;
    snapshot.require_numeric(&value_column)?;

    let source = snapshot.source.clone();
    snapshot.map_column(date, |row_no, cell| {
        let parsed = cell
            .as_str()
            .and_then(|raw| NaiveDate::parse_from_str(raw, DATE_FORMAT).ok())
            .ok_or_else(|| {
                LoadError::data_source(format!(
                    "{source}: row {} has an invalid Date `{cell}` (expected YYYY-MM-DD)",
                    row_no + 2
                ))
            })?;
        Ok(Cell::Text(parsed.format(DATE_FORMAT).to_string()))
    })?;
    Ok(value_column)
}
