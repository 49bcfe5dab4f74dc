// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]
//! MarketPulse domain model: snapshot entities, the derived sector
//! aggregate, and the column/cell table every read operation returns.

mod columns;
mod company;
mod layout;
mod table;

pub use columns::{
    canonical_column_name, is_safe_identifier, normalize_column_name, ValidationError,
    COMPANY_COLUMNS, COL_CURRENT_PRICE, COL_DATE, COL_INDUSTRY, COL_MARKET_CAP, COL_SECTOR,
    COL_SHORT_NAME, COL_SYMBOL, COL_WEIGHT, SECTOR_STATS_COLUMNS,
};
pub use company::{
    compute_sector_stats, normalize_symbol, Company, IndexHistoryPoint, SectorStats,
};
pub use layout::{
    COMPANIES_TABLE, INDEX_HISTORY_TABLE, INDEX_VALUE_ALIAS, META_COMPANIES_ROWS,
    META_INDEX_HISTORY_ROWS, META_INDEX_VALUE_COLUMN, META_LOAD_COMPLETED, META_SCHEMA_VERSION,
    META_SECTOR_STATS_ROWS, META_TABLE, SECTOR_STATS_TABLE, STORE_SCHEMA_VERSION,
};
pub use table::{Cell, Record, Table};

pub const CRATE_NAME: &str = "marketpulse-model";
