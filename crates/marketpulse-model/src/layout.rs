// SPDX-License-Identifier: Apache-2.0

//! Store layout shared by the loader (writer) and the query layer (reader).

pub const STORE_SCHEMA_VERSION: i64 = 1;
pub const COMPANIES_TABLE: &str = "companies";
pub const INDEX_HISTORY_TABLE: &str = "index_history";
pub const SECTOR_STATS_TABLE: &str = "sector_stats";
pub const META_TABLE: &str = "marketpulse_meta";

pub const META_SCHEMA_VERSION: &str = "schema_version";
pub const META_LOAD_COMPLETED: &str = "load_completed";
pub const META_INDEX_VALUE_COLUMN: &str = "index_value_column";
pub const META_COMPANIES_ROWS: &str = "companies_rows";
pub const META_INDEX_HISTORY_ROWS: &str = "index_history_rows";
pub const META_SECTOR_STATS_ROWS: &str = "sector_stats_rows";

/// JSON field name of the index value in history listings.
pub const INDEX_VALUE_ALIAS: &str = "sp500";
