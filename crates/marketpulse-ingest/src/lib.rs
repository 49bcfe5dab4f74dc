// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

mod extract;
mod logging;
mod snapshot;
mod sqlite;

use marketpulse_model::compute_sector_stats;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

pub const CRATE_NAME: &str = "marketpulse-ingest";
pub const COMPANIES_SNAPSHOT_FILE: &str = "sp500_companies.csv";
pub const INDEX_SNAPSHOT_FILE: &str = "sp500_index.csv";

pub use logging::{LoadEvent, LoadLog, LoadStage};
pub use snapshot::{read_snapshot, ColumnKind, Snapshot, SnapshotColumn};
pub use sqlite::store_is_loaded;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[non_exhaustive]
pub enum LoadErrorCode {
    /// Snapshot missing, unreadable or malformed.
    DataSource,
    /// Store unreachable or the replace transaction failed.
    Storage,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadError {
    pub code: LoadErrorCode,
    pub message: String,
}

impl LoadError {
    #[must_use]
    pub fn new(code: LoadErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn data_source(message: impl Into<String>) -> Self {
        Self::new(LoadErrorCode::DataSource, message)
    }

    #[must_use]
    pub fn storage(message: impl Into<String>) -> Self {
        Self::new(LoadErrorCode::Storage, message)
    }
}

impl Display for LoadError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let kind = match self.code {
            LoadErrorCode::DataSource => "DataSourceError",
            LoadErrorCode::Storage => "StorageError",
        };
        write!(f, "{kind}: {}", self.message)
    }
}

impl std::error::Error for LoadError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadOptions {
    pub companies_csv: PathBuf,
    pub index_csv: PathBuf,
    pub db_path: PathBuf,
    pub rebuild: bool,
}

impl LoadOptions {
    /// Snapshots under their conventional names inside `assets_dir`.
    #[must_use]
    pub fn from_assets_dir(assets_dir: &Path, db_path: &Path, rebuild: bool) -> Self {
        Self {
            companies_csv: assets_dir.join(COMPANIES_SNAPSHOT_FILE),
            index_csv: assets_dir.join(INDEX_SNAPSHOT_FILE),
            db_path: db_path.to_path_buf(),
            rebuild,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct LoadReport {
    pub db_path: PathBuf,
    /// The store already held a completed load and `rebuild` was off.
    pub skipped: bool,
    pub companies: u64,
    pub index_points: u64,
    pub sectors: u64,
    pub index_value_column: Option<String>,
    pub events: Vec<LoadEvent>,
}

/// Loads both snapshots into the store and derives `sector_stats`.
///
/// Idempotent: a store holding a completed load is left untouched unless
/// `opts.rebuild` is set. Snapshots are fully decoded and validated before
/// the store is written, and the write is one transaction, so a failure
/// leaves the previous tables in place.
pub fn initialize(opts: &LoadOptions) -> Result<LoadReport, LoadError> {
    let mut log = LoadLog::default();
    log.emit(
        LoadStage::Prepare,
        "load.start",
        logging::fields([
            ("db_path", opts.db_path.display().to_string()),
            ("rebuild", opts.rebuild.to_string()),
        ]),
    );

    let mut conn = sqlite::open_store(&opts.db_path)?;
    if !opts.rebuild && store_is_loaded(&conn) {
        log.emit(LoadStage::Finalize, "load.skipped", Default::default());
        return Ok(LoadReport {
            db_path: opts.db_path.clone(),
            skipped: true,
            companies: 0,
            index_points: 0,
            sectors: 0,
            index_value_column: None,
            events: log.into_events(),
        });
    }

    log.emit(LoadStage::Decode, "load.decode.begin", Default::default());
    let mut companies = read_snapshot(&opts.companies_csv, &extract::COMPANY_TEXT_COLUMNS)?;
    let company_rows = extract::extract_companies(&mut companies)?;
    let mut index_history = read_snapshot(&opts.index_csv, &extract::INDEX_TEXT_COLUMNS)?;
    let index_value_column = extract::prepare_index_history(&mut index_history)?;
    let sector_stats = compute_sector_stats(&company_rows);
    log.emit(
        LoadStage::Decode,
        "load.decode.complete",
        logging::fields([
            ("companies", companies.rows.len().to_string()),
            ("index_points", index_history.rows.len().to_string()),
            ("sectors", sector_stats.len().to_string()),
        ]),
    );

    log.emit(LoadStage::Persist, "load.persist.begin", Default::default());
    sqlite::write_store(
        &mut conn,
        &sqlite::WriteStoreInput {
            companies: &companies,
            index_history: &index_history,
            index_value_column: &index_value_column,
            sector_stats: &sector_stats,
        },
    )?;
    log.emit(LoadStage::Finalize, "load.persist.complete", Default::default());

    Ok(LoadReport {
        db_path: opts.db_path.clone(),
        skipped: false,
        companies: companies.rows.len() as u64,
        index_points: index_history.rows.len() as u64,
        sectors: sector_stats.len() as u64,
        index_value_column: Some(index_value_column),
        events: log.into_events(),
    })
}
