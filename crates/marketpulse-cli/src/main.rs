// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

use clap::{Parser, Subcommand, ValueEnum};
use marketpulse_api::params::{DEFAULT_COMPANY_LIMIT, DEFAULT_INDEX_LIMIT};
use marketpulse_ingest::{initialize, LoadOptions, COMPANIES_SNAPSHOT_FILE, INDEX_SNAPSHOT_FILE};
use marketpulse_query::{
    get_company, list_companies, list_index_history, list_sector_companies, list_sectors,
    store_metadata,
};
use rusqlite::{Connection, OpenFlags};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "marketpulse")]
#[command(about = "MarketPulse store operations CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load the CSV snapshots into the store.
    Load {
        #[arg(long, default_value = "assets")]
        assets_dir: PathBuf,
        #[arg(long)]
        companies: Option<PathBuf>,
        #[arg(long)]
        index: Option<PathBuf>,
        #[arg(long)]
        db: PathBuf,
        #[arg(long, default_value_t = false)]
        rebuild: bool,
    },
    /// Run one read operation and print the rows as JSON.
    Query {
        #[arg(value_enum)]
        op: QueryOp,
        #[arg(long)]
        db: PathBuf,
        #[arg(long)]
        limit: Option<usize>,
        #[arg(long)]
        sector: Option<String>,
        #[arg(long)]
        symbol: Option<String>,
    },
    /// Print store metadata and index names.
    InspectDb {
        #[arg(long)]
        db: PathBuf,
    },
    Version,
}

#[derive(Clone, Copy, ValueEnum)]
enum QueryOp {
    Companies,
    Company,
    Sectors,
    SectorCompanies,
    Index,
}

fn main() -> ExitCode {
    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), String> {
    match cli.command {
        Commands::Load {
            assets_dir,
            companies,
            index,
            db,
            rebuild,
        } => {
            let opts = LoadOptions {
                companies_csv: companies.unwrap_or_else(|| assets_dir.join(COMPANIES_SNAPSHOT_FILE)),
                index_csv: index.unwrap_or_else(|| assets_dir.join(INDEX_SNAPSHOT_FILE)),
                db_path: db,
                rebuild,
            };
            let report = initialize(&opts).map_err(|e| e.to_string())?;
            emit(&serde_json::to_value(&report).map_err(|e| e.to_string())?)
        }
        Commands::Query {
            op,
            db,
            limit,
            sector,
            symbol,
        } => run_query(&db, op, limit, sector.as_deref(), symbol.as_deref()),
        Commands::InspectDb { db } => inspect_db(&db),
        Commands::Version => emit(&json!({
            "name": "marketpulse",
            "version": env!("CARGO_PKG_VERSION"),
        })),
    }
}

fn emit(value: &Value) -> Result<(), String> {
    let text = serde_json::to_string_pretty(value).map_err(|e| e.to_string())?;
    println!("{text}");
    Ok(())
}

fn open_read_only(db: &Path) -> Result<Connection, String> {
    Connection::open_with_flags(db, OpenFlags::SQLITE_OPEN_READ_ONLY)
        .map_err(|e| format!("cannot open store {}: {e}", db.display()))
}

fn run_query(
    db: &Path,
    op: QueryOp,
    limit: Option<usize>,
    sector: Option<&str>,
    symbol: Option<&str>,
) -> Result<(), String> {
    let conn = open_read_only(db)?;
    let table = match op {
        QueryOp::Companies => {
            list_companies(&conn, limit.unwrap_or(DEFAULT_COMPANY_LIMIT), sector)
        }
        QueryOp::Company => {
            let symbol = symbol.ok_or_else(|| "query company requires --symbol".to_string())?;
            get_company(&conn, symbol)
        }
        QueryOp::Sectors => list_sectors(&conn),
        QueryOp::SectorCompanies => list_sector_companies(&conn, sector),
        QueryOp::Index => list_index_history(&conn, limit.unwrap_or(DEFAULT_INDEX_LIMIT)),
    }
    .map_err(|e| e.to_string())?;
    emit(&serde_json::to_value(&table).map_err(|e| e.to_string())?)
}

fn inspect_db(db: &Path) -> Result<(), String> {
    let conn = open_read_only(db)?;
    let meta = store_metadata(&conn).map_err(|e| e.to_string())?;
    let mut stmt = conn
        .prepare("SELECT name FROM sqlite_master WHERE type='index' AND name NOT LIKE 'sqlite_%' ORDER BY name")
        .map_err(|e| e.to_string())?;
    let indexes = stmt
        .query_map([], |row| row.get::<_, String>(0))
        .map_err(|e| e.to_string())?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| e.to_string())?;
    emit(&json!({
        "db": db.display().to_string(),
        "metadata": meta,
        "indexes": indexes,
    }))
}
