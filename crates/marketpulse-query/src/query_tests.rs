// SPDX-License-Identifier: Apache-2.0

use super::*;
use marketpulse_model::Cell;

fn setup_db() -> Connection {
    let conn = Connection::open_in_memory().expect("open memory db");
    conn.execute_batch(
        "
            CREATE TABLE companies (
              Symbol TEXT,
              Shortname TEXT,
              Sector TEXT,
              Industry TEXT,
              Currentprice REAL,
              Marketcap INTEGER,
              Ebitda INTEGER,
              Weight REAL
            );
            CREATE TABLE sector_stats (
              Sector TEXT PRIMARY KEY,
              n_companies INTEGER NOT NULL,
              avg_marketcap REAL,
              total_weight REAL NOT NULL
            ) WITHOUT ROWID;
            CREATE TABLE index_history (Date TEXT, SandP500 REAL);
            CREATE TABLE marketpulse_meta (k TEXT PRIMARY KEY, v TEXT NOT NULL) WITHOUT ROWID;

            INSERT INTO companies VALUES
              ('AAPL', 'Apple', 'Technology', 'Consumer Electronics', 250.0, 3000, 130, 0.06),
              ('MSFT', 'Microsoft', 'Technology', 'Software', 430.0, 2500, 120, 0.05),
              ('XOM', 'Exxon', 'Energy', 'Oil & Gas', 105.0, 450, 60, 0.01),
              ('ZZZ', 'Nowhere', NULL, NULL, 1.0, NULL, NULL, NULL);
            INSERT INTO sector_stats VALUES
              ('Technology', 2, 2750.0, 0.11),
              ('Energy', 1, 450.0, 0.01);
            INSERT INTO index_history VALUES
              ('2024-12-18', 5872.16),
              ('2024-12-20', 5930.85),
              ('2024-12-19', 5867.08);
            INSERT INTO marketpulse_meta VALUES
              ('schema_version', '1'),
              ('load_completed', 'true'),
              ('index_value_column', 'SandP500'),
              ('companies_rows', '4'),
              ('index_history_rows', '3'),
              ('sector_stats_rows', '2');
            ",
    )
    .expect("schema");
    conn
}

fn symbols(table: &Table) -> Vec<&str> {
    table
        .column("Symbol")
        .into_iter()
        .filter_map(Cell::as_str)
        .collect()
}

#[test]
fn companies_are_projected_in_fixed_order_and_sorted_by_market_cap() {
    let conn = setup_db();
    let table = list_companies(&conn, 0, None).expect("companies");
    assert_eq!(table.columns, COMPANY_COLUMNS.map(String::from).to_vec());
    // NULL market caps sort last.
    assert_eq!(symbols(&table), vec!["AAPL", "MSFT", "XOM", "ZZZ"]);
}

#[test]
fn company_limit_and_sector_filter_combine() {
    let conn = setup_db();
    let table = list_companies(&conn, 1, Some("Technology")).expect("companies");
    assert_eq!(symbols(&table), vec!["AAPL"]);
    let none = list_companies(&conn, 10, Some("technology")).expect("companies");
    assert!(none.is_empty());
}

#[test]
fn company_lookup_normalizes_symbol_and_returns_every_column() {
    let conn = setup_db();
    let table = get_company(&conn, "  msft ").expect("company");
    assert_eq!(table.len(), 1);
    assert!(table.columns.iter().any(|c| c == "Ebitda"));
    let missing = get_company(&conn, "ZZZZNOPE").expect("lookup");
    assert!(missing.is_empty());
}

#[test]
fn sectors_exclude_null_and_sort_ascending() {
    let conn = setup_db();
    let table = list_sectors(&conn).expect("sectors");
    assert_eq!(table.columns, vec!["Sector".to_string()]);
    let names: Vec<&str> = table.column("Sector").into_iter().filter_map(Cell::as_str).collect();
    assert_eq!(names, vec!["Energy", "Technology"]);
}

#[test]
fn sector_join_orders_by_weight_then_market_cap() {
    let conn = setup_db();
    let table = list_sector_companies(&conn, None).expect("join");
    assert_eq!(
        table.columns,
        [
            "Symbol",
            "Shortname",
            "Sector",
            "Industry",
            "Currentprice",
            "Marketcap",
            "n_companies",
            "avg_marketcap",
            "total_weight"
        ]
        .map(String::from)
        .to_vec()
    );
    assert_eq!(symbols(&table), vec!["AAPL", "MSFT", "XOM"]);

    let energy = list_sector_companies(&conn, Some("Energy")).expect("join");
    assert_eq!(symbols(&energy), vec!["XOM"]);
    assert_eq!(energy.rows[0][6], Cell::Integer(1));
    assert!(list_sector_companies(&conn, Some("Nope")).expect("join").is_empty());
}

#[test]
fn index_history_is_newest_first_with_value_alias() {
    let conn = setup_db();
    let table = list_index_history(&conn, 2).expect("history");
    assert_eq!(table.columns, vec!["Date".to_string(), "sp500".to_string()]);
    let dates: Vec<&str> = table.column("Date").into_iter().filter_map(Cell::as_str).collect();
    assert_eq!(dates, vec!["2024-12-20", "2024-12-19"]);
    assert_eq!(list_index_history(&conn, 3).expect("history").len(), 3);
    assert!(list_index_history(&conn, 0).expect("history").is_empty());
}

#[test]
fn unsafe_index_value_column_in_metadata_is_rejected() {
    let conn = setup_db();
    conn.execute(
        "UPDATE marketpulse_meta SET v = 'x\"; DROP TABLE companies; --' WHERE k = 'index_value_column'",
        [],
    )
    .expect("tamper");
    let err = list_index_history(&conn, 5).expect_err("must reject");
    assert_eq!(err.code, QueryErrorCode::Schema);
}

#[test]
fn unloaded_store_reports_schema_errors() {
    let conn = Connection::open_in_memory().expect("open memory db");
    assert_eq!(
        list_companies(&conn, 5, None).expect_err("no tables").code,
        QueryErrorCode::Schema
    );
    assert_eq!(
        store_metadata(&conn).expect_err("no meta").code,
        QueryErrorCode::Schema
    );
}

#[test]
fn missing_table_is_schema_but_broken_sql_is_not() {
    let conn = setup_db();
    conn.execute_batch("DROP TABLE sector_stats;").expect("drop");
    let err = list_sector_companies(&conn, None).expect_err("no stats table");
    assert_eq!(err.code, QueryErrorCode::Schema);
    assert!(err.message.contains("sector_stats"));
    assert_eq!(list_companies(&conn, 1, None).expect("companies").len(), 1);

    let err = query_table(&conn, "SELECT nope FROM companies", &[]).expect_err("bad column");
    assert_eq!(err.code, QueryErrorCode::Sql);
}

#[test]
fn metadata_reads_counts_and_value_column() {
    let conn = setup_db();
    let meta = store_metadata(&conn).expect("meta");
    assert!(meta.load_completed);
    assert_eq!(meta.schema_version, Some(1));
    assert_eq!(meta.index_value_column.as_deref(), Some("SandP500"));
    assert_eq!(meta.companies_rows, 4);
    assert_eq!(meta.sector_stats_rows, 2);
}
