// SPDX-License-Identifier: Apache-2.0

use std::path::PathBuf;

use criterion::{criterion_group, criterion_main, Criterion};
use marketpulse_ingest::{initialize, LoadOptions};
use marketpulse_query::{
    get_company, list_companies, list_index_history, list_sector_companies, list_sectors,
};
use rusqlite::{Connection, OpenFlags};

fn bench_queries(c: &mut Criterion) {
    let assets = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../assets");
    let tmp = tempfile::tempdir().expect("tmp");
    let db = tmp.path().join("bench.db");
    initialize(&LoadOptions::from_assets_dir(&assets, &db, true)).expect("load");
    let conn = Connection::open_with_flags(&db, OpenFlags::SQLITE_OPEN_READ_ONLY).expect("open");

    c.bench_function("list_companies_top50", |b| {
        b.iter(|| list_companies(&conn, 50, None).expect("companies"))
    });
    c.bench_function("list_companies_by_sector", |b| {
        b.iter(|| list_companies(&conn, 0, Some("Technology")).expect("companies"))
    });
    c.bench_function("get_company", |b| {
        b.iter(|| get_company(&conn, "msft").expect("company"))
    });
    c.bench_function("list_sectors", |b| {
        b.iter(|| list_sectors(&conn).expect("sectors"))
    });
    c.bench_function("list_sector_companies", |b| {
        b.iter(|| list_sector_companies(&conn, None).expect("join"))
    });
    c.bench_function("list_index_history_100", |b| {
        b.iter(|| list_index_history(&conn, 100).expect("history"))
    });
}

criterion_group!(benches, bench_queries);
criterion_main!(benches);
