// SPDX-License-Identifier: Apache-2.0

use marketpulse_query::{QueryError, StoreMetadata};
use rusqlite::{Connection, OpenFlags};
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::time::timeout;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The store file could not be opened read-only.
    Unavailable(String),
    Timeout(Duration),
    Query(QueryError),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable(msg) => write!(f, "store unavailable: {msg}"),
            Self::Timeout(d) => write!(f, "store query timed out after {}ms", d.as_millis()),
            Self::Query(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for StoreError {}

/// Read-only handle on the loaded store. Each call opens its own connection
/// on the blocking pool; the semaphore caps how many are open at once.
#[derive(Debug)]
pub struct MarketStore {
    db_path: PathBuf,
    permits: Arc<Semaphore>,
    query_timeout: Duration,
}

impl MarketStore {
    #[must_use]
    pub fn new(db_path: impl Into<PathBuf>, max_connections: usize, query_timeout: Duration) -> Self {
        Self {
            db_path: db_path.into(),
            permits: Arc::new(Semaphore::new(max_connections.max(1))),
            query_timeout,
        }
    }

    pub async fn with_connection<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, QueryError> + Send + 'static,
    {
        let permit = Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .map_err(|_| StoreError::Unavailable("store handle closed".to_string()))?;
        let path = self.db_path.clone();
        let task = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            let started = Instant::now();
            let conn = open_read_only(&path)?;
            let out = f(&conn).map_err(StoreError::Query);
            debug!(elapsed_us = started.elapsed().as_micros() as u64, "store read");
            out
        });
        match timeout(self.query_timeout, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => Err(StoreError::Unavailable(format!("store task failed: {e}"))),
            Err(_) => Err(StoreError::Timeout(self.query_timeout)),
        }
    }

    pub async fn metadata(&self) -> Result<StoreMetadata, StoreError> {
        self.with_connection(marketpulse_query::store_metadata).await
    }
}

fn open_read_only(path: &Path) -> Result<Connection, StoreError> {
    let conn = Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .map_err(|e| StoreError::Unavailable(format!("{}: {e}", path.display())))?;
    conn.execute_batch("PRAGMA query_only=ON; PRAGMA temp_store=MEMORY;")
        .map_err(|e| StoreError::Unavailable(e.to_string()))?;
    Ok(conn)
}

#[cfg(test)]
mod tests {
    use super::*;
    use marketpulse_query::QueryErrorCode;

    #[tokio::test]
    async fn missing_store_file_is_unavailable() {
        let tmp = tempfile::tempdir().expect("tmp");
        let store = MarketStore::new(tmp.path().join("absent.db"), 2, Duration::from_secs(1));
        let err = store.metadata().await.expect_err("no file");
        assert!(matches!(err, StoreError::Unavailable(_)), "{err}");
    }

    #[tokio::test]
    async fn connections_are_read_only() {
        let tmp = tempfile::tempdir().expect("tmp");
        let db = tmp.path().join("ro.db");
        Connection::open(&db)
            .and_then(|c| c.execute_batch("CREATE TABLE t (x INTEGER);"))
            .expect("seed");
        let store = MarketStore::new(&db, 1, Duration::from_secs(1));
        let err = store
            .with_connection(|conn| {
                conn.execute("INSERT INTO t VALUES (1)", [])
                    .map_err(QueryError::from)
            })
            .await
            .expect_err("write must fail");
        match err {
            StoreError::Query(e) => assert_eq!(e.code, QueryErrorCode::Sql),
            other => panic!("unexpected {other}"),
        }
    }

    #[tokio::test]
    async fn empty_store_reports_schema_error() {
        let tmp = tempfile::tempdir().expect("tmp");
        let db = tmp.path().join("empty.db");
        Connection::open(&db)
            .and_then(|c| c.execute_batch("CREATE TABLE t (x INTEGER);"))
            .expect("seed");
        let store = MarketStore::new(&db, 1, Duration::from_secs(1));
        match store.metadata().await.expect_err("no meta") {
            StoreError::Query(e) => assert_eq!(e.code, QueryErrorCode::Schema),
            other => panic!("unexpected {other}"),
        }
    }
}
