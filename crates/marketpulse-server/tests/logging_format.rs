// SPDX-License-Identifier: Apache-2.0

use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use marketpulse_ingest::{initialize, LoadOptions};
use marketpulse_server::{build_router, AppState, ServerConfig};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::Level;
use tracing_subscriber::fmt::MakeWriter;

#[derive(Clone, Default)]
struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

struct BufferWriter(Arc<Mutex<Vec<u8>>>);

impl<'a> MakeWriter<'a> for SharedBuffer {
    type Writer = BufferWriter;

    fn make_writer(&'a self) -> Self::Writer {
        BufferWriter(Arc::clone(&self.0))
    }
}

impl io::Write for BufferWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut guard = self
            .0
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "lock poisoned"))?;
        guard.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn json_lines(sink: &SharedBuffer) -> Vec<serde_json::Value> {
    let bytes = sink.0.lock().expect("lock output").clone();
    String::from_utf8(bytes)
        .expect("utf8 log output")
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| serde_json::from_str(l).expect("json log line"))
        .collect()
}

fn assets_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .and_then(|p| p.parent())
        .expect("workspace root")
        .join("assets")
}

#[test]
fn startup_load_events_are_json_lines() {
    let sink = SharedBuffer::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(sink.clone())
        .json()
        .with_max_level(Level::INFO)
        .finish();

    let tmp = tempfile::tempdir().expect("tempdir");
    let db = tmp.path().join("marketpulse.db");
    let report = tracing::subscriber::with_default(subscriber, || {
        initialize(&LoadOptions::from_assets_dir(&assets_dir(), &db, false))
    })
    .expect("load");

    let lines = json_lines(&sink);
    let stages: Vec<&str> = lines
        .iter()
        .filter(|l| l["fields"]["message"] == "load event")
        .filter_map(|l| l["fields"]["stage"].as_str())
        .collect();
    assert_eq!(stages.len(), report.events.len());
    assert_eq!(stages.first(), Some(&"prepare"));
    assert_eq!(stages.last(), Some(&"finalize"));
    let first = lines
        .iter()
        .find(|l| l["fields"]["message"] == "load event")
        .expect("load event line");
    assert_eq!(first["level"], "INFO");
    assert_eq!(first["target"], "marketpulse_ingest::logging");
    assert!(first["fields"]["event"].is_string());
}

// Current-thread runtime: the server task shares the test thread, so the
// thread-local subscriber sees its events.
#[tokio::test(flavor = "current_thread")]
async fn request_log_line_carries_span_and_status() {
    let sink = SharedBuffer::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(sink.clone())
        .json()
        .with_current_span(true)
        .with_max_level(Level::INFO)
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let tmp = tempfile::tempdir().expect("tempdir");
    let app = build_router(AppState::new(ServerConfig {
        db_path: tmp.path().join("unused.db"),
        ..ServerConfig::default()
    }));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move { axum::serve(listener, app).await.expect("serve app") });

    let mut stream = tokio::net::TcpStream::connect(addr).await.expect("connect");
    stream
        .write_all(
            format!("GET /health HTTP/1.1\r\nHost: {addr}\r\nx-request-id: trace-me\r\nConnection: close\r\n\r\n")
                .as_bytes(),
        )
        .await
        .expect("write request");
    let mut response = String::new();
    stream
        .read_to_string(&mut response)
        .await
        .expect("read response");
    assert!(response.starts_with("HTTP/1.1 200"));

    let lines = json_lines(&sink);
    let line = lines
        .iter()
        .find(|l| l["fields"]["message"] == "GET /health -> 200")
        .expect("request log line");
    assert_eq!(line["fields"]["status"], 200);
    assert_eq!(line["span"]["name"], "http.request");
    assert_eq!(line["span"]["request_id"], "trace-me");
    assert_eq!(line["span"]["route"], "/health");
}
