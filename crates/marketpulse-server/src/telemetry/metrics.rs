// SPDX-License-Identifier: Apache-2.0

use crate::AppState;
use axum::extract::State;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;

const METRIC_PREFIX: &str = "marketpulse";
const CONTENT_TYPE: &str = "text/plain; version=0.0.4";
/// Route label for requests no route matched.
pub(crate) const UNMATCHED_ROUTE: &str = "unmatched";

#[derive(Debug, Default)]
pub struct RequestMetrics {
    requests_total: AtomicU64,
    paths: Mutex<BTreeMap<String, u64>>,
    statuses: Mutex<BTreeMap<u16, u64>>,
}

impl RequestMetrics {
    /// Counted on arrival, so a scrape includes itself.
    pub(crate) async fn observe_arrival(&self, route: &str) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);
        *self.paths.lock().await.entry(route.to_string()).or_insert(0) += 1;
    }

    pub(crate) async fn observe_status(&self, status: StatusCode) {
        *self.statuses.lock().await.entry(status.as_u16()).or_insert(0) += 1;
    }

    #[must_use]
    pub fn requests_total(&self) -> u64 {
        self.requests_total.load(Ordering::Relaxed)
    }
}

/// `/company/:symbol` becomes `path__company__symbol`.
#[must_use]
pub(crate) fn path_metric_name(route: &str) -> String {
    let sanitized: String = route
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    format!("path_{sanitized}")
}

pub(crate) async fn render(state: &AppState) -> String {
    let mut body = String::new();
    let _ = writeln!(body, "# TYPE {METRIC_PREFIX}_uptime_seconds gauge");
    let _ = writeln!(
        body,
        "{METRIC_PREFIX}_uptime_seconds {}",
        state.started.elapsed().as_secs()
    );
    let _ = writeln!(body, "# TYPE {METRIC_PREFIX}_requests_total counter");
    let _ = writeln!(
        body,
        "{METRIC_PREFIX}_requests_total {}",
        state.metrics.requests_total()
    );
    for (route, count) in state.metrics.paths.lock().await.iter() {
        let _ = writeln!(body, "{METRIC_PREFIX}_{} {count}", path_metric_name(route));
    }
    let statuses = state.metrics.statuses.lock().await;
    if !statuses.is_empty() {
        let _ = writeln!(body, "# TYPE {METRIC_PREFIX}_responses_total counter");
    }
    for (status, count) in statuses.iter() {
        let _ = writeln!(
            body,
            "{METRIC_PREFIX}_responses_total{{status=\"{status}\"}} {count}"
        );
    }
    body
}

pub(crate) async fn metrics_handler(State(state): State<AppState>) -> Response {
    let mut resp = (StatusCode::OK, render(&state).await).into_response();
    resp.headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static(CONTENT_TYPE));
    resp
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn route_templates_become_metric_names() {
        assert_eq!(path_metric_name("/companies"), "path__companies");
        assert_eq!(path_metric_name("/company/:symbol"), "path__company__symbol");
        assert_eq!(path_metric_name("/"), "path__");
        assert_eq!(path_metric_name("/v1/openapi.json"), "path__v1_openapi_json");
    }

    #[tokio::test]
    async fn counters_accumulate_per_route_and_status() {
        let m = RequestMetrics::default();
        m.observe_arrival("/companies").await;
        m.observe_arrival("/companies").await;
        m.observe_arrival("/sectors").await;
        m.observe_status(StatusCode::OK).await;
        m.observe_status(StatusCode::NOT_FOUND).await;
        assert_eq!(m.requests_total(), 3);
        assert_eq!(m.paths.lock().await.get("/companies"), Some(&2));
        assert_eq!(m.statuses.lock().await.get(&404), Some(&1));
    }
}
