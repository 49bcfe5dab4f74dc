// SPDX-License-Identifier: Apache-2.0

use crate::http::html::render_table_page;
use crate::store::StoreError;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use marketpulse_api::{map_error, ApiError, ResponseFormat};
use marketpulse_model::Table;
use marketpulse_query::QueryErrorCode;
use serde::Serialize;
use serde_json::json;
use tracing::warn;

#[must_use]
pub(crate) fn api_error_status(err: &ApiError) -> StatusCode {
    StatusCode::from_u16(map_error(err).status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

#[must_use]
pub(crate) fn api_error_response(err: ApiError) -> Response {
    let status = api_error_status(&err);
    let mut resp = (status, Json(json!({"error": err}))).into_response();
    if status == StatusCode::SERVICE_UNAVAILABLE {
        resp.headers_mut()
            .insert("retry-after", HeaderValue::from_static("3"));
    }
    resp
}

/// Handler error: always rendered as the JSON error envelope.
#[derive(Debug)]
pub(crate) struct ApiFailure(pub ApiError);

impl IntoResponse for ApiFailure {
    fn into_response(self) -> Response {
        api_error_response(self.0)
    }
}

impl From<ApiError> for ApiFailure {
    fn from(value: ApiError) -> Self {
        Self(value)
    }
}

impl From<StoreError> for ApiFailure {
    fn from(value: StoreError) -> Self {
        Self(store_error_to_api(&value))
    }
}

#[must_use]
pub(crate) fn store_error_to_api(err: &StoreError) -> ApiError {
    match err {
        StoreError::Query(q) if q.code == QueryErrorCode::Sql => {
            warn!(error = %q, "store query failed");
            ApiError::internal("store query failed")
        }
        other => {
            warn!(error = %other, "store unavailable");
            ApiError::store_unavailable(other.to_string())
        }
    }
}

/// JSON gets `json`; HTML renders `table` regardless of the JSON shape.
pub(crate) fn data_response<T: Serialize>(
    format: ResponseFormat,
    title: &str,
    table: &Table,
    json: T,
) -> Response {
    match format {
        ResponseFormat::Html => Html(render_table_page(title, table)).into_response(),
        ResponseFormat::Json => Json(json).into_response(),
    }
}
