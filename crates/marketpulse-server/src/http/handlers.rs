// SPDX-License-Identifier: Apache-2.0

use crate::http::html::render_landing_page;
use crate::http::response_contract::{data_response, ApiFailure};
use crate::AppState;
use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use marketpulse_api::{
    openapi_v1_spec, parse_companies_params, parse_index_params, parse_response_format, ApiError,
    ResponseFormat,
};
use marketpulse_model::{normalize_symbol, Cell, COL_SECTOR};
use marketpulse_query::{
    get_company, list_companies, list_index_history, list_sector_companies, list_sectors,
};
use serde_json::json;
use std::collections::BTreeMap;

type QueryMap = Query<BTreeMap<String, String>>;

fn ensure_ready(state: &AppState) -> Result<(), ApiError> {
    if state.is_ready() {
        Ok(())
    } else {
        Err(ApiError::not_ready())
    }
}

fn response_format(
    query: &BTreeMap<String, String>,
    headers: &HeaderMap,
) -> Result<ResponseFormat, ApiError> {
    let accept = headers.get(header::ACCEPT).and_then(|v| v.to_str().ok());
    parse_response_format(query, accept)
}

pub(crate) async fn landing_handler() -> Html<String> {
    Html(render_landing_page(env!("CARGO_PKG_VERSION")))
}

pub(crate) async fn health_handler(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "uptime_seconds": state.started.elapsed().as_secs(),
    }))
}

pub(crate) async fn readyz_handler(State(state): State<AppState>) -> Result<Response, ApiFailure> {
    ensure_ready(&state)?;
    let meta = state.store.metadata().await?;
    if !meta.load_completed {
        return Err(ApiError::not_ready().into());
    }
    Ok((StatusCode::OK, Json(json!({"status": "ready", "store": meta}))).into_response())
}

pub(crate) async fn openapi_handler() -> Json<serde_json::Value> {
    Json(openapi_v1_spec())
}

pub(crate) async fn companies_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): QueryMap,
) -> Result<Response, ApiFailure> {
    ensure_ready(&state)?;
    let format = response_format(&query, &headers)?;
    let params = parse_companies_params(&query, state.config.default_company_limit)?;
    let table = state
        .store
        .with_connection(move |conn| list_companies(conn, params.limit, params.sector.as_deref()))
        .await?;
    Ok(data_response(format, "Companies", &table, &table))
}

pub(crate) async fn company_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(symbol): Path<String>,
    Query(query): QueryMap,
) -> Result<Response, ApiFailure> {
    ensure_ready(&state)?;
    let format = response_format(&query, &headers)?;
    let lookup = symbol.clone();
    let table = state
        .store
        .with_connection(move |conn| get_company(conn, &lookup))
        .await?;
    let Some(record) = table.first() else {
        return Err(ApiError::not_found(
            "Symbol not found",
            json!({"symbol": normalize_symbol(&symbol)}),
        )
        .into());
    };
    let title = format!("Company {}", normalize_symbol(&symbol));
    Ok(data_response(format, &title, &table, record))
}

pub(crate) async fn sectors_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): QueryMap,
) -> Result<Response, ApiFailure> {
    ensure_ready(&state)?;
    let format = response_format(&query, &headers)?;
    let table = state.store.with_connection(list_sectors).await?;
    let names: Vec<&str> = table
        .column(COL_SECTOR)
        .into_iter()
        .filter_map(Cell::as_str)
        .collect();
    Ok(data_response(format, "Sectors", &table, names))
}

pub(crate) async fn sector_companies_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(sector): Path<String>,
    Query(query): QueryMap,
) -> Result<Response, ApiFailure> {
    ensure_ready(&state)?;
    let format = response_format(&query, &headers)?;
    let filter = sector.clone();
    let table = state
        .store
        .with_connection(move |conn| list_sector_companies(conn, Some(&filter)))
        .await?;
    if table.is_empty() {
        return Err(ApiError::not_found("Sector not found", json!({"sector": sector})).into());
    }
    Ok(data_response(format, &format!("{sector} companies"), &table, &table))
}

pub(crate) async fn index_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): QueryMap,
) -> Result<Response, ApiFailure> {
    ensure_ready(&state)?;
    let format = response_format(&query, &headers)?;
    let params = parse_index_params(&query, state.config.default_index_limit)?;
    let table = state
        .store
        .with_connection(move |conn| list_index_history(conn, params.limit))
        .await?;
    Ok(data_response(format, "S&P 500 index history", &table, &table))
}
