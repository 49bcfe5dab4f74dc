// SPDX-License-Identifier: Apache-2.0

use crate::ApiError;
use std::collections::BTreeMap;

pub const DEFAULT_COMPANY_LIMIT: usize = 50;
pub const DEFAULT_INDEX_LIMIT: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseFormat {
    #[default]
    Json,
    Html,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompaniesParams {
    /// `0` means every row.
    pub limit: usize,
    pub sector: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexParams {
    pub limit: usize,
}

pub fn parse_companies_params(
    query: &BTreeMap<String, String>,
    default_limit: usize,
) -> Result<CompaniesParams, ApiError> {
    Ok(CompaniesParams {
        limit: parse_limit(query, default_limit)?,
        sector: query.get("sector").filter(|s| !s.is_empty()).cloned(),
    })
}

pub fn parse_index_params(
    query: &BTreeMap<String, String>,
    default_limit: usize,
) -> Result<IndexParams, ApiError> {
    Ok(IndexParams {
        limit: parse_limit(query, default_limit)?,
    })
}

fn parse_limit(query: &BTreeMap<String, String>, default_limit: usize) -> Result<usize, ApiError> {
    match query.get("limit") {
        Some(raw) => raw
            .trim()
            .parse::<usize>()
            .map_err(|_| ApiError::invalid_param("limit", raw)),
        None => Ok(default_limit),
    }
}

/// An explicit `format` wins; otherwise HTML only when the `Accept` header
/// ranks `text/html` strictly above JSON.
pub fn parse_response_format(
    query: &BTreeMap<String, String>,
    accept: Option<&str>,
) -> Result<ResponseFormat, ApiError> {
    if let Some(raw) = query.get("format") {
        return match raw.to_ascii_lowercase().as_str() {
            "json" => Ok(ResponseFormat::Json),
            "html" => Ok(ResponseFormat::Html),
            _ => Err(ApiError::invalid_param("format", raw)),
        };
    }
    let Some(accept) = accept else {
        return Ok(ResponseFormat::Json);
    };
    let html = media_quality(accept, "text/html");
    let json = media_quality(accept, "application/json");
    Ok(if html > json {
        ResponseFormat::Html
    } else {
        ResponseFormat::Json
    })
}

/// Highest quality any range in `accept` gives `media`; exact ranges beat
/// wildcards.
fn media_quality(accept: &str, media: &str) -> f32 {
    let (kind, _) = media.split_once('/').unwrap_or((media, ""));
    let mut exact: Option<f32> = None;
    let mut wildcard: Option<f32> = None;
    for range in accept.split(',') {
        let mut parts = range.split(';').map(str::trim);
        let name = parts.next().unwrap_or_default().to_ascii_lowercase();
        let q = parts
            .filter_map(|p| p.strip_prefix("q="))
            .find_map(|v| v.parse::<f32>().ok())
            .unwrap_or(1.0);
        if name == media {
            exact = Some(exact.map_or(q, |e| e.max(q)));
        } else if name == "*/*" || name == format!("{kind}/*") {
            wildcard = Some(wildcard.map_or(q, |w| w.max(q)));
        }
    }
    exact.or(wildcard).unwrap_or(0.0)
}
