// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

//! HTTP boundary contract: error codes, query-parameter parsing and the
//! OpenAPI document. Nothing here touches the store.

mod error_mapping;
mod errors;
mod openapi;
pub mod params;

pub const CRATE_NAME: &str = "marketpulse-api";

pub use error_mapping::{map_error, ApiErrorMapping, API_ERROR_SCHEMA_REF};
pub use errors::{ApiError, ApiErrorCode};
pub use openapi::openapi_v1_spec;
pub use params::{
    parse_companies_params, parse_index_params, parse_response_format, CompaniesParams,
    IndexParams, ResponseFormat,
};
