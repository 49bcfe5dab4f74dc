// SPDX-License-Identifier: Apache-2.0

use serde_json::{json, Value};

#[must_use]
pub fn openapi_v1_spec() -> Value {
    let error = json!({"application/json": {"schema": {"$ref": "#/components/schemas/ApiError"}}});
    let format = json!({"name": "format", "in": "query", "schema": {"type": "string", "enum": ["json", "html"]}});
    let limit = |default: u64, description: &str| {
        json!({
          "name": "limit",
          "in": "query",
          "schema": {"type": "integer", "minimum": 0, "default": default},
          "description": description
        })
    };
    json!({
      "openapi": "3.0.3",
      "info": {
        "title": "MarketPulse API",
        "version": "v1"
      },
      "paths": {
        "/": {"get": {"responses": {"200": {"description": "html landing page"}}}},
        "/companies": {
          "get": {
            "parameters": [
              limit(50, "0 returns every row"),
              {"name": "sector", "in": "query", "schema": {"type": "string"}},
              format
            ],
            "responses": {
              "200": {"description": "companies by market cap, largest first"},
              "400": {"description": "invalid query", "content": error},
              "503": {"description": "store unavailable", "content": error}
            }
          }
        },
        "/company/{symbol}": {
          "get": {
            "parameters": [
              {"name": "symbol", "in": "path", "required": true, "schema": {"type": "string"}},
              format
            ],
            "responses": {
              "200": {"description": "every stored column of one company"},
              "404": {"description": "symbol not found", "content": error}
            }
          }
        },
        "/health": {"get": {"responses": {"200": {"description": "status and uptime"}}}},
        "/index": {
          "get": {
            "parameters": [limit(100, "maximum rows, newest first"), format],
            "responses": {
              "200": {"description": "index history, newest first"},
              "400": {"description": "invalid query", "content": error}
            }
          }
        },
        "/metrics": {"get": {"responses": {"200": {"description": "prometheus metrics"}}}},
        "/readyz": {"get": {"responses": {"200": {"description": "ready"}, "503": {"description": "not ready", "content": error}}}},
        "/sector/{sector}/companies": {
          "get": {
            "parameters": [
              {"name": "sector", "in": "path", "required": true, "schema": {"type": "string"}},
              format
            ],
            "responses": {
              "200": {"description": "companies joined with sector aggregates"},
              "404": {"description": "sector not found", "content": error}
            }
          }
        },
        "/sectors": {
          "get": {
            "parameters": [format],
            "responses": {"200": {"description": "distinct sector names, ascending"}}
          }
        }
      },
      "components": {
        "schemas": {
          "ApiError": {
            "type": "object",
            "required": ["code", "message", "details"],
            "additionalProperties": false,
            "properties": {
              "code": {"$ref": "#/components/schemas/ApiErrorCode"},
              "message": {"type": "string"},
              "details": {"type": "object"}
            }
          },
          "ApiErrorCode": {
            "type": "string",
            "enum": ["InvalidArgument", "NotFound", "StoreUnavailable", "NotReady", "Internal"]
          }
        }
      }
    })
}
