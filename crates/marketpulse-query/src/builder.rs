// SPDX-License-Identifier: Apache-2.0

use rusqlite::types::Value;

/// Assembles one SELECT. Identifiers passed here must come from constants or
/// validated metadata; every user-supplied value goes through `params`.
#[derive(Debug, Clone, Default)]
pub struct SelectBuilder {
    projection: Vec<String>,
    from: String,
    where_parts: Vec<String>,
    params: Vec<Value>,
    order_by: Vec<String>,
    limit: Option<usize>,
}

impl SelectBuilder {
    #[must_use]
    pub fn new(from: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn column(mut self, expr: impl Into<String>) -> Self {
        self.projection.push(expr.into());
        self
    }

    #[must_use]
    pub fn columns<'a>(mut self, exprs: impl IntoIterator<Item = &'a str>) -> Self {
        self.projection.extend(exprs.into_iter().map(str::to_string));
        self
    }

    #[must_use]
    pub fn where_eq(mut self, column: &str, value: Value) -> Self {
        self.where_parts.push(format!("{column} = ?"));
        self.params.push(value);
        self
    }

    #[must_use]
    pub fn where_not_null(mut self, column: &str) -> Self {
        self.where_parts.push(format!("{column} IS NOT NULL"));
        self
    }

    #[must_use]
    pub fn order_by(mut self, expr: impl Into<String>) -> Self {
        self.order_by.push(expr.into());
        self
    }

    /// `0` leaves the result unbounded.
    #[must_use]
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = (limit > 0).then_some(limit);
        self
    }

    /// Always emits `LIMIT ?`, so `0` yields no rows.
    #[must_use]
    pub fn limit_exact(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    #[must_use]
    pub fn build(self) -> (String, Vec<Value>) {
        let projection = if self.projection.is_empty() {
            "*".to_string()
        } else {
            self.projection.join(", ")
        };
        let mut sql = format!("SELECT {projection} FROM {}", self.from);
        let mut params = self.params;
        if !self.where_parts.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&self.where_parts.join(" AND "));
        }
        if !self.order_by.is_empty() {
            sql.push_str(" ORDER BY ");
            sql.push_str(&self.order_by.join(", "));
        }
        if let Some(limit) = self.limit {
            sql.push_str(" LIMIT ?");
            params.push(Value::Integer(i64::try_from(limit).unwrap_or(i64::MAX)));
        }
        (sql, params)
    }
}
