use serde_json::Value;

use super::error::FilterError;
use super::filter_order::FilterOrder;
use super::filter_where::FilterWhere;
use super::types::{is_valid_identifier, FilterData, FilterOrderInfo, SqlResult};

/// A parameterised SELECT against one table.
///
/// Identifiers are checked as they are set, so rendering only fails on a
/// malformed where clause. Paging is a LIMIT with an optional OFFSET; an offset
/// without a limit is ignored.
#[derive(Debug, Clone)]
pub struct Filter {
    table: String,
    columns: Vec<String>,
    conditions: Option<Value>,
    ordering: Vec<FilterOrderInfo>,
    window: Option<(i32, Option<i32>)>,
}

impl Filter {
    pub fn new(table: impl Into<String>) -> Result<Self, FilterError> {
        let table = table.into();
        if !is_valid_identifier(&table) {
            return Err(FilterError::identifier("table", table));
        }
        Ok(Self {
            table,
            columns: Vec::new(),
            conditions: None,
            ordering: Vec::new(),
            window: None,
        })
    }

    /// Build from the JSON envelope accepted by repositories
    pub fn from_data(table: impl Into<String>, data: FilterData) -> Result<Self, FilterError> {
        let mut filter = Self::new(table)?;
        if let Some(columns) = data.select {
            filter = filter.select(columns)?;
        }
        if let Some(conditions) = data.where_clause {
            filter = filter.where_clause(conditions)?;
        }
        if let Some(order) = data.order {
            filter = filter.order(&order)?;
        }
        if let Some(limit) = data.limit {
            filter = filter.window(limit, data.offset)?;
        }
        Ok(filter)
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn select(mut self, columns: Vec<String>) -> Result<Self, FilterError> {
        if let Some(bad) = columns.iter().find(|c| *c != "*" && !is_valid_identifier(c)) {
            return Err(FilterError::identifier("column", bad.clone()));
        }
        self.columns = columns;
        Ok(self)
    }

    pub fn where_clause(mut self, conditions: Value) -> Result<Self, FilterError> {
        FilterWhere::validate(&conditions)?;
        self.conditions = Some(conditions);
        Ok(self)
    }

    pub fn order(mut self, spec: &Value) -> Result<Self, FilterError> {
        self.ordering = FilterOrder::validate_and_parse(spec)?;
        Ok(self)
    }

    pub fn window(mut self, limit: i32, offset: Option<i32>) -> Result<Self, FilterError> {
        if limit < 0 {
            return Err(FilterError::NegativePaging("limit"));
        }
        if offset.is_some_and(|o| o < 0) {
            return Err(FilterError::NegativePaging("offset"));
        }
        self.window = Some((limit, offset));
        Ok(self)
    }

    pub fn to_sql(&self) -> Result<SqlResult, FilterError> {
        let (predicate, params) = self.predicate()?;
        let mut query = format!("SELECT {} FROM \"{}\" WHERE {}", self.projection(), self.table, predicate);

        let order_by = FilterOrder::generate(&self.ordering);
        if !order_by.is_empty() {
            query.push(' ');
            query.push_str(&order_by);
        }
        if let Some((limit, offset)) = self.window {
            query.push_str(&format!(" LIMIT {}", limit));
            if let Some(offset) = offset {
                query.push_str(&format!(" OFFSET {}", offset));
            }
        }

        Ok(SqlResult { query, params })
    }

    /// Row count for the same predicate; ordering and paging do not apply
    pub fn to_count_sql(&self) -> Result<SqlResult, FilterError> {
        let (predicate, params) = self.predicate()?;
        Ok(SqlResult {
            query: format!("SELECT COUNT(*) FROM \"{}\" WHERE {}", self.table, predicate),
            params,
        })
    }

    fn predicate(&self) -> Result<(String, Vec<Value>), FilterError> {
        match &self.conditions {
            Some(conditions) => FilterWhere::generate(conditions, 0),
            None => Ok(("1=1".to_string(), Vec::new())),
        }
    }

    fn projection(&self) -> String {
        if self.columns.is_empty() || self.columns.iter().any(|c| c == "*") {
            return "*".to_string();
        }
        self.columns
            .iter()
            .map(|c| format!("\"{}\"", c))
            .collect::<Vec<_>>()
            .join(", ")
    }
}
