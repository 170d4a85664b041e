use serde_json::Value;
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::{Arguments, FromRow, PgPool};

use crate::database::manager::DatabaseError;
use crate::filter::{Filter, FilterData, SqlResult};

/// Runs a compiled [`Filter`] against the pool, mapping rows into `T`
pub struct QueryBuilder<T> {
    filter: Filter,
    log_queries: bool,
    _row: std::marker::PhantomData<T>,
}

impl<T> QueryBuilder<T>
where
    T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
{
    pub fn new(table_name: impl Into<String>) -> Result<Self, DatabaseError> {
        Ok(Self {
            filter: Filter::new(table_name)?,
            log_queries: false,
            _row: std::marker::PhantomData,
        })
    }

    pub fn log_queries(mut self, enabled: bool) -> Self {
        self.log_queries = enabled;
        self
    }

    /// Replace the current filter with one compiled from `filter_data`
    pub fn filter(mut self, filter_data: FilterData) -> Result<Self, DatabaseError> {
        self.filter = Filter::from_data(self.filter.table(), filter_data)?;
        Ok(self)
    }

    pub async fn select_all(self, pool: &PgPool) -> Result<Vec<T>, DatabaseError> {
        let SqlResult { query, params } = self.traced(self.filter.to_sql()?);
        let rows = sqlx::query_as_with::<_, T, _>(&query, arguments(&params))
            .fetch_all(pool)
            .await?;
        Ok(rows)
    }

    pub async fn select_optional(self, pool: &PgPool) -> Result<Option<T>, DatabaseError> {
        let SqlResult { query, params } = self.traced(self.filter.to_sql()?);
        let row = sqlx::query_as_with::<_, T, _>(&query, arguments(&params))
            .fetch_optional(pool)
            .await?;
        Ok(row)
    }

    pub async fn count(self, pool: &PgPool) -> Result<i64, DatabaseError> {
        let SqlResult { query, params } = self.traced(self.filter.to_count_sql()?);
        let count = sqlx::query_scalar_with::<_, i64, _>(&query, arguments(&params))
            .fetch_one(pool)
            .await?;
        Ok(count)
    }

    fn traced(&self, sql: SqlResult) -> SqlResult {
        if self.log_queries {
            tracing::debug!(query = %sql.query, params = sql.params.len(), "executing query");
        }
        sql
    }
}

/// Positional arguments for `$n` placeholders. Arrays and objects travel as JSONB.
fn arguments(params: &[Value]) -> PgArguments {
    let mut args = PgArguments::default();
    for value in params {
        match value {
            Value::Null => args.add(Option::<String>::None),
            Value::Bool(b) => args.add(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => args.add(i),
                None => args.add(n.as_f64().unwrap_or_default()),
            },
            Value::String(s) => args.add(s.clone()),
            Value::Array(_) | Value::Object(_) => args.add(value.clone()),
        }
    }
    args
}
