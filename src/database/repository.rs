use serde_json::{json, Value};
use sqlx::{postgres::PgRow, FromRow, PgPool};

use crate::database::manager::DatabaseError;
use crate::database::query_builder::QueryBuilder;
use crate::filter::FilterData;

/// Typed reads against one table
pub struct Repository<T> {
    table: &'static str,
    pool: PgPool,
    log_queries: bool,
    _row: std::marker::PhantomData<T>,
}

impl<T> Repository<T>
where
    T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
{
    pub fn new(table: &'static str, pool: PgPool, log_queries: bool) -> Self {
        Self {
            table,
            pool,
            log_queries,
            _row: std::marker::PhantomData,
        }
    }

    fn query(&self, filter_data: FilterData) -> Result<QueryBuilder<T>, DatabaseError> {
        QueryBuilder::<T>::new(self.table)?
            .log_queries(self.log_queries)
            .filter(filter_data)
    }

    /// Full filter envelope, including ordering and paging
    pub async fn select(&self, filter_data: FilterData) -> Result<Vec<T>, DatabaseError> {
        self.query(filter_data)?.select_all(&self.pool).await
    }

    pub async fn matching(&self, conditions: Value) -> Result<Vec<T>, DatabaseError> {
        self.select(FilterData {
            where_clause: Some(conditions),
            ..Default::default()
        })
        .await
    }

    pub async fn first(&self, conditions: Value) -> Result<Option<T>, DatabaseError> {
        let filter_data = FilterData {
            where_clause: Some(conditions),
            limit: Some(1),
            ..Default::default()
        };
        self.query(filter_data)?.select_optional(&self.pool).await
    }

    pub async fn count(&self, conditions: Value) -> Result<i64, DatabaseError> {
        let filter_data = FilterData {
            where_clause: Some(conditions),
            ..Default::default()
        };
        self.query(filter_data)?.count(&self.pool).await
    }

    pub async fn by_ids(&self, ids: &[i64]) -> Result<Vec<T>, DatabaseError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.matching(json!({ "id": { "$in": ids } })).await
    }
}
