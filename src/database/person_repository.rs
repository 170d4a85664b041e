use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

use crate::database::manager::DatabaseManager;
use crate::database::repository::Repository;
use crate::database::store::{Page, PageRequest, PersonStore, StoreError};
use crate::filter::FilterData;
use crate::models::{LabeledValue, Organization, Person, PersonData};
use crate::search::PersonCriteria;

const PERSONS: &str = "persons";
const ORGANIZATIONS: &str = "organizations";
const ATTRIBUTE_VALUES: &str = "attribute_values";

/// Entity type under which person attributes are stored
const ENTITY_TYPE: &str = "persons";

#[derive(Debug, FromRow)]
struct PersonRow {
    id: i64,
    name: String,
    job_title: Option<String>,
    emails: Json<Vec<LabeledValue>>,
    contact_numbers: Json<Vec<LabeledValue>>,
    organization_id: Option<i64>,
    user_id: Option<i64>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct OrganizationRow {
    id: i64,
    name: String,
}

#[derive(Debug, FromRow)]
struct AttributeValueRow {
    entity_id: i64,
    attribute_code: String,
    value: Option<Json<Value>>,
}

/// Postgres-backed person store
pub struct PgPersonStore {
    pool: PgPool,
    log_queries: bool,
}

impl PgPersonStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool, log_queries: false }
    }

    pub fn with_query_logging(mut self, enabled: bool) -> Self {
        self.log_queries = enabled;
        self
    }

    fn repository<T>(&self, table: &'static str) -> Repository<T>
    where
        T: for<'r> FromRow<'r, sqlx::postgres::PgRow> + Send + Unpin,
    {
        Repository::new(table, self.pool.clone(), self.log_queries)
    }

    /// Attach `organization` and `attribute_values` to each row, two queries per batch
    async fn load_relations(&self, rows: Vec<PersonRow>) -> Result<Vec<Person>, StoreError> {
        if rows.is_empty() {
            return Ok(vec![]);
        }

        let mut org_ids: Vec<i64> = rows.iter().filter_map(|r| r.organization_id).collect();
        org_ids.sort_unstable();
        org_ids.dedup();
        let organizations: HashMap<i64, Organization> = self
            .repository::<OrganizationRow>(ORGANIZATIONS)
            .by_ids(&org_ids)
            .await?
            .into_iter()
            .map(|row| (row.id, Organization { id: row.id, name: row.name }))
            .collect();

        let person_ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
        let owned_by_batch = json!({
            "$and": [
                { "entity_type": { "$eq": ENTITY_TYPE } },
                { "entity_id": { "$in": person_ids } }
            ]
        });
        let mut attributes: HashMap<i64, BTreeMap<String, Value>> = HashMap::new();
        for row in self
            .repository::<AttributeValueRow>(ATTRIBUTE_VALUES)
            .matching(owned_by_batch)
            .await?
        {
            attributes
                .entry(row.entity_id)
                .or_default()
                .insert(row.attribute_code, row.value.map(|v| v.0).unwrap_or(Value::Null));
        }

        Ok(rows
            .into_iter()
            .map(|row| Person {
                organization: row.organization_id.and_then(|id| organizations.get(&id).cloned()),
                attribute_values: attributes.remove(&row.id).unwrap_or_default(),
                id: row.id,
                name: row.name,
                job_title: row.job_title,
                emails: row.emails.0,
                contact_numbers: row.contact_numbers.0,
                organization_id: row.organization_id,
                user_id: row.user_id,
                created_at: row.created_at,
                updated_at: row.updated_at,
            })
            .collect())
    }

    async fn save_attributes(
        tx: &mut Transaction<'_, Postgres>,
        person_id: i64,
        attributes: &BTreeMap<String, Value>,
    ) -> Result<(), sqlx::Error> {
        for (code, value) in attributes {
            sqlx::query(
                "INSERT INTO attribute_values (entity_type, entity_id, attribute_code, value) \
                 VALUES ($1, $2, $3, $4) \
                 ON CONFLICT (entity_type, entity_id, attribute_code) DO UPDATE SET value = EXCLUDED.value",
            )
            .bind(ENTITY_TYPE)
            .bind(person_id)
            .bind(code)
            .bind(Json(value))
            .execute(&mut **tx)
            .await?;
        }
        Ok(())
    }
}

/// Where-clause, ordering and window for one page of `persons`
fn page_filter(criteria: &PersonCriteria, page: PageRequest) -> Result<FilterData, StoreError> {
    let order: Vec<String> = criteria
        .sort
        .to_order_info()
        .iter()
        .map(|info| format!("{} {}", info.column, info.sort.to_sql()))
        .collect();
    let limit = i32::try_from(page.per_page).map_err(|_| StoreError::Invalid("per_page out of range".to_string()))?;
    let offset = i32::try_from(page.offset()).map_err(|_| StoreError::Invalid("page out of range".to_string()))?;

    Ok(FilterData {
        where_clause: Some(criteria.to_where()),
        order: Some(json!(order)),
        limit: Some(limit),
        offset: Some(offset),
        ..Default::default()
    })
}

#[async_trait]
impl PersonStore for PgPersonStore {
    async fn paginate(&self, criteria: &PersonCriteria, page: PageRequest) -> Result<Page<Person>, StoreError> {
        let filter_data = page_filter(criteria, page)?;
        let repository = self.repository::<PersonRow>(PERSONS);

        let total = repository
            .count(filter_data.where_clause.clone().unwrap_or(Value::Null))
            .await?;
        let rows = repository.select(filter_data).await?;

        debug!(total, returned = rows.len(), page = page.page, "paginated persons");

        Ok(Page {
            items: self.load_relations(rows).await?,
            total: total.max(0) as u64,
            current_page: page.page,
            per_page: page.per_page,
        })
    }

    async fn find(&self, id: i64) -> Result<Option<Person>, StoreError> {
        let row = self
            .repository::<PersonRow>(PERSONS)
            .first(json!({ "id": { "$eq": id } }))
            .await?;
        match row {
            Some(row) => Ok(self.load_relations(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn create(&self, data: PersonData) -> Result<Person, StoreError> {
        let mut tx = self.pool.begin().await?;

        let id: i64 = sqlx::query_scalar(
            "INSERT INTO persons (name, job_title, emails, contact_numbers, organization_id, user_id) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING id",
        )
        .bind(&data.name)
        .bind(&data.job_title)
        .bind(Json(&data.emails))
        .bind(Json(&data.contact_numbers))
        .bind(data.organization_id)
        .bind(data.user_id)
        .fetch_one(&mut *tx)
        .await?;

        Self::save_attributes(&mut tx, id, &data.attribute_values).await?;
        tx.commit().await?;

        debug!(person_id = id, "person inserted");
        self.find_or_fail(id).await
    }

    async fn update(&self, id: i64, data: PersonData) -> Result<Person, StoreError> {
        let mut tx = self.pool.begin().await?;

        let updated: Option<i64> = sqlx::query_scalar(
            "UPDATE persons SET name = $1, job_title = $2, emails = $3, contact_numbers = $4, \
             organization_id = $5, user_id = COALESCE($6, user_id), updated_at = now() WHERE id = $7 RETURNING id",
        )
        .bind(&data.name)
        .bind(&data.job_title)
        .bind(Json(&data.emails))
        .bind(Json(&data.contact_numbers))
        .bind(data.organization_id)
        .bind(data.user_id)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        if updated.is_none() {
            return Err(StoreError::NotFound(id));
        }

        Self::save_attributes(&mut tx, id, &data.attribute_values).await?;
        tx.commit().await?;

        self.find_or_fail(id).await
    }

    async fn delete(&self, id: i64) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM attribute_values WHERE entity_type = $1 AND entity_id = $2")
            .bind(ENTITY_TYPE)
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM persons WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(id));
        }

        tx.commit().await?;
        Ok(())
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        DatabaseManager::health_check(&self.pool)
            .await
            .map_err(StoreError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{Filter, SortDirection};
    use crate::search::{parse_terms, SortColumn, SortKey};

    #[test]
    fn page_query_renders_terms_owner_scope_and_window() {
        let criteria = PersonCriteria::new(
            parse_terms(["job_title:lead", "email:ann@example.com"]),
            Some(vec![3, 4]),
        )
        .with_sort(SortKey {
            column: SortColumn::Name,
            direction: SortDirection::Desc,
        });

        let filter_data = page_filter(&criteria, PageRequest::new(3, 10)).unwrap();
        let where_clause = filter_data.where_clause.clone().unwrap();
        let sql = Filter::from_data(PERSONS, filter_data).unwrap().to_sql().unwrap();

        assert_eq!(
            sql.query,
            "SELECT * FROM \"persons\" WHERE (\"job_title\" ILIKE $1) AND (\"emails\" @> $2::jsonb) \
             AND (\"user_id\" IN ($3, $4)) ORDER BY \"name\" DESC, \"id\" ASC LIMIT 10 OFFSET 20"
        );
        assert_eq!(
            sql.params,
            vec![
                json!("%lead%"),
                json!([{ "value": "ann@example.com" }]),
                json!(3),
                json!(4),
            ]
        );

        let count = Filter::new(PERSONS)
            .unwrap()
            .where_clause(where_clause)
            .unwrap()
            .to_count_sql()
            .unwrap();
        assert_eq!(
            count.query,
            "SELECT COUNT(*) FROM \"persons\" WHERE (\"job_title\" ILIKE $1) AND (\"emails\" @> $2::jsonb) \
             AND (\"user_id\" IN ($3, $4))"
        );
    }

    #[test]
    fn unrestricted_page_has_no_owner_clause() {
        let filter_data = page_filter(&PersonCriteria::default(), PageRequest::new(1, 15)).unwrap();
        let sql = Filter::from_data(PERSONS, filter_data).unwrap().to_sql().unwrap();
        assert_eq!(sql.query, "SELECT * FROM \"persons\" WHERE 1=1 ORDER BY \"id\" ASC LIMIT 15 OFFSET 0");
        assert!(sql.params.is_empty());
    }
}
