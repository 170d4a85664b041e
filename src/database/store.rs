use async_trait::async_trait;
use thiserror::Error;

use crate::database::manager::DatabaseError;
use crate::models::{Person, PersonData};
use crate::search::PersonCriteria;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Person {0} not found")]
    NotFound(i64),

    #[error("Invalid query: {0}")]
    Invalid(String),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Database(DatabaseError::Sqlx(err))
    }
}

/// One-based page request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub per_page: u64,
}

impl PageRequest {
    pub fn new(page: u64, per_page: u64) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.max(1),
        }
    }

    pub fn offset(&self) -> u64 {
        (self.page - 1).saturating_mul(self.per_page)
    }
}

#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub current_page: u64,
    pub per_page: u64,
}

impl<T> Page<T> {
    pub fn last_page(&self) -> u64 {
        if self.total == 0 {
            1
        } else {
            let per_page = self.per_page.max(1);
            (self.total + per_page - 1) / per_page
        }
    }

    /// One-based position of the first item on this page
    pub fn from(&self) -> Option<u64> {
        (!self.items.is_empty()).then(|| (self.current_page - 1) * self.per_page + 1)
    }

    /// One-based position of the last item on this page
    pub fn to(&self) -> Option<u64> {
        self.from().map(|from| from + self.items.len() as u64 - 1)
    }
}

/// Persistence for person records. Ids are assigned by the store.
#[async_trait]
pub trait PersonStore: Send + Sync {
    /// Select one page of persons matching `criteria`, relations loaded.
    async fn paginate(&self, criteria: &PersonCriteria, page: PageRequest) -> Result<Page<Person>, StoreError>;

    async fn find(&self, id: i64) -> Result<Option<Person>, StoreError>;

    async fn find_or_fail(&self, id: i64) -> Result<Person, StoreError> {
        self.find(id).await?.ok_or(StoreError::NotFound(id))
    }

    async fn create(&self, data: PersonData) -> Result<Person, StoreError>;

    /// Overwrite the columns of person `id` and upsert the supplied attribute
    /// values. A `None` owner keeps the current one. Fails with `NotFound` for
    /// unknown ids.
    async fn update(&self, id: i64, data: PersonData) -> Result<Person, StoreError>;

    /// Permanently remove person `id`. Fails with `NotFound` for unknown ids.
    async fn delete(&self, id: i64) -> Result<(), StoreError>;

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
