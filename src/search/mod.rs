// Typed person search: tokens -> terms -> criteria.
//
// Criteria are evaluated two ways: compiled into a `filter` where-clause for
// the Postgres store, or matched directly against `Person` values by the
// in-memory store. Both paths must agree.

pub mod term;

use serde_json::{json, Value};
use std::cmp::Ordering;

use crate::filter::{FilterOrderInfo, SortDirection};
use crate::models::Person;

pub use term::{parse_terms, SearchTerm, TextColumn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortColumn {
    Id,
    Name,
    JobTitle,
    CreatedAt,
    UpdatedAt,
}

impl SortColumn {
    pub fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "id" => SortColumn::Id,
            "name" => SortColumn::Name,
            "job_title" => SortColumn::JobTitle,
            "created_at" => SortColumn::CreatedAt,
            "updated_at" => SortColumn::UpdatedAt,
            _ => return None,
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortColumn::Id => "id",
            SortColumn::Name => "name",
            SortColumn::JobTitle => "job_title",
            SortColumn::CreatedAt => "created_at",
            SortColumn::UpdatedAt => "updated_at",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
    pub column: SortColumn,
    pub direction: SortDirection,
}

impl Default for SortKey {
    fn default() -> Self {
        Self {
            column: SortColumn::Id,
            direction: SortDirection::Asc,
        }
    }
}

impl SortKey {
    pub fn to_order_info(&self) -> Vec<FilterOrderInfo> {
        let mut infos = vec![FilterOrderInfo {
            column: self.column.as_str().to_string(),
            sort: self.direction,
        }];
        // Stable pages when the primary key ties
        if self.column != SortColumn::Id {
            infos.push(FilterOrderInfo {
                column: "id".to_string(),
                sort: SortDirection::Asc,
            });
        }
        infos
    }

    pub fn compare(&self, a: &Person, b: &Person) -> Ordering {
        let primary = match self.column {
            SortColumn::Id => a.id.cmp(&b.id),
            SortColumn::Name => a.name.cmp(&b.name),
            // Postgres sorts NULLs last ascending; Option orders None first
            SortColumn::JobTitle => match (&a.job_title, &b.job_title) {
                (Some(x), Some(y)) => x.cmp(y),
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Greater,
                (Some(_), None) => Ordering::Less,
            },
            SortColumn::CreatedAt => a.created_at.cmp(&b.created_at),
            SortColumn::UpdatedAt => a.updated_at.cmp(&b.updated_at),
        };
        let primary = match self.direction {
            SortDirection::Asc => primary,
            SortDirection::Desc => primary.reverse(),
        };
        primary.then_with(|| a.id.cmp(&b.id))
    }
}

/// Everything a store needs to select a page of persons
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PersonCriteria {
    /// AND-combined search terms
    pub terms: Vec<SearchTerm>,
    /// Owner restriction from the authorization resolver; `None` is unrestricted
    pub user_ids: Option<Vec<i64>>,
    pub sort: SortKey,
}

impl PersonCriteria {
    pub fn new(terms: Vec<SearchTerm>, user_ids: Option<Vec<i64>>) -> Self {
        Self {
            terms,
            user_ids,
            sort: SortKey::default(),
        }
    }

    pub fn with_sort(mut self, sort: SortKey) -> Self {
        self.sort = sort;
        self
    }

    pub fn matches(&self, person: &Person) -> bool {
        let permitted = match &self.user_ids {
            None => true,
            Some(ids) => person.user_id.map(|id| ids.contains(&id)).unwrap_or(false),
        };
        permitted && self.terms.iter().all(|term| term.matches(person))
    }

    pub fn to_where(&self) -> Value {
        let mut clauses: Vec<Value> = self.terms.iter().map(SearchTerm::to_where).collect();
        if let Some(ids) = &self.user_ids {
            clauses.push(json!({ "user_id": { "$in": ids } }));
        }
        json!({ "$and": clauses })
    }
}
