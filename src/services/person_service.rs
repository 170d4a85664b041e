use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::api::{into_person_data, sanitize_person, validate_person, FieldErrors};
use crate::authorization::{AuthorizationError, AuthorizationResolver, Caller};
use crate::config::AppConfig;
use crate::database::{Page, PageRequest, PersonStore, StoreError};
use crate::filter::SortDirection;
use crate::models::{Person, PersonPayload};
use crate::observer::{EventDispatcher, EventName, PersonEvent};
use crate::search::{parse_terms, PersonCriteria, SortColumn, SortKey};

#[derive(Debug, Error)]
pub enum PersonServiceError {
    #[error("Validation failed on {} field(s)", .0.len())]
    Validation(FieldErrors),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Authorization(#[from] AuthorizationError),
}

/// Result of a single delete. Failures after the record was found are
/// reported here instead of as errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    Failed,
}

/// Raw query pairs minus `page`, kept for pagination links
pub type LinkQuery = Vec<(String, String)>;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListParams {
    pub page: Option<u64>,
    pub per_page: Option<u32>,
    pub sort: Option<String>,
    pub order: Option<String>,
}

impl ListParams {
    /// Parse `page`, `per_page`, `sort` and `order`. Unparseable numbers fall back to defaults.
    pub fn from_query(query: &str) -> (Self, LinkQuery) {
        let mut params = Self::default();
        let mut link_query = LinkQuery::new();
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                "page" => {
                    params.page = value.parse().ok();
                    continue;
                }
                "per_page" => params.per_page = value.parse().ok(),
                "sort" => params.sort = Some(value.to_string()),
                "order" => params.order = Some(value.to_string()),
                _ => {}
            }
            link_query.push((key.into_owned(), value.into_owned()));
        }
        (params, link_query)
    }

    fn sort_key(&self) -> SortKey {
        let column = self
            .sort
            .as_deref()
            .and_then(SortColumn::parse)
            .unwrap_or(SortColumn::Id);
        let direction = self.order.as_deref().map(SortDirection::parse).unwrap_or(SortDirection::Asc);
        SortKey { column, direction }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchParams {
    /// Raw search tokens, in query order
    pub search: Vec<String>,
    pub page: Option<u64>,
    pub per_page: Option<u32>,
}

impl SearchParams {
    /// Accepts `search=`, `search[]=` and `search[N]=` forms.
    pub fn from_query(query: &str) -> (Self, LinkQuery) {
        let mut params = Self::default();
        let mut link_query = LinkQuery::new();
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                "page" => {
                    params.page = value.parse().ok();
                    continue;
                }
                "per_page" => params.per_page = value.parse().ok(),
                k if is_search_key(k) => params.search.push(value.to_string()),
                _ => {}
            }
            link_query.push((key.into_owned(), value.into_owned()));
        }
        (params, link_query)
    }
}

fn is_search_key(key: &str) -> bool {
    match key.strip_prefix("search") {
        Some("") => true,
        Some(rest) => rest
            .strip_prefix('[')
            .and_then(|r| r.strip_suffix(']'))
            .map(|index| index.chars().all(|c| c.is_ascii_digit()))
            .unwrap_or(false),
        None => false,
    }
}

/// Person use cases: validation, persistence, authorization and notifications
pub struct PersonService {
    store: Arc<dyn PersonStore>,
    resolver: Arc<dyn AuthorizationResolver>,
    dispatcher: Arc<EventDispatcher>,
    config: Arc<AppConfig>,
}

impl PersonService {
    pub fn new(
        store: Arc<dyn PersonStore>,
        resolver: Arc<dyn AuthorizationResolver>,
        dispatcher: Arc<EventDispatcher>,
        config: Arc<AppConfig>,
    ) -> Self {
        Self {
            store,
            resolver,
            dispatcher,
            config,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub async fn health_check(&self) -> Result<(), StoreError> {
        self.store.health_check().await
    }

    fn page_request(&self, page: Option<u64>, per_page: Option<u32>) -> PageRequest {
        let per_page = self.config.pagination.resolve_per_page(per_page);
        PageRequest::new(page.unwrap_or(1), u64::from(per_page))
    }

    pub async fn list(&self, caller: &Caller, params: &ListParams) -> Result<Page<Person>, PersonServiceError> {
        let user_ids = self.resolver.authorized_user_ids(caller).await?;
        let criteria = PersonCriteria::new(vec![], user_ids).with_sort(params.sort_key());
        let page = self
            .store
            .paginate(&criteria, self.page_request(params.page, params.per_page))
            .await?;
        Ok(page)
    }

    pub async fn show(&self, id: i64) -> Result<Person, PersonServiceError> {
        Ok(self.store.find_or_fail(id).await?)
    }

    pub async fn search(&self, caller: &Caller, params: &SearchParams) -> Result<Page<Person>, PersonServiceError> {
        let terms = parse_terms(&params.search);
        let user_ids = self.resolver.authorized_user_ids(caller).await?;
        let criteria = PersonCriteria::new(terms, user_ids);
        if self.config.pagination.debug_logging {
            tracing::debug!(terms = criteria.terms.len(), restricted = criteria.user_ids.is_some(), "person search");
        }
        let page = self
            .store
            .paginate(&criteria, self.page_request(params.page, params.per_page))
            .await?;
        Ok(page)
    }

    pub async fn create(&self, caller: &Caller, payload: PersonPayload) -> Result<Person, PersonServiceError> {
        validate_person(&payload).map_err(PersonServiceError::Validation)?;

        self.dispatcher.dispatch(PersonEvent::none(EventName::CreateBefore)).await;

        let data = into_person_data(sanitize_person(payload), Some(caller.user_id));
        let person = self.store.create(data).await?;
        info!(person_id = person.id, user_id = caller.user_id, "person created");

        self.dispatcher
            .dispatch(PersonEvent::person(EventName::CreateAfter, person.clone()))
            .await;
        Ok(person)
    }

    pub async fn update(&self, caller: &Caller, id: i64, payload: PersonPayload) -> Result<Person, PersonServiceError> {
        validate_person(&payload).map_err(PersonServiceError::Validation)?;

        self.dispatcher.dispatch(PersonEvent::id(EventName::UpdateBefore, id)).await;

        // Editing never transfers ownership unless the body names a new owner
        let data = into_person_data(sanitize_person(payload), None);
        let person = self.store.update(id, data).await?;
        info!(person_id = person.id, user_id = caller.user_id, "person updated");

        self.dispatcher
            .dispatch(PersonEvent::person(EventName::UpdateAfter, person.clone()))
            .await;
        Ok(person)
    }

    /// Unknown ids fail with `NotFound`; anything after the lookup is caught.
    pub async fn destroy(&self, id: i64) -> Result<DeleteOutcome, PersonServiceError> {
        self.store.find_or_fail(id).await?;

        self.dispatcher.dispatch(PersonEvent::id(EventName::DeleteBefore, id)).await;

        match self.store.delete(id).await {
            Ok(()) => {
                self.dispatcher.dispatch(PersonEvent::id(EventName::DeleteAfter, id)).await;
                info!(person_id = id, "person deleted");
                Ok(DeleteOutcome::Deleted)
            }
            Err(e) => {
                error!(person_id = id, "Failed to delete person: {}", e);
                Ok(DeleteOutcome::Failed)
            }
        }
    }

    /// Delete each id in order. Missing ids are skipped and failed deletes are
    /// logged; the batch itself always succeeds.
    pub async fn mass_destroy(&self, ids: &[i64]) -> Result<(), PersonServiceError> {
        for &id in ids {
            match self.store.find(id).await {
                Ok(Some(_)) => {}
                Ok(None) => continue,
                Err(e) => {
                    warn!(person_id = id, "Skipping person during mass delete: {}", e);
                    continue;
                }
            }

            self.dispatcher
                .dispatch(PersonEvent::id(EventName::MassDeleteBefore, id))
                .await;

            match self.store.delete(id).await {
                Ok(()) => {
                    self.dispatcher
                        .dispatch(PersonEvent::id(EventName::MassDeleteAfter, id))
                        .await;
                }
                Err(e) => {
                    error!(person_id = id, "Failed to delete person during mass delete: {}", e);
                }
            }
        }
        info!(requested = ids.len(), "mass delete finished");
        Ok(())
    }
}
