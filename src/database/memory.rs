use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicI64, Ordering};
use tokio::sync::RwLock;

use crate::database::store::{Page, PageRequest, PersonStore, StoreError};
use crate::models::{Organization, Person, PersonData};
use crate::search::PersonCriteria;

/// Process-local person store for development and tests
#[derive(Default)]
pub struct MemoryPersonStore {
    persons: RwLock<BTreeMap<i64, Person>>,
    organizations: RwLock<HashMap<i64, Organization>>,
    next_id: AtomicI64,
}

impl MemoryPersonStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an organization so persons referencing it load the relation
    pub async fn add_organization(&self, organization: Organization) {
        self.organizations.write().await.insert(organization.id, organization);
    }

    pub async fn len(&self) -> usize {
        self.persons.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.persons.read().await.is_empty()
    }

    async fn organization(&self, id: Option<i64>) -> Option<Organization> {
        let id = id?;
        self.organizations.read().await.get(&id).cloned()
    }
}

#[async_trait]
impl PersonStore for MemoryPersonStore {
    async fn paginate(&self, criteria: &PersonCriteria, page: PageRequest) -> Result<Page<Person>, StoreError> {
        let persons = self.persons.read().await;
        let mut matched: Vec<&Person> = persons.values().filter(|p| criteria.matches(p)).collect();
        matched.sort_by(|a, b| criteria.sort.compare(a, b));

        let total = matched.len() as u64;
        let offset = usize::try_from(page.offset()).unwrap_or(usize::MAX);
        let per_page = usize::try_from(page.per_page).unwrap_or(usize::MAX);
        let items = matched.into_iter().skip(offset).take(per_page).cloned().collect();

        Ok(Page {
            items,
            total,
            current_page: page.page,
            per_page: page.per_page,
        })
    }

    async fn find(&self, id: i64) -> Result<Option<Person>, StoreError> {
        Ok(self.persons.read().await.get(&id).cloned())
    }

    async fn create(&self, data: PersonData) -> Result<Person, StoreError> {
        let organization = self.organization(data.organization_id).await;
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let now = Utc::now();
        let person = Person {
            id,
            name: data.name,
            job_title: data.job_title,
            emails: data.emails,
            contact_numbers: data.contact_numbers,
            organization_id: data.organization_id,
            organization,
            attribute_values: data.attribute_values,
            user_id: data.user_id,
            created_at: now,
            updated_at: now,
        };
        self.persons.write().await.insert(id, person.clone());
        Ok(person)
    }

    async fn update(&self, id: i64, data: PersonData) -> Result<Person, StoreError> {
        let organization = self.organization(data.organization_id).await;
        let mut persons = self.persons.write().await;
        let person = persons.get_mut(&id).ok_or(StoreError::NotFound(id))?;

        person.name = data.name;
        person.job_title = data.job_title;
        person.emails = data.emails;
        person.contact_numbers = data.contact_numbers;
        person.organization_id = data.organization_id;
        person.organization = organization;
        person.attribute_values.extend(data.attribute_values);
        if data.user_id.is_some() {
            person.user_id = data.user_id;
        }
        person.updated_at = Utc::now();

        Ok(person.clone())
    }

    async fn delete(&self, id: i64) -> Result<(), StoreError> {
        self.persons
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::SortDirection;
    use crate::models::LabeledValue;
    use crate::search::{SearchTerm, SortColumn, SortKey, TextColumn};
    use serde_json::json;

    fn data(name: &str, email: &str, owner: i64) -> PersonData {
        PersonData {
            name: name.to_string(),
            job_title: None,
            emails: vec![LabeledValue::new(email, "work")],
            contact_numbers: vec![LabeledValue::new("555-0100", "work")],
            organization_id: None,
            attribute_values: BTreeMap::new(),
            user_id: Some(owner),
        }
    }

    #[tokio::test]
    async fn assigns_increasing_ids() {
        let store = MemoryPersonStore::new();
        let a = store.create(data("Ann", "ann@example.com", 1)).await.unwrap();
        let b = store.create(data("Bob", "bob@example.com", 1)).await.unwrap();
        assert_eq!(a.id, 1);
        assert_eq!(b.id, 2);
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn loads_organization_relation() {
        let store = MemoryPersonStore::new();
        store.add_organization(Organization { id: 7, name: "Acme".to_string() }).await;
        let mut d = data("Ann", "ann@example.com", 1);
        d.organization_id = Some(7);
        let person = store.create(d).await.unwrap();
        assert_eq!(person.organization.unwrap().name, "Acme");
    }

    #[tokio::test]
    async fn update_merges_attributes_and_rejects_unknown_ids() {
        let store = MemoryPersonStore::new();
        let mut d = data("Ann", "ann@example.com", 1);
        d.attribute_values.insert("source".to_string(), json!("web"));
        let person = store.create(d).await.unwrap();

        let mut changed = data("Ann Lee", "ann@example.com", 1);
        changed.attribute_values.insert("tier".to_string(), json!(2));
        let updated = store.update(person.id, changed.clone()).await.unwrap();
        assert_eq!(updated.name, "Ann Lee");
        assert_eq!(updated.attribute_values.len(), 2);

        assert!(matches!(store.update(99, changed).await, Err(StoreError::NotFound(99))));
    }

    #[tokio::test]
    async fn delete_removes_and_reports_missing() {
        let store = MemoryPersonStore::new();
        let person = store.create(data("Ann", "ann@example.com", 1)).await.unwrap();
        store.delete(person.id).await.unwrap();
        assert!(store.find(person.id).await.unwrap().is_none());
        assert!(matches!(store.delete(person.id).await, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn paginates_filtered_and_sorted() {
        let store = MemoryPersonStore::new();
        for (name, owner) in [("Cara", 1), ("anna", 2), ("Bob", 1), ("Joanna", 1)] {
            let email = format!("{}@example.com", name.to_lowercase());
            store.create(data(name, &email, owner)).await.unwrap();
        }

        let criteria = PersonCriteria::new(
            vec![SearchTerm::Contains { column: TextColumn::Name, value: "ANN".to_string() }],
            Some(vec![1]),
        );
        let page = store.paginate(&criteria, PageRequest::new(1, 10)).await.unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].name, "Joanna");

        let sorted = PersonCriteria::new(vec![], None).with_sort(SortKey {
            column: SortColumn::Name,
            direction: SortDirection::Desc,
        });
        let page = store.paginate(&sorted, PageRequest::new(2, 3)).await.unwrap();
        assert_eq!(page.total, 4);
        assert_eq!(page.items.len(), 1);
        // Byte order: uppercase sorts before lowercase
        assert_eq!(page.items[0].name, "Bob");
    }
}
