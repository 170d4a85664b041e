use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::database::store::Page;
use crate::models::{LabeledValue, Organization, Person};

/// Public wire format of a person
#[derive(Debug, Clone, Serialize)]
pub struct PersonResource {
    pub id: i64,
    pub name: String,
    pub job_title: Option<String>,
    pub emails: Vec<LabeledValue>,
    pub contact_numbers: Vec<LabeledValue>,
    pub organization: Option<Organization>,
    pub attribute_values: BTreeMap<String, Value>,
    pub user_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Person> for PersonResource {
    fn from(person: Person) -> Self {
        Self {
            id: person.id,
            name: person.name,
            job_title: person.job_title,
            emails: person.emails,
            contact_numbers: person.contact_numbers,
            organization: person.organization,
            attribute_values: person.attribute_values,
            user_id: person.user_id,
            created_at: person.created_at,
            updated_at: person.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PageLinks {
    pub first: String,
    pub last: String,
    pub prev: Option<String>,
    pub next: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PageMeta {
    pub current_page: u64,
    pub from: Option<u64>,
    pub last_page: u64,
    pub path: String,
    pub per_page: u64,
    pub to: Option<u64>,
    pub total: u64,
}

/// `{ data, links, meta }` pagination envelope
#[derive(Debug, Clone, Serialize)]
pub struct Paginated<T: Serialize> {
    pub data: Vec<T>,
    pub links: PageLinks,
    pub meta: PageMeta,
}

impl Paginated<PersonResource> {
    /// `query` holds the request parameters to carry into page links (without `page`).
    pub fn from_page(page: Page<Person>, path: &str, query: &[(String, String)]) -> Self {
        let last_page = page.last_page();
        let link = |n: u64| page_url(path, query, n);

        let links = PageLinks {
            first: link(1),
            last: link(last_page),
            prev: (page.current_page > 1).then(|| link(page.current_page - 1)),
            next: (page.current_page < last_page).then(|| link(page.current_page + 1)),
        };
        let meta = PageMeta {
            current_page: page.current_page,
            from: page.from(),
            last_page,
            path: path.to_string(),
            per_page: page.per_page,
            to: page.to(),
            total: page.total,
        };

        Self {
            data: page.items.into_iter().map(PersonResource::from).collect(),
            links,
            meta,
        }
    }
}

fn page_url(path: &str, query: &[(String, String)], page: u64) -> String {
    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    for (key, value) in query {
        serializer.append_pair(key, value);
    }
    serializer.append_pair("page", &page.to_string());
    format!("{}?{}", path, serializer.finish())
}
