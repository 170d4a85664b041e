use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

use crate::models::Person;
use crate::observer::error::ObserverError;

/// Lifecycle notification channels.
///
/// Mass delete publishes on the singular `contact.person.delete.*` channels,
/// while single delete uses `contacts.person.delete.*`. Subscribers depend on
/// both spellings so they are kept distinct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum EventName {
    CreateBefore,
    CreateAfter,
    UpdateBefore,
    UpdateAfter,
    DeleteBefore,
    DeleteAfter,
    MassDeleteBefore,
    MassDeleteAfter,
}

impl EventName {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventName::CreateBefore => "contacts.person.create.before",
            EventName::CreateAfter => "contacts.person.create.after",
            EventName::UpdateBefore => "contacts.person.update.before",
            EventName::UpdateAfter => "contacts.person.update.after",
            EventName::DeleteBefore => "contacts.person.delete.before",
            EventName::DeleteAfter => "contacts.person.delete.after",
            EventName::MassDeleteBefore => "contact.person.delete.before",
            EventName::MassDeleteAfter => "contact.person.delete.after",
        }
    }

    pub fn is_before(&self) -> bool {
        matches!(
            self,
            EventName::CreateBefore | EventName::UpdateBefore | EventName::DeleteBefore | EventName::MassDeleteBefore
        )
    }
}

impl fmt::Display for EventName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum EventPayload {
    None,
    Id(i64),
    Person(Box<Person>),
}

impl EventPayload {
    pub fn person_id(&self) -> Option<i64> {
        match self {
            EventPayload::None => None,
            EventPayload::Id(id) => Some(*id),
            EventPayload::Person(person) => Some(person.id),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PersonEvent {
    pub name: EventName,
    pub payload: EventPayload,
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
}

impl PersonEvent {
    pub fn new(name: EventName, payload: EventPayload) -> Self {
        Self {
            name,
            payload,
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
        }
    }

    pub fn none(name: EventName) -> Self {
        Self::new(name, EventPayload::None)
    }

    pub fn id(name: EventName, id: i64) -> Self {
        Self::new(name, EventPayload::Id(id))
    }

    pub fn person(name: EventName, person: Person) -> Self {
        Self::new(name, EventPayload::Person(Box::new(person)))
    }
}

/// Subscriber to person lifecycle events
#[async_trait]
pub trait PersonObserver: Send + Sync {
    /// Observer name for logging and debugging
    fn name(&self) -> &'static str;

    fn applies_to(&self, _event: EventName) -> bool {
        true
    }

    /// Execution timeout (default 5 seconds)
    fn timeout(&self) -> Duration {
        Duration::from_secs(5)
    }

    async fn handle(&self, event: &PersonEvent) -> Result<(), ObserverError>;
}
