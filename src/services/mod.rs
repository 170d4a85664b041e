pub mod person_service;

pub use person_service::{DeleteOutcome, ListParams, PersonService, PersonServiceError, SearchParams};
