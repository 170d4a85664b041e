pub mod manager;
pub mod memory;
pub mod person_repository;
pub mod query_builder;
pub mod repository;
pub mod store;

pub use manager::{DatabaseError, DatabaseManager};
pub use memory::MemoryPersonStore;
pub use person_repository::PgPersonStore;
pub use store::{Page, PageRequest, PersonStore, StoreError};
