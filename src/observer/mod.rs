// Person lifecycle notifications: event names, observer trait, dispatcher

pub mod error;
pub mod observers;
pub mod pipeline;
pub mod traits;

pub use error::ObserverError;
pub use observers::AuditLogObserver;
pub use pipeline::{DispatchReport, EventDispatcher};
pub use traits::{EventName, EventPayload, PersonEvent, PersonObserver};
