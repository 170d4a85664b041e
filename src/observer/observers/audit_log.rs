use async_trait::async_trait;
use tracing::info;

use crate::observer::error::ObserverError;
use crate::observer::traits::{EventPayload, PersonEvent, PersonObserver};

/// Structured audit trail of person lifecycle events
pub struct AuditLogObserver;

#[async_trait]
impl PersonObserver for AuditLogObserver {
    fn name(&self) -> &'static str {
        "audit_log"
    }

    async fn handle(&self, event: &PersonEvent) -> Result<(), ObserverError> {
        let owner = match &event.payload {
            EventPayload::Person(person) => person.user_id,
            _ => None,
        };
        info!(
            target: "audit",
            event = %event.name,
            event_id = %event.event_id,
            person_id = ?event.payload.person_id(),
            owner_id = ?owner,
            occurred_at = %event.occurred_at.to_rfc3339(),
            "person lifecycle event"
        );
        Ok(())
    }
}
