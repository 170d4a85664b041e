// Lifecycle event dispatch.
//
// Before-events run observers one at a time in registration order, after-events
// fan out concurrently. Observer failures and timeouts never reach the caller;
// they are logged and collected in the returned report.

use futures::future::join_all;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use uuid::Uuid;

use crate::observer::error::ObserverError;
use crate::observer::traits::{EventName, PersonEvent, PersonObserver};

/// Outcome of one dispatch
#[derive(Debug, Clone)]
pub struct DispatchReport {
    pub event: EventName,
    pub event_id: Uuid,
    pub delivered: Vec<&'static str>,
    pub errors: Vec<ObserverError>,
    pub execution_time: Duration,
}

impl DispatchReport {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

#[derive(Default, Clone)]
pub struct EventDispatcher {
    observers: Vec<Arc<dyn PersonObserver>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, observer: Arc<dyn PersonObserver>) {
        tracing::debug!("Registered observer '{}'", observer.name());
        self.observers.push(observer);
    }

    pub fn with_observer(mut self, observer: Arc<dyn PersonObserver>) -> Self {
        self.register(observer);
        self
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    pub async fn dispatch(&self, event: PersonEvent) -> DispatchReport {
        let start_time = Instant::now();
        let applicable: Vec<&Arc<dyn PersonObserver>> =
            self.observers.iter().filter(|o| o.applies_to(event.name)).collect();

        tracing::debug!(
            event = %event.name,
            event_id = %event.event_id,
            observers = applicable.len(),
            "dispatching person event"
        );

        let outcomes: Vec<(&'static str, Result<(), ObserverError>)> = if event.name.is_before() {
            let mut outcomes = Vec::with_capacity(applicable.len());
            for observer in applicable {
                outcomes.push((observer.name(), run_observer(observer.as_ref(), &event).await));
            }
            outcomes
        } else {
            join_all(applicable.into_iter().map(|observer| {
                let event = &event;
                async move { (observer.name(), run_observer(observer.as_ref(), event).await) }
            }))
            .await
        };

        let mut report = DispatchReport {
            event: event.name,
            event_id: event.event_id,
            delivered: Vec::new(),
            errors: Vec::new(),
            execution_time: Duration::ZERO,
        };
        for (name, outcome) in outcomes {
            match outcome {
                Ok(()) => report.delivered.push(name),
                Err(error) => report.errors.push(error),
            }
        }
        report.execution_time = start_time.elapsed();
        report
    }
}

/// Execute with timeout protection
async fn run_observer(observer: &dyn PersonObserver, event: &PersonEvent) -> Result<(), ObserverError> {
    let observer_start = Instant::now();
    match timeout(observer.timeout(), observer.handle(event)).await {
        Ok(Ok(())) => {
            tracing::debug!(
                "Observer: {} handled {} in {:?}",
                observer.name(),
                event.name,
                observer_start.elapsed()
            );
            Ok(())
        }
        Ok(Err(error)) => {
            tracing::warn!(
                "Observer: {} failed on {} in {:?}: {}",
                observer.name(),
                event.name,
                observer_start.elapsed(),
                error
            );
            Err(error)
        }
        Err(_elapsed) => {
            tracing::error!(
                "Observer: {} timed out on {} after {:?}",
                observer.name(),
                event.name,
                observer.timeout()
            );
            Err(ObserverError::Timeout {
                observer: observer.name().to_string(),
                millis: observer.timeout().as_millis(),
            })
        }
    }
}
