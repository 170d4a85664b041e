use thiserror::Error;

/// Failures raised by individual observers
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ObserverError {
    #[error("Observer {observer} failed: {message}")]
    Failed { observer: String, message: String },

    #[error("Observer {observer} timed out after {millis}ms")]
    Timeout { observer: String, millis: u128 },
}

impl ObserverError {
    pub fn failed(observer: impl Into<String>, message: impl Into<String>) -> Self {
        ObserverError::Failed {
            observer: observer.into(),
            message: message.into(),
        }
    }

    pub fn observer(&self) -> &str {
        match self {
            ObserverError::Failed { observer, .. } | ObserverError::Timeout { observer, .. } => observer,
        }
    }
}
