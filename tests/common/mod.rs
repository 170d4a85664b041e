#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use tracing_subscriber::EnvFilter;

use crm_persons_api::auth::{generate_jwt, Claims};
use crm_persons_api::authorization::{StaticAuthorizationResolver, ViewPermission};
use crm_persons_api::config::AppConfig;
use crm_persons_api::database::{MemoryPersonStore, Page, PageRequest, PersonStore, StoreError};
use crm_persons_api::models::{Organization, Person, PersonData};
use crm_persons_api::observer::{EventDispatcher, ObserverError, PersonEvent, PersonObserver};
use crm_persons_api::search::PersonCriteria;
use crm_persons_api::{app, AppState};

/// Captures every dispatched event as `(channel, person id)`
#[derive(Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<(String, Option<i64>)>>,
}

impl RecordingObserver {
    pub fn events(&self) -> Vec<(String, Option<i64>)> {
        self.events.lock().unwrap().clone()
    }

    pub fn channels(&self) -> Vec<String> {
        self.events().into_iter().map(|(name, _)| name).collect()
    }

    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }
}

#[async_trait]
impl PersonObserver for RecordingObserver {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn handle(&self, event: &PersonEvent) -> Result<(), ObserverError> {
        self.events
            .lock()
            .unwrap()
            .push((event.name.as_str().to_string(), event.payload.person_id()));
        Ok(())
    }
}

/// Memory store whose deletes can be switched to fail
#[derive(Default)]
pub struct FlakyStore {
    pub inner: MemoryPersonStore,
    pub fail_deletes: AtomicBool,
}

#[async_trait]
impl PersonStore for FlakyStore {
    async fn paginate(&self, criteria: &PersonCriteria, page: PageRequest) -> Result<Page<Person>, StoreError> {
        self.inner.paginate(criteria, page).await
    }

    async fn find(&self, id: i64) -> Result<Option<Person>, StoreError> {
        self.inner.find(id).await
    }

    async fn create(&self, data: PersonData) -> Result<Person, StoreError> {
        self.inner.create(data).await
    }

    async fn update(&self, id: i64, data: PersonData) -> Result<Person, StoreError> {
        self.inner.update(id, data).await
    }

    async fn delete(&self, id: i64) -> Result<(), StoreError> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(StoreError::Invalid("simulated delete failure".to_string()));
        }
        self.inner.delete(id).await
    }
}

#[derive(Default)]
pub struct TestOptions {
    /// group id -> member user ids
    pub groups: HashMap<i64, Vec<i64>>,
    pub legacy_delete_failure_message: bool,
    pub max_per_page: Option<u32>,
}

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    pub client: reqwest::Client,
    pub store: Arc<FlakyStore>,
    pub recorder: Arc<RecordingObserver>,
    secret: String,
}

impl TestServer {
    pub async fn spawn() -> Result<Self> {
        Self::spawn_with(TestOptions::default()).await
    }

    pub async fn spawn_with(options: TestOptions) -> Result<Self> {
        init_tracing();

        let mut config = AppConfig::development();
        config.persons.legacy_delete_failure_message = options.legacy_delete_failure_message;
        if options.max_per_page.is_some() {
            config.pagination.max_per_page = options.max_per_page;
        }
        let secret = config.security.jwt_secret.clone();

        let store = Arc::new(FlakyStore::default());
        store
            .inner
            .add_organization(Organization { id: 1, name: "Acme".to_string() })
            .await;

        let mut resolver = StaticAuthorizationResolver::new();
        for (group_id, members) in options.groups {
            resolver = resolver.with_group(group_id, members);
        }

        let recorder = Arc::new(RecordingObserver::default());
        let dispatcher = EventDispatcher::new().with_observer(recorder.clone());
        let state = AppState::new(store.clone(), Arc::new(resolver), dispatcher, config);

        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
            .await
            .context("failed to bind test listener")?;
        tokio::spawn(async move {
            axum::serve(listener, app(state)).await.ok();
        });
        tracing::debug!(port, "test server listening");

        Ok(Self {
            port,
            base_url: format!("http://127.0.0.1:{}", port),
            client: reqwest::Client::new(),
            store,
            recorder,
            secret,
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn token(&self, user_id: i64, view_permission: ViewPermission) -> String {
        generate_jwt(&Claims::new(user_id, view_permission, 1), &self.secret).expect("token")
    }

    /// Global-view bearer token for user 1
    pub fn admin(&self) -> String {
        self.token(1, ViewPermission::Global)
    }

    /// Create a person through the API, returning the `data` object
    pub async fn create_person(&self, token: &str, body: &Value) -> Result<Value> {
        let res = self
            .client
            .post(self.url("/api/contacts/persons"))
            .bearer_auth(token)
            .json(body)
            .send()
            .await?;
        anyhow::ensure!(res.status().as_u16() == 201, "create failed with {}", res.status());
        let body = res.json::<Value>().await?;
        Ok(body["data"].clone())
    }
}

/// Quiet by default; `RUST_LOG=crm_persons_api=debug` shows server logs per test
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    // Every test binary shares one global subscriber; later calls are no-ops
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

pub fn person_body(name: &str, email: &str) -> Value {
    json!({
        "name": name,
        "emails": [{ "value": email, "label": "work" }],
        "contact_numbers": [{ "value": "555-0100", "label": "work" }]
    })
}
