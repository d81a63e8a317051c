//! In-memory platform fakes shared by unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::platform::client::{IntegrationClient, ResourceClient};
use crate::platform::error::{PlatformError, Result};
use crate::report::{Attempt, Observation, Reporter};
use crate::resource::{IntegrationSpec, ResourceKind};

/// Scripted platform. Each call pops the next queued response; an empty
/// queue yields a default success.
#[derive(Default)]
pub struct FakePlatform {
    create_responses: Mutex<VecDeque<Result<Value>>>,
    get_responses: Mutex<VecDeque<Result<Option<Value>>>>,
    delete_responses: Mutex<VecDeque<Result<()>>>,
    integration_responses: Mutex<VecDeque<Result<()>>>,
    list_response: Mutex<Vec<Value>>,
    creates: Mutex<Vec<(ResourceKind, Value)>>,
    gets: Mutex<Vec<(ResourceKind, String)>>,
    deletes: Mutex<Vec<(ResourceKind, String)>>,
    integrations: Mutex<Vec<IntegrationSpec>>,
}

impl FakePlatform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_create(&self, response: Result<Value>) {
        self.create_responses.lock().unwrap().push_back(response);
    }

    pub fn push_get(&self, response: Result<Option<Value>>) {
        self.get_responses.lock().unwrap().push_back(response);
    }

    /// Queue a get returning a resource in the given status.
    pub fn push_status(&self, name: &str, status: &str) {
        self.push_get(Ok(Some(resource(name, status))));
    }

    pub fn push_delete(&self, response: Result<()>) {
        self.delete_responses.lock().unwrap().push_back(response);
    }

    pub fn push_integration(&self, response: Result<()>) {
        self.integration_responses.lock().unwrap().push_back(response);
    }

    pub fn set_list(&self, items: Vec<Value>) {
        *self.list_response.lock().unwrap() = items;
    }

    pub fn create_calls(&self) -> Vec<(ResourceKind, Value)> {
        self.creates.lock().unwrap().clone()
    }

    pub fn get_calls(&self) -> Vec<(ResourceKind, String)> {
        self.gets.lock().unwrap().clone()
    }

    pub fn delete_calls(&self) -> Vec<(ResourceKind, String)> {
        self.deletes.lock().unwrap().clone()
    }

    pub fn integration_calls(&self) -> Vec<IntegrationSpec> {
        self.integrations.lock().unwrap().clone()
    }

    /// Total number of platform calls made.
    pub fn call_count(&self) -> usize {
        self.creates.lock().unwrap().len()
            + self.gets.lock().unwrap().len()
            + self.deletes.lock().unwrap().len()
            + self.integrations.lock().unwrap().len()
    }
}

/// Minimal platform body for a resource in a status.
pub fn resource(name: &str, status: &str) -> Value {
    json!({
        "metadata": {"name": name},
        "spec": {},
        "status": status,
    })
}

#[async_trait]
impl ResourceClient for FakePlatform {
    async fn create(&self, kind: ResourceKind, body: &Value) -> Result<Value> {
        self.creates.lock().unwrap().push((kind, body.clone()));
        let name = body["metadata"]["name"].as_str().unwrap_or_default().to_string();
        self.create_responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(resource(&name, "CREATED")))
    }

    async fn get(&self, kind: ResourceKind, name: &str) -> Result<Option<Value>> {
        self.gets.lock().unwrap().push((kind, name.to_string()));
        self.get_responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Some(resource(name, "DEPLOYED"))))
    }

    async fn list(&self, _kind: ResourceKind) -> Result<Vec<Value>> {
        Ok(self.list_response.lock().unwrap().clone())
    }

    async fn delete(&self, kind: ResourceKind, name: &str) -> Result<()> {
        self.deletes.lock().unwrap().push((kind, name.to_string()));
        self.delete_responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(()))
    }
}

#[async_trait]
impl IntegrationClient for FakePlatform {
    async fn create_integration(&self, integration: &IntegrationSpec) -> Result<()> {
        self.integrations.lock().unwrap().push(integration.clone());
        self.integration_responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(()))
    }
}

/// Reporter that records every event as a line of text.
#[derive(Default)]
pub struct RecordingReporter {
    events: Mutex<Vec<String>>,
}

impl RecordingReporter {
    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    pub fn warnings(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| e.strip_prefix("warning: ").map(String::from))
            .collect()
    }
}

impl Reporter for RecordingReporter {
    fn attempt(&self, attempt: &Attempt<'_>) {
        let observed = match &attempt.observation {
            Observation::Status(status) => status.to_string(),
            Observation::Missing => "missing".to_string(),
            Observation::FetchFailed(e) => format!("error: {}", e),
        };
        self.events.lock().unwrap().push(format!(
            "attempt {}/{} {} {}: {}",
            attempt.number, attempt.max_attempts, attempt.kind, attempt.name, observed
        ));
    }

    fn milestone(&self, message: &str) {
        self.events.lock().unwrap().push(format!("milestone: {}", message));
    }

    fn warning(&self, message: &str) {
        self.events.lock().unwrap().push(format!("warning: {}", message));
    }
}

/// A transient server failure.
pub fn server_error() -> PlatformError {
    PlatformError::from_status(503, "temporarily unavailable")
}
