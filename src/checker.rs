//! Per-kind status extraction.

use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;

use crate::platform::types::{Agent, Job, ModelApi, Sandbox, ToolServer};
use crate::platform::{PlatformError, PlatformResource, ResourceClient};
use crate::resource::ResourceKind;

/// Status string reported when a resource carries no status field.
pub const MISSING_STATUS: &str = "UNKNOWN";

/// Fetches a resource and extracts its lifecycle status.
#[async_trait]
pub trait StatusChecker: Send + Sync {
    /// Kind of resource this checker reads.
    fn kind(&self) -> ResourceKind;

    /// Fetch the current status. `Ok(None)` means the resource is absent.
    async fn fetch_status(&self, name: &str) -> Result<Option<String>, PlatformError>;
}

/// Status checker backed by a [`ResourceClient`] and a typed model.
pub struct ResourceStatusChecker<R> {
    client: Arc<dyn ResourceClient>,
    _model: PhantomData<fn() -> R>,
}

impl<R: PlatformResource> ResourceStatusChecker<R> {
    pub fn new(client: Arc<dyn ResourceClient>) -> Self {
        Self {
            client,
            _model: PhantomData,
        }
    }
}

#[async_trait]
impl<R: PlatformResource> StatusChecker for ResourceStatusChecker<R> {
    fn kind(&self) -> ResourceKind {
        R::KIND
    }

    async fn fetch_status(&self, name: &str) -> Result<Option<String>, PlatformError> {
        let Some(value) = self.client.get(R::KIND, name).await? else {
            return Ok(None);
        };
        let resource = R::from_value(value)?;
        Ok(Some(
            resource.status().unwrap_or(MISSING_STATUS).to_string(),
        ))
    }
}

/// Status checker for the given kind.
pub fn checker_for(kind: ResourceKind, client: Arc<dyn ResourceClient>) -> Box<dyn StatusChecker> {
    match kind {
        ResourceKind::Agent => Box::new(ResourceStatusChecker::<Agent>::new(client)),
        ResourceKind::Job => Box::new(ResourceStatusChecker::<Job>::new(client)),
        ResourceKind::ModelApi => Box::new(ResourceStatusChecker::<ModelApi>::new(client)),
        ResourceKind::ToolServer => Box::new(ResourceStatusChecker::<ToolServer>::new(client)),
        ResourceKind::Sandbox => Box::new(ResourceStatusChecker::<Sandbox>::new(client)),
    }
}
