//! Home Assistant REST API access.
//!
//! Only the two operations the light actions need are exposed: calling a
//! service and reading one entity's state.

mod client;
mod error;
#[cfg(test)]
pub(crate) mod mock;

use std::sync::Arc;

use async_trait::async_trait;
pub use client::HaClient;
pub use error::BackendError;
use serde::Deserialize;
use serde::Serialize;

/// State record returned by `GET /api/states/{entity_id}`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EntityState {
    #[serde(default)]
    pub entity_id: String,

    /// `on`, `off`, `unavailable`, ...
    #[serde(default)]
    pub state: Option<String>,

    #[serde(default)]
    pub attributes: serde_json::Value,
}

/// Trait for backend operations
///
/// This trait allows for mocking the Home Assistant client for testing purposes
#[async_trait]
pub trait Backend: Send + Sync {
    /// Call `domain.service` with the given service data
    async fn call_service(
        &self,
        domain: &str,
        service: &str,
        payload: &serde_json::Value,
    ) -> Result<serde_json::Value, BackendError>;

    /// Fetch the current state of one entity
    async fn get_state(&self, entity_id: &str) -> Result<EntityState, BackendError>;
}

#[async_trait]
impl<B: Backend + ?Sized> Backend for Arc<B> {
    async fn call_service(
        &self,
        domain: &str,
        service: &str,
        payload: &serde_json::Value,
    ) -> Result<serde_json::Value, BackendError> {
        (**self).call_service(domain, service, payload).await
    }

    async fn get_state(&self, entity_id: &str) -> Result<EntityState, BackendError> {
        (**self).get_state(entity_id).await
    }
}
