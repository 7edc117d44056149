use std::collections::HashMap;
use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;

use super::Backend;
use super::BackendError;
use super::EntityState;

/// A request the mock backend received
#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    Service {
        domain: String,
        service: String,
        payload: serde_json::Value,
    },
    State {
        entity_id: String,
    },
}

/// Mock backend for testing
///
/// Records every call. Services are addressed as `domain.service`; both
/// services and entity ids can be scripted to fail.
#[derive(Debug, Default)]
pub struct MockBackend {
    calls: Mutex<Vec<BackendCall>>,
    states: HashMap<String, String>,
    failing: HashSet<String>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(mut self, entity_id: &str, state: &str) -> Self {
        self.states.insert(entity_id.to_string(), state.to_string());
        self
    }

    /// Make a service (`light.turn_on`) or an entity id fail
    pub fn failing(mut self, key: &str) -> Self {
        self.failing.insert(key.to_string());
        self
    }

    pub fn calls(&self) -> Vec<BackendCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Backend for MockBackend {
    async fn call_service(
        &self,
        domain: &str,
        service: &str,
        payload: &serde_json::Value,
    ) -> Result<serde_json::Value, BackendError> {
        self.calls.lock().unwrap().push(BackendCall::Service {
            domain: domain.to_string(),
            service: service.to_string(),
            payload: payload.clone(),
        });

        if self.failing.contains(&format!("{}.{}", domain, service)) {
            return Err(BackendError::Status {
                status: 400,
                body: "service rejected".to_string(),
            });
        }
        Ok(serde_json::json!([]))
    }

    async fn get_state(&self, entity_id: &str) -> Result<EntityState, BackendError> {
        self.calls.lock().unwrap().push(BackendCall::State {
            entity_id: entity_id.to_string(),
        });

        if self.failing.contains(entity_id) {
            return Err(BackendError::Status {
                status: 404,
                body: format!("Entity not found: {}", entity_id),
            });
        }
        Ok(EntityState {
            entity_id: entity_id.to_string(),
            state: self.states.get(entity_id).cloned(),
            attributes: serde_json::Value::Null,
        })
    }
}
