// In memory implementation of the ResourceFetcher port.
//
// Serves canned JSON per resource path and records every request, so the
// aggregation pipeline can be exercised without a Toggl account.

use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;
use tokio::sync::RwLock;

use super::toggl::{Resource, ResourceFetcher};
use crate::error::{InvoiceError, Result};

#[derive(Default)]
pub struct InMemoryFetcher {
    responses: HashMap<String, (StatusCode, Value)>,
    requests: RwLock<Vec<Resource>>,
}

impl InMemoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answers `path` (e.g. `projects/7`) with `200 OK` and `body`.
    pub fn with(mut self, path: &str, body: Value) -> Self {
        self.responses
            .insert(path.to_string(), (StatusCode::OK, body));
        self
    }

    /// Answers `path` with `status` and an empty body.
    pub fn with_status(mut self, path: &str, status: StatusCode) -> Self {
        self.responses
            .insert(path.to_string(), (status, Value::Null));
        self
    }

    pub async fn requests(&self) -> Vec<Resource> {
        self.requests.read().await.clone()
    }
}

#[async_trait]
impl ResourceFetcher for InMemoryFetcher {
    async fn fetch(&self, resource: &Resource) -> Result<Value> {
        self.requests.write().await.push(resource.clone());

        let path = resource.path();
        let (status, body) = self
            .responses
            .get(&path)
            .cloned()
            .unwrap_or((StatusCode::NOT_FOUND, Value::Null));

        if status != StatusCode::OK {
            return Err(InvoiceError::RemoteRequest { url: path, status });
        }
        Ok(body)
    }
}
