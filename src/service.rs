//! Cloud service clients.
//!
//! Commands reach the remote API only through the traits here. The clients are shared,
//! read-only, across concurrently executing batch items.

use crate::error::ApiError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

pub mod http;

pub use http::HttpObjectStorage;

/// Container metadata as reported by the object-storage service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerInfo {
    pub name: String,
    #[serde(rename = "count")]
    pub object_count: u64,
    #[serde(rename = "bytes")]
    pub bytes_used: u64,
}

/// Object-storage container operations.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// List containers, optionally filtered by name prefix and capped at `limit`.
    async fn list_containers(
        &self,
        prefix: Option<&str>,
        limit: Option<usize>,
    ) -> Result<Vec<ContainerInfo>, ApiError>;

    async fn get_container(&self, name: &str) -> Result<ContainerInfo, ApiError>;

    async fn create_container(&self, name: &str, metadata: &[(String, String)])
        -> Result<(), ApiError>;

    async fn delete_container(&self, name: &str) -> Result<(), ApiError>;
}

/// Resolved service clients plus the client-side timing knobs handed to execution hooks.
#[derive(Clone)]
pub struct Services {
    pub object_storage: Arc<dyn ObjectStorage>,
    pub poll_interval: Duration,
}

impl Services {
    pub fn new(object_storage: Arc<dyn ObjectStorage>) -> Self {
        Self {
            object_storage,
            poll_interval: Duration::from_secs(2),
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }
}
