//! Task queue client abstraction.
//!
//! This module provides:
//!
//! - [`TaskQueueClient`]: Trait for submitting task creation requests
//! - [`CreatedTask`]: The service's acknowledgement of a created task
//! - [`cloud_tasks::CloudTasksClient`]: Google Cloud Tasks REST client
//! - [`memory::InMemoryTaskQueue`]: Recording queue for tests and dry runs
//!
//! Scheduling, delivery, retries and deduplication all belong to the
//! service behind the client.

pub mod cloud_tasks;
pub mod memory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::task::CreateTaskRequest;

/// A task accepted by the queue service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedTask {
    /// Fully qualified task name,
    /// `projects/{p}/locations/{l}/queues/{q}/tasks/{id}`.
    pub name: String,
}

impl CreatedTask {
    /// Returns the trailing task ID segment of the name.
    #[must_use]
    pub fn task_id(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or(&self.name)
    }
}

/// Client for a managed task queue service.
///
/// One call creates one task. Implementations must not retry on their own.
#[async_trait]
pub trait TaskQueueClient: Send + Sync {
    /// Creates the task described by `request` and returns its name.
    async fn create_task(&self, request: &CreateTaskRequest) -> Result<CreatedTask>;

    /// Returns a human-readable description of where tasks are sent.
    fn endpoint(&self) -> &str;
}
