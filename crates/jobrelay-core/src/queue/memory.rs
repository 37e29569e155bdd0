//! In-memory task queue for tests and dry runs.
//!
//! ## Limitations
//!
//! - **Nothing is delivered**: requests are recorded, never executed
//! - **Single-process only**: recorded tasks are not visible elsewhere

use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;

use super::{CreatedTask, TaskQueueClient};
use crate::error::{Error, Result};
use crate::task::CreateTaskRequest;

#[derive(Debug, Default)]
struct QueueState {
    requests: Vec<CreateTaskRequest>,
    fail_with: Option<String>,
}

/// Records every creation request instead of contacting a service.
///
/// Created tasks are named `{queue_path}/tasks/{n}` with `n` counting from 1.
///
/// ```rust
/// use jobrelay_core::queue::memory::InMemoryTaskQueue;
///
/// let queue = InMemoryTaskQueue::new();
/// assert!(queue.requests()?.is_empty());
/// # Ok::<(), jobrelay_core::Error>(())
/// ```
#[derive(Debug, Default)]
pub struct InMemoryTaskQueue {
    state: RwLock<QueueState>,
}

fn poison_err<T>(_: PoisonError<T>) -> Error {
    Error::dispatch("in-memory task queue lock poisoned")
}

impl InMemoryTaskQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a queue whose every `create_task` call fails with `message`.
    #[must_use]
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            state: RwLock::new(QueueState {
                requests: Vec::new(),
                fail_with: Some(message.into()),
            }),
        }
    }

    /// Returns a copy of every request recorded so far.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock is poisoned.
    pub fn requests(&self) -> Result<Vec<CreateTaskRequest>> {
        let state = self.state.read().map_err(poison_err)?;
        Ok(state.requests.clone())
    }
}

#[async_trait]
impl TaskQueueClient for InMemoryTaskQueue {
    async fn create_task(&self, request: &CreateTaskRequest) -> Result<CreatedTask> {
        let mut state = self.state.write().map_err(poison_err)?;
        if let Some(message) = &state.fail_with {
            return Err(Error::dispatch(message.clone()));
        }

        state.requests.push(request.clone());
        let name = format!("{}/tasks/{}", request.queue_path, state.requests.len());
        drop(state);

        Ok(CreatedTask { name })
    }

    fn endpoint(&self) -> &str {
        "memory"
    }
}
