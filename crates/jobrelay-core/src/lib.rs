//! # jobrelay-core
//!
//! Builds the payload for a CI test job and enqueues it as a Google Cloud
//! Tasks HTTP task. The task later calls a workflow endpoint with an
//! authenticated request whose body is `{"argument": "<payload JSON>"}`.
//!
//! ## Pipeline
//!
//! 1. [`config::DispatchConfig`] is read from the environment and validated
//! 2. [`payload::JobPayload`] gets a fresh job ID and the parsed class list
//! 3. [`envelope::encode_envelope`] double-encodes the payload
//! 4. [`task::HttpTask`] and [`task::CreateTaskRequest`] describe the task
//! 5. [`queue::TaskQueueClient::create_task`] submits it once
//!
//! ## Example
//!
//! ```rust
//! use jobrelay_core::config::DispatchConfig;
//! use jobrelay_core::dispatcher::JobDispatcher;
//! use jobrelay_core::queue::memory::InMemoryTaskQueue;
//!
//! # fn main() -> jobrelay_core::error::Result<()> {
//! let config = DispatchConfig::from_lookup(|key| {
//!     Some(match key {
//!         "COMMIT_HASH" => "abc123",
//!         "CLASSES" => "Foo, Bar",
//!         "PULL_REQUEST_NUMBER" => "42",
//!         "PROJECT_ID" => "p",
//!         "LOCATION" => "l",
//!         "QUEUE_ID" => "q",
//!         "WORKFLOW_URL" => "https://x/y",
//!         "SERVICE_ACCOUNT_EMAIL" => "sa@p.iam",
//!         _ => return None,
//!     }
//!     .to_string())
//! })?;
//!
//! let dispatcher = JobDispatcher::new(config, InMemoryTaskQueue::new());
//! let prepared = dispatcher.prepare()?;
//! assert_eq!(prepared.request.queue_path, "projects/p/locations/l/queues/q");
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod dispatcher;
pub mod envelope;
pub mod error;
pub mod observability;
pub mod payload;
pub mod queue;
pub mod task;

pub use config::DispatchConfig;
pub use dispatcher::{DispatchOutcome, JobDispatcher, PreparedDispatch};
pub use error::{Error, Result};
pub use payload::JobPayload;
