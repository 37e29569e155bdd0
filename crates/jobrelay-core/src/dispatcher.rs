//! The job dispatch pipeline.
//!
//! `config → payload → envelope → HTTP task → queue request → submit`.
//! Every step before `submit` is pure; `submit` makes exactly one call.

use tracing::Instrument;

use crate::config::DispatchConfig;
use crate::envelope::encode_envelope;
use crate::error::{Error, Result};
use crate::observability::dispatch_span;
use crate::payload::JobPayload;
use crate::queue::{CreatedTask, TaskQueueClient};
use crate::task::{CreateTaskRequest, HttpTask};

/// Everything built for one dispatch, before it is submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedDispatch {
    /// The job payload.
    pub payload: JobPayload,
    /// The double-encoded envelope sent as the task body.
    pub envelope: String,
    /// The queue-qualified creation request.
    pub request: CreateTaskRequest,
}

/// Result of a successful dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchOutcome {
    /// ID of the dispatched job.
    pub job_id: String,
    /// Name of the created task.
    pub task_name: String,
}

/// Builds and submits one job task per invocation.
#[derive(Debug)]
pub struct JobDispatcher<Q> {
    config: DispatchConfig,
    queue: Q,
}

impl<Q: TaskQueueClient> JobDispatcher<Q> {
    /// Creates a dispatcher for a validated configuration.
    #[must_use]
    pub const fn new(config: DispatchConfig, queue: Q) -> Self {
        Self { config, queue }
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Returns the queue client.
    #[must_use]
    pub const fn queue(&self) -> &Q {
        &self.queue
    }

    /// Builds the payload, envelope, task descriptor and request.
    ///
    /// # Errors
    ///
    /// Returns an error if the class list is blank or serialization fails.
    pub fn prepare(&self) -> Result<PreparedDispatch> {
        let payload = JobPayload::build(&self.config)?;
        let envelope = encode_envelope(&payload)?;
        let task = HttpTask::new(&self.config, &envelope);
        let request = CreateTaskRequest::new(self.config.queue_path(), task);

        Ok(PreparedDispatch {
            payload,
            envelope,
            request,
        })
    }

    /// Submits a prepared request with a single creation call.
    ///
    /// # Errors
    ///
    /// Returns the queue client's error unchanged.
    pub async fn submit(&self, prepared: &PreparedDispatch) -> Result<CreatedTask> {
        let created = self.queue.create_task(&prepared.request).await?;
        tracing::info!(
            task = %created.name,
            job_id = %prepared.payload.job_id,
            "created task"
        );
        Ok(created)
    }

    /// Prepares, logs and submits the job.
    ///
    /// # Errors
    ///
    /// Returns an error if preparation or submission fails.
    pub async fn dispatch(&self) -> Result<DispatchOutcome> {
        let span = dispatch_span(
            &self.config.project_id,
            &self.config.queue_path(),
            &self.config.commit_hash,
        );

        async {
            let prepared = self.prepare()?;
            tracing::info!(
                payload = %prepared.envelope,
                endpoint = self.queue.endpoint(),
                "dispatching job"
            );

            let created = self.submit(&prepared).await?;
            Ok::<_, Error>(DispatchOutcome {
                job_id: prepared.payload.job_id,
                task_name: created.name,
            })
        }
        .instrument(span)
        .await
    }
}
