//! End-to-end dispatch pipeline tests against the in-memory queue.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::collections::HashMap;
use std::io::Write;
use std::sync::{Arc, Mutex};

use tracing_subscriber::fmt::MakeWriter;

use jobrelay_core::config::{CLASSES, DispatchConfig};
use jobrelay_core::dispatcher::JobDispatcher;
use jobrelay_core::envelope::decode_envelope;
use jobrelay_core::error::Error;
use jobrelay_core::queue::memory::InMemoryTaskQueue;
use jobrelay_core::task::HttpMethod;

/// Collects formatted log output in memory.
#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).expect("utf-8 logs")
    }
}

impl Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = Self;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

fn sample_env() -> HashMap<&'static str, &'static str> {
    HashMap::from([
        ("COMMIT_HASH", "abc123"),
        ("CLASSES", "Foo, Bar"),
        ("PULL_REQUEST_NUMBER", "42"),
        ("PROJECT_ID", "p"),
        ("LOCATION", "l"),
        ("QUEUE_ID", "q"),
        ("WORKFLOW_URL", "https://x/y"),
        ("SERVICE_ACCOUNT_EMAIL", "sa@p.iam"),
    ])
}

fn config_from(env: &HashMap<&'static str, &'static str>) -> jobrelay_core::Result<DispatchConfig> {
    DispatchConfig::from_lookup(|key| env.get(key).map(ToString::to_string))
}

fn sample_dispatcher() -> JobDispatcher<InMemoryTaskQueue> {
    let config = config_from(&sample_env()).expect("config");
    JobDispatcher::new(config, InMemoryTaskQueue::new())
}

#[test]
fn prepared_request_matches_environment() {
    let prepared = sample_dispatcher().prepare().expect("prepare");

    assert_eq!(prepared.request.queue_path, "projects/p/locations/l/queues/q");

    let task = prepared.request.http_task();
    assert_eq!(task.url, "https://x/y");
    assert_eq!(task.http_method, HttpMethod::Post);
    assert_eq!(task.service_account_email(), Some("sa@p.iam"));

    let body = task.decoded_body().expect("decode body");
    assert_eq!(body, prepared.envelope);

    let outer: serde_json::Value = serde_json::from_str(&body).expect("outer json");
    let argument: serde_json::Value =
        serde_json::from_str(outer["argument"].as_str().expect("argument string"))
            .expect("argument json");

    assert_eq!(argument["commitHash"], "abc123");
    assert_eq!(argument["classes"], serde_json::json!(["Foo", "Bar"]));
    assert_eq!(argument["pullRequest"], "42");

    let job_id = argument["jobId"].as_str().expect("job id");
    assert_eq!(job_id.len(), 36);
    assert_eq!(job_id, prepared.payload.job_id);
}

#[test]
fn envelope_body_decodes_to_payload() {
    let prepared = sample_dispatcher().prepare().expect("prepare");
    let body = prepared.request.http_task().decoded_body().expect("decode");

    assert_eq!(decode_envelope(&body).expect("envelope"), prepared.payload);
}

#[test]
fn repeated_builds_differ_only_in_job_id() {
    let dispatcher = sample_dispatcher();
    let first = dispatcher.prepare().expect("first");
    let second = dispatcher.prepare().expect("second");

    assert_ne!(first.payload.job_id, second.payload.job_id);
    assert_eq!(first.payload.commit_hash, second.payload.commit_hash);
    assert_eq!(first.payload.classes, second.payload.classes);
    assert_eq!(first.payload.pull_request, second.payload.pull_request);
    assert_eq!(first.request.queue_path, second.request.queue_path);
    assert_eq!(first.request.http_task().url, second.request.http_task().url);
}

#[test]
fn missing_classes_fails_before_payload_is_built() {
    let mut env = sample_env();
    env.remove("CLASSES");

    let err = config_from(&env).expect_err("missing CLASSES must fail");
    assert!(matches!(err, Error::MissingVariable { name: CLASSES }));
    assert!(err.is_configuration());
}

#[tokio::test]
async fn dispatch_submits_exactly_one_request() {
    let dispatcher = sample_dispatcher();

    let outcome = dispatcher.dispatch().await.expect("dispatch");

    let requests = dispatcher.queue().requests().expect("requests");
    assert_eq!(requests.len(), 1);
    assert_eq!(outcome.task_name, "projects/p/locations/l/queues/q/tasks/1");

    let body = requests[0].http_task().decoded_body().expect("decode");
    let payload = decode_envelope(&body).expect("payload");
    assert_eq!(payload.job_id, outcome.job_id);
}

#[tokio::test]
async fn queue_failure_propagates() {
    let config = config_from(&sample_env()).expect("config");
    let dispatcher = JobDispatcher::new(config, InMemoryTaskQueue::failing("queue not found"));

    let err = dispatcher.dispatch().await.expect_err("dispatch must fail");

    assert!(matches!(err, Error::Dispatch { .. }));
    assert!(!err.is_configuration());
    assert!(err.to_string().contains("queue not found"));
}

#[tokio::test]
async fn submit_reuses_prepared_request() {
    let dispatcher = sample_dispatcher();
    let prepared = dispatcher.prepare().expect("prepare");

    let created = dispatcher.submit(&prepared).await.expect("submit");

    assert_eq!(created.task_id(), "1");
    assert_eq!(dispatcher.queue().requests().expect("requests")[0], prepared.request);
}

#[test]
fn trailing_class_separator_keeps_empty_entry() {
    let mut env = sample_env();
    env.insert("CLASSES", "Foo,Bar,");
    let config = config_from(&env).expect("trailing separator is accepted");

    let prepared = JobDispatcher::new(config, InMemoryTaskQueue::new())
        .prepare()
        .expect("prepare");

    assert_eq!(prepared.payload.classes, vec!["Foo", "Bar", ""]);
}

#[tokio::test]
async fn dispatch_logs_envelope_then_task_name() {
    let logs = CapturedLogs::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(logs.clone())
        .with_ansi(false)
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let outcome = sample_dispatcher().dispatch().await.expect("dispatch");

    let output = logs.contents();
    let envelope_at = output
        .find(r#"payload={"argument": "{\"jobId\":\""#)
        .expect("envelope logged");
    let task_at = output
        .find(&format!("task={}", outcome.task_name))
        .expect("task name logged");
    assert!(envelope_at < task_at);
    assert!(output.contains(&outcome.job_id));
}
