//! End-to-end runs of the service over a real socket.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use grash::config::load_config_from_str;
use grash::lifecycle::{
    CloseError, NoopReporter, RunError, ServiceRunner, ShutdownReporter, HTTP_SERVER_TASK,
};
use grash::ServiceConfig;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

mod common;
use common::{register_timed, Invocations};

#[derive(Default)]
struct StartedTasks {
    names: Mutex<Vec<String>>,
}

impl ShutdownReporter for StartedTasks {
    fn task_started(&self, name: &str) {
        self.names.lock().unwrap().push(name.to_string());
    }
}

fn config_with_timeout(timeout: Duration) -> ServiceConfig {
    let mut config = ServiceConfig::default();
    config.http_server.address = "127.0.0.1:0".into();
    config.shutdown_timeout = timeout;
    config
}

fn quiet_runner(timeout: Duration) -> ServiceRunner {
    ServiceRunner::new(config_with_timeout(timeout), Arc::new(NoopReporter)).unwrap()
}

async fn run_until_cancelled(
    runner: ServiceRunner,
) -> (
    std::net::SocketAddr,
    CancellationToken,
    tokio::task::JoinHandle<Result<(), RunError>>,
) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = CancellationToken::new();
    let handle = tokio::spawn(runner.run(listener, shutdown.clone()));
    (addr, shutdown, handle)
}

async fn stop(
    shutdown: CancellationToken,
    handle: tokio::task::JoinHandle<Result<(), RunError>>,
) -> Result<(), RunError> {
    shutdown.cancel();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .unwrap()
        .unwrap()
}

#[tokio::test]
async fn test_serves_then_shuts_down_cleanly() {
    let reporter = Arc::new(StartedTasks::default());
    let config = config_with_timeout(Duration::from_secs(2));
    let runner = ServiceRunner::new(config, reporter.clone()).unwrap();
    let invocations = Invocations::default();
    let delay = Duration::from_millis(50);
    register_timed(runner.closer(), &invocations, "Redis connect", delay, None);
    let closer = runner.closer().clone();

    let (addr, shutdown, handle) = run_until_cancelled(runner).await;

    let response = reqwest::get(format!("http://{addr}/")).await.unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    assert!(!response.text().await.unwrap().is_empty());

    let result = stop(shutdown, handle).await;

    assert!(result.is_ok(), "{result:?}");
    assert!(closer.is_closing());
    assert_eq!(invocations.count("Redis connect"), 1);
    assert_eq!(HTTP_SERVER_TASK, "HTTP server");

    assert!(reqwest::get(format!("http://{addr}/")).await.is_err());

    // Single-threaded runtime: tasks start in the order they were registered.
    let started = reporter.names.lock().unwrap().clone();
    assert_eq!(started, ["HTTP server", "Redis connect"]);
}

#[test]
fn test_http_teardown_is_registered_first() {
    let runner = quiet_runner(Duration::from_secs(1));
    assert_eq!(runner.closer().len(), 1);
}

#[tokio::test]
async fn test_teardown_without_run_succeeds() {
    let runner = quiet_runner(Duration::from_secs(1));
    let closer = runner.closer().clone();
    drop(runner);

    closer
        .close(grash::Deadline::after(Duration::from_secs(1)))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_task_failure_becomes_run_error() {
    let runner = quiet_runner(Duration::from_secs(2));
    let invocations = Invocations::default();
    let delay = Duration::from_millis(10);
    register_timed(runner.closer(), &invocations, "db", delay, Some("connection refused"));
    register_timed(runner.closer(), &invocations, "cache", delay, None);

    let (_addr, shutdown, handle) = run_until_cancelled(runner).await;
    let result = stop(shutdown, handle).await;

    match result {
        Err(RunError::Close(CloseError::TaskFailures(failures))) => {
            assert_eq!(failures.len(), 1);
            assert_eq!(failures[0].name(), "db");
            assert_eq!(failures[0].reason().to_string(), "connection refused");
        }
        other => panic!("unexpected result: {other:?}"),
    }
    assert_eq!(invocations.count("cache"), 1);
}

#[tokio::test]
async fn test_slow_teardown_hits_shutdown_timeout() {
    let runner = quiet_runner(Duration::from_millis(100));
    let invocations = Invocations::default();
    let delay = Duration::from_secs(10);
    register_timed(runner.closer(), &invocations, "Another server", delay, None);

    let (_addr, shutdown, handle) = run_until_cancelled(runner).await;
    let start = std::time::Instant::now();
    let result = stop(shutdown, handle).await;

    assert!(start.elapsed() < Duration::from_secs(2), "{:?}", start.elapsed());
    let err = result.unwrap_err();
    assert!(err.to_string().starts_with("closer: shutdown cancelled"), "{err}");
    match err {
        RunError::Close(close) => assert_eq!(close.pending(), ["Another server".to_string()]),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_huge_integer_timeout_still_shuts_down() {
    let yaml = "shutdown_timeout: 18446744073709551615\nhttp_server:\n  address: 127.0.0.1:0\n";
    let config = load_config_from_str(yaml, "inline").unwrap();
    assert_eq!(config.shutdown_timeout, Duration::from_secs(u64::MAX));

    let runner = ServiceRunner::new(config, Arc::new(NoopReporter)).unwrap();
    let (_addr, shutdown, handle) = run_until_cancelled(runner).await;

    stop(shutdown, handle).await.unwrap();
}

#[tokio::test]
async fn test_runner_rejects_registration_after_shutdown() {
    let runner = quiet_runner(Duration::from_secs(1));
    let closer = runner.closer().clone();

    let (_addr, shutdown, handle) = run_until_cancelled(runner).await;
    stop(shutdown, handle).await.unwrap();

    let late = closer.register("late", |_| async { Ok::<(), grash::lifecycle::BoxError>(()) });
    assert!(late.is_err());
}
