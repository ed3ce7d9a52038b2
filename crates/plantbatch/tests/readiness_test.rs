//! Readiness probe tests against a stub server.

mod common;

use std::time::{Duration, Instant};

use common::{FAKE_PNG, StubServer};

use plantbatch::{
    config::ProbeConfig,
    container::{StartupError, wait_until_ready},
    encoding,
};

fn fast_probe(timeout: Duration) -> ProbeConfig {
    ProbeConfig::new(Duration::from_millis(20), timeout, Duration::from_millis(500))
}

#[test]
fn test_bad_request_means_ready() {
    let server = StubServer::start(|_| (400, b"Syntax error".to_vec()));

    let started = Instant::now();
    wait_until_ready(&server.base_url(), &fast_probe(Duration::from_secs(5))).unwrap();

    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(server.requests().len(), 1);
}

#[test]
fn test_ok_means_ready() {
    let server = StubServer::start(|_| (200, FAKE_PNG.to_vec()));

    wait_until_ready(&server.base_url(), &fast_probe(Duration::from_secs(5))).unwrap();

    let requests = server.requests();
    assert_eq!(requests[0].method, "GET");
    assert_eq!(
        requests[0].path,
        format!("/png/{}", encoding::encode("@startuml\n@enduml\n"))
    );
}

#[test]
fn test_keeps_polling_while_unavailable() {
    let server = StubServer::start(|_| (503, b"starting".to_vec()));

    let err = wait_until_ready(&server.base_url(), &fast_probe(Duration::from_millis(300)))
        .unwrap_err();

    assert!(matches!(err, StartupError::Timeout { .. }));
    assert!(server.requests().len() > 1);
}
