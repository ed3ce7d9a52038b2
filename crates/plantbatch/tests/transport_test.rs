//! Integration tests for the HTTP transport against a stub server.

mod common;

use common::{FAKE_PNG, StubServer};

use plantbatch::{
    config::HttpConfig,
    encoding,
    transport::{HttpRenderer, Method, RenderError, Renderer},
};

const DIAGRAM: &str = "@startuml\nAlice -> Bob\n@enduml\n";

fn renderer(server: &StubServer, method: Method) -> HttpRenderer {
    HttpRenderer::new(&server.base_url(), method, &HttpConfig::default())
}

#[test]
fn test_post_sends_raw_text() {
    let server = StubServer::start(|_| (200, FAKE_PNG.to_vec()));

    let image = renderer(&server, Method::Post).render(DIAGRAM).unwrap();

    assert_eq!(image, FAKE_PNG);
    let requests = server.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, "POST");
    assert_eq!(requests[0].path, "/png");
    assert_eq!(requests[0].body, DIAGRAM.as_bytes());
}

#[test]
fn test_post_rejects_non_image_with_ok_status() {
    let server = StubServer::start(|_| (200, b"<html>Syntax error</html>".to_vec()));

    let err = renderer(&server, Method::Post).render(DIAGRAM).unwrap_err();

    assert!(matches!(err, RenderError::NotAnImage));
    assert_eq!(err.to_string(), "server did not return an image on POST");
}

#[test]
fn test_post_accepts_image_regardless_of_status() {
    let server = StubServer::start(|_| (400, FAKE_PNG.to_vec()));

    let image = renderer(&server, Method::Post).render(DIAGRAM).unwrap();
    assert_eq!(image, FAKE_PNG);
}

#[test]
fn test_get_uses_encoded_payload() {
    let server = StubServer::start(|_| (200, FAKE_PNG.to_vec()));

    let image = renderer(&server, Method::Get).render(DIAGRAM).unwrap();

    assert_eq!(image, FAKE_PNG);
    let requests = server.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, "GET");
    assert_eq!(
        requests[0].path,
        format!("/png/{}", encoding::encode(DIAGRAM))
    );
}

#[test]
fn test_get_failure_reports_status() {
    let server = StubServer::start(|_| (400, b"bad diagram".to_vec()));

    let err = renderer(&server, Method::Get).render(DIAGRAM).unwrap_err();

    assert!(matches!(err, RenderError::HttpStatus { status: 400 }));
    assert!(err.to_string().contains("400"));
}

#[test]
fn test_get_rejects_non_image_with_ok_status() {
    let server = StubServer::start(|_| (200, b"not a png".to_vec()));

    let err = renderer(&server, Method::Get).render(DIAGRAM).unwrap_err();
    assert_eq!(err.to_string(), "GET failed: HTTP 200");
}

#[test]
fn test_auto_falls_back_to_get() {
    let server = StubServer::start(|request| match request.method.as_str() {
        "POST" => (200, b"<html>POST disabled</html>".to_vec()),
        _ => (200, FAKE_PNG.to_vec()),
    });

    let image = renderer(&server, Method::Auto).render(DIAGRAM).unwrap();

    assert_eq!(image, FAKE_PNG);
    let methods: Vec<_> = server.requests().into_iter().map(|r| r.method).collect();
    assert_eq!(methods, ["POST", "GET"]);
}

#[test]
fn test_auto_stops_after_successful_post() {
    let server = StubServer::start(|_| (200, FAKE_PNG.to_vec()));

    renderer(&server, Method::Auto).render(DIAGRAM).unwrap();

    assert_eq!(server.requests().len(), 1);
}

#[test]
fn test_auto_surfaces_get_error() {
    let server = StubServer::start(|request| match request.method.as_str() {
        "POST" => (500, b"oops".to_vec()),
        _ => (404, b"missing".to_vec()),
    });

    let err = renderer(&server, Method::Auto).render(DIAGRAM).unwrap_err();

    assert_eq!(err.to_string(), "GET failed: HTTP 404");
    assert_eq!(server.requests().len(), 2);
}

#[test]
fn test_trailing_slash_in_endpoint() {
    let server = StubServer::start(|_| (200, FAKE_PNG.to_vec()));
    let endpoint = format!("{}/", server.base_url());

    HttpRenderer::new(&endpoint, Method::Post, &HttpConfig::default())
        .render(DIAGRAM)
        .unwrap();

    assert_eq!(server.requests()[0].path, "/png");
}

#[test]
fn test_unreachable_server_is_request_error() {
    let port = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();
    let renderer = HttpRenderer::new(
        &format!("http://127.0.0.1:{port}"),
        Method::Get,
        &HttpConfig::default(),
    );

    let err = renderer.render(DIAGRAM).unwrap_err();
    assert!(matches!(err, RenderError::Request { method: Method::Get, .. }));
}
