//! Minimal in-process HTTP server standing in for a PlantUML server, and a
//! shell script standing in for the container tool.
//!
//! Shared with the CLI crate's tests through `#[path]`.

#![allow(dead_code)]

use std::{
    fs,
    io::{BufRead, BufReader, Read, Write},
    net::{SocketAddr, TcpListener, TcpStream},
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
    thread,
};

/// PNG signature followed by a few payload bytes.
pub const FAKE_PNG: &[u8] = b"\x89PNG\r\n\x1a\nfake-image-data";

/// A request received by the stub.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: String,
    pub path: String,
    pub body: Vec<u8>,
}

type Handler = dyn Fn(&Request) -> (u16, Vec<u8>) + Send + Sync;

/// HTTP stub answering every request with the handler's `(status, body)`.
pub struct StubServer {
    addr: SocketAddr,
    requests: Arc<Mutex<Vec<Request>>>,
}

impl StubServer {
    pub fn start<F>(handler: F) -> Self
    where
        F: Fn(&Request) -> (u16, Vec<u8>) + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind stub server");
        let addr = listener.local_addr().expect("Stub server has no address");
        let requests = Arc::new(Mutex::new(Vec::new()));

        let handler: Arc<Handler> = Arc::new(handler);
        let recorded = Arc::clone(&requests);
        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(stream) = stream else { break };
                serve(stream, handler.as_ref(), &recorded);
            }
        });

        Self { addr, requests }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().unwrap().clone()
    }
}

fn serve(stream: TcpStream, handler: &Handler, recorded: &Mutex<Vec<Request>>) {
    let mut reader = BufReader::new(stream);

    let mut request_line = String::new();
    if reader.read_line(&mut request_line).unwrap_or(0) == 0 {
        return;
    }
    let mut parts = request_line.split_whitespace();
    let method = parts.next().unwrap_or_default().to_string();
    let path = parts.next().unwrap_or_default().to_string();

    let mut content_length = 0;
    loop {
        let mut line = String::new();
        if reader.read_line(&mut line).unwrap_or(0) == 0 {
            break;
        }
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            if name.eq_ignore_ascii_case("content-length") {
                content_length = value.trim().parse().unwrap_or(0);
            }
        }
    }

    let mut body = vec![0; content_length];
    if reader.read_exact(&mut body).is_err() {
        return;
    }

    let request = Request { method, path, body };
    let (status, response_body) = handler(&request);
    recorded.lock().unwrap().push(request);

    let mut stream = reader.into_inner();
    let head = format!(
        "HTTP/1.1 {status} Stub\r\nContent-Type: application/octet-stream\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        response_body.len()
    );
    let _ = stream.write_all(head.as_bytes());
    let _ = stream.write_all(&response_body);
    let _ = stream.flush();
}

/// Write an executable `fake-docker` script into `dir`.
///
/// Every call appends its arguments to `calls.log` in the same directory.
/// `run` prints `cid123`; every other command succeeds silently.
#[cfg(unix)]
pub fn fake_container_tool(dir: &Path) -> (PathBuf, PathBuf) {
    use std::os::unix::fs::PermissionsExt;

    let log = dir.join("calls.log");
    let tool = dir.join("fake-docker");
    let script = format!(
        "#!/bin/sh\necho \"$@\" >> '{}'\n[ \"$1\" = run ] && echo cid123\nexit 0\n",
        log.display()
    );
    fs::write(&tool, script).expect("Failed to write fake container tool");
    fs::set_permissions(&tool, fs::Permissions::from_mode(0o755))
        .expect("Failed to make fake container tool executable");
    (tool, log)
}

/// Lines of a `calls.log` written by [`fake_container_tool`].
pub fn tool_calls(log: &Path) -> Vec<String> {
    fs::read_to_string(log)
        .unwrap_or_default()
        .lines()
        .map(str::to_string)
        .collect()
}
