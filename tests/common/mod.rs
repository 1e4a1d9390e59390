#![allow(dead_code)]

use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::path::{Path, PathBuf};
use std::thread;

use tempfile::{TempDir, tempdir};

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    /// Creates a fresh scratch directory for the current test case.
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    /// Returns the root path for all files owned by this workspace.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents.as_bytes())
            .expect("write temp file contents");
        path
    }
}

/// Canned response for one request path on the stub API.
#[derive(Debug, Clone)]
pub struct StubRoute {
    pub path: String,
    pub status: u16,
    pub body: String,
}

impl StubRoute {
    pub fn new(path: impl Into<String>, status: u16, body: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            status,
            body: body.into(),
        }
    }
}

/// Minimal single-threaded HTTP responder standing in for the Rackbeat API.
///
/// Listens on an ephemeral loopback port and answers each connection from the
/// route table; unknown paths get a 404 with a JSON body. The accept loop
/// runs on a detached thread for the lifetime of the test process.
pub struct StubApi {
    base_url: String,
}

impl StubApi {
    /// Starts the responder. `prefix` is the URL path under which products
    /// live, mirroring the real API layout (e.g. `/api/products`); route
    /// paths must include it.
    pub fn serve(prefix: &str, routes: Vec<StubRoute>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind stub listener");
        let addr = listener.local_addr().expect("stub listener addr");
        let base_url = format!("http://{addr}{prefix}");
        thread::spawn(move || {
            for stream in listener.incoming() {
                match stream {
                    Ok(stream) => handle_connection(stream, &routes),
                    Err(_) => break,
                }
            }
        });
        Self { base_url }
    }

    /// Base URL to hand the tool via `RACKBEAT_API_BASE`.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns a loopback URL that nothing is listening on, for exercising
    /// connection failures.
    pub fn unreachable_base_url() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind probe listener");
        let addr = listener.local_addr().expect("probe listener addr");
        drop(listener);
        format!("http://{addr}/api/products")
    }
}

fn handle_connection(mut stream: TcpStream, routes: &[StubRoute]) {
    let mut reader = BufReader::new(match stream.try_clone() {
        Ok(clone) => clone,
        Err(_) => return,
    });
    let mut request_line = String::new();
    if reader.read_line(&mut request_line).is_err() {
        return;
    }
    // Drain request headers; GET requests carry no body.
    loop {
        let mut line = String::new();
        match reader.read_line(&mut line) {
            Ok(0) => break,
            Ok(_) if line == "\r\n" || line == "\n" => break,
            Ok(_) => continue,
            Err(_) => return,
        }
    }

    let target = request_line.split_whitespace().nth(1).unwrap_or("");
    let path = target.split('?').next().unwrap_or(target);
    let (status, body) = routes
        .iter()
        .find(|route| route.path == path)
        .map(|route| (route.status, route.body.clone()))
        .unwrap_or((404, r#"{"message":"Not found"}"#.to_string()));
    let reason = match status {
        200 => "OK",
        404 => "Not Found",
        500 => "Internal Server Error",
        _ => "Status",
    };
    let response = format!(
        "HTTP/1.1 {status} {reason}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    let _ = stream.write_all(response.as_bytes());
    let _ = stream.flush();
}
