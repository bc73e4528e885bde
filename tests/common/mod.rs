//! Shared fixtures: a stub parse service and a minimal fake LlamaParse server.

#![allow(dead_code)]

use async_trait::async_trait;
use llamaparse_md::{ParseError, ParseRequest, ParseResult, ParseService};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

// ── Fixtures ─────────────────────────────────────────────────────────────────

/// Write a file that passes the `%PDF` check.
pub fn write_pdf(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, b"%PDF-1.4\n1 0 obj\n<<>>\nendobj\n%%EOF\n").unwrap();
    path
}

/// The JSON document the fake service returns for a job.
pub fn result_json() -> serde_json::Value {
    json!({
        "pages": [
            {
                "page": 1,
                "text": "심혈관 질환 개요",
                "md": "# 심혈관 질환\n\n개요 본문",
                "items": [
                    {"type": "heading", "lvl": 1, "value": "심혈관 질환"},
                    {"type": "text", "value": "개요 본문"}
                ],
                "images": []
            },
            {"page": 2, "text": "Second page", "md": "| A | B |\n|---|---|\n| 1 | 2 |"}
        ],
        "job_metadata": {"credits_used": 2.0, "job_pages": 2}
    })
}

pub fn fixed_result() -> ParseResult {
    let mut doc = result_json();
    doc["job_id"] = json!("job-1");
    serde_json::from_value(json!([doc])).unwrap()
}

// ── Stub service ─────────────────────────────────────────────────────────────

type Responder = dyn Fn(&ParseRequest, usize) -> Result<ParseResult, ParseError> + Send + Sync;

/// A [`ParseService`] that answers from a closure and counts calls.
///
/// The closure receives the request and the 0-based call number.
pub struct StubService {
    respond: Box<Responder>,
    calls: AtomicUsize,
}

impl StubService {
    pub fn new<F>(respond: F) -> Self
    where
        F: Fn(&ParseRequest, usize) -> Result<ParseResult, ParseError> + Send + Sync + 'static,
    {
        Self {
            respond: Box::new(respond),
            calls: AtomicUsize::new(0),
        }
    }

    /// Always returns [`fixed_result`].
    pub fn fixed() -> Self {
        Self::new(|_, _| Ok(fixed_result()))
    }

    /// Always fails with a network error.
    pub fn failing() -> Self {
        Self::new(|_, _| {
            Err(ParseError::Network {
                detail: "connection refused".into(),
            })
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ParseService for StubService {
    fn name(&self) -> &str {
        "stub"
    }

    async fn parse(&self, request: &ParseRequest) -> Result<ParseResult, ParseError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        (self.respond)(request, n)
    }
}

// ── Fake HTTP server ─────────────────────────────────────────────────────────

/// One request as seen by the fake server.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// `(status, extra headers, body)`.
pub type Reply = (u16, Vec<(&'static str, String)>, String);

type Router = dyn Fn(&RecordedRequest) -> Reply + Send + Sync;

pub struct FakeServer {
    pub base_url: String,
    pub connections: Arc<AtomicUsize>,
    pub requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl FakeServer {
    pub fn connection_count(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }

    pub fn recorded(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

/// Start a one-response-per-connection HTTP/1.1 server on a random port.
pub async fn spawn_server<F>(router: F) -> FakeServer
where
    F: Fn(&RecordedRequest) -> Reply + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let router: Arc<Router> = Arc::new(router);
    let connections = Arc::new(AtomicUsize::new(0));
    let requests = Arc::new(Mutex::new(Vec::new()));

    let conn_counter = Arc::clone(&connections);
    let log = Arc::clone(&requests);
    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            conn_counter.fetch_add(1, Ordering::SeqCst);
            let router = Arc::clone(&router);
            let log = Arc::clone(&log);
            tokio::spawn(async move {
                let Some(request) = read_request(&mut socket).await else {
                    return;
                };
                let (status, headers, body) = (*router)(&request);
                log.lock().unwrap().push(request);

                let mut response = format!(
                    "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n",
                    status,
                    reason(status),
                    body.len()
                );
                for (k, v) in headers {
                    response.push_str(&format!("{k}: {v}\r\n"));
                }
                response.push_str("\r\n");
                response.push_str(&body);
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    FakeServer {
        base_url: format!("http://{addr}"),
        connections,
        requests,
    }
}

/// Router implementing the upload → poll → result exchange.
///
/// The first status poll reports PENDING, later ones SUCCESS.
pub fn llama_router(expected_key: &'static str) -> impl Fn(&RecordedRequest) -> Reply + Send + Sync {
    let polls = AtomicUsize::new(0);
    move |req: &RecordedRequest| {
        let expected = format!("Bearer {expected_key}");
        if req.header("authorization") != Some(expected.as_str()) {
            return (401, vec![], r#"{"detail":"Invalid API key"}"#.to_string());
        }
        match (req.method.as_str(), req.path.as_str()) {
            ("POST", "/api/parsing/upload") => {
                (200, vec![], r#"{"id":"job-1","status":"PENDING"}"#.to_string())
            }
            ("GET", "/api/parsing/job/job-1") => {
                let status = if polls.fetch_add(1, Ordering::SeqCst) == 0 {
                    "PENDING"
                } else {
                    "SUCCESS"
                };
                (200, vec![], format!(r#"{{"id":"job-1","status":"{status}"}}"#))
            }
            ("GET", "/api/parsing/job/job-1/result/json") => {
                (200, vec![], result_json().to_string())
            }
            _ => (404, vec![], r#"{"detail":"Not Found"}"#.to_string()),
        }
    }
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        400 => "Bad Request",
        401 => "Unauthorized",
        404 => "Not Found",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        _ => "Unknown",
    }
}

async fn read_request(socket: &mut TcpStream) -> Option<RecordedRequest> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 8192];

    let header_end = loop {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = find(&buf, b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).into_owned();
    let mut lines = head.split("\r\n");
    let mut request_line = lines.next()?.split_whitespace();
    let method = request_line.next()?.to_string();
    let path = request_line.next()?.to_string();
    let headers: Vec<(String, String)> = lines
        .filter_map(|l| l.split_once(':'))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .collect();

    let content_length = headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case("content-length"))
        .and_then(|(_, v)| v.parse::<usize>().ok());
    let chunked = headers
        .iter()
        .any(|(k, v)| k.eq_ignore_ascii_case("transfer-encoding") && v.contains("chunked"));

    let mut body = buf[header_end..].to_vec();
    if let Some(len) = content_length {
        while body.len() < len {
            let n = socket.read(&mut chunk).await.ok()?;
            if n == 0 {
                break;
            }
            body.extend_from_slice(&chunk[..n]);
        }
    } else if chunked {
        while !body.ends_with(b"0\r\n\r\n") {
            let n = socket.read(&mut chunk).await.ok()?;
            if n == 0 {
                break;
            }
            body.extend_from_slice(&chunk[..n]);
        }
    }

    Some(RecordedRequest {
        method,
        path,
        headers,
        body,
    })
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}
