//! Shared helpers for rr-core integration tests.
//!
//! - [`FakeApi`]: a local `tiny_http` stand-in for the messaging API that
//!   records every request it receives
//! - [`StubRenderer`]: a font-free renderer that embeds the HTML serialization
//! - [`multipart_parts`]: a minimal `multipart/form-data` parser

#![allow(dead_code)]
// Test support intentionally provides more helpers than any single test uses.

use rr_report::{Renderer, ReportDocument, ReportError};
use std::io::Read;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

pub const TEST_TOKEN: &str = "123456:TEST-TOKEN";
pub const TEST_CHAT: &str = "-1001234";
pub const OK_BODY: &str = r#"{"ok":true,"result":{"message_id":42}}"#;

/// One request as seen by the fake API.
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub method: String,
    pub url: String,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

/// Local fake of the messaging API answering every request the same way.
pub struct FakeApi {
    addr: SocketAddr,
    captured: Arc<Mutex<Vec<CapturedRequest>>>,
    stop: Arc<AtomicBool>,
    thread: Option<thread::JoinHandle<()>>,
}

impl FakeApi {
    pub fn start(status: u16, body: &'static str) -> Self {
        Self::start_delayed(status, body, Duration::ZERO)
    }

    /// Like [`FakeApi::start`], but every answer is held back by `delay`.
    pub fn start_delayed(status: u16, body: &'static str, delay: Duration) -> Self {
        let server = tiny_http::Server::http("127.0.0.1:0").expect("bind fake API");
        let addr = server.server_addr().to_ip().expect("fake API has an IP address");
        let captured = Arc::new(Mutex::new(Vec::new()));
        let stop = Arc::new(AtomicBool::new(false));

        let thread = {
            let captured = captured.clone();
            let stop = stop.clone();
            thread::spawn(move || {
                while !stop.load(Ordering::SeqCst) {
                    let mut request = match server.recv_timeout(Duration::from_millis(50)) {
                        Ok(Some(req)) => req,
                        Ok(None) => continue,
                        Err(_) => break,
                    };
                    let mut data = Vec::new();
                    let _ = request.as_reader().read_to_end(&mut data);
                    let content_type = request
                        .headers()
                        .iter()
                        .find(|h| h.field.equiv("Content-Type"))
                        .map(|h| h.value.as_str().to_string());
                    captured.lock().unwrap().push(CapturedRequest {
                        method: request.method().to_string(),
                        url: request.url().to_string(),
                        content_type,
                        body: data,
                    });
                    if !delay.is_zero() {
                        thread::sleep(delay);
                    }
                    let response = tiny_http::Response::from_string(body)
                        .with_status_code(status)
                        .with_header(
                            "Content-Type: application/json"
                                .parse::<tiny_http::Header>()
                                .unwrap(),
                        );
                    let _ = request.respond(response);
                }
            })
        };

        Self {
            addr,
            captured,
            stop,
            thread: Some(thread),
        }
    }

    pub fn ok() -> Self {
        Self::start(200, OK_BODY)
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn requests(&self) -> Vec<CapturedRequest> {
        self.captured.lock().unwrap().clone()
    }
}

impl Drop for FakeApi {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

/// Renderer that needs no fonts: `%PDF-stub` followed by the HTML.
pub struct StubRenderer;

impl Renderer for StubRenderer {
    fn render(&self, document: &ReportDocument) -> rr_report::Result<Vec<u8>> {
        document.validate()?;
        let mut out = b"%PDF-stub\n".to_vec();
        out.extend_from_slice(document.to_html().as_bytes());
        Ok(out)
    }
}

/// Renderer that always fails.
pub struct FailingRenderer;

impl Renderer for FailingRenderer {
    fn render(&self, _document: &ReportDocument) -> rr_report::Result<Vec<u8>> {
        Err(ReportError::RenderFailed("layout overflow".to_string()))
    }
}

/// One `multipart/form-data` part.
#[derive(Debug, Clone)]
pub struct Part {
    pub name: String,
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

impl Part {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.data).into_owned()
    }
}

/// Split a multipart body into its parts.
pub fn multipart_parts(content_type: &str, body: &[u8]) -> Vec<Part> {
    let boundary = content_type
        .split("boundary=")
        .nth(1)
        .expect("boundary parameter")
        .trim_matches('"');
    let delimiter = format!("--{}", boundary);
    let delimiter = delimiter.as_bytes();

    let mut parts = Vec::new();
    let mut starts = Vec::new();
    let mut i = 0;
    while i + delimiter.len() <= body.len() {
        if &body[i..i + delimiter.len()] == delimiter {
            starts.push(i);
            i += delimiter.len();
        } else {
            i += 1;
        }
    }

    for pair in starts.windows(2) {
        // Skip delimiter and CRLF; drop the CRLF that precedes the next delimiter.
        let chunk = &body[pair[0] + delimiter.len() + 2..pair[1] - 2];
        let split = chunk
            .windows(4)
            .position(|w| w == b"\r\n\r\n")
            .expect("part header terminator");
        let headers = String::from_utf8_lossy(&chunk[..split]).into_owned();
        let data = chunk[split + 4..].to_vec();

        let param = |key: &str| {
            headers
                .split(';')
                .map(str::trim)
                .find_map(|p| p.strip_prefix(&format!("{}=\"", key)))
                .map(|v| v.split('"').next().unwrap_or_default().to_string())
        };
        let content_type = headers
            .lines()
            .find_map(|l| l.strip_prefix("Content-Type: "))
            .map(str::to_string);

        parts.push(Part {
            name: param("name").expect("part name"),
            filename: param("filename"),
            content_type,
            data,
        });
    }
    parts
}

pub fn part<'a>(parts: &'a [Part], name: &str) -> &'a Part {
    parts
        .iter()
        .find(|p| p.name == name)
        .unwrap_or_else(|| panic!("missing multipart part {name}"))
}
