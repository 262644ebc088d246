//! HTTP intake for report requests.
//!
//! A fixed pool of worker threads pulls requests from one shared `tiny_http`
//! listener. Each worker handles its request synchronously end to end; no
//! state is shared between requests besides the read-only pipeline.
//!
//! ## Routes
//!
//! - `GET /` health check, `{"ok":true}`
//! - `POST /send_report` render and deliver one report
//! - `OPTIONS` on either path: CORS preflight, `204`
//!
//! Responses never carry the rendered document.

use crate::config::{RelayConfig, DEFAULT_BIND, DEFAULT_MAX_BODY_BYTES, DEFAULT_PORT, DEFAULT_WORKERS};
use crate::delivery::Delivery;
use crate::pipeline::{PipelineError, Receipt, ReportPipeline};

use rr_report::Renderer;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::io::{Cursor, Read};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;
use tiny_http::{Header, Method, Request, Response};
use tracing::{debug, error, info, warn};

pub const HEALTH_PATH: &str = "/";
pub const REPORT_PATH: &str = "/send_report";

/// How often idle workers check the shutdown flag.
const POLL_INTERVAL: Duration = Duration::from_millis(250);

const CORS_HEADERS: [(&str, &str); 3] = [
    ("Access-Control-Allow-Origin", "*"),
    ("Access-Control-Allow-Headers", "Content-Type"),
    ("Access-Control-Allow-Methods", "POST, OPTIONS"),
];

/// Listener configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address (default: 0.0.0.0).
    pub bind: String,
    /// Port (default: 8080, 0 picks a free port).
    pub port: u16,
    /// Worker threads.
    pub workers: usize,
    /// Largest accepted request body.
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            port: DEFAULT_PORT,
            workers: DEFAULT_WORKERS,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

impl From<&RelayConfig> for ServerConfig {
    fn from(config: &RelayConfig) -> Self {
        Self {
            bind: config.bind.clone(),
            port: config.port,
            workers: config.workers,
            max_body_bytes: config.max_body_bytes,
        }
    }
}

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind {addr}: {reason}")]
    Bind { addr: String, reason: String },

    #[error("listener is not bound to an IP address")]
    NoIpAddress,

    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Handle to the running HTTP server.
pub struct RelayServer {
    shutdown: Arc<AtomicBool>,
    workers: Vec<thread::JoinHandle<()>>,
    addr: SocketAddr,
}

impl RelayServer {
    /// Bind the listener and start the worker pool.
    pub fn start<R, D>(
        config: &ServerConfig,
        pipeline: Arc<ReportPipeline<R, D>>,
    ) -> Result<Self, ServerError>
    where
        R: Renderer + 'static,
        D: Delivery + 'static,
    {
        let requested = format!("{}:{}", config.bind, config.port);
        let server = tiny_http::Server::http(requested.as_str()).map_err(|e| ServerError::Bind {
            addr: requested.clone(),
            reason: e.to_string(),
        })?;
        let addr = server.server_addr().to_ip().ok_or(ServerError::NoIpAddress)?;
        let server = Arc::new(server);

        let shutdown = Arc::new(AtomicBool::new(false));
        let mut server_handle = Self {
            shutdown: shutdown.clone(),
            workers: Vec::with_capacity(config.workers),
            addr,
        };

        for id in 0..config.workers.max(1) {
            let server = server.clone();
            let pipeline = pipeline.clone();
            let shutdown = shutdown.clone();
            let max_body = config.max_body_bytes;
            // On error the partially built handle is dropped, which stops started workers.
            let worker = thread::Builder::new()
                .name(format!("rr-http-{}", id))
                .spawn(move || worker_loop(&server, &pipeline, &shutdown, max_body))?;
            server_handle.workers.push(worker);
        }

        info!(
            addr = %addr,
            workers = server_handle.workers.len(),
            max_body_bytes = config.max_body_bytes,
            "relay server started"
        );
        Ok(server_handle)
    }

    /// Get the bound address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Flag that stops the workers once set.
    pub fn shutdown_flag(&self) -> Arc<AtomicBool> {
        self.shutdown.clone()
    }

    /// Block until the workers exit.
    pub fn wait(mut self) {
        self.join_workers();
    }

    /// Stop accepting requests and wait for in-flight ones to finish.
    pub fn shutdown(mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
        self.join_workers();
        info!("relay server stopped");
    }

    fn join_workers(&mut self) {
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
    }
}

impl Drop for RelayServer {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
        self.join_workers();
    }
}

fn worker_loop<R: Renderer, D: Delivery>(
    server: &tiny_http::Server,
    pipeline: &ReportPipeline<R, D>,
    shutdown: &AtomicBool,
    max_body: usize,
) {
    while !shutdown.load(Ordering::SeqCst) {
        let request = match server.recv_timeout(POLL_INTERVAL) {
            Ok(Some(req)) => req,
            Ok(None) => continue,
            Err(e) => {
                if !shutdown.load(Ordering::SeqCst) {
                    error!(error = %e, "accept error");
                }
                break;
            }
        };
        handle_request(request, pipeline, max_body);
    }
}

/// Status code, optional JSON body and optional `Allow` header.
#[derive(Debug, Clone, PartialEq)]
struct Reply {
    status: u16,
    body: Option<Value>,
    allow: Option<&'static str>,
}

impl Reply {
    fn json(status: u16, body: Value) -> Self {
        Self {
            status,
            body: Some(body),
            allow: None,
        }
    }

    fn ok() -> Self {
        Self::json(200, json!({"ok": true}))
    }

    fn failure(status: u16, message: &str) -> Self {
        Self::json(status, json!({"ok": false, "error": message}))
    }

    fn no_content() -> Self {
        Self {
            status: 204,
            body: None,
            allow: None,
        }
    }

    fn method_not_allowed(allow: &'static str) -> Self {
        Self {
            allow: Some(allow),
            ..Self::failure(405, "method not allowed")
        }
    }

    fn into_response(self) -> Response<Cursor<Vec<u8>>> {
        let data = self
            .body
            .as_ref()
            .map(|body| body.to_string().into_bytes())
            .unwrap_or_default();
        let mut response = Response::from_data(data).with_status_code(self.status);
        if self.body.is_some() {
            add_header(&mut response, "Content-Type", "application/json; charset=utf-8");
        }
        if let Some(allow) = self.allow {
            add_header(&mut response, "Allow", allow);
        }
        for (name, value) in CORS_HEADERS {
            add_header(&mut response, name, value);
        }
        response
    }
}

fn add_header<R: Read>(response: &mut Response<R>, name: &str, value: &str) {
    if let Ok(header) = Header::from_bytes(name.as_bytes(), value.as_bytes()) {
        response.add_header(header);
    }
}

fn handle_request<R: Renderer, D: Delivery>(
    mut request: Request,
    pipeline: &ReportPipeline<R, D>,
    max_body: usize,
) {
    let started = Instant::now();
    let method = request.method().clone();
    let path = request
        .url()
        .split('?')
        .next()
        .unwrap_or(HEALTH_PATH)
        .to_string();

    let reply = route(&method, &path, &mut request, pipeline, max_body);
    debug!(
        method = %method,
        path = %path,
        status = reply.status,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "request handled"
    );
    if let Err(e) = request.respond(reply.into_response()) {
        warn!(error = %e, "failed to send response");
    }
}

fn route<R: Renderer, D: Delivery>(
    method: &Method,
    path: &str,
    request: &mut Request,
    pipeline: &ReportPipeline<R, D>,
    max_body: usize,
) -> Reply {
    match (path, method) {
        (HEALTH_PATH, Method::Get | Method::Head) => Reply::ok(),
        (HEALTH_PATH | REPORT_PATH, Method::Options) => Reply::no_content(),
        (HEALTH_PATH, _) => Reply::method_not_allowed("GET, OPTIONS"),
        (REPORT_PATH, Method::Post) => match read_body(request, max_body) {
            Ok(body) => report_reply(pipeline.handle(&body)),
            Err(reply) => reply,
        },
        (REPORT_PATH, _) => Reply::method_not_allowed("POST, OPTIONS"),
        _ => Reply::failure(404, "not found"),
    }
}

/// Read at most `max` bytes of body; larger bodies are rejected with `413`.
fn read_body(request: &mut Request, max: usize) -> Result<Vec<u8>, Reply> {
    if request.body_length().is_some_and(|len| len > max) {
        warn!(declared = ?request.body_length(), max, "request body too large");
        return Err(Reply::failure(413, "payload too large"));
    }
    let mut body = Vec::new();
    if let Err(e) = request
        .as_reader()
        .take(max as u64 + 1)
        .read_to_end(&mut body)
    {
        warn!(error = %e, "failed to read request body");
        return Err(Reply::failure(400, "invalid request body"));
    }
    if body.len() > max {
        warn!(max, "request body too large");
        return Err(Reply::failure(413, "payload too large"));
    }
    Ok(body)
}

fn report_reply(result: Result<Receipt, PipelineError>) -> Reply {
    match result {
        Ok(receipt) => {
            info!(
                request_id = %receipt.request_id,
                filename = %receipt.filename,
                "report sent"
            );
            Reply::ok()
        }
        Err(e) => {
            let status = match e {
                PipelineError::Render(_) => 500,
                PipelineError::Delivery(_) => 502,
            };
            Reply::failure(status, e.public_message())
        }
    }
}
