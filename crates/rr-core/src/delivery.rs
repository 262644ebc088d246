//! Document delivery to the messaging API.
//!
//! One multipart upload per report, single attempt, bounded by the configured
//! timeout. The endpoint URL embeds the API token, so it never appears in
//! errors or logs.

use crate::config::RelayConfig;

use serde::Deserialize;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, warn};

/// MIME type of the uploaded artifact.
pub const DOCUMENT_MIME: &str = "application/pdf";

/// Longest API error description kept in errors.
const MAX_DESCRIPTION_CHARS: usize = 200;

/// Delivery failures. Each one is terminal for the request.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// Connection, TLS, timeout or I/O failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// The API answered with a non-success HTTP status.
    #[error("messaging API returned HTTP {code}: {description}")]
    Status { code: u16, description: String },

    /// HTTP success, but the API did not acknowledge the document.
    #[error("messaging API rejected the document: {description}")]
    Rejected { description: String },
}

/// A document ready for upload.
#[derive(Debug, Clone, Copy)]
pub struct OutgoingDocument<'a> {
    pub chat_id: &'a str,
    pub filename: &'a str,
    /// Plain-text caption.
    pub caption: &'a str,
    pub bytes: &'a [u8],
}

/// Sends a rendered document to its recipient.
pub trait Delivery: Send + Sync {
    /// Upload once. `Ok` only when the remote side acknowledged the document.
    fn send_document(&self, document: &OutgoingDocument<'_>) -> Result<(), DeliveryError>;
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

/// Telegram Bot API `sendDocument` client.
pub struct TelegramClient {
    agent: ureq::Agent,
    endpoint: String,
    timeout: Duration,
}

impl std::fmt::Debug for TelegramClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramClient")
            .field("endpoint", &"[REDACTED]")
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl TelegramClient {
    /// Build a client from the relay configuration.
    pub fn new(config: &RelayConfig) -> Self {
        Self::with_endpoint(&config.api_base, &config.bot_token, config.timeout)
    }

    /// Build a client for an explicit API base and token.
    pub fn with_endpoint(api_base: &str, token: &str, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(timeout)
            .user_agent(concat!("rr-core/", env!("CARGO_PKG_VERSION")))
            .build();
        Self {
            agent,
            endpoint: format!(
                "{}/bot{}/sendDocument",
                api_base.trim_end_matches('/'),
                token
            ),
            timeout,
        }
    }
}

impl Delivery for TelegramClient {
    fn send_document(&self, document: &OutgoingDocument<'_>) -> Result<(), DeliveryError> {
        let (content_type, body) = MultipartBody::new()
            .text("chat_id", document.chat_id)
            .text("caption", document.caption)
            .file("document", document.filename, DOCUMENT_MIME, document.bytes)
            .finish();

        debug!(
            filename = %document.filename,
            bytes = document.bytes.len(),
            body_bytes = body.len(),
            "uploading document"
        );
        let started = Instant::now();

        let result = self
            .agent
            .post(&self.endpoint)
            .set("Content-Type", &content_type)
            .send_bytes(&body);

        let elapsed_ms = started.elapsed().as_millis() as u64;
        match result {
            Ok(response) => {
                let code = response.status();
                let text = response.into_string().map_err(|e| {
                    DeliveryError::Transport(format!("failed to read response: {}", e))
                })?;
                if !(200..300).contains(&code) {
                    warn!(code, elapsed_ms, "messaging API returned non-success status");
                    return Err(DeliveryError::Status {
                        code,
                        description: describe(&text),
                    });
                }
                match serde_json::from_str::<ApiResponse>(&text) {
                    Ok(ApiResponse { ok: true, .. }) => {
                        debug!(code, elapsed_ms, "document accepted");
                        Ok(())
                    }
                    Ok(ApiResponse { description, .. }) => {
                        let description = description
                            .map(|d| truncate(&d))
                            .unwrap_or_else(|| "no description".to_string());
                        warn!(code, elapsed_ms, %description, "messaging API rejected document");
                        Err(DeliveryError::Rejected { description })
                    }
                    Err(e) => {
                        warn!(code, elapsed_ms, error = %e, "unparseable messaging API response");
                        Err(DeliveryError::Rejected {
                            description: format!("unparseable response: {}", e),
                        })
                    }
                }
            }
            Err(ureq::Error::Status(code, response)) => {
                let description = response
                    .into_string()
                    .map(|text| describe(&text))
                    .unwrap_or_else(|_| "no description".to_string());
                warn!(code, elapsed_ms, %description, "messaging API returned error status");
                Err(DeliveryError::Status { code, description })
            }
            Err(ureq::Error::Transport(transport)) => {
                // Display of `Transport` includes the URL; use kind and message only.
                let detail = match transport.message() {
                    Some(message) => format!("{}: {}", transport.kind(), message),
                    None => transport.kind().to_string(),
                };
                warn!(elapsed_ms, error = %detail, "messaging API unreachable");
                Err(DeliveryError::Transport(detail))
            }
        }
    }
}

/// `description` from an API error body, else a short excerpt of the body.
fn describe(body: &str) -> String {
    match serde_json::from_str::<ApiResponse>(body) {
        Ok(ApiResponse {
            description: Some(description),
            ..
        }) => truncate(&description),
        _ if body.trim().is_empty() => "no description".to_string(),
        _ => truncate(body.trim()),
    }
}

fn truncate(s: &str) -> String {
    if s.chars().count() <= MAX_DESCRIPTION_CHARS {
        return s.to_string();
    }
    let mut out: String = s.chars().take(MAX_DESCRIPTION_CHARS).collect();
    out.push('…');
    out
}

/// `multipart/form-data` body builder.
pub(crate) struct MultipartBody {
    boundary: String,
    buf: Vec<u8>,
}

impl MultipartBody {
    pub(crate) fn new() -> Self {
        Self {
            boundary: format!("rr-boundary-{}", uuid::Uuid::new_v4().simple()),
            buf: Vec::new(),
        }
    }

    pub(crate) fn text(mut self, name: &str, value: &str) -> Self {
        self.part_header(name, None, None);
        self.buf.extend_from_slice(value.as_bytes());
        self.buf.extend_from_slice(b"\r\n");
        self
    }

    pub(crate) fn file(mut self, name: &str, filename: &str, mime: &str, bytes: &[u8]) -> Self {
        self.part_header(name, Some(filename), Some(mime));
        self.buf.extend_from_slice(bytes);
        self.buf.extend_from_slice(b"\r\n");
        self
    }

    /// Content-Type header value and the finished body.
    pub(crate) fn finish(mut self) -> (String, Vec<u8>) {
        self.buf
            .extend_from_slice(format!("--{}--\r\n", self.boundary).as_bytes());
        (
            format!("multipart/form-data; boundary={}", self.boundary),
            self.buf,
        )
    }

    fn part_header(&mut self, name: &str, filename: Option<&str>, mime: Option<&str>) {
        let mut header = format!(
            "--{}\r\nContent-Disposition: form-data; name=\"{}\"",
            self.boundary,
            quote(name)
        );
        if let Some(filename) = filename {
            header.push_str(&format!("; filename=\"{}\"", quote(filename)));
        }
        header.push_str("\r\n");
        if let Some(mime) = mime {
            header.push_str(&format!("Content-Type: {}\r\n", mime));
        }
        header.push_str("\r\n");
        self.buf.extend_from_slice(header.as_bytes());
    }
}

/// Make a value safe inside a quoted header parameter.
fn quote(value: &str) -> String {
    value
        .chars()
        .filter(|c| *c != '\r' && *c != '\n')
        .map(|c| if c == '"' || c == '\\' { '_' } else { c })
        .collect()
}
