//! Request pipeline: parse, build, render, deliver.
//!
//! Each call is independent. The pipeline holds only read-only state (the
//! generator, the loaded fonts, the delivery client and the recipient), so one
//! instance is shared by every worker thread.

use crate::delivery::{Delivery, DeliveryError, OutgoingDocument};
use crate::logging::generate_request_id;

use chrono::{DateTime, Utc};
use rr_report::{GeneratedReport, Renderer, ReportError, ReportGenerator, ReportRequest};
use serde::Serialize;
use std::time::Instant;
use thiserror::Error;
use tracing::{error, info, info_span};

/// Per-request failures. Either one aborts the request.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("rendering failed: {0}")]
    Render(#[from] ReportError),

    #[error("delivery failed: {0}")]
    Delivery(#[from] DeliveryError),
}

impl PipelineError {
    /// Stage that failed, for logs.
    pub fn stage(&self) -> &'static str {
        match self {
            PipelineError::Render(_) => "render",
            PipelineError::Delivery(_) => "delivery",
        }
    }

    /// Message safe to hand back to the caller.
    pub fn public_message(&self) -> &'static str {
        match self {
            PipelineError::Render(_) => "report rendering failed",
            PipelineError::Delivery(_) => "report delivery failed",
        }
    }
}

/// Outcome of a delivered report.
#[derive(Debug, Clone, Serialize)]
pub struct Receipt {
    pub request_id: String,
    pub kind: &'static str,
    pub filename: String,
    pub caption: String,
    pub pdf_bytes: usize,
    pub rows_total: usize,
    pub rows_shown: usize,
    pub render_ms: u64,
    pub delivery_ms: u64,
}

/// A built and rendered report that has not been delivered.
#[derive(Debug)]
pub struct PreparedReport {
    pub report: GeneratedReport,
    pub pdf: Vec<u8>,
    pub render_ms: u64,
}

/// Build and render one request. Nothing is returned unless rendering completed.
pub fn prepare_report<R: Renderer + ?Sized>(
    generator: &ReportGenerator,
    renderer: &R,
    request: &ReportRequest,
    now: DateTime<Utc>,
) -> Result<PreparedReport, ReportError> {
    let report = generator.generate(request, now);
    let started = Instant::now();
    let pdf = renderer.render(&report.document)?;
    Ok(PreparedReport {
        report,
        pdf,
        render_ms: started.elapsed().as_millis() as u64,
    })
}

/// End-to-end report handling.
pub struct ReportPipeline<R, D> {
    generator: ReportGenerator,
    renderer: R,
    delivery: D,
    chat_id: String,
}

impl<R: Renderer, D: Delivery> ReportPipeline<R, D> {
    pub fn new(
        generator: ReportGenerator,
        renderer: R,
        delivery: D,
        chat_id: impl Into<String>,
    ) -> Self {
        Self {
            generator,
            renderer,
            delivery,
            chat_id: chat_id.into(),
        }
    }

    pub fn generator(&self) -> &ReportGenerator {
        &self.generator
    }

    pub fn delivery(&self) -> &D {
        &self.delivery
    }

    /// Handle one raw request body at the current time.
    pub fn handle(&self, body: &[u8]) -> Result<Receipt, PipelineError> {
        self.handle_at(body, Utc::now())
    }

    /// Handle one raw request body, dating the report at `now`.
    pub fn handle_at(&self, body: &[u8], now: DateTime<Utc>) -> Result<Receipt, PipelineError> {
        let request_id = generate_request_id();
        let span = info_span!("report", request_id = %request_id);
        let _enter = span.enter();

        let request = ReportRequest::from_json_bytes(body);
        info!(kind = request.kind(), body_bytes = body.len(), "report received");

        let result = self.run(&request, now, request_id);
        if let Err(e) = &result {
            error!(stage = e.stage(), error = %e, "report failed");
        }
        result
    }

    fn run(
        &self,
        request: &ReportRequest,
        now: DateTime<Utc>,
        request_id: String,
    ) -> Result<Receipt, PipelineError> {
        let prepared = prepare_report(&self.generator, &self.renderer, request, now)?;
        let report = &prepared.report;
        info!(
            filename = %report.filename,
            pdf_bytes = prepared.pdf.len(),
            rows_total = report.rows_total,
            rows_shown = report.rows_shown,
            render_ms = prepared.render_ms,
            "document rendered"
        );

        let started = Instant::now();
        self.delivery.send_document(&OutgoingDocument {
            chat_id: &self.chat_id,
            filename: &report.filename,
            caption: &report.caption,
            bytes: &prepared.pdf,
        })?;
        let delivery_ms = started.elapsed().as_millis() as u64;
        info!(filename = %report.filename, delivery_ms, "document delivered");

        Ok(Receipt {
            request_id,
            kind: request.kind(),
            filename: report.filename.clone(),
            caption: report.caption.clone(),
            pdf_bytes: prepared.pdf.len(),
            rows_total: report.rows_total,
            rows_shown: report.rows_shown,
            render_ms: prepared.render_ms,
            delivery_ms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rr_report::ReportDocument;
    use std::sync::Mutex;

    struct StubRenderer;

    impl Renderer for StubRenderer {
        fn render(&self, document: &ReportDocument) -> rr_report::Result<Vec<u8>> {
            document.validate()?;
            Ok(format!("%PDF-stub {}", document.title).into_bytes())
        }
    }

    struct FailingRenderer;

    impl Renderer for FailingRenderer {
        fn render(&self, _document: &ReportDocument) -> rr_report::Result<Vec<u8>> {
            Err(ReportError::RenderFailed("boom".to_string()))
        }
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Sent {
        chat_id: String,
        filename: String,
        caption: String,
        bytes: Vec<u8>,
    }

    #[derive(Default)]
    struct RecordingDelivery {
        sent: Mutex<Vec<Sent>>,
        fail_with: Option<u16>,
    }

    impl Delivery for RecordingDelivery {
        fn send_document(&self, document: &OutgoingDocument<'_>) -> Result<(), DeliveryError> {
            self.sent.lock().unwrap().push(Sent {
                chat_id: document.chat_id.to_string(),
                filename: document.filename.to_string(),
                caption: document.caption.to_string(),
                bytes: document.bytes.to_vec(),
            });
            match self.fail_with {
                Some(code) => Err(DeliveryError::Status {
                    code,
                    description: "Internal Server Error".to_string(),
                }),
                None => Ok(()),
            }
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 16, 9, 0, 0).unwrap()
    }

    fn pipeline<R: Renderer>(renderer: R, delivery: RecordingDelivery) -> ReportPipeline<R, RecordingDelivery> {
        ReportPipeline::new(ReportGenerator::default_config(), renderer, delivery, "-100")
    }

    #[test]
    fn test_structured_delivered() {
        let p = pipeline(StubRenderer, RecordingDelivery::default());
        let receipt = p
            .handle_at(
                br#"{"department":"Network","kpis":{"total":"12","open":"3"},"open_rows":[]}"#,
                now(),
            )
            .unwrap();

        assert_eq!(receipt.kind, "structured");
        assert_eq!(receipt.filename, "network_2026-10-16.pdf");
        assert_eq!(receipt.caption, "Отчёт 2026-10-16 по отделу Network");
        assert!(receipt.request_id.starts_with("req-"));

        let sent = p.delivery().sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].chat_id, "-100");
        assert_eq!(sent[0].filename, receipt.filename);
        assert_eq!(sent[0].caption, receipt.caption);
        assert!(sent[0].bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_empty_body_uses_defaults() {
        let p = pipeline(StubRenderer, RecordingDelivery::default());
        let receipt = p.handle_at(b"", now()).unwrap();
        assert_eq!(receipt.caption, "Отчёт 2026-10-16 по отделу unknown");
        assert_eq!(receipt.filename, "unknown_2026-10-16.pdf");
        assert_eq!(receipt.rows_total, 0);
    }

    #[test]
    fn test_render_failure_skips_delivery() {
        let p = pipeline(FailingRenderer, RecordingDelivery::default());
        let err = p.handle_at(b"{}", now()).unwrap_err();
        assert!(matches!(err, PipelineError::Render(_)));
        assert_eq!(err.public_message(), "report rendering failed");
        assert!(p.delivery().sent.lock().unwrap().is_empty());
    }

    #[test]
    fn test_delivery_failure_single_attempt() {
        let delivery = RecordingDelivery {
            fail_with: Some(500),
            ..Default::default()
        };
        let p = pipeline(StubRenderer, delivery);
        let err = p.handle_at(br#"{"department":"IT"}"#, now()).unwrap_err();
        assert!(matches!(err, PipelineError::Delivery(DeliveryError::Status { code: 500, .. })));
        assert_eq!(err.stage(), "delivery");
        assert_eq!(p.delivery().sent.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_prepare_report_without_delivery() {
        let generator = ReportGenerator::default_config();
        let request = ReportRequest::from_json_bytes(br#"{"title":"Weekly","text":"ok"}"#);
        let prepared = prepare_report(&generator, &StubRenderer, &request, now()).unwrap();
        assert_eq!(prepared.report.filename, "weekly_2026-10-16.pdf");
        assert_eq!(prepared.pdf, b"%PDF-stub Weekly");
    }
}
