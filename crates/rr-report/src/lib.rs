//! Vulnerability report document generation.
//!
//! Turns an untrusted JSON payload into a typed [`ReportDocument`] and then
//! into an A4 PDF.
//!
//! # Pipeline
//!
//! - [`ReportRequest::from_json_bytes`]: lenient parsing, never fails
//! - [`ReportGenerator::generate`]: document tree, caption, file name
//! - [`ReportDocument::to_html`]: markup serialization, every leaf escaped
//! - [`PdfRenderer`]: PDF serialization with embedded fonts
//!
//! # Example
//!
//! ```no_run
//! use rr_report::{PdfRenderer, Renderer, ReportConfig, ReportGenerator, ReportRequest};
//!
//! let config = ReportConfig::default();
//! let renderer = PdfRenderer::new(&config.fonts).unwrap();
//! let generator = ReportGenerator::new(config).unwrap();
//!
//! let request = ReportRequest::from_json_bytes(br#"{"department":"Network"}"#);
//! let report = generator.generate(&request, chrono::Utc::now());
//! let pdf = renderer.render(&report.document).unwrap();
//! std::fs::write(&report.filename, pdf).unwrap();
//! ```

pub mod config;
pub mod error;
pub mod filename;
pub mod generator;
pub mod html;
pub mod model;
pub mod render;
pub mod request;
pub mod sanitize;
pub mod style;

pub use config::{FontConfig, FontFamilySpec, ReportConfig, ReportLimits};
pub use error::{ReportError, Result};
pub use filename::derive_filename;
pub use generator::{GeneratedReport, ReportGenerator};
pub use model::{Block, Cell, DataTable, KpiCell, ReportDocument, TextPanel};
pub use render::{PdfRenderer, Renderer};
pub use request::{FreeformReport, Kpis, ReportRequest, StructuredReport, VulnerabilityRow};
pub use sanitize::html_escape;
pub use style::{BadgeStyle, StatusKind, ThreatLevel};
