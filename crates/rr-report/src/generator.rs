//! Report generator: maps a [`ReportRequest`] onto a [`ReportDocument`].

use crate::config::ReportConfig;
use crate::error::{ReportError, Result};
use crate::filename::derive_filename_with_limit;
use crate::model::{Block, Cell, DataTable, KpiCell, ReportDocument, TextPanel};
use crate::request::{FreeformReport, ReportRequest, StructuredReport, VulnerabilityRow};
use crate::style::{BadgeStyle, StatusKind, ThreatLevel};

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use tracing::debug;

/// Subtitle of freeform reports.
pub const FREEFORM_SUBTITLE: &str = "PDF сформирован автоматически";

/// Table header, in display order.
pub const TABLE_COLUMNS: [&str; 7] = [
    "CVSS",
    "Угроза",
    "Статус",
    "Хост",
    "Порт",
    "Плагин",
    "Обнаружено",
];

/// Body of the single row shown when there are no findings.
pub const NO_FINDINGS: &str = "Открытых уязвимостей нет";

/// Everything needed to render and deliver one report.
#[derive(Debug, Clone)]
pub struct GeneratedReport {
    /// Document tree.
    pub document: ReportDocument,
    /// Plain-text caption for the delivery message.
    pub caption: String,
    /// Artifact file name.
    pub filename: String,
    /// Report date in the configured timezone.
    pub date: NaiveDate,
    /// Rows received (structured reports).
    pub rows_total: usize,
    /// Rows placed in the table.
    pub rows_shown: usize,
}

impl GeneratedReport {
    /// Serialize the document to HTML.
    pub fn to_html(&self) -> String {
        self.document.to_html()
    }

    /// Whether some rows were cut off by the row limit.
    pub fn truncated(&self) -> bool {
        self.rows_shown < self.rows_total
    }
}

/// Report generator.
#[derive(Debug, Clone)]
pub struct ReportGenerator {
    config: ReportConfig,
    tz: Tz,
}

impl ReportGenerator {
    /// Create a generator, validating limits, placeholder and timezone.
    pub fn new(config: ReportConfig) -> Result<Self> {
        config.validate()?;
        let tz: Tz = config.timezone.parse().map_err(|e| {
            ReportError::InvalidConfig(format!("unknown timezone '{}': {}", config.timezone, e))
        })?;
        Ok(Self { config, tz })
    }

    /// Create a generator with default configuration.
    pub fn default_config() -> Self {
        Self {
            config: ReportConfig::default(),
            tz: chrono_tz::Europe::Helsinki,
        }
    }

    /// Get the current configuration.
    pub fn config(&self) -> &ReportConfig {
        &self.config
    }

    /// Calendar date of `now` in the report timezone.
    pub fn report_date(&self, now: DateTime<Utc>) -> NaiveDate {
        now.with_timezone(&self.tz).date_naive()
    }

    /// Build the document, caption and file name for a request.
    pub fn generate(&self, request: &ReportRequest, now: DateTime<Utc>) -> GeneratedReport {
        let date = self.report_date(now);
        let report = match request {
            ReportRequest::Freeform(f) => self.build_freeform(f, date),
            ReportRequest::Structured(s) => self.build_structured(s, date),
        };
        debug!(
            kind = request.kind(),
            date = %report.date,
            filename = %report.filename,
            rows_total = report.rows_total,
            rows_shown = report.rows_shown,
            "Report document built"
        );
        report
    }

    fn build_freeform(&self, report: &FreeformReport, date: NaiveDate) -> GeneratedReport {
        let mut document = ReportDocument::new(report.title.clone())
            .with_subtitle(FREEFORM_SUBTITLE)
            .with_footer(self.footer());
        document.push(Block::Panel(TextPanel {
            text: report.text.clone(),
            preformatted: true,
        }));

        GeneratedReport {
            document,
            caption: truncate_caption(&report.title, self.config.limits.max_caption_chars),
            filename: self.filename(&report.title, date),
            date,
            rows_total: 0,
            rows_shown: 0,
        }
    }

    fn build_structured(&self, report: &StructuredReport, date: NaiveDate) -> GeneratedReport {
        let date_str = format_date(date);
        let title = format!("Отчёт {} по отделу {}", date_str, report.department);

        let mut document = ReportDocument::new(title.clone())
            .with_subtitle(format!(
                "Дата отчёта: {} ({}) · {}",
                date_str,
                self.tz.name(),
                FREEFORM_SUBTITLE
            ))
            .with_footer(self.footer());

        document.push(Block::Kpis {
            cells: self.kpi_cells(report),
        });

        let max_rows = self.config.limits.max_rows;
        let shown = report.rows.len().min(max_rows);
        if report.rows.len() > max_rows {
            document.push(Block::Notice {
                text: format!("Показаны первые {} из {}", shown, report.rows.len()),
            });
        }

        let mut table = DataTable::new(
            TABLE_COLUMNS.iter().map(|c| c.to_string()).collect(),
            NO_FINDINGS,
        );
        table.rows = report
            .rows
            .iter()
            .take(max_rows)
            .map(|row| self.table_row(row))
            .collect();
        document.push(Block::Table(table));

        GeneratedReport {
            document,
            caption: truncate_caption(&title, self.config.limits.max_caption_chars),
            filename: self.filename(&report.department, date),
            date,
            rows_total: report.rows.len(),
            rows_shown: shown,
        }
    }

    fn kpi_cells(&self, report: &StructuredReport) -> Vec<KpiCell> {
        let kpis = &report.kpis;
        let value = |v: &Option<String>| v.clone().unwrap_or_else(|| self.config.placeholder.clone());
        vec![
            KpiCell {
                value: value(&kpis.total),
                label: "Всего уязвимостей".to_string(),
                sub_label: None,
            },
            KpiCell {
                value: value(&kpis.open),
                label: "Открытые".to_string(),
                sub_label: None,
            },
            KpiCell {
                value: value(&kpis.open_high7),
                label: "Открытые, CVSS ≥ 7".to_string(),
                sub_label: None,
            },
            KpiCell {
                value: value(&kpis.hosts),
                label: "Хосты".to_string(),
                sub_label: Some(format!("с открытыми: {}", value(&kpis.hosts_open))),
            },
        ]
    }

    fn table_row(&self, row: &VulnerabilityRow) -> Vec<Cell> {
        let threat = ThreatLevel::from_key(&row.threat_key);
        let status = StatusKind::from_key(&row.status_key);
        vec![
            Cell::text(row.cvss.clone()),
            Cell::badge(self.badge_text(&row.threat), BadgeStyle::Threat(threat)),
            Cell::badge(self.badge_text(&row.status), BadgeStyle::Status(status)),
            Cell::text(row.host.clone()),
            Cell::text(row.port.clone()),
            Cell::text(row.plugin.clone()),
            Cell::text(row.detected.clone()),
        ]
    }

    fn badge_text(&self, label: &str) -> String {
        if label.trim().is_empty() {
            self.config.placeholder.clone()
        } else {
            label.to_string()
        }
    }

    fn filename(&self, label: &str, date: NaiveDate) -> String {
        derive_filename_with_limit(
            label,
            &format_date(date),
            self.config.limits.max_filename_stem,
        )
    }

    fn footer(&self) -> String {
        format!("rr-report {}", env!("CARGO_PKG_VERSION"))
    }
}

/// `YYYY-MM-DD`.
pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Cap a caption at `max_chars` characters, marking the cut with `…`.
pub fn truncate_caption(caption: &str, max_chars: usize) -> String {
    if caption.chars().count() <= max_chars {
        return caption.to_string();
    }
    let mut out: String = caption.chars().take(max_chars.saturating_sub(1)).collect();
    out.push('…');
    out
}
