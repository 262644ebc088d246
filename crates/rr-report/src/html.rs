//! HTML serialization of [`ReportDocument`].
//!
//! This is the only place markup is produced. Every text leaf is passed
//! through [`html_escape`]; class attributes only ever come from
//! [`BadgeStyle::css_class`](crate::style::BadgeStyle::css_class).

use crate::model::{Block, Cell, DataTable, KpiCell, ReportDocument, TextPanel};
use crate::sanitize::html_escape;

const STYLESHEET: &str = r#"
        @page { size: A4; margin: 18mm; }
        body {
            font-family: "DejaVu Sans", "Liberation Sans", Arial, sans-serif;
            color: #111;
        }
        .header {
            border-bottom: 2px solid #111;
            padding-bottom: 10px;
            margin-bottom: 14px;
        }
        h1 { margin: 0; font-size: 20px; letter-spacing: .2px; }
        .meta { margin-top: 6px; font-size: 11px; color: #666; }
        .box {
            border: 1px solid #d9d9d9;
            border-radius: 12px;
            padding: 12px 14px;
            background: #fafafa;
            margin-bottom: 12px;
        }
        .mono { white-space: pre-wrap; font-size: 12px; line-height: 1.35; }
        .kpis { display: flex; gap: 8px; margin-bottom: 14px; }
        .kpi { flex: 1; text-align: center; }
        .kpi-value { font-size: 22px; font-weight: 700; }
        .kpi-label { font-size: 10px; color: #666; }
        .kpi-sub { font-size: 9px; color: #888; margin-top: 2px; }
        .notice { font-size: 10px; color: #666; margin-bottom: 6px; }
        table { width: 100%; border-collapse: collapse; font-size: 9px; }
        th, td { border-bottom: 1px solid #e5e5e5; padding: 4px 5px; text-align: left; }
        th { background: #f0f0f0; }
        td.empty { text-align: center; color: #666; padding: 12px; }
        .badge { display: inline-block; padding: 1px 6px; border-radius: 8px; color: #fff; font-size: 8px; }
        .threat-critical { background: #991b1b; }
        .threat-high { background: #dc2626; }
        .threat-medium { background: #d97706; }
        .threat-low { background: #2563eb; }
        .threat-info { background: #4b5563; }
        .threat-other { background: #6b7280; }
        .status-open { background: #dc2626; }
        .status-in-progress { background: #d97706; }
        .status-fixed { background: #16a34a; }
        .status-accepted { background: #2563eb; }
        .status-other { background: #6b7280; }
        .footer { margin-top: 14px; font-size: 9px; color: #888; }
"#;

impl ReportDocument {
    /// Serialize to a standalone HTML document.
    ///
    /// This is the markup view of the tree; [`crate::PdfRenderer`] lays the
    /// tree out on its own.
    pub fn to_html(&self) -> String {
        let body: String = self.blocks.iter().map(render_block).collect();
        let subtitle = if self.subtitle.is_empty() {
            String::new()
        } else {
            format!(r#"<div class="meta">{}</div>"#, html_escape(&self.subtitle))
        };

        format!(
            r##"<!DOCTYPE html>
<html lang="ru">
<head>
    <meta charset="utf-8">
    <title>{title}</title>
    <meta name="generator" content="rr-report {version}">
    <style>{stylesheet}</style>
</head>
<body>
    <div class="header">
        <h1>{title}</h1>
        {subtitle}
    </div>
{body}{footer}
</body>
</html>
"##,
            title = html_escape(&self.title),
            version = env!("CARGO_PKG_VERSION"),
            stylesheet = STYLESHEET,
            subtitle = subtitle,
            body = body,
            footer = match &self.footer {
                Some(footer) => format!(r#"    <div class="footer">{}</div>"#, html_escape(footer)),
                None => String::new(),
            },
        )
    }
}

fn render_block(block: &Block) -> String {
    match block {
        Block::Panel(panel) => render_panel(panel),
        Block::Kpis { cells } => render_kpis(cells),
        Block::Notice { text } => {
            format!("    <div class=\"notice\">{}</div>\n", html_escape(text))
        }
        Block::Table(table) => render_table(table),
    }
}

fn render_panel(panel: &TextPanel) -> String {
    let class = if panel.preformatted { "box mono" } else { "box" };
    format!(
        "    <div class=\"{}\">{}</div>\n",
        class,
        html_escape(&panel.text)
    )
}

fn render_kpis(cells: &[KpiCell]) -> String {
    let cells_html: String = cells
        .iter()
        .map(|cell| {
            let sub = cell
                .sub_label
                .as_deref()
                .map(|s| format!(r#"<div class="kpi-sub">{}</div>"#, html_escape(s)))
                .unwrap_or_default();
            format!(
                r#"
        <div class="box kpi">
            <div class="kpi-value">{}</div>
            <div class="kpi-label">{}</div>
            {}
        </div>"#,
                html_escape(&cell.value),
                html_escape(&cell.label),
                sub
            )
        })
        .collect();
    format!("    <div class=\"kpis\">{}\n    </div>\n", cells_html)
}

fn render_table(table: &DataTable) -> String {
    let head: String = table
        .columns
        .iter()
        .map(|c| format!("<th>{}</th>", html_escape(c)))
        .collect();

    let body = if table.rows.is_empty() {
        format!(
            r#"<tr class="placeholder"><td class="empty" colspan="{}">{}</td></tr>"#,
            table.columns.len(),
            html_escape(&table.empty_placeholder)
        )
    } else {
        table
            .rows
            .iter()
            .map(|row| {
                let cells: String = row.iter().map(render_cell).collect();
                format!("<tr class=\"row\">{}</tr>\n            ", cells)
            })
            .collect()
    };

    format!(
        r#"    <table>
        <thead><tr>{head}</tr></thead>
        <tbody>
            {body}
        </tbody>
    </table>
"#,
        head = head,
        body = body
    )
}

fn render_cell(cell: &Cell) -> String {
    match cell {
        Cell::Text { text } => format!("<td>{}</td>", html_escape(text)),
        Cell::Badge { text, style } => format!(
            r#"<td><span class="badge {}">{}</span></td>"#,
            style.css_class(),
            html_escape(text)
        ),
    }
}
