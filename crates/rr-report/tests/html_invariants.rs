//! HTML report invariant tests.
//!
//! These tests validate the generated markup without a renderer:
//! - Hostile input never appears unescaped
//! - Row limit, order and the empty-table placeholder
//! - KPI placeholders
//! - Badge classes come from the closed style set

use chrono::{DateTime, TimeZone, Utc};
use regex::Regex;
use rr_report::generator::ReportGenerator;
use rr_report::request::ReportRequest;
use serde_json::json;

const HOSTILE: &str = r#"<img src=x onerror="alert('x')">&"#;

fn noon() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 16, 9, 0, 0).unwrap()
}

fn html_for(payload: serde_json::Value) -> String {
    let body = serde_json::to_vec(&payload).unwrap();
    let request = ReportRequest::from_json_bytes(&body);
    ReportGenerator::default_config()
        .generate(&request, noon())
        .to_html()
}

fn row(i: usize) -> serde_json::Value {
    json!({
        "cvss": "9.1",
        "threat": "Критический",
        "threat_key": "critical",
        "status": "Открыта",
        "status_key": "open",
        "host": format!("host-{:03}", i),
        "port": 22,
        "plugin": format!("plugin {}", i),
        "detected": "2026-10-01 08:00"
    })
}

/// Text between tags inside `<body>`, i.e. everything a user-supplied value can land in.
fn text_nodes(html: &str) -> Vec<String> {
    let body = &html[html.find("<body>").unwrap()..];
    let re = Regex::new(r">([^<]*)<").unwrap();
    re.captures_iter(body).map(|c| c[1].to_string()).collect()
}

// ============================================================================
// Escaping
// ============================================================================

mod escaping {
    use super::*;

    #[test]
    fn test_structured_fields_escaped() {
        let html = html_for(json!({
            "department": HOSTILE,
            "kpis": {"total": HOSTILE, "hosts_open": HOSTILE},
            "open_rows": [{
                "cvss": HOSTILE, "threat": HOSTILE, "threat_key": HOSTILE,
                "status": HOSTILE, "status_key": HOSTILE, "host": HOSTILE,
                "port": HOSTILE, "plugin": HOSTILE, "detected": HOSTILE
            }]
        }));

        assert!(!html.contains("<img"), "raw tag leaked into output");
        assert!(!html.contains("onerror=\""), "raw attribute leaked into output");
        assert!(html.contains("&lt;img src=x onerror=&quot;alert(&#x27;x&#x27;)&quot;&gt;&amp;"));

        for node in text_nodes(&html) {
            assert!(!node.contains('"'), "raw quote in text node: {node}");
            assert!(!node.contains('\''), "raw apostrophe in text node: {node}");
        }
    }

    #[test]
    fn test_freeform_fields_escaped() {
        let html = html_for(json!({"title": HOSTILE, "text": HOSTILE}));
        assert!(!html.contains("<img"));
        assert_eq!(
            html.matches("&lt;img src=x").count(),
            3,
            "title, heading and body should each carry one escaped copy"
        );
    }

    #[test]
    fn test_badge_classes_from_closed_set() {
        let html = html_for(json!({
            "open_rows": [
                {"threat_key": "high\" onclick=\"x", "status_key": "in_progress"},
                {"threat_key": "LOW", "status_key": "weird"}
            ]
        }));
        let re = Regex::new(r#"class="badge ([^"]*)""#).unwrap();
        let classes: Vec<String> = re.captures_iter(&html).map(|c| c[1].to_string()).collect();
        assert_eq!(
            classes,
            vec!["threat-other", "status-in-progress", "threat-low", "status-other"]
        );
    }
}

// ============================================================================
// Table structure
// ============================================================================

mod table {
    use super::*;

    #[test]
    fn test_row_limit_and_order() {
        let rows: Vec<_> = (0..120).map(row).collect();
        let html = html_for(json!({"department": "IT", "open_rows": rows}));

        assert_eq!(html.matches(r#"<tr class="row">"#).count(), 50);
        assert_eq!(html.matches(r#"<tr class="placeholder">"#).count(), 0);

        let hosts: Vec<usize> = Regex::new(r"host-(\d{3})")
            .unwrap()
            .captures_iter(&html)
            .map(|c| c[1].parse().unwrap())
            .collect();
        assert_eq!(hosts, (0..50).collect::<Vec<_>>());
        assert!(html.contains("Показаны первые 50 из 120"));
    }

    #[test]
    fn test_exactly_fifty_rows_has_no_notice() {
        let rows: Vec<_> = (0..50).map(row).collect();
        let html = html_for(json!({"open_rows": rows}));
        assert_eq!(html.matches(r#"<tr class="row">"#).count(), 50);
        assert!(!html.contains("Показаны первые"));
    }

    #[test]
    fn test_empty_rows_single_placeholder() {
        let html = html_for(json!({"department": "Network", "open_rows": []}));
        assert_eq!(html.matches(r#"<tr class="placeholder">"#).count(), 1);
        assert_eq!(html.matches(r#"<tr class="row">"#).count(), 0);
        assert!(html.contains(r#"colspan="7""#));
        assert!(html.contains("Открытых уязвимостей нет"));
    }

    #[test]
    fn test_column_order() {
        let html = html_for(json!({"open_rows": [row(7)]}));
        let start = html.find(r#"<tr class="row">"#).unwrap();
        let end = start + html[start..].find("</tr>").unwrap();
        let cells: Vec<String> = Regex::new(r"<td>(?:<span[^>]*>)?([^<]*)")
            .unwrap()
            .captures_iter(&html[start..end])
            .map(|c| c[1].to_string())
            .collect();
        assert_eq!(
            cells,
            vec!["9.1", "Критический", "Открыта", "host-007", "22", "plugin 7", "2026-10-01 08:00"]
        );
    }
}

// ============================================================================
// KPI panel and defaults
// ============================================================================

mod kpis {
    use super::*;

    #[test]
    fn test_empty_kpis_render_placeholder() {
        let html = html_for(json!({"department": "IT", "kpis": {}}));
        assert_eq!(html.matches(r#"<div class="kpi-value">—</div>"#).count(), 4);
        assert!(!html.contains("null"));
        assert!(!html.contains("None"));
    }

    #[test]
    fn test_partial_kpis() {
        let html = html_for(json!({
            "department": "Network",
            "kpis": {"total": "12", "open": "3"},
            "open_rows": []
        }));
        assert!(html.contains(r#"<div class="kpi-value">12</div>"#));
        assert!(html.contains(r#"<div class="kpi-value">3</div>"#));
        assert_eq!(html.matches(r#"<div class="kpi-value">—</div>"#).count(), 2);
        assert!(html.contains("<h1>Отчёт 2026-10-16 по отделу Network</h1>"));
    }

    #[test]
    fn test_non_object_payload_defaults() {
        let request = ReportRequest::from_json_bytes(b"");
        let html = ReportGenerator::default_config()
            .generate(&request, noon())
            .to_html();
        assert!(html.contains("по отделу unknown"));
        assert_eq!(html.matches(r#"<tr class="placeholder">"#).count(), 1);
    }
}
