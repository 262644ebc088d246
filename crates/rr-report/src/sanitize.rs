//! Markup escaping for untrusted text.

/// Escape HTML special characters.
///
/// Every leaf of a [`ReportDocument`](crate::model::ReportDocument) goes
/// through this function when the document is serialized. It escapes once per
/// pass: an already escaped string is escaped again (`&amp;` becomes
/// `&amp;amp;`).
pub fn html_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + s.len() / 8);
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(ch),
        }
    }
    out
}
