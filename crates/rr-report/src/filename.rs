//! Filesystem-safe artifact names.

use regex::Regex;
use std::sync::LazyLock;

/// Stem used when nothing survives normalisation.
pub const FALLBACK_STEM: &str = "report";

/// Default cap on the stem length.
pub const DEFAULT_MAX_STEM: usize = 60;

static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));
static DISALLOWED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9_-]").expect("charset pattern is valid"));

/// Normalise a free-text label into a filename stem.
///
/// Lowercases, collapses whitespace runs into `_`, drops everything outside
/// `[a-z0-9_-]` and caps the result at `max_len` characters.
pub fn filename_stem(label: &str, max_len: usize) -> String {
    let lowered = label.trim().to_lowercase();
    let underscored = WHITESPACE_RUN.replace_all(&lowered, "_");
    let cleaned = DISALLOWED.replace_all(&underscored, "");
    let stem: String = cleaned.chars().take(max_len).collect();
    if stem.is_empty() {
        FALLBACK_STEM.to_string()
    } else {
        stem
    }
}

/// Build `<stem>_<date>.pdf` with the default stem cap.
pub fn derive_filename(label: &str, date: &str) -> String {
    derive_filename_with_limit(label, date, DEFAULT_MAX_STEM)
}

/// Build `<stem>_<date>.pdf`.
pub fn derive_filename_with_limit(label: &str, date: &str, max_stem: usize) -> String {
    let stem = filename_stem(label, max_stem);
    let date = DISALLOWED.replace_all(date, "");
    format!("{}_{}.pdf", stem, date)
}
