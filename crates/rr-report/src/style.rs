//! Classification tags mapped to badge styles.
//!
//! Caller-supplied `threat_key` / `status_key` values never reach the markup.
//! They are parsed into a closed set of variants and each variant owns a
//! fixed CSS class and PDF colour.

use serde::{Deserialize, Serialize};

/// RGB colour used for badges in the PDF output.
pub type Rgb = (u8, u8, u8);

/// Threat level of a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThreatLevel {
    Critical,
    High,
    Medium,
    Low,
    Info,
    /// Unknown, empty or unrecognised key.
    #[default]
    Other,
}

impl ThreatLevel {
    /// Every variant, in severity order.
    pub const ALL: [ThreatLevel; 6] = [
        ThreatLevel::Critical,
        ThreatLevel::High,
        ThreatLevel::Medium,
        ThreatLevel::Low,
        ThreatLevel::Info,
        ThreatLevel::Other,
    ];

    /// Map a caller-supplied key. Never fails.
    pub fn from_key(key: &str) -> Self {
        match normalize_key(key).as_str() {
            "critical" | "crit" => ThreatLevel::Critical,
            "high" => ThreatLevel::High,
            "medium" | "med" | "moderate" => ThreatLevel::Medium,
            "low" => ThreatLevel::Low,
            "info" | "informational" | "none" => ThreatLevel::Info,
            _ => ThreatLevel::Other,
        }
    }

    /// Get the CSS class for this level.
    pub fn css_class(&self) -> &'static str {
        match self {
            ThreatLevel::Critical => "threat-critical",
            ThreatLevel::High => "threat-high",
            ThreatLevel::Medium => "threat-medium",
            ThreatLevel::Low => "threat-low",
            ThreatLevel::Info => "threat-info",
            ThreatLevel::Other => "threat-other",
        }
    }

    /// Badge colour in the PDF.
    pub fn color(&self) -> Rgb {
        match self {
            ThreatLevel::Critical => (153, 27, 27),
            ThreatLevel::High => (220, 38, 38),
            ThreatLevel::Medium => (217, 119, 6),
            ThreatLevel::Low => (37, 99, 235),
            ThreatLevel::Info => (75, 85, 99),
            ThreatLevel::Other => (107, 114, 128),
        }
    }
}

/// Remediation status of a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StatusKind {
    Open,
    InProgress,
    Fixed,
    Accepted,
    /// Unknown, empty or unrecognised key.
    #[default]
    Other,
}

impl StatusKind {
    /// Every variant.
    pub const ALL: [StatusKind; 5] = [
        StatusKind::Open,
        StatusKind::InProgress,
        StatusKind::Fixed,
        StatusKind::Accepted,
        StatusKind::Other,
    ];

    /// Map a caller-supplied key. Never fails.
    pub fn from_key(key: &str) -> Self {
        match normalize_key(key).as_str() {
            "open" | "new" | "reopened" => StatusKind::Open,
            "in-progress" | "progress" | "wip" => StatusKind::InProgress,
            "fixed" | "closed" | "resolved" => StatusKind::Fixed,
            "accepted" | "risk-accepted" => StatusKind::Accepted,
            _ => StatusKind::Other,
        }
    }

    /// Get the CSS class for this status.
    pub fn css_class(&self) -> &'static str {
        match self {
            StatusKind::Open => "status-open",
            StatusKind::InProgress => "status-in-progress",
            StatusKind::Fixed => "status-fixed",
            StatusKind::Accepted => "status-accepted",
            StatusKind::Other => "status-other",
        }
    }

    /// Badge colour in the PDF.
    pub fn color(&self) -> Rgb {
        match self {
            StatusKind::Open => (220, 38, 38),
            StatusKind::InProgress => (217, 119, 6),
            StatusKind::Fixed => (22, 163, 74),
            StatusKind::Accepted => (37, 99, 235),
            StatusKind::Other => (107, 114, 128),
        }
    }
}

/// Style of a badge cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum BadgeStyle {
    Threat(ThreatLevel),
    Status(StatusKind),
}

impl BadgeStyle {
    /// Get the CSS class for this badge.
    pub fn css_class(&self) -> &'static str {
        match self {
            BadgeStyle::Threat(t) => t.css_class(),
            BadgeStyle::Status(s) => s.css_class(),
        }
    }

    /// Badge colour in the PDF.
    pub fn color(&self) -> Rgb {
        match self {
            BadgeStyle::Threat(t) => t.color(),
            BadgeStyle::Status(s) => s.color(),
        }
    }
}

fn normalize_key(key: &str) -> String {
    key.trim().to_ascii_lowercase().replace('_', "-")
}
