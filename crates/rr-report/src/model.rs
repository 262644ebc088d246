//! Typed report document tree.
//!
//! Leaves hold raw, unescaped text. Serializers ([`ReportDocument::to_html`],
//! [`PdfRenderer`](crate::render::PdfRenderer)) are responsible for encoding.

use crate::error::{ReportError, Result};
use crate::style::BadgeStyle;
use serde::{Deserialize, Serialize};

/// A complete report document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportDocument {
    /// Heading and document title.
    pub title: String,
    /// Muted line under the heading.
    pub subtitle: String,
    /// Body blocks in display order.
    pub blocks: Vec<Block>,
    /// Small print at the bottom.
    pub footer: Option<String>,
}

/// A body block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    /// Boxed text.
    Panel(TextPanel),
    /// KPI summary row.
    Kpis { cells: Vec<KpiCell> },
    /// One-line muted remark.
    Notice { text: String },
    /// Data table.
    Table(DataTable),
}

/// Boxed text panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextPanel {
    pub text: String,
    /// Keep line breaks and runs of spaces exactly as supplied.
    pub preformatted: bool,
}

/// One cell of the KPI panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KpiCell {
    pub value: String,
    pub label: String,
    #[serde(default)]
    pub sub_label: Option<String>,
}

/// Table cell content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Cell {
    Text { text: String },
    Badge { text: String, style: BadgeStyle },
}

impl Cell {
    /// Plain text cell.
    pub fn text(text: impl Into<String>) -> Self {
        Cell::Text { text: text.into() }
    }

    /// Styled badge cell.
    pub fn badge(text: impl Into<String>, style: BadgeStyle) -> Self {
        Cell::Badge {
            text: text.into(),
            style,
        }
    }

    /// The displayed text.
    pub fn content(&self) -> &str {
        match self {
            Cell::Text { text } | Cell::Badge { text, .. } => text,
        }
    }
}

/// Table with a header row. An empty body shows `empty_placeholder` in a
/// single full-width row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
    pub empty_placeholder: String,
}

impl DataTable {
    /// Create an empty table.
    pub fn new(columns: Vec<String>, empty_placeholder: impl Into<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
            empty_placeholder: empty_placeholder.into(),
        }
    }

    /// Column weights proportional to header width, for fixed-layout output.
    pub fn column_weights(&self) -> Vec<usize> {
        self.columns
            .iter()
            .enumerate()
            .map(|(i, _)| {
                let longest = self
                    .rows
                    .iter()
                    .filter_map(|row| row.get(i))
                    .map(|cell| cell.content().chars().count())
                    .max()
                    .unwrap_or(0);
                longest.clamp(4, 24)
            })
            .collect()
    }
}

impl ReportDocument {
    /// Create a document with a title and no body.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            subtitle: String::new(),
            blocks: Vec::new(),
            footer: None,
        }
    }

    /// Set the subtitle.
    pub fn with_subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.subtitle = subtitle.into();
        self
    }

    /// Set the footer.
    pub fn with_footer(mut self, footer: impl Into<String>) -> Self {
        self.footer = Some(footer.into());
        self
    }

    /// Append a block.
    pub fn push(&mut self, block: Block) {
        self.blocks.push(block);
    }

    /// Tables in the document.
    pub fn tables(&self) -> impl Iterator<Item = &DataTable> {
        self.blocks.iter().filter_map(|b| match b {
            Block::Table(t) => Some(t),
            _ => None,
        })
    }

    /// Check structural consistency.
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(ReportError::MalformedDocument("empty title".to_string()));
        }
        for block in &self.blocks {
            match block {
                Block::Kpis { cells } if cells.is_empty() => {
                    return Err(ReportError::MalformedDocument(
                        "KPI panel without cells".to_string(),
                    ));
                }
                Block::Table(table) => {
                    if table.columns.is_empty() {
                        return Err(ReportError::MalformedDocument(
                            "table without columns".to_string(),
                        ));
                    }
                    if let Some((idx, row)) = table
                        .rows
                        .iter()
                        .enumerate()
                        .find(|(_, row)| row.len() != table.columns.len())
                    {
                        return Err(ReportError::MalformedDocument(format!(
                            "table row {} has {} cells, expected {}",
                            idx,
                            row.len(),
                            table.columns.len()
                        )));
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }
}
