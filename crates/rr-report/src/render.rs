//! PDF rendering of [`ReportDocument`].
//!
//! Pure Rust (`genpdf`). Fonts are embedded, so Cyrillic text renders the same
//! on every host. The font family is resolved once from an ordered fallback
//! list and reused for every render.
//!
//! The PDF is laid out directly from the typed tree. [`ReportDocument::to_html`]
//! is a separate markup view of the same tree (`rr-core render --html`) and
//! never feeds this renderer.
//!
//! genpdf embeds every face of the family in full, whether or not the layout
//! uses it, so each artifact carries roughly the size of the four font files.

use crate::config::{FontConfig, FontFamilySpec};
use crate::error::{ReportError, Result};
use crate::model::{Block, Cell, DataTable, KpiCell, ReportDocument, TextPanel};

use genpdf::elements::{Break, FrameCellDecorator, LinearLayout, Paragraph, TableLayout};
use genpdf::fonts::{FontData, FontFamily};
use genpdf::style::{Color, Style};
use genpdf::{Alignment, Document, Element, PaperSize, SimplePageDecorator};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};

/// Page margin in millimetres.
pub const PAGE_MARGIN_MM: i32 = 18;

/// How deep font directories are searched.
const FONT_SEARCH_DEPTH: usize = 4;

const MUTED: Color = Color::Rgb(102, 102, 102);
const NBSP: char = '\u{00A0}';

/// Converts a document into a binary artifact.
pub trait Renderer: Send + Sync {
    /// Render the whole document. Returns the complete artifact or an error,
    /// never a partial buffer.
    fn render(&self, document: &ReportDocument) -> Result<Vec<u8>>;
}

/// A4 PDF renderer.
pub struct PdfRenderer {
    family_name: String,
    fonts: FontFamily<FontData>,
}

impl std::fmt::Debug for PdfRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PdfRenderer")
            .field("family_name", &self.family_name)
            .finish()
    }
}

impl PdfRenderer {
    /// Resolve the first available font family from the configuration.
    pub fn new(config: &FontConfig) -> Result<Self> {
        for spec in &config.families {
            match load_family(spec, &config.dirs) {
                Ok(Some(fonts)) => {
                    info!(family = %spec.name, "PDF font family loaded");
                    return Ok(Self::from_family(spec.name.clone(), fonts));
                }
                Ok(None) => debug!(family = %spec.name, "font family not installed"),
                Err(e) => debug!(family = %spec.name, error = %e, "font family unusable"),
            }
        }
        Err(ReportError::FontNotFound {
            families: config.families.iter().map(|f| f.name.clone()).collect(),
            searched: config.dirs.clone(),
        })
    }

    /// Use an already loaded font family.
    pub fn from_family(name: impl Into<String>, fonts: FontFamily<FontData>) -> Self {
        Self {
            family_name: name.into(),
            fonts,
        }
    }

    /// Name of the font family in use.
    pub fn family_name(&self) -> &str {
        &self.family_name
    }

    fn build(&self, document: &ReportDocument) -> Result<Document> {
        let mut doc = Document::new(self.fonts.clone());
        doc.set_title(document.title.clone());
        doc.set_minimal_conformance();
        doc.set_paper_size(PaperSize::A4);
        doc.set_font_size(10);
        doc.set_line_spacing(1.25);

        let mut decorator = SimplePageDecorator::new();
        decorator.set_margins(PAGE_MARGIN_MM);
        doc.set_page_decorator(decorator);

        doc.push(
            Paragraph::new(document.title.clone()).styled(Style::new().bold().with_font_size(18)),
        );
        if !document.subtitle.is_empty() {
            doc.push(Paragraph::new(document.subtitle.clone()).styled(muted(9)));
        }
        doc.push(Break::new(1.0));

        for block in &document.blocks {
            match block {
                Block::Panel(panel) => doc.push(panel_element(panel)?),
                Block::Kpis { cells } => doc.push(kpi_element(cells)?),
                Block::Notice { text } => doc.push(Paragraph::new(text.clone()).styled(muted(8))),
                Block::Table(table) => push_table(&mut doc, table)?,
            }
            doc.push(Break::new(0.8));
        }

        if let Some(footer) = &document.footer {
            doc.push(Paragraph::new(footer.clone()).styled(muted(7)));
        }
        Ok(doc)
    }
}

impl Renderer for PdfRenderer {
    fn render(&self, document: &ReportDocument) -> Result<Vec<u8>> {
        document.validate()?;
        let started = Instant::now();

        let doc = self.build(document)?;
        let mut bytes = Vec::new();
        doc.render(&mut bytes)?;

        if !bytes.starts_with(b"%PDF") {
            return Err(ReportError::RenderFailed(
                "renderer produced no PDF output".to_string(),
            ));
        }

        debug!(
            bytes = bytes.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "PDF rendered"
        );
        Ok(bytes)
    }
}

fn muted(size: u8) -> Style {
    Style::new().with_font_size(size).with_color(MUTED)
}

fn boxed(weights: Vec<usize>) -> TableLayout {
    let mut table = TableLayout::new(weights);
    table.set_cell_decorator(FrameCellDecorator::new(true, true, false));
    table
}

fn panel_element(panel: &TextPanel) -> Result<TableLayout> {
    let mut body = LinearLayout::vertical();
    if panel.preformatted {
        for line in panel.text.split('\n') {
            body.push(Paragraph::new(preserve_spaces(line)).styled(Style::new().with_font_size(9)));
        }
    } else {
        body.push(Paragraph::new(panel.text.clone()));
    }

    let mut table = boxed(vec![1]);
    table.row().element(body.padded(3)).push()?;
    Ok(table)
}

fn kpi_element(cells: &[KpiCell]) -> Result<TableLayout> {
    let mut table = boxed(vec![1; cells.len()]);
    let mut row = table.row();
    for cell in cells {
        let mut layout = LinearLayout::vertical()
            .element(
                Paragraph::new(cell.value.clone())
                    .aligned(Alignment::Center)
                    .styled(Style::new().bold().with_font_size(16)),
            )
            .element(
                Paragraph::new(cell.label.clone())
                    .aligned(Alignment::Center)
                    .styled(muted(8)),
            );
        if let Some(sub) = &cell.sub_label {
            layout.push(
                Paragraph::new(sub.clone())
                    .aligned(Alignment::Center)
                    .styled(muted(7)),
            );
        }
        row.push_element(layout.padded(2));
    }
    row.push()?;
    Ok(table)
}

fn push_table(doc: &mut Document, table: &DataTable) -> Result<()> {
    let mut layout = boxed(table.column_weights());

    let mut header = layout.row();
    for column in &table.columns {
        header.push_element(
            Paragraph::new(column.clone())
                .styled(Style::new().bold().with_font_size(8))
                .padded(1),
        );
    }
    header.push()?;

    for cells in &table.rows {
        let mut row = layout.row();
        for cell in cells {
            row.push_element(cell_element(cell).padded(1));
        }
        row.push()?;
    }
    doc.push(layout);

    if table.rows.is_empty() {
        let mut placeholder = boxed(vec![1]);
        placeholder
            .row()
            .element(
                Paragraph::new(table.empty_placeholder.clone())
                    .aligned(Alignment::Center)
                    .styled(muted(9))
                    .padded(3),
            )
            .push()?;
        doc.push(placeholder);
    }
    Ok(())
}

fn cell_element(cell: &Cell) -> impl Element {
    match cell {
        Cell::Text { text } => {
            Paragraph::new(text.clone()).styled(Style::new().with_font_size(8))
        }
        Cell::Badge { text, style } => {
            let (r, g, b) = style.color();
            Paragraph::new(text.clone()).styled(
                Style::new()
                    .bold()
                    .with_font_size(8)
                    .with_color(Color::Rgb(r, g, b)),
            )
        }
    }
}

/// Keep indentation and runs of spaces through line wrapping.
fn preserve_spaces(line: &str) -> String {
    let expanded = line.replace('\t', "    ");
    let mut out = String::with_capacity(expanded.len());
    let mut prev_space = true;
    for ch in expanded.chars() {
        if ch == ' ' && prev_space {
            out.push(NBSP);
        } else {
            out.push(ch);
        }
        prev_space = ch == ' ' || ch == NBSP;
    }
    if out.is_empty() {
        out.push(NBSP);
    }
    out
}

/// Load one family. `Ok(None)` when its regular face is not installed.
fn load_family(spec: &FontFamilySpec, dirs: &[PathBuf]) -> Result<Option<FontFamily<FontData>>> {
    let Some(regular_path) = find_font_file(dirs, &spec.regular) else {
        return Ok(None);
    };
    let family_dir = regular_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();

    let load = |path: &Path| {
        FontData::load(path, None).map_err(|e| {
            ReportError::RenderFailed(format!("failed to load font {}: {}", path.display(), e))
        })
    };
    let variant = |name: &Option<String>| -> Result<FontData> {
        let path = name
            .as_deref()
            .and_then(|n| {
                let sibling = family_dir.join(n);
                if sibling.is_file() {
                    Some(sibling)
                } else {
                    find_font_file(dirs, n)
                }
            })
            .unwrap_or_else(|| regular_path.clone());
        load(&path)
    };

    Ok(Some(FontFamily {
        regular: load(&regular_path)?,
        bold: variant(&spec.bold)?,
        italic: variant(&spec.italic)?,
        bold_italic: variant(&spec.bold_italic)?,
    }))
}

/// Find `file_name` in the first directory (or subdirectory) containing it.
pub fn find_font_file(dirs: &[PathBuf], file_name: &str) -> Option<PathBuf> {
    dirs.iter()
        .find_map(|dir| search_dir(dir, file_name, FONT_SEARCH_DEPTH))
}

fn search_dir(dir: &Path, file_name: &str, depth: usize) -> Option<PathBuf> {
    let candidate = dir.join(file_name);
    if candidate.is_file() {
        return Some(candidate);
    }
    if depth == 0 {
        return None;
    }
    let mut subdirs: Vec<PathBuf> = std::fs::read_dir(dir)
        .ok()?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();
    subdirs.sort();
    subdirs
        .iter()
        .find_map(|sub| search_dir(sub, file_name, depth - 1))
}
