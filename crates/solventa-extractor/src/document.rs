//! Parsed-document model
//!
//! Binary container parsing (OOXML packaging, cell styles, drawing parts)
//! is an external collaborator. What arrives here is its output: a
//! structured handle exposing paragraphs, tables, rows, cells, runs with
//! style attributes, sheets and embedded image descriptors. The model is
//! serde-derived so a handle can be serialized by the parser process and
//! loaded by [`JsonDocumentParser`].

use crate::error::ExtractorError;
use serde::{Deserialize, Serialize};
use solventa_domain::FileKind;
use std::fs;
use std::path::Path;

/// A fully parsed source document of either supported kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ParsedDocument {
    /// Word-processor document
    Docx(DocxDocument),
    /// Spreadsheet workbook
    Xlsx(XlsxDocument),
}

impl ParsedDocument {
    /// The document kind.
    pub fn kind(&self) -> FileKind {
        match self {
            Self::Docx(_) => FileKind::Docx,
            Self::Xlsx(_) => FileKind::Xlsx,
        }
    }

    /// Total embedded images across the document.
    pub fn image_count(&self) -> usize {
        match self {
            Self::Docx(d) => d.images.len(),
            Self::Xlsx(d) => d.sheets.iter().map(|s| s.images.len()).sum(),
        }
    }

    /// Sheet names, in workbook order; empty for word-processor documents.
    pub fn sheet_names(&self) -> Vec<String> {
        match self {
            Self::Docx(_) => Vec::new(),
            Self::Xlsx(d) => d.sheets.iter().map(|s| s.name.clone()).collect(),
        }
    }
}

/// A parsed word-processor document: body blocks in document order plus
/// the document-level image inventory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocxDocument {
    /// Paragraphs and tables in document order
    pub blocks: Vec<Block>,
    /// Embedded images (placement relative to cells is not resolved)
    #[serde(default)]
    pub images: Vec<ImageRef>,
}

impl DocxDocument {
    /// All top-level tables, in document order.
    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.blocks.iter().filter_map(|b| match b {
            Block::Table(t) => Some(t),
            Block::Paragraph(_) => None,
        })
    }

    /// All free-standing paragraphs outside tables, in document order.
    pub fn paragraphs(&self) -> impl Iterator<Item = &Paragraph> {
        self.blocks.iter().filter_map(|b| match b {
            Block::Paragraph(p) => Some(p),
            Block::Table(_) => None,
        })
    }
}

/// A body-level element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Block {
    /// A paragraph of styled runs
    Paragraph(Paragraph),
    /// A table of rows and cells
    Table(Table),
}

/// Paragraph alignment, when the source specifies one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    /// Left-aligned (the rendering default)
    Left,
    /// Centered
    Center,
    /// Right-aligned
    Right,
    /// Justified
    Justify,
}

/// A paragraph of styled text runs.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Paragraph {
    /// Styled runs in order
    pub runs: Vec<Run>,
    /// Alignment, when specified
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub alignment: Option<Alignment>,
    /// Heading level for title paragraphs (1-based)
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub heading_level: Option<u8>,
}

impl Paragraph {
    /// Plain text of the paragraph: run texts concatenated.
    pub fn text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }

    /// A paragraph holding a single unstyled run; used by tests and the
    /// fallback path.
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            runs: vec![Run {
                text: text.into(),
                style: RunStyle::default(),
            }],
            alignment: None,
            heading_level: None,
        }
    }
}

/// A run: a span of text sharing one style.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Run {
    /// The run text
    pub text: String,
    /// Character style
    #[serde(default)]
    pub style: RunStyle,
}

/// Character-level style attributes of a run.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RunStyle {
    /// Bold
    #[serde(default)]
    pub bold: bool,
    /// Italic
    #[serde(default)]
    pub italic: bool,
    /// Underline
    #[serde(default)]
    pub underline: bool,
    /// Strikethrough
    #[serde(default)]
    pub strike: bool,
    /// Superscript
    #[serde(default)]
    pub superscript: bool,
    /// Subscript
    #[serde(default)]
    pub subscript: bool,
    /// Font family name
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub font: Option<String>,
    /// Font size in points
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub size_pt: Option<f32>,
    /// Font color as RGB or ARGB hex, no leading `#`
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub color: Option<String>,
}

/// A table of rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    /// Rows in order
    pub rows: Vec<TableRow>,
}

/// A table row of cells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableRow {
    /// Cells left to right
    pub cells: Vec<TableCell>,
}

/// A table cell: paragraphs plus optional nested tables.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TableCell {
    /// Paragraphs in the cell
    pub paragraphs: Vec<Paragraph>,
    /// Nested tables in the cell
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub tables: Vec<Table>,
}

impl TableCell {
    /// Plain text of the cell: paragraph texts joined with newlines,
    /// followed by nested-table cell texts.
    pub fn text(&self) -> String {
        let mut parts: Vec<String> = self.paragraphs.iter().map(Paragraph::text).collect();
        for table in &self.tables {
            for row in &table.rows {
                for cell in &row.cells {
                    parts.push(cell.text());
                }
            }
        }
        parts.retain(|p| !p.trim().is_empty());
        parts.join("\n")
    }

    /// A cell holding a single plain paragraph; used by tests.
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            paragraphs: vec![Paragraph::plain(text)],
            tables: Vec::new(),
        }
    }
}

/// An embedded image descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRef {
    /// 1-based index within its container
    pub index: u32,
    /// Image format ("png", "jpeg", ...)
    pub format: String,
    /// Part name inside the container, when known
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub name: Option<String>,
    /// Blob size in bytes, when known
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub size_bytes: Option<u64>,
    /// Sheet anchor, spreadsheets only
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub anchor: Option<ImageAnchor>,
}

/// Anchor position of a spreadsheet image, 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageAnchor {
    /// 1-based anchor row
    pub row: u32,
    /// 1-based anchor column
    pub column: u32,
}

/// A parsed spreadsheet workbook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct XlsxDocument {
    /// Sheets in workbook order
    pub sheets: Vec<Sheet>,
}

/// One worksheet: a dense grid of cells plus the sheet's images.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sheet {
    /// Sheet name
    pub name: String,
    /// Rows top to bottom, cells left to right
    pub rows: Vec<Vec<SheetCell>>,
    /// Images anchored to this sheet
    #[serde(default)]
    pub images: Vec<ImageRef>,
}

/// One spreadsheet cell.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SheetCell {
    /// Rendered cell value; `None` for empty cells
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub value: Option<String>,
    /// Cell style
    #[serde(default)]
    pub style: CellStyle,
}

impl SheetCell {
    /// A cell holding an unstyled value; used by tests.
    pub fn plain(value: impl Into<String>) -> Self {
        Self {
            value: Some(value.into()),
            style: CellStyle::default(),
        }
    }

    /// The cell value, trimmed; empty string when the cell is empty.
    pub fn text(&self) -> &str {
        self.value.as_deref().map(str::trim).unwrap_or("")
    }
}

/// Style attributes of a spreadsheet cell.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CellStyle {
    /// Bold font
    #[serde(default)]
    pub bold: bool,
    /// Italic font
    #[serde(default)]
    pub italic: bool,
    /// Underlined font
    #[serde(default)]
    pub underline: bool,
    /// Font size in points
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub size_pt: Option<f32>,
    /// Font color as RGB or ARGB hex, no leading `#`
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub color: Option<String>,
    /// Fill color as RGB or ARGB hex, no leading `#`
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub fill: Option<String>,
    /// Horizontal alignment keyword
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub align: Option<String>,
    /// Wrap text
    #[serde(default)]
    pub wrap: bool,
}

/// Loads a serialized [`ParsedDocument`] handle from disk.
///
/// The binary container parser runs out of process and emits this JSON;
/// corrupt or unreadable input maps to [`ExtractorError::Parse`].
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonDocumentParser;

impl JsonDocumentParser {
    /// Read and deserialize a parsed-document handle.
    pub fn parse(&self, path: &Path) -> Result<ParsedDocument, ExtractorError> {
        let raw = fs::read_to_string(path)
            .map_err(|e| ExtractorError::Parse(format!("{}: {}", path.display(), e)))?;
        serde_json::from_str(&raw)
            .map_err(|e| ExtractorError::Parse(format!("{}: {}", path.display(), e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paragraph_text_concatenates_runs() {
        let p = Paragraph {
            runs: vec![
                Run {
                    text: "Se corrigió ".to_string(),
                    style: RunStyle::default(),
                },
                Run {
                    text: "el expediente".to_string(),
                    style: RunStyle {
                        bold: true,
                        ..Default::default()
                    },
                },
            ],
            alignment: None,
            heading_level: None,
        };
        assert_eq!(p.text(), "Se corrigió el expediente");
    }

    #[test]
    fn test_cell_text_includes_nested_tables() {
        let cell = TableCell {
            paragraphs: vec![Paragraph::plain("Encabezado")],
            tables: vec![Table {
                rows: vec![TableRow {
                    cells: vec![TableCell::plain("anidada")],
                }],
            }],
        };
        assert_eq!(cell.text(), "Encabezado\nanidada");
    }

    #[test]
    fn test_cell_text_skips_empty_paragraphs() {
        let cell = TableCell {
            paragraphs: vec![
                Paragraph::plain(""),
                Paragraph::plain("contenido"),
                Paragraph::default(),
            ],
            tables: Vec::new(),
        };
        assert_eq!(cell.text(), "contenido");
    }

    #[test]
    fn test_document_roundtrip_json() {
        let doc = ParsedDocument::Xlsx(XlsxDocument {
            sheets: vec![Sheet {
                name: "SA".to_string(),
                rows: vec![vec![SheetCell::plain("Observación"), SheetCell::plain("x")]],
                images: vec![ImageRef {
                    index: 1,
                    format: "png".to_string(),
                    name: None,
                    size_bytes: Some(1024),
                    anchor: Some(ImageAnchor { row: 4, column: 2 }),
                }],
            }],
        });
        let json = serde_json::to_string(&doc).unwrap();
        let back: ParsedDocument = serde_json::from_str(&json).unwrap();
        assert_eq!(doc, back);
        assert_eq!(back.image_count(), 1);
        assert_eq!(back.sheet_names(), vec!["SA".to_string()]);
    }

    #[test]
    fn test_parser_missing_file_is_parse_error() {
        let parser = JsonDocumentParser;
        let err = parser.parse(Path::new("/nonexistent/handle.docx.json"));
        assert!(matches!(err, Err(ExtractorError::Parse(_))));
    }
}
