//! Styled-content → HTML rendering
//!
//! One renderer for every place the pipeline needs markup: captured table
//! cells, spreadsheet cells, and the document excerpt handed to the
//! fallback extractor. All text content is escaped; colors are emitted as
//! 6-digit hex with the alpha channel of ARGB values stripped.

use crate::document::{
    Alignment, Block, DocxDocument, Paragraph, Run, Sheet, SheetCell, Table, TableCell,
};

/// Escape text for inclusion in HTML content or attribute values.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Reduce an ARGB hex color to RGB by dropping the alpha byte.
///
/// Spreadsheet themes encode colors as 8-digit ARGB (`FF2E74B5`); CSS
/// wants 6 digits. Anything that is not an 8-digit hex string passes
/// through unchanged.
pub fn strip_alpha(color: &str) -> &str {
    if color.len() == 8 && color.chars().all(|c| c.is_ascii_hexdigit()) {
        &color[2..]
    } else {
        color
    }
}

fn run_html(run: &Run) -> String {
    let mut html = escape(&run.text);
    if html.trim().is_empty() {
        return html;
    }
    let s = &run.style;
    let mut css = Vec::new();
    if let Some(color) = &s.color {
        css.push(format!("color:#{}", strip_alpha(color)));
    }
    if let Some(font) = &s.font {
        css.push(format!("font-family:'{}'", escape(font)));
    }
    if let Some(size) = s.size_pt {
        css.push(format!("font-size:{}pt", size));
    }
    if !css.is_empty() {
        html = format!("<span style=\"{}\">{}</span>", css.join(";"), html);
    }
    if s.subscript {
        html = format!("<sub>{}</sub>", html);
    }
    if s.superscript {
        html = format!("<sup>{}</sup>", html);
    }
    if s.strike {
        html = format!("<s>{}</s>", html);
    }
    if s.underline {
        html = format!("<u>{}</u>", html);
    }
    if s.italic {
        html = format!("<em>{}</em>", html);
    }
    if s.bold {
        html = format!("<strong>{}</strong>", html);
    }
    html
}

/// Render a paragraph as `<p>` (or `<h1>`..`<h6>` for headings) with its
/// alignment carried as an inline style.
pub fn paragraph_html(paragraph: &Paragraph) -> String {
    let body: String = paragraph.runs.iter().map(run_html).collect();
    if body.trim().is_empty() {
        return String::new();
    }
    let tag = match paragraph.heading_level {
        Some(level @ 1..=6) => format!("h{}", level),
        _ => "p".to_string(),
    };
    let style = match paragraph.alignment {
        Some(Alignment::Center) => " style=\"text-align:center\"",
        Some(Alignment::Right) => " style=\"text-align:right\"",
        Some(Alignment::Justify) => " style=\"text-align:justify\"",
        Some(Alignment::Left) | None => "",
    };
    format!("<{}{}>{}</{}>", tag, style, body, tag)
}

/// Render a table cell: its paragraphs followed by any nested tables.
pub fn cell_html(cell: &TableCell) -> String {
    let mut out = String::new();
    for paragraph in &cell.paragraphs {
        out.push_str(&paragraph_html(paragraph));
    }
    for table in &cell.tables {
        out.push_str(&table_html(table));
    }
    out
}

/// Render a table, recursing into nested tables.
pub fn table_html(table: &Table) -> String {
    let mut out = String::from("<table border=\"1\">");
    for row in &table.rows {
        out.push_str("<tr>");
        for cell in &row.cells {
            out.push_str("<td>");
            out.push_str(&cell_html(cell));
            out.push_str("</td>");
        }
        out.push_str("</tr>");
    }
    out.push_str("</table>");
    out
}

/// Render a spreadsheet cell as a styled paragraph.
pub fn sheet_cell_html(cell: &SheetCell) -> String {
    let text = cell.text();
    if text.is_empty() {
        return String::new();
    }
    let mut html = escape(text);
    let s = &cell.style;
    let mut css = Vec::new();
    if s.bold {
        css.push("font-weight:bold".to_string());
    }
    if s.italic {
        css.push("font-style:italic".to_string());
    }
    if s.underline {
        css.push("text-decoration:underline".to_string());
    }
    if let Some(size) = s.size_pt {
        css.push(format!("font-size:{}pt", size));
    }
    if let Some(color) = &s.color {
        css.push(format!("color:#{}", strip_alpha(color)));
    }
    if let Some(fill) = &s.fill {
        css.push(format!("background-color:#{}", strip_alpha(fill)));
    }
    if !css.is_empty() {
        html = format!("<span style=\"{}\">{}</span>", css.join(";"), html);
    }
    format!("<p>{}</p>", html)
}

/// Wrap plain text in a minimal paragraph. Used for fallback-extracted
/// content, which arrives without styling.
pub fn plain_html(text: &str) -> String {
    format!("<p>{}</p>", escape(text))
}

/// Render a full word-processor document body, in block order.
pub fn docx_html(doc: &DocxDocument) -> String {
    let mut out = String::new();
    for block in &doc.blocks {
        match block {
            Block::Paragraph(p) => out.push_str(&paragraph_html(p)),
            Block::Table(t) => out.push_str(&table_html(t)),
        }
    }
    out
}

/// Render one worksheet as a table of its non-empty rows.
pub fn sheet_html(sheet: &Sheet) -> String {
    let mut out = String::from("<table border=\"1\">");
    for row in &sheet.rows {
        if row.iter().all(|c| c.text().is_empty()) {
            continue;
        }
        out.push_str("<tr>");
        for cell in row {
            out.push_str("<td>");
            out.push_str(&escape(cell.text()));
            out.push_str("</td>");
        }
        out.push_str("</tr>");
    }
    out.push_str("</table>");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{CellStyle, RunStyle, TableRow};

    #[test]
    fn test_escape_special_characters() {
        assert_eq!(escape("a < b & c > \"d\""), "a &lt; b &amp; c &gt; &quot;d&quot;");
    }

    #[test]
    fn test_strip_alpha_argb() {
        assert_eq!(strip_alpha("FF2E74B5"), "2E74B5");
        assert_eq!(strip_alpha("2E74B5"), "2E74B5");
        assert_eq!(strip_alpha("red"), "red");
    }

    #[test]
    fn test_bold_run() {
        let p = Paragraph {
            runs: vec![Run {
                text: "Observación".to_string(),
                style: RunStyle {
                    bold: true,
                    ..Default::default()
                },
            }],
            alignment: None,
            heading_level: None,
        };
        assert_eq!(paragraph_html(&p), "<p><strong>Observación</strong></p>");
    }

    #[test]
    fn test_colored_run_strips_alpha() {
        let p = Paragraph {
            runs: vec![Run {
                text: "x".to_string(),
                style: RunStyle {
                    color: Some("FF2E74B5".to_string()),
                    ..Default::default()
                },
            }],
            alignment: None,
            heading_level: None,
        };
        assert_eq!(
            paragraph_html(&p),
            "<p><span style=\"color:#2E74B5\">x</span></p>"
        );
    }

    #[test]
    fn test_empty_paragraph_renders_nothing() {
        assert_eq!(paragraph_html(&Paragraph::default()), "");
        assert_eq!(paragraph_html(&Paragraph::plain("   ")), "");
    }

    #[test]
    fn test_centered_heading() {
        let p = Paragraph {
            runs: vec![Run {
                text: "Título".to_string(),
                style: RunStyle::default(),
            }],
            alignment: Some(Alignment::Center),
            heading_level: Some(2),
        };
        assert_eq!(
            paragraph_html(&p),
            "<h2 style=\"text-align:center\">Título</h2>"
        );
    }

    #[test]
    fn test_nested_table_renders_recursively() {
        let inner = Table {
            rows: vec![TableRow {
                cells: vec![TableCell::plain("anidada")],
            }],
        };
        let outer = Table {
            rows: vec![TableRow {
                cells: vec![TableCell {
                    paragraphs: vec![Paragraph::plain("exterior")],
                    tables: vec![inner],
                }],
            }],
        };
        let html = table_html(&outer);
        assert!(html.starts_with("<table border=\"1\"><tr><td><p>exterior</p>"));
        assert!(html.contains("<table border=\"1\"><tr><td><p>anidada</p></td></tr></table>"));
    }

    #[test]
    fn test_sheet_cell_with_fill() {
        let cell = SheetCell {
            value: Some("valor".to_string()),
            style: CellStyle {
                bold: true,
                fill: Some("FFFFF2CC".to_string()),
                ..Default::default()
            },
        };
        assert_eq!(
            sheet_cell_html(&cell),
            "<p><span style=\"font-weight:bold;background-color:#FFF2CC\">valor</span></p>"
        );
    }

    #[test]
    fn test_sheet_html_skips_blank_rows() {
        let sheet = Sheet {
            name: "SA".to_string(),
            rows: vec![
                vec![SheetCell::default(), SheetCell::default()],
                vec![SheetCell::plain("a"), SheetCell::plain("b")],
            ],
            images: Vec::new(),
        };
        let html = sheet_html(&sheet);
        assert_eq!(
            html,
            "<table border=\"1\"><tr><td>a</td><td>b</td></tr></table>"
        );
    }
}
