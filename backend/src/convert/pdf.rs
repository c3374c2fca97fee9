//! PDF export: the dataset as a table of bordered cells.
//!
//! Generates the PDF structure directly, in memory, with the standard
//! Helvetica fonts (no font files, no temporary files). Geometry is in
//! millimetres and converted to points when written:
//!
//! - A4 portrait, widened when the columns need more room
//! - 10 mm left/top margin, automatic page break 15 mm above the bottom edge
//! - 40 mm × 10 mm cells, 10 pt text, bold header repeated on every page

use super::row_window;
use crate::models::Dataset;
use crate::render::fit_text;

/// Points per millimetre.
const PT_PER_MM: f64 = 72.0 / 25.4;

const PAGE_WIDTH_MM: f64 = 210.0;
const PAGE_HEIGHT_MM: f64 = 297.0;
const MARGIN_MM: f64 = 10.0;
const PAGE_BREAK_MARGIN_MM: f64 = 15.0;

pub const CELL_WIDTH_MM: f64 = 40.0;
pub const CELL_HEIGHT_MM: f64 = 10.0;
pub const FONT_SIZE_PT: f64 = 10.0;

/// Inner horizontal padding of a cell.
const CELL_PADDING_MM: f64 = 1.0;

/// Average Helvetica advance, as a fraction of the font size.
const AVG_CHAR_WIDTH_EM: f64 = 0.55;

/// A rendered PDF and what it contains.
#[derive(Debug, Clone)]
pub struct PdfTable {
    pub bytes: Vec<u8>,
    pub pages: usize,
    pub rows_rendered: usize,
    pub truncated: bool,
}

/// Render the header and up to `limit` rows (all rows if `None`).
pub fn to_pdf(dataset: &Dataset, limit: Option<usize>) -> PdfTable {
    let (rows, truncated) = row_window(dataset.row_count(), limit);
    let headers: Vec<String> = dataset.column_names().into_iter().map(String::from).collect();

    let page_width = PAGE_WIDTH_MM.max(2.0 * MARGIN_MM + headers.len() as f64 * CELL_WIDTH_MM);
    let bottom = PAGE_HEIGHT_MM - PAGE_BREAK_MARGIN_MM;

    let mut pages: Vec<Vec<u8>> = Vec::new();
    let mut page = TablePage::new();
    let mut y = page.header(&headers, MARGIN_MM);

    for row in dataset.rows().take(rows) {
        if y + CELL_HEIGHT_MM > bottom {
            pages.push(page.finish());
            page = TablePage::new();
            y = page.header(&headers, MARGIN_MM);
        }
        let cells: Vec<String> = row.iter().map(|c| c.to_string()).collect();
        page.row(&cells, y, Font::Regular);
        y += CELL_HEIGHT_MM;
    }
    pages.push(page.finish());

    let page_count = pages.len();
    let mut builder = PdfBuilder::new(page_width * PT_PER_MM, PAGE_HEIGHT_MM * PT_PER_MM);
    for content in pages {
        builder.add_page(content);
    }

    PdfTable {
        bytes: builder.build("Data Sweeper export"),
        pages: page_count,
        rows_rendered: rows,
        truncated,
    }
}

#[derive(Clone, Copy)]
enum Font {
    Bold,
    Regular,
}

impl Font {
    fn resource(&self) -> &'static str {
        match self {
            Font::Bold => "/F1",
            Font::Regular => "/F2",
        }
    }
}

/// Content stream of one page, built top-down in millimetres.
struct TablePage {
    content: Vec<u8>,
}

impl TablePage {
    fn new() -> Self {
        let mut content = Vec::new();
        content.extend_from_slice(b"0.2 w\n0 0 0 RG\n0 0 0 rg\n");
        Self { content }
    }

    /// Draw the header row at `y`; returns the y of the next row.
    fn header(&mut self, headers: &[String], y: f64) -> f64 {
        self.row(headers, y, Font::Bold);
        y + CELL_HEIGHT_MM
    }

    fn row(&mut self, cells: &[String], y: f64, font: Font) {
        let max_chars = ((CELL_WIDTH_MM - 2.0 * CELL_PADDING_MM) * PT_PER_MM
            / (FONT_SIZE_PT * AVG_CHAR_WIDTH_EM)) as usize;

        for (i, text) in cells.iter().enumerate() {
            let x = MARGIN_MM + i as f64 * CELL_WIDTH_MM;

            // Border
            self.content.extend_from_slice(
                format!(
                    "{:.2} {:.2} {:.2} {:.2} re S\n",
                    x * PT_PER_MM,
                    (PAGE_HEIGHT_MM - y - CELL_HEIGHT_MM) * PT_PER_MM,
                    CELL_WIDTH_MM * PT_PER_MM,
                    CELL_HEIGHT_MM * PT_PER_MM
                )
                .as_bytes(),
            );

            if text.is_empty() {
                continue;
            }

            // Baseline sits 0.3 em below the vertical centre of the cell.
            let baseline = y + 0.5 * CELL_HEIGHT_MM + 0.3 * FONT_SIZE_PT / PT_PER_MM;
            self.content.extend_from_slice(
                format!(
                    "BT\n{} {:.0} Tf\n{:.2} {:.2} Td\n(",
                    font.resource(),
                    FONT_SIZE_PT,
                    (x + CELL_PADDING_MM) * PT_PER_MM,
                    (PAGE_HEIGHT_MM - baseline) * PT_PER_MM
                )
                .as_bytes(),
            );
            self.content.extend_from_slice(&pdf_text(&fit_text(text, max_chars)));
            self.content.extend_from_slice(b") Tj\nET\n");
        }
    }

    fn finish(self) -> Vec<u8> {
        self.content
    }
}

/// Encode text for a WinAnsi Helvetica string literal: characters outside
/// Windows-1252 become `?`, and `\`, `(`, `)` are escaped.
fn pdf_text(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len());
    let mut buf = [0u8; 4];
    for ch in text.chars() {
        let ch = if ch.is_control() { ' ' } else { ch };
        let (encoded, _, had_errors) = encoding_rs::WINDOWS_1252.encode(ch.encode_utf8(&mut buf));
        let byte = if had_errors || encoded.len() != 1 {
            b'?'
        } else {
            encoded[0]
        };
        if matches!(byte, b'\\' | b'(' | b')') {
            out.push(b'\\');
        }
        out.push(byte);
    }
    out
}

/// Minimal PDF file builder. Constructs valid PDF 1.4 files with any
/// number of pages sharing one size and the two Helvetica fonts.
struct PdfBuilder {
    width_pt: f64,
    height_pt: f64,
    pages: Vec<Vec<u8>>,
}

impl PdfBuilder {
    fn new(width_pt: f64, height_pt: f64) -> Self {
        Self {
            width_pt,
            height_pt,
            pages: Vec::new(),
        }
    }

    fn add_page(&mut self, content: Vec<u8>) {
        self.pages.push(content);
    }

    /// Build the complete PDF file as bytes.
    ///
    /// Object layout: 1 catalog, 2 page tree, 3-4 fonts, 5 info, then a
    /// page object and its content stream for every page.
    fn build(&self, title: &str) -> Vec<u8> {
        let page_obj = |i: usize| 6 + 2 * i;
        let kids: Vec<String> = (0..self.pages.len())
            .map(|i| format!("{} 0 R", page_obj(i)))
            .collect();

        let mut objects: Vec<Vec<u8>> = vec![
            b"<< /Type /Catalog /Pages 2 0 R >>".to_vec(),
            format!(
                "<< /Type /Pages /Kids [{}] /Count {} >>",
                kids.join(" "),
                self.pages.len()
            )
            .into_bytes(),
            b"<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica-Bold /Encoding /WinAnsiEncoding >>"
                .to_vec(),
            b"<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>"
                .to_vec(),
            {
                let mut info = b"<< /Title (".to_vec();
                info.extend_from_slice(&pdf_text(title));
                info.extend_from_slice(b") /Producer (Data Sweeper) >>");
                info
            },
        ];

        for (i, content) in self.pages.iter().enumerate() {
            objects.push(
                format!(
                    "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {:.2} {:.2}] \
                     /Contents {} 0 R /Resources << /Font << /F1 3 0 R /F2 4 0 R >> >> >>",
                    self.width_pt,
                    self.height_pt,
                    page_obj(i) + 1
                )
                .into_bytes(),
            );
            let mut stream = format!("<< /Length {} >>\nstream\n", content.len()).into_bytes();
            stream.extend_from_slice(content);
            stream.extend_from_slice(b"\nendstream");
            objects.push(stream);
        }

        let mut pdf: Vec<u8> = b"%PDF-1.4\n".to_vec();
        let mut offsets = Vec::with_capacity(objects.len());
        for (i, body) in objects.iter().enumerate() {
            offsets.push(pdf.len());
            pdf.extend_from_slice(format!("{} 0 obj\n", i + 1).as_bytes());
            pdf.extend_from_slice(body);
            pdf.extend_from_slice(b"\nendobj\n");
        }

        // Cross-reference table
        let xref_offset = pdf.len();
        let num_objects = offsets.len() + 1; // +1 for free entry
        pdf.extend_from_slice(format!("xref\n0 {}\n", num_objects).as_bytes());
        pdf.extend_from_slice(b"0000000000 65535 f \n");
        for offset in &offsets {
            pdf.extend_from_slice(format!("{:010} 00000 n \n", offset).as_bytes());
        }

        // Trailer
        pdf.extend_from_slice(
            format!(
                "trailer\n<< /Size {} /Root 1 0 R /Info 5 0 R >>\nstartxref\n{}\n%%EOF\n",
                num_objects, xref_offset
            )
            .as_bytes(),
        );

        pdf
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Cell;

    fn table(columns: usize, rows: usize) -> Dataset {
        Dataset::from_rows(
            (0..columns).map(|c| format!("col{}", c)).collect(),
            (0..rows)
                .map(|r| (0..columns).map(|c| Cell::Int((r * columns + c) as i64)).collect())
                .collect(),
        )
        .unwrap()
    }

    fn text(pdf: &PdfTable) -> String {
        String::from_utf8_lossy(&pdf.bytes).into_owned()
    }

    #[test]
    fn test_basic_structure() {
        let pdf = to_pdf(&table(3, 2), None);
        let content = text(&pdf);
        assert!(pdf.bytes.starts_with(b"%PDF-1.4"));
        assert!(content.ends_with("%%EOF\n"));
        assert!(content.contains("/Helvetica-Bold"));
        assert!(content.contains("(col2) Tj"));
        assert!(content.contains("/F1 10 Tf"));
        assert_eq!(pdf.pages, 1);
        assert_eq!(pdf.rows_rendered, 2);
    }

    #[test]
    fn test_automatic_page_break() {
        // 26 data rows fit under the header on each A4 page.
        let pdf = to_pdf(&table(2, 60), None);
        assert_eq!(pdf.pages, 3);
        assert!(text(&pdf).contains("/Count 3"));
        // Header repeated on every page.
        assert_eq!(text(&pdf).matches("(col0) Tj").count(), 3);
    }

    #[test]
    fn test_row_limit() {
        let pdf = to_pdf(&table(2, 60), Some(20));
        assert_eq!(pdf.pages, 1);
        assert_eq!(pdf.rows_rendered, 20);
        assert!(pdf.truncated);
    }

    #[test]
    fn test_wide_tables_widen_the_page() {
        let narrow = text(&to_pdf(&table(4, 1), None));
        assert!(narrow.contains("/MediaBox [0 0 595.28 841.89]"));

        // 8 columns need 10 + 8 × 40 + 10 = 340 mm.
        let wide = text(&to_pdf(&table(8, 1), None));
        assert!(wide.contains("/MediaBox [0 0 963.78 841.89]"));
    }

    #[test]
    fn test_xref_offsets_point_at_objects() {
        let pdf = to_pdf(&table(2, 3), None);
        let content = text(&pdf);
        let xref_at: usize = content
            .rsplit("startxref\n")
            .next()
            .and_then(|tail| tail.lines().next())
            .and_then(|n| n.parse().ok())
            .unwrap();
        assert!(content[xref_at..].starts_with("xref"));

        let first_entry = content[xref_at..].lines().nth(3).unwrap();
        let offset: usize = first_entry[..10].parse().unwrap();
        assert!(content[offset..].starts_with("1 0 obj"));
    }

    #[test]
    fn test_pdf_text_escaping_and_encoding() {
        assert_eq!(pdf_text("(a)\\"), b"\\(a\\)\\\\".to_vec());
        assert_eq!(pdf_text("é"), vec![0xE9]);
        assert_eq!(pdf_text("€"), vec![0x80]);
        assert_eq!(pdf_text("日"), b"?".to_vec());
    }

    #[test]
    fn test_long_text_is_shortened() {
        let ds = Dataset::from_rows(
            vec!["note".into()],
            vec![vec![Cell::Text("x".repeat(100))]],
        )
        .unwrap();
        let content = text(&to_pdf(&ds, None));
        assert!(!content.contains(&"x".repeat(40)));
        assert!(content.contains(".."));
    }

    #[test]
    fn test_empty_cells_have_border_but_no_text() {
        let ds = Dataset::from_rows(vec!["a".into()], vec![vec![Cell::Null]]).unwrap();
        let content = text(&to_pdf(&ds, None));
        assert_eq!(content.matches("re S").count(), 2);
        assert_eq!(content.matches(" Tj").count(), 1);
    }
}
