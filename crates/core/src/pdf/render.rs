use super::{Align, Block, Column, Layout};
use crate::{HisError, HisResult};
use printpdf::{BuiltinFont, Mm, PdfDocument};
use std::io::BufWriter;

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN: f32 = 15.0;
const CONTENT_WIDTH: f32 = PAGE_WIDTH - 2.0 * MARGIN;
const FOOTER_Y: f32 = 8.0;
/// Lowest baseline body text may use.
const BOTTOM: f32 = MARGIN + 5.0;
const PT_TO_MM: f32 = 0.3528;
/// Average Helvetica glyph width as a fraction of the font size.
const GLYPH_WIDTH: f32 = 0.5;
const FIELD_LABEL_WIDTH: f32 = 28.0;

/// One positioned line of text. Coordinates are millimetres from the bottom left.
#[derive(Debug, Clone, PartialEq)]
pub struct Run {
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub size: f32,
    pub bold: bool,
}

pub type Page = Vec<Run>;

fn text_width(text: &str, size: f32) -> f32 {
    text.chars().count() as f32 * size * GLYPH_WIDTH * PT_TO_MM
}

fn line_height(size: f32) -> f32 {
    size * PT_TO_MM * 1.4
}

/// Greedy word wrap to roughly `width` millimetres. Words longer than a line are split.
fn wrap(text: &str, width: f32, size: f32) -> Vec<String> {
    let max_chars = ((width / (size * GLYPH_WIDTH * PT_TO_MM)).floor() as usize).max(1);
    let mut lines = Vec::new();
    for paragraph in text.lines() {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            let mut word: Vec<char> = word.chars().collect();
            while word.len() > max_chars {
                if !current.is_empty() {
                    lines.push(std::mem::take(&mut current));
                }
                lines.push(word.drain(..max_chars).collect());
            }
            let word: String = word.into_iter().collect();
            let needed = current.chars().count() + word.chars().count() + usize::from(!current.is_empty());
            if needed > max_chars && !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(&word);
        }
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

struct Composer {
    pages: Vec<Page>,
    y: f32,
}

impl Composer {
    fn new() -> Self {
        Self {
            pages: vec![Vec::new()],
            y: PAGE_HEIGHT - MARGIN,
        }
    }

    fn new_page(&mut self) {
        self.pages.push(Vec::new());
        self.y = PAGE_HEIGHT - MARGIN;
    }

    /// Moves to a new page unless `height` more millimetres fit on this one.
    fn reserve(&mut self, height: f32) {
        if self.y - height < BOTTOM && !self.current().is_empty() {
            self.new_page();
        }
    }

    fn current(&mut self) -> &mut Page {
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }

    fn put(&mut self, text: impl Into<String>, x: f32, size: f32, bold: bool) {
        let y = self.y;
        self.current().push(Run {
            text: text.into(),
            x,
            y,
            size,
            bold,
        });
    }

    fn centred(&mut self, text: &str, size: f32, bold: bool) {
        for line in wrap(text, CONTENT_WIDTH, size) {
            let height = line_height(size);
            self.reserve(height);
            self.y -= height;
            let x = MARGIN + ((CONTENT_WIDTH - text_width(&line, size)) / 2.0).max(0.0);
            self.put(line, x, size, bold);
        }
    }

    fn paragraph(&mut self, text: &str, size: f32, bold: bool) {
        for line in wrap(text, CONTENT_WIDTH, size) {
            let height = line_height(size);
            self.reserve(height);
            self.y -= height;
            self.put(line, MARGIN, size, bold);
        }
    }

    fn fields(&mut self, pairs: &[(String, String)]) {
        const SIZE: f32 = 9.5;
        let column = CONTENT_WIDTH / 2.0;
        for row in pairs.chunks(2) {
            let wrapped: Vec<Vec<String>> = row
                .iter()
                .map(|(_, value)| wrap(value, column - FIELD_LABEL_WIDTH - 2.0, SIZE))
                .collect();
            let lines = wrapped.iter().map(Vec::len).max().unwrap_or(1);
            let height = line_height(SIZE) * lines as f32;
            self.reserve(height);
            let top = self.y;
            for (i, ((label, _), value_lines)) in row.iter().zip(&wrapped).enumerate() {
                let x = MARGIN + column * i as f32;
                self.y = top - line_height(SIZE);
                self.put(format!("{label}:"), x, SIZE, true);
                for line in value_lines {
                    self.put(line.clone(), x + FIELD_LABEL_WIDTH, SIZE, false);
                    self.y -= line_height(SIZE);
                }
            }
            self.y = top - height;
        }
    }

    fn table_row(&mut self, columns: &[Column], cells: &[String], size: f32, bold: bool) {
        let wrapped: Vec<Vec<String>> = columns
            .iter()
            .zip(cells.iter().chain(std::iter::repeat(&String::new())))
            .map(|(column, cell)| wrap(cell, column.width * CONTENT_WIDTH - 2.0, size))
            .collect();
        let lines = wrapped.iter().map(Vec::len).max().unwrap_or(1);
        let top = self.y;
        let mut x = MARGIN;
        for (column, cell_lines) in columns.iter().zip(&wrapped) {
            let width = column.width * CONTENT_WIDTH;
            self.y = top;
            for line in cell_lines {
                self.y -= line_height(size);
                let at = match column.align {
                    Align::Left => x,
                    Align::Right => x + (width - 2.0 - text_width(line, size)).max(0.0),
                };
                self.put(line.clone(), at, size, bold);
            }
            x += width;
        }
        self.y = top - line_height(size) * lines as f32;
    }

    fn table(&mut self, columns: &[Column], rows: &[Vec<String>]) {
        const SIZE: f32 = 9.0;
        let header: Vec<String> = columns.iter().map(|c| c.header.clone()).collect();
        self.reserve(line_height(SIZE) * 2.0);
        self.table_row(columns, &header, SIZE, true);
        for row in rows {
            let lines = columns
                .iter()
                .zip(row)
                .map(|(c, cell)| wrap(cell, c.width * CONTENT_WIDTH - 2.0, SIZE).len())
                .max()
                .unwrap_or(1);
            let height = line_height(SIZE) * lines as f32;
            if self.y - height < BOTTOM {
                self.new_page();
                self.table_row(columns, &header, SIZE, true);
            }
            self.table_row(columns, row, SIZE, false);
        }
    }
}

/// Lay `layout` out on pages without producing PDF bytes.
pub fn compose(layout: &Layout) -> Vec<Page> {
    let mut composer = Composer::new();
    for block in &layout.blocks {
        match block {
            Block::Title(text) => composer.centred(text, 16.0, true),
            Block::Subtitle(text) => {
                composer.y -= 1.0;
                composer.centred(text, 12.0, true);
                composer.y -= 2.0;
            }
            Block::Fields(pairs) => composer.fields(pairs),
            Block::Heading(text) => {
                composer.reserve(line_height(11.0) * 2.0 + 3.0);
                composer.y -= 3.0;
                composer.paragraph(text, 11.0, true);
            }
            Block::Table { columns, rows } => composer.table(columns, rows),
            Block::Paragraph(text) => composer.paragraph(text, 10.0, false),
            Block::Spacer => composer.y -= 4.0,
        }
    }
    composer.pages
}

/// Render `layout` as an A4 PDF.
///
/// # Errors
///
/// Returns `HisError::Pdf` if a font cannot be registered or the document cannot be written.
pub fn render(layout: &Layout) -> HisResult<Vec<u8>> {
    let pages = compose(layout);
    let total = pages.len();

    let (doc, first_page, first_layer) =
        PdfDocument::new(&layout.document_title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
    let font = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| HisError::Pdf(format!("font error: {e}")))?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| HisError::Pdf(format!("font error: {e}")))?;

    for (index, runs) in pages.iter().enumerate() {
        let (page, layer) = if index == 0 {
            (first_page, first_layer)
        } else {
            doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), format!("Layer {}", index + 1))
        };
        let layer = doc.get_page(page).get_layer(layer);
        for run in runs {
            let face = if run.bold { &bold } else { &font };
            layer.use_text(run.text.as_str(), run.size, Mm(run.x), Mm(run.y), face);
        }

        let numbering = format!("Page {} of {}", index + 1, total);
        let x = PAGE_WIDTH - MARGIN - text_width(&numbering, 8.0);
        layer.use_text(numbering, 8.0, Mm(x), Mm(FOOTER_Y), &font);
        if let Some(footer) = &layout.footer {
            layer.use_text(footer.as_str(), 8.0, Mm(MARGIN), Mm(FOOTER_Y), &font);
        }
    }

    let mut buf = BufWriter::new(Vec::new());
    doc.save(&mut buf)
        .map_err(|e| HisError::Pdf(format!("save error: {e}")))?;
    buf.into_inner()
        .map_err(|e| HisError::Pdf(format!("buffer error: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_respects_width() {
        let text = "Paracetamol 500mg one tablet three times a day after food for five days";
        let lines = wrap(text, 40.0, 10.0);
        assert!(lines.len() > 1);
        let max_chars = (40.0 / (10.0 * GLYPH_WIDTH * PT_TO_MM)).floor() as usize;
        assert!(lines.iter().all(|l| l.chars().count() <= max_chars));
        assert_eq!(lines.join(" "), text);
    }

    #[test]
    fn test_wrap_splits_long_words_and_keeps_blank_lines() {
        let lines = wrap(&"x".repeat(50), 10.0, 10.0);
        assert!(lines.len() > 1);
        assert_eq!(wrap("a\n\nb", 100.0, 10.0), vec!["a", "", "b"]);
    }

    #[test]
    fn test_long_table_paginates_and_repeats_header() {
        let rows: Vec<Vec<String>> = (1..=120)
            .map(|i| vec![format!("Service {i}"), format!("{i}.00")])
            .collect();
        let layout = Layout::new("Bill")
            .title("City Hospital")
            .table(vec![Column::left("Service", 0.7), Column::right("Amount", 0.3)], rows);
        let pages = compose(&layout);
        assert!(pages.len() >= 2);
        for page in &pages {
            assert!(page.iter().all(|run| run.y >= BOTTOM - 0.01));
        }
        let header_on_second = pages[1]
            .iter()
            .any(|run| run.bold && run.text == "Service");
        assert!(header_on_second, "table header should repeat on the next page");
    }

    #[test]
    fn test_right_aligned_cells_end_at_column_edge() {
        let layout = Layout::new("Bill").table(
            vec![Column::left("Item", 0.5), Column::right("Amount", 0.5)],
            vec![vec!["Consultation".into(), "500.00".into()]],
        );
        let pages = compose(&layout);
        let amount = pages[0]
            .iter()
            .find(|run| run.text == "500.00")
            .expect("amount should be placed");
        let right_edge = amount.x + text_width("500.00", 9.0);
        assert!((right_edge - (PAGE_WIDTH - MARGIN - 2.0)).abs() < 0.01);
    }

    #[test]
    fn test_render_produces_pdf() {
        let layout = Layout::new("Test")
            .title("City Hospital")
            .subtitle("OPD Bill")
            .fields(vec![("Bill No".into(), "OPD-00001".into())])
            .paragraph("Thank you.")
            .footer("Computer generated");
        let bytes = render(&layout).expect("render should succeed");
        assert!(bytes.starts_with(b"%PDF"));
    }
}
