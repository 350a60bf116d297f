//! Plain text → PDF
//!
//! Lays text out on A4 pages with 20 mm margins using printpdf ops.
//! Paragraphs are separated by blank lines, single newlines are hard breaks,
//! and everything else wraps at the content width. Pages are added as the
//! cursor runs into the bottom margin.

use std::path::Path;

use printpdf::{
    BuiltinFont, FontId, Mm, Op, ParsedFont, PdfDocument, PdfPage, PdfSaveOptions, Point, Pt,
    TextItem,
};
use tracing::debug;

use crate::fonts::{load_font, ResolvedFont};

const PAGE_W: Mm = Mm(210.0);
const PAGE_H: Mm = Mm(297.0);

/// Margin on all four sides, in mm.
const MARGIN: f32 = 20.0;

/// Body text size and baseline-to-baseline distance, in pt.
pub const FONT_SIZE: f32 = 12.0;
pub const LEADING: f32 = 15.0;

/// Vertical space after every paragraph, in pt.
pub const PARAGRAPH_GAP: f32 = 6.0;

const PT_PER_MM: f32 = 72.0 / 25.4;

/// Width available for a line of text, in pt.
pub fn content_width() -> f32 {
    (PAGE_W.0 - 2.0 * MARGIN) * PT_PER_MM
}

/// Render `text` with the font at `font` (if it loads) or the builtin face.
pub fn render_text(text: &str, font: Option<&Path>) -> Vec<u8> {
    let resolved = load_font(font);
    render_with_font(text, resolved)
}

/// Render `text` with an already resolved font.
pub fn render_with_font(text: &str, font: ResolvedFont) -> Vec<u8> {
    let mut doc = PdfDocument::new("Converted document");

    let (face, widths) = match &font {
        ResolvedFont::Embedded { font, .. } => (
            FontFace::External(doc.add_font(&**font)),
            GlyphWidths::Font(&**font),
        ),
        ResolvedFont::Builtin { .. } => (
            FontFace::Builtin(BuiltinFont::Helvetica),
            GlyphWidths::Helvetica,
        ),
    };

    let paragraphs = layout_paragraphs(text, &widths, content_width(), FONT_SIZE);
    let mut builder = PageBuilder::new(face);
    for lines in &paragraphs {
        for line in lines {
            builder.write_line(line);
        }
        builder.skip(PARAGRAPH_GAP);
    }

    let pages = builder.finish();
    debug!(
        "Rendered {} paragraphs onto {} pages",
        paragraphs.len(),
        pages.len()
    );

    let mut warnings = Vec::new();
    doc.with_pages(pages)
        .save(&PdfSaveOptions::default(), &mut warnings)
}

/// Split text into paragraphs on `"\n\n"`.
pub fn split_paragraphs(text: &str) -> Vec<&str> {
    text.split("\n\n").collect()
}

/// Break every paragraph into the lines it will occupy on the page.
///
/// Within a paragraph `"\n"` forces a break; runs of other whitespace collapse
/// to one space and words wrap greedily at `max_width`.
pub fn layout_paragraphs(
    text: &str,
    widths: &GlyphWidths,
    max_width: f32,
    font_size: f32,
) -> Vec<Vec<String>> {
    split_paragraphs(text)
        .into_iter()
        .map(|para| {
            para.split('\n')
                .flat_map(|line| wrap_line(line, widths, max_width, font_size))
                .collect()
        })
        .collect()
}

fn wrap_line(line: &str, widths: &GlyphWidths, max_width: f32, font_size: f32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_w = 0.0;
    let space_w = widths.text_width(" ", font_size);

    for word in line.split_whitespace() {
        let word_w = widths.text_width(word, font_size);

        if word_w > max_width {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
                current_w = 0.0;
            }
            for ch in word.chars() {
                let ch_w = widths.advance(ch) * font_size;
                if current_w + ch_w > max_width && !current.is_empty() {
                    lines.push(std::mem::take(&mut current));
                    current_w = 0.0;
                }
                current.push(ch);
                current_w += ch_w;
            }
            continue;
        }

        let needed = if current.is_empty() {
            word_w
        } else {
            current_w + space_w + word_w
        };
        if needed > max_width && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
            current_w = 0.0;
        }
        if !current.is_empty() {
            current.push(' ');
            current_w += space_w;
        }
        current.push_str(word);
        current_w += word_w;
    }

    // A blank hard line still takes up a line.
    lines.push(current);
    lines
}

/// Horizontal advances used for line breaking, in em.
pub enum GlyphWidths<'a> {
    /// Standard Helvetica metrics for the builtin face.
    Helvetica,
    /// Advances read from the embedded font's `hmtx` records.
    Font(&'a ParsedFont),
}

impl GlyphWidths<'_> {
    pub fn advance(&self, c: char) -> f32 {
        match self {
            GlyphWidths::Helvetica => helvetica_advance(c),
            GlyphWidths::Font(font) => {
                let units_per_em = font.font_metrics.units_per_em.max(1) as f32;
                // unmapped characters are drawn with glyph 0
                let glyph = font.lookup_glyph_index(c as u32).unwrap_or(0);
                let advance = match font.get_horizontal_advance(glyph) {
                    0 => font.font_metrics.advance_width_max,
                    advance => advance,
                };
                advance as f32 / units_per_em
            }
        }
    }

    /// Width of `text` set at `font_size`, in pt.
    pub fn text_width(&self, text: &str, font_size: f32) -> f32 {
        text.chars().map(|c| self.advance(c)).sum::<f32>() * font_size
    }
}

/// Helvetica AFM widths for ASCII 0x20..=0x7E, in 1/1000 em.
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // space../
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, // 0..?
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, // @..O
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, // P.._
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, // `..o
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584, // p..~
];

fn helvetica_advance(c: char) -> f32 {
    match c {
        ' '..='~' => HELVETICA_WIDTHS[c as usize - 0x20] as f32 / 1000.0,
        // Nothing outside ASCII is wider than an em in Helvetica.
        _ => 1.0,
    }
}

enum FontFace {
    Builtin(BuiltinFont),
    External(FontId),
}

struct PageBuilder {
    face: FontFace,
    pages: Vec<PdfPage>,
    current_ops: Vec<Op>,
    y_pos: f32, // pt from bottom
}

impl PageBuilder {
    fn new(face: FontFace) -> Self {
        PageBuilder {
            face,
            pages: Vec::new(),
            current_ops: Vec::new(),
            y_pos: Self::top(),
        }
    }

    fn top() -> f32 {
        (PAGE_H.0 - MARGIN) * PT_PER_MM
    }

    fn bottom() -> f32 {
        MARGIN * PT_PER_MM
    }

    fn new_page(&mut self) {
        let ops = std::mem::take(&mut self.current_ops);
        self.pages.push(PdfPage::new(PAGE_W, PAGE_H, ops));
        self.y_pos = Self::top();
    }

    fn write_line(&mut self, text: &str) {
        if self.y_pos - LEADING < Self::bottom() {
            self.new_page();
        }
        self.y_pos -= LEADING;

        if text.is_empty() {
            return;
        }

        let pos = Point {
            x: Pt(MARGIN * PT_PER_MM),
            y: Pt(self.y_pos),
        };
        let items = vec![TextItem::Text(text.to_string())];

        self.current_ops.push(Op::StartTextSection);
        self.current_ops.push(Op::SetTextCursor { pos });
        match &self.face {
            FontFace::Builtin(font) => {
                self.current_ops.push(Op::SetFontSizeBuiltinFont {
                    size: Pt(FONT_SIZE),
                    font: *font,
                });
                self.current_ops.push(Op::WriteTextBuiltinFont { items, font: *font });
            }
            FontFace::External(font) => {
                self.current_ops.push(Op::SetFontSize {
                    size: Pt(FONT_SIZE),
                    font: font.clone(),
                });
                self.current_ops.push(Op::WriteText {
                    items,
                    font: font.clone(),
                });
            }
        }
        self.current_ops.push(Op::EndTextSection);
    }

    /// Vertical gap. Not carried over to the next page.
    fn skip(&mut self, amount: f32) {
        self.y_pos = (self.y_pos - amount).max(Self::bottom());
    }

    fn finish(mut self) -> Vec<PdfPage> {
        if self.pages.is_empty() || !self.current_ops.is_empty() {
            self.new_page();
        }
        self.pages
    }
}
