//! DOCX paragraph text
//!
//! A DOCX file is a ZIP archive; the body lives in `word/document.xml`.
//! Only the plain text of top-level body paragraphs is kept:
//! - `w:t` → text
//! - `w:tab` → `\t`
//! - `w:br` / `w:cr` → `\n`
//!
//! Paragraphs inside tables and text boxes, styling, and images are dropped.

use std::io::{Cursor, Read};

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::PdfDeskError;

const DOCUMENT_PART: &str = "word/document.xml";

/// Paragraph texts of a DOCX file, in document order.
pub fn read_paragraphs(bytes: &[u8]) -> Result<Vec<String>, PdfDeskError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| PdfDeskError::Docx(format!("Invalid DOCX ZIP: {}", e)))?;

    let mut entry = archive
        .by_name(DOCUMENT_PART)
        .map_err(|e| PdfDeskError::Docx(format!("Missing {}: {}", DOCUMENT_PART, e)))?;

    let mut xml = String::new();
    entry
        .read_to_string(&mut xml)
        .map_err(|e| PdfDeskError::Docx(format!("Cannot read {}: {}", DOCUMENT_PART, e)))?;

    parse_paragraphs(&xml)
}

/// Paragraph texts joined by a blank line, ready for the text renderer.
pub fn docx_to_text(bytes: &[u8]) -> Result<String, PdfDeskError> {
    Ok(read_paragraphs(bytes)?.join("\n\n"))
}

/// Extract top-level paragraph texts from `word/document.xml` content.
pub fn parse_paragraphs(xml: &str) -> Result<Vec<String>, PdfDeskError> {
    let mut reader = Reader::from_str(xml);
    let mut state = ParagraphState::default();

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                let local = e.local_name();
                state.handle_start(local.as_ref());
            }
            Ok(Event::Empty(ref e)) => {
                let local = e.local_name();
                state.handle_empty(local.as_ref());
            }
            Ok(Event::Text(ref e)) => {
                if state.in_text {
                    let text = e
                        .unescape()
                        .map_err(|e| PdfDeskError::Docx(format!("Bad text node: {}", e)))?;
                    state.push_text(&text);
                }
            }
            Ok(Event::End(ref e)) => {
                let local = e.local_name();
                state.handle_end(local.as_ref());
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(PdfDeskError::Docx(format!(
                    "Malformed document.xml at {}: {}",
                    reader.buffer_position(),
                    e
                )))
            }
            _ => {}
        }
    }

    Ok(state.paragraphs)
}

#[derive(Default)]
struct ParagraphState {
    paragraphs: Vec<String>,
    current: String,
    /// Nesting depth of `w:p` elements.
    para_depth: usize,
    /// Nesting depth of `w:tbl` and `w:txbxContent` containers.
    skip_depth: usize,
    /// Inside `w:pPr` / `w:rPr`, where `w:tab` means a tab stop.
    props_depth: usize,
    in_text: bool,
}

impl ParagraphState {
    fn collecting(&self) -> bool {
        self.para_depth == 1 && self.skip_depth == 0 && self.props_depth == 0
    }

    fn push_text(&mut self, text: &str) {
        if self.collecting() {
            self.current.push_str(text);
        }
    }

    fn handle_start(&mut self, local: &[u8]) {
        match local {
            b"tbl" | b"txbxContent" => self.skip_depth += 1,
            b"pPr" | b"rPr" => self.props_depth += 1,
            b"p" => {
                self.para_depth += 1;
                if self.para_depth == 1 {
                    self.current.clear();
                }
            }
            b"t" => self.in_text = true,
            _ => self.handle_empty(local),
        }
    }

    fn handle_empty(&mut self, local: &[u8]) {
        match local {
            b"tab" => self.push_text("\t"),
            b"br" | b"cr" => self.push_text("\n"),
            // <w:p/> is an empty paragraph
            b"p" if self.para_depth == 0 && self.skip_depth == 0 => {
                self.paragraphs.push(String::new())
            }
            _ => {}
        }
    }

    fn handle_end(&mut self, local: &[u8]) {
        match local {
            b"tbl" | b"txbxContent" => self.skip_depth = self.skip_depth.saturating_sub(1),
            b"pPr" | b"rPr" => self.props_depth = self.props_depth.saturating_sub(1),
            b"p" => {
                if self.collecting() {
                    self.paragraphs.push(std::mem::take(&mut self.current));
                }
                self.para_depth = self.para_depth.saturating_sub(1);
            }
            b"t" => self.in_text = false,
            _ => {}
        }
    }
}
