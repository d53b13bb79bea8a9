//! Server-side text extraction for uploaded documents
//!
//! Contract: bytes in, plain text out, typed errors for anything that cannot
//! be extracted. TXT and DOCX are supported; PDF is recognized but rejected.

use std::io::{Cursor, Read};

use quick_xml::events::Event;
use quick_xml::Reader;
use thiserror::Error;

pub const MIME_TXT: &str = "text/plain";
pub const MIME_DOCX: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
pub const MIME_PDF: &str = "application/pdf";

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Invalid file type. Only DOCX and TXT files are allowed.")]
    UnsupportedType,

    #[error("PDF parsing is not available. Please use TXT or DOCX files.")]
    PdfNotSupported,

    #[error("File is not valid UTF-8 text")]
    InvalidUtf8,

    #[error("Could not read DOCX archive: {0}")]
    CorruptDocx(String),
}

/// Document formats recognized by the upload endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    PlainText,
    Docx,
    Pdf,
}

impl DocumentKind {
    pub fn from_mime(mime: &str) -> Option<DocumentKind> {
        match mime {
            MIME_TXT => Some(DocumentKind::PlainText),
            MIME_DOCX => Some(DocumentKind::Docx),
            MIME_PDF => Some(DocumentKind::Pdf),
            _ => None,
        }
    }
}

/// Extract plain text from an uploaded document
pub fn extract_text(kind: DocumentKind, bytes: &[u8]) -> Result<String, ExtractError> {
    match kind {
        DocumentKind::PlainText => {
            String::from_utf8(bytes.to_vec()).map_err(|_| ExtractError::InvalidUtf8)
        }
        DocumentKind::Docx => extract_docx(bytes),
        DocumentKind::Pdf => Err(ExtractError::PdfNotSupported),
    }
}

/// Pull the text runs out of a DOCX file's main document part
///
/// A DOCX is a zip archive; the body lives in word/document.xml as `<w:t>`
/// runs grouped into `<w:p>` paragraphs.
fn extract_docx(bytes: &[u8]) -> Result<String, ExtractError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| ExtractError::CorruptDocx(e.to_string()))?;

    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|e| ExtractError::CorruptDocx(e.to_string()))?
        .read_to_string(&mut xml)
        .map_err(|e| ExtractError::CorruptDocx(e.to_string()))?;

    let mut reader = Reader::from_str(&xml);
    let mut out = String::new();
    let mut in_text_run = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) if e.local_name().as_ref() == b"t" => in_text_run = true,
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"t" => in_text_run = false,
                b"p" => out.push('\n'),
                _ => {}
            },
            Ok(Event::Empty(e)) if e.local_name().as_ref() == b"br" => out.push('\n'),
            Ok(Event::Text(t)) if in_text_run => {
                let text = t.unescape().map_err(|e| ExtractError::CorruptDocx(e.to_string()))?;
                out.push_str(&text);
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(ExtractError::CorruptDocx(e.to_string())),
            _ => {}
        }
    }

    Ok(out)
}

/// Word/character/line/paragraph counts for an extracted document
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct DocumentStats {
    pub words: usize,
    pub characters: usize,
    pub lines: usize,
    pub paragraphs: usize,
}

/// Compute display statistics for extracted text
pub fn document_stats(text: &str) -> DocumentStats {
    let words = text.split_whitespace().count();
    let characters = text.chars().count();
    let lines = text.lines().count();

    // Paragraphs are runs of non-blank lines
    let mut paragraphs = 0;
    let mut in_paragraph = false;
    for line in text.lines() {
        if line.trim().is_empty() {
            in_paragraph = false;
        } else if !in_paragraph {
            paragraphs += 1;
            in_paragraph = true;
        }
    }

    DocumentStats { words, characters, lines, paragraphs }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn docx_with_body(document_xml: &str) -> Vec<u8> {
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = zip::ZipWriter::new(&mut cursor);
            let options = zip::write::SimpleFileOptions::default();
            writer.start_file("word/document.xml", options).unwrap();
            writer.write_all(document_xml.as_bytes()).unwrap();
            writer.finish().unwrap();
        }
        cursor.into_inner()
    }

    #[test]
    fn plain_text_passes_through() {
        let text = extract_text(DocumentKind::PlainText, "hello world\n".as_bytes()).unwrap();
        assert_eq!(text, "hello world\n");
    }

    #[test]
    fn invalid_utf8_is_rejected() {
        let err = extract_text(DocumentKind::PlainText, &[0xff, 0xfe, 0x00]).unwrap_err();
        assert!(matches!(err, ExtractError::InvalidUtf8));
    }

    #[test]
    fn pdf_is_recognized_but_rejected() {
        assert_eq!(DocumentKind::from_mime(MIME_PDF), Some(DocumentKind::Pdf));
        let err = extract_text(DocumentKind::Pdf, b"%PDF-1.4").unwrap_err();
        assert!(matches!(err, ExtractError::PdfNotSupported));
    }

    #[test]
    fn unknown_mime_does_not_resolve() {
        assert_eq!(DocumentKind::from_mime("image/png"), None);
    }

    #[test]
    fn docx_paragraphs_become_lines() {
        let xml = r#"<?xml version="1.0"?>
            <w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
              <w:body>
                <w:p><w:r><w:t>First paragraph.</w:t></w:r></w:p>
                <w:p><w:r><w:t>Second </w:t></w:r><w:r><w:t>paragraph.</w:t></w:r></w:p>
              </w:body>
            </w:document>"#;

        let text = extract_text(DocumentKind::Docx, &docx_with_body(xml)).unwrap();
        assert_eq!(text, "First paragraph.\nSecond paragraph.\n");
    }

    #[test]
    fn truncated_docx_is_a_typed_error() {
        let err = extract_text(DocumentKind::Docx, b"PK\x03\x04broken").unwrap_err();
        assert!(matches!(err, ExtractError::CorruptDocx(_)));
    }

    #[test]
    fn stats_count_words_lines_and_paragraphs() {
        let text = "Alpha beta gamma.\nSecond line here.\n\nNew paragraph.";
        let stats = document_stats(text);
        assert_eq!(stats.words, 8);
        assert_eq!(stats.lines, 4);
        assert_eq!(stats.paragraphs, 2);
        assert_eq!(stats.characters, text.chars().count());
    }

    #[test]
    fn stats_of_empty_text_are_zero() {
        let stats = document_stats("");
        assert_eq!(stats, DocumentStats { words: 0, characters: 0, lines: 0, paragraphs: 0 });
    }
}
