//! Document Text Extractor — converts uploaded PDF/DOC/DOCX binaries into
//! plain text. Extraction is best-effort: a single unreadable resume is
//! skipped and reported, it never aborts the whole batch.

pub mod contact;

use thiserror::Error;

/// Minimum number of readable characters for a legacy DOC salvage to count
/// as meaningful text.
const MIN_DOC_TEXT_LEN: usize = 20;

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("could not read document: {0}")]
    Unreadable(String),

    #[error("document contained no extractable text")]
    Empty,
}

/// The three document formats the analyzer accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Doc,
    Docx,
}

impl DocumentKind {
    /// Resolves the format of an uploaded file from its declared content
    /// type, falling back to the filename extension when the multipart part
    /// carries no content type. Returns `None` for unsupported formats.
    pub fn from_upload(filename: &str, content_type: Option<&str>) -> Option<Self> {
        match content_type {
            Some("application/pdf") => return Some(Self::Pdf),
            Some("application/msword") => return Some(Self::Doc),
            Some("application/vnd.openxmlformats-officedocument.wordprocessingml.document") => {
                return Some(Self::Docx)
            }
            // Browsers sometimes send application/octet-stream; decide by extension
            Some("application/octet-stream") | None => {}
            Some(_) => return None,
        }
        let lower = filename.to_lowercase();
        if lower.ends_with(".pdf") {
            Some(Self::Pdf)
        } else if lower.ends_with(".docx") {
            Some(Self::Docx)
        } else if lower.ends_with(".doc") {
            Some(Self::Doc)
        } else {
            None
        }
    }
}

/// Extracts UTF-8 text from a document of a known format.
pub fn extract_text(data: &[u8], kind: DocumentKind) -> Result<String, ExtractionError> {
    let text = match kind {
        DocumentKind::Pdf => extract_pdf(data)?,
        DocumentKind::Docx => extract_docx(data)?,
        DocumentKind::Doc => extract_doc(data)?,
    };
    if text.trim().is_empty() {
        return Err(ExtractionError::Empty);
    }
    Ok(text)
}

fn extract_pdf(data: &[u8]) -> Result<String, ExtractionError> {
    pdf_extract::extract_text_from_mem(data)
        .map_err(|e| ExtractionError::Unreadable(e.to_string()))
}

fn extract_docx(data: &[u8]) -> Result<String, ExtractionError> {
    let docx = docx_rs::read_docx(data).map_err(|e| ExtractionError::Unreadable(e.to_string()))?;

    let mut text = String::new();
    for child in docx.document.children {
        if let docx_rs::DocumentChild::Paragraph(paragraph) = child {
            for para_child in paragraph.children {
                if let docx_rs::ParagraphChild::Run(run) = para_child {
                    for run_child in run.children {
                        if let docx_rs::RunChild::Text(t) = run_child {
                            text.push_str(&t.text);
                        }
                    }
                }
            }
            text.push('\n');
        }
    }
    Ok(text)
}

/// Legacy .doc files are an undocumented binary format. Salvage whatever
/// printable runs exist instead of refusing the file outright.
fn extract_doc(data: &[u8]) -> Result<String, ExtractionError> {
    let raw = String::from_utf8_lossy(data);
    let mut text = String::with_capacity(raw.len());
    let mut last_was_space = false;
    for c in raw.chars() {
        if c == '\n' || (' '..='~').contains(&c) {
            let is_space = c.is_whitespace();
            if !(is_space && last_was_space) {
                text.push(if is_space { ' ' } else { c });
            }
            last_was_space = is_space;
        } else if !last_was_space {
            text.push(' ');
            last_was_space = true;
        }
    }
    let text = text.trim().to_string();
    if text.len() < MIN_DOC_TEXT_LEN {
        return Err(ExtractionError::Unreadable(
            "legacy DOC yielded too little readable text".to_string(),
        ));
    }
    Ok(text)
}
