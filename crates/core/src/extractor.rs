use crate::error::IngestError;
use lopdf::Document;
use std::fs;
use std::path::Path;
use tracing::warn;

/// File extensions the extractor recognizes without fallback.
pub const SUPPORTED_EXTENSIONS: [&str; 3] = ["txt", "md", "pdf"];

/// Extract the raw text of a document. Plain-text formats are read
/// directly; PDFs go through page extraction. Unrecognized extensions are
/// an `UnsupportedFormat` error so the caller can decide whether to fall
/// back to plain text.
pub fn extract_text(path: &Path) -> Result<String, IngestError> {
    let extension = path
        .extension()
        .and_then(|extension| extension.to_str())
        .map(|extension| extension.to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "txt" | "md" => Ok(fs::read_to_string(path)?),
        "pdf" => extract_pdf_text(path),
        _ => Err(IngestError::UnsupportedFormat {
            extension,
            path: path.display().to_string(),
        }),
    }
}

/// Like `extract_text`, but degrades to a lossy plain-text read when the
/// extension is unrecognized.
pub fn extract_text_or_plain(path: &Path) -> Result<String, IngestError> {
    match extract_text(path) {
        Err(IngestError::UnsupportedFormat { extension, .. }) => {
            warn!(
                path = %path.display(),
                extension,
                "unrecognised extension, attempting plain-text read"
            );
            Ok(String::from_utf8_lossy(&fs::read(path)?).into_owned())
        }
        other => other,
    }
}

fn extract_pdf_text(path: &Path) -> Result<String, IngestError> {
    let document =
        Document::load(path).map_err(|error| IngestError::PdfParse(error.to_string()))?;

    let mut pages = Vec::new();
    for (page_number, _page_id) in document.get_pages() {
        let text = document
            .extract_text(&[page_number])
            .map_err(|error| IngestError::PdfParse(error.to_string()))?;

        if !text.trim().is_empty() {
            pages.push(text.trim().to_string());
        }
    }

    Ok(pages.join("\n\n"))
}
