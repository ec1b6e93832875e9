//! Document loading - the boundary between source files and the index
//!
//! The index consumes either raw text or an ordered element stream; this
//! module supplies both for the supported file types and enumerates the
//! files a docs directory contributes to the index.

mod markdown;

use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::chunker::DocumentElement;

/// Extensions the loader understands. Anything else found by a direct
/// `load_document` call is a fatal error; callers that want other files
/// ignored must pre-filter (which `discover_files` does).
#[cfg(feature = "pdf")]
pub const SUPPORTED_EXTENSIONS: &[&str] = &["txt", "md", "pdf"];
#[cfg(not(feature = "pdf"))]
pub const SUPPORTED_EXTENSIONS: &[&str] = &["txt", "md"];

fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}

pub fn is_supported(path: &Path) -> bool {
    SUPPORTED_EXTENSIONS.contains(&extension_of(path).as_str())
}

/// List supported files in a docs directory, sorted by file name so that
/// repeated builds visit files in a deterministic order.
pub fn discover_files(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read docs directory {}", dir.display()))?;

    let mut files: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file() && is_supported(p))
        .collect();

    files.sort();
    Ok(files)
}

/// Load a document as raw text.
pub fn load_document(path: &Path) -> anyhow::Result<String> {
    match extension_of(path).as_str() {
        "txt" | "md" => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display())),
        #[cfg(feature = "pdf")]
        "pdf" => pdf_extract::extract_text(path)
            .with_context(|| format!("Failed to extract text from {}", path.display())),
        other => anyhow::bail!("Unsupported file type: .{} ({})", other, path.display()),
    }
}

/// Load a document as an ordered stream of structural elements.
///
/// Markdown gets real heading structure; plain text (and extracted PDF
/// text) degrades to headingless paragraphs.
pub fn load_document_structured(path: &Path) -> anyhow::Result<Vec<DocumentElement>> {
    match extension_of(path).as_str() {
        "md" => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            Ok(markdown::parse_elements(&text))
        }
        "txt" => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            Ok(markdown::parse_plain_elements(&text))
        }
        #[cfg(feature = "pdf")]
        "pdf" => {
            let text = pdf_extract::extract_text(path)
                .with_context(|| format!("Failed to extract text from {}", path.display()))?;
            Ok(markdown::parse_plain_elements(&text))
        }
        other => anyhow::bail!("Unsupported file type: .{} ({})", other, path.display()),
    }
}
