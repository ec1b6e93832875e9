//! Chunking module - splitting document text into retrievable passages
//!
//! Provides plain sentence-aware chunking and structure-aware chunking that
//! preserves heading metadata.

mod plain;
mod structured;

pub use plain::PlainChunker;
pub use structured::StructuredChunker;

use serde::{Deserialize, Serialize};

/// A retrievable unit of text from one source document.
///
/// `chunk_idx` is 0-based and monotonically increasing within a single
/// filename; it restarts at 0 every time that file is (re)chunked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
    pub filename: String,
    pub chunk_idx: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heading: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub section_path: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element_type: Option<ElementType>,
}

/// Structural role of a document element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementType {
    Heading,
    Paragraph,
    ListItem,
}

/// One structural element produced by the document loader.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentElement {
    pub text: String,
    /// Nearest heading above this element (empty before the first heading).
    pub heading: String,
    /// 1 for a top-level heading, 0 for body text before any heading.
    pub heading_level: usize,
    /// Ordered ancestor-heading chain, outermost first.
    pub section_path: Vec<String>,
    pub element_type: ElementType,
}
