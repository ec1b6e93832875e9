//! Structure-aware chunking over typed document elements

use super::{Chunk, DocumentElement, ElementType};

/// Chunker that walks a stream of typed elements and tags every chunk with
/// the heading context active when its first word was accumulated.
///
/// Headings never become chunks of their own: they flush any pending
/// accumulation and update the active context. A change of active heading
/// also forces a flush, so a chunk never spans two headings. Within one
/// heading, body elements accumulate exactly like the plain chunker.
pub struct StructuredChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

/// Context captured for the chunk currently being accumulated.
#[derive(Clone)]
struct ChunkTag {
    heading: String,
    section_path: Vec<String>,
    element_type: ElementType,
}

impl Default for ChunkTag {
    fn default() -> Self {
        Self {
            heading: String::new(),
            section_path: Vec::new(),
            element_type: ElementType::Paragraph,
        }
    }
}

impl StructuredChunker {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            chunk_size,
            chunk_overlap,
        }
    }

    pub fn chunk(&self, elements: &[DocumentElement], filename: &str) -> Vec<Chunk> {
        let mut chunks: Vec<Chunk> = Vec::new();
        let mut current: Vec<String> = Vec::new();

        // Context that applies to body text encountered next.
        let mut heading = String::new();
        let mut section_path: Vec<String> = Vec::new();
        // Context captured when the current chunk's first word arrived.
        let mut tag = ChunkTag::default();

        for elem in elements {
            if elem.element_type == ElementType::Heading {
                if !current.is_empty() {
                    let idx = chunks.len();
                    chunks.push(make_chunk(&current, filename, idx, &tag));
                    current.clear();
                }
                heading = elem.text.clone();
                section_path = elem.section_path.clone();
                continue;
            }

            let words: Vec<&str> = elem.text.split_whitespace().collect();
            if words.is_empty() {
                continue;
            }

            // Body elements may carry their own heading context (e.g. when
            // the loader interleaves sections); a change flushes without
            // overlap so no chunk spans two headings.
            if elem.heading != heading {
                if !current.is_empty() {
                    let idx = chunks.len();
                    chunks.push(make_chunk(&current, filename, idx, &tag));
                    current.clear();
                }
                heading = elem.heading.clone();
                section_path = elem.section_path.clone();
            }

            if !current.is_empty() && current.len() + words.len() > self.chunk_size {
                let idx = chunks.len();
                chunks.push(make_chunk(&current, filename, idx, &tag));
                current = self.overlap_tail(&current);
                // Overlap words stay under the same heading; the seeded
                // chunk takes the incoming element's type.
                tag = ChunkTag {
                    heading: heading.clone(),
                    section_path: section_path.clone(),
                    element_type: elem.element_type,
                };
            }

            if current.is_empty() {
                tag = ChunkTag {
                    heading: heading.clone(),
                    section_path: section_path.clone(),
                    element_type: elem.element_type,
                };
            }

            current.extend(words.iter().map(|w| w.to_string()));
        }

        if !current.is_empty() {
            let idx = chunks.len();
            chunks.push(make_chunk(&current, filename, idx, &tag));
        }

        chunks
    }

    fn overlap_tail(&self, words: &[String]) -> Vec<String> {
        if self.chunk_overlap == 0 {
            return Vec::new();
        }
        let start = words.len().saturating_sub(self.chunk_overlap);
        words[start..].to_vec()
    }
}

fn make_chunk(words: &[String], filename: &str, chunk_idx: usize, tag: &ChunkTag) -> Chunk {
    Chunk {
        text: words.join(" "),
        filename: filename.to_string(),
        chunk_idx,
        heading: if tag.heading.is_empty() {
            None
        } else {
            Some(tag.heading.clone())
        },
        section_path: tag.section_path.clone(),
        element_type: Some(tag.element_type),
    }
}
