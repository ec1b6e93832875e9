//! Sentence-aware word-count chunking

use regex::Regex;

use super::Chunk;

/// Chunker that accumulates whole sentences up to a word budget.
///
/// Sentences are never split: a single sentence longer than `chunk_size`
/// is appended in full and only triggers a flush on the next addition.
/// The last `chunk_overlap` words of an emitted chunk seed the next one.
/// `chunk_overlap >= chunk_size` is a caller configuration error and is
/// not validated here.
pub struct PlainChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl PlainChunker {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            chunk_size,
            chunk_overlap,
        }
    }

    /// Chunk raw document text. Empty input produces no chunks.
    pub fn chunk(&self, text: &str, filename: &str) -> Vec<Chunk> {
        let mut chunks: Vec<Chunk> = Vec::new();
        let mut current: Vec<String> = Vec::new();

        for sentence in split_sentences(text) {
            let words: Vec<&str> = sentence.split_whitespace().collect();
            if words.is_empty() {
                continue;
            }

            if !current.is_empty() && current.len() + words.len() > self.chunk_size {
                let idx = chunks.len();
                chunks.push(make_chunk(&current, filename, idx));
                current = self.overlap_tail(&current);
            }

            current.extend(words.iter().map(|w| w.to_string()));
        }

        if !current.is_empty() {
            let idx = chunks.len();
            chunks.push(make_chunk(&current, filename, idx));
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

fn make_chunk(words: &[String], filename: &str, chunk_idx: usize) -> Chunk {
    Chunk {
        text: words.join(" "),
        filename: filename.to_string(),
        chunk_idx,
        heading: None,
        section_path: Vec::new(),
        element_type: None,
    }
}

/// Split text into sentences. A boundary is whitespace following
/// `.`, `!`, or `?`; the punctuation stays with the preceding sentence.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let re = Regex::new(r"[.!?]\s+").unwrap();
    let mut sentences = Vec::new();
    let mut start = 0;

    for m in re.find_iter(text) {
        // keep the punctuation character, drop the trailing whitespace
        sentences.push(&text[start..m.start() + 1]);
        start = m.end();
    }

    if start < text.len() {
        sentences.push(&text[start..]);
    }

    sentences
}
