//! Hybrid index store - the aggregate owning chunks, embeddings, manifest
//! and the lexical model
//!
//! The chunk list, the embedding matrix and the BM25 model are three
//! parallel views of the same ordered chunk sequence and are mutated
//! together as one unit per build/reindex call. A failure partway (for
//! example an embedder error) leaves the previously persisted index on
//! disk untouched; the in-memory instance must then be discarded and
//! reloaded.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Serialize;
use tracing::info;

use crate::chunker::{Chunk, PlainChunker, StructuredChunker};
use crate::embedding::EmbeddingProvider;
use crate::loader;

use super::bm25::Bm25;
use super::fusion::{rrf_fuse, RRF_K};
use super::manifest::{self, FileDiff, Manifest, ManifestEntry};
use super::matrix::EmbeddingMatrix;

pub const MANIFEST_FILE: &str = "manifest.json";
pub const CHUNKS_FILE: &str = "chunks.json";
pub const EMBEDDINGS_FILE: &str = "embeddings.bin";

/// Chunking configuration for an index.
#[derive(Debug, Clone)]
pub struct IndexOptions {
    /// Maximum words per chunk.
    pub chunk_size: usize,
    /// Trailing words repeated at the start of the next chunk.
    pub chunk_overlap: usize,
    /// Use the structure-aware chunker (heading metadata on chunks).
    pub structured: bool,
}

impl Default for IndexOptions {
    fn default() -> Self {
        Self {
            chunk_size: 400,
            chunk_overlap: 50,
            structured: false,
        }
    }
}

/// One search result, resolved back to its chunk.
#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    pub text: String,
    pub filename: String,
    pub chunk_idx: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heading: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub section_path: Vec<String>,
    pub score: f32,
}

/// The retrieval index over one docs directory.
pub struct HybridIndex {
    index_dir: PathBuf,
    options: IndexOptions,
    chunks: Vec<Chunk>,
    embeddings: EmbeddingMatrix,
    manifest: Manifest,
    bm25: Bm25,
}

impl HybridIndex {
    /// Create an empty in-memory index bound to an index directory.
    pub fn new(index_dir: impl Into<PathBuf>, options: IndexOptions) -> Self {
        Self {
            index_dir: index_dir.into(),
            options,
            chunks: Vec::new(),
            embeddings: EmbeddingMatrix::new(),
            manifest: Manifest::new(),
            bm25: Bm25::new(),
        }
    }

    /// Load a persisted index. A missing manifest means "no index yet"
    /// and yields an empty instance; a manifest without its sibling
    /// artifacts is a fatal inconsistency. The lexical model is always
    /// refit from the restored chunk texts.
    pub fn load(index_dir: impl Into<PathBuf>, options: IndexOptions) -> anyhow::Result<Self> {
        let mut index = Self::new(index_dir, options);

        let manifest_path = index.index_dir.join(MANIFEST_FILE);
        if !manifest_path.exists() {
            return Ok(index);
        }

        let manifest_json = std::fs::read_to_string(&manifest_path)
            .with_context(|| format!("Failed to read {}", manifest_path.display()))?;
        index.manifest = serde_json::from_str(&manifest_json)
            .with_context(|| format!("Failed to parse {}", manifest_path.display()))?;

        let chunks_path = index.index_dir.join(CHUNKS_FILE);
        let chunks_json = std::fs::read_to_string(&chunks_path).with_context(|| {
            format!(
                "Index is inconsistent: {} exists but {} is missing",
                MANIFEST_FILE, CHUNKS_FILE
            )
        })?;
        index.chunks = serde_json::from_str(&chunks_json)
            .with_context(|| format!("Failed to parse {}", chunks_path.display()))?;

        if !index.chunks.is_empty() {
            let embeddings_path = index.index_dir.join(EMBEDDINGS_FILE);
            index.embeddings = EmbeddingMatrix::load(&embeddings_path, index.chunks.len())
                .with_context(|| {
                    format!(
                        "Index is inconsistent: failed to load {}",
                        embeddings_path.display()
                    )
                })?;
        }

        index.refit_bm25();
        info!(
            "Loaded index: {} chunks from {} documents",
            index.chunks.len(),
            index.manifest.len()
        );
        Ok(index)
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Full rebuild: discard everything, chunk every supported file,
    /// embed the complete chunk set, refit the lexical model, persist.
    pub async fn build(
        &mut self,
        docs_dir: &Path,
        embedder: &EmbeddingProvider,
    ) -> anyhow::Result<()> {
        let hashes = manifest::compute_file_hashes(docs_dir)?;

        self.chunks.clear();
        self.manifest.clear();
        self.embeddings.clear();

        for (filename, hash) in &hashes {
            let file_chunks = self.chunk_file(docs_dir, filename)?;
            let chunk_start = self.chunks.len();
            self.chunks.extend(file_chunks);
            self.manifest.insert(
                filename.clone(),
                ManifestEntry {
                    hash: hash.clone(),
                    chunk_start,
                    chunk_end: self.chunks.len(),
                },
            );
        }

        info!(
            "Chunked {} documents into {} chunks",
            self.manifest.len(),
            self.chunks.len()
        );

        let texts: Vec<&str> = self.chunks.iter().map(|c| c.text.as_str()).collect();
        for vector in embedder.embed(&texts).await? {
            self.embeddings.push_row(&vector)?;
        }

        self.refit_bm25();
        self.save()
    }

    /// Pure staleness query: diff the on-disk files against the manifest
    /// without mutating anything.
    pub fn needs_reindex(&self, docs_dir: &Path) -> anyhow::Result<(bool, FileDiff)> {
        let current = manifest::compute_file_hashes(docs_dir)?;
        let diff = manifest::diff(&self.manifest, &current);
        Ok((!diff.is_empty(), diff))
    }

    /// Incremental update. Chunks of changed and removed files are
    /// dropped together with their embedding rows; changed and added
    /// files are re-chunked and re-embedded at the end of the sequence;
    /// the lexical model is refit over everything and all manifest
    /// ranges are recomputed. A no-op when nothing changed.
    pub async fn reindex(
        &mut self,
        docs_dir: &Path,
        embedder: &EmbeddingProvider,
    ) -> anyhow::Result<()> {
        let current = manifest::compute_file_hashes(docs_dir)?;
        let diff = manifest::diff(&self.manifest, &current);
        if diff.is_empty() {
            info!("Index is already up to date");
            return Ok(());
        }

        info!(
            "Reindexing: {} added, {} changed, {} removed",
            diff.added.len(),
            diff.changed.len(),
            diff.removed.len()
        );

        let doomed: Vec<&str> = diff
            .changed
            .iter()
            .chain(diff.removed.iter())
            .map(|s| s.as_str())
            .collect();

        if !doomed.is_empty() {
            let keep: Vec<bool> = self
                .chunks
                .iter()
                .map(|c| !doomed.contains(&c.filename.as_str()))
                .collect();

            self.embeddings.retain_rows(&keep);
            let mut pos = 0;
            self.chunks.retain(|_| {
                let flag = keep[pos];
                pos += 1;
                flag
            });
            for filename in &doomed {
                self.manifest.remove(*filename);
            }
        }

        let mut incoming: Vec<&String> = diff.added.iter().chain(diff.changed.iter()).collect();
        incoming.sort();

        let mut new_texts: Vec<String> = Vec::new();
        for filename in incoming {
            let file_chunks = self.chunk_file(docs_dir, filename)?;
            let chunk_start = self.chunks.len();
            new_texts.extend(file_chunks.iter().map(|c| c.text.clone()));
            self.chunks.extend(file_chunks);
            self.manifest.insert(
                filename.clone(),
                ManifestEntry {
                    hash: current[filename].clone(),
                    chunk_start,
                    chunk_end: self.chunks.len(),
                },
            );
        }

        if !new_texts.is_empty() {
            let refs: Vec<&str> = new_texts.iter().map(|s| s.as_str()).collect();
            for vector in embedder.embed(&refs).await? {
                self.embeddings.push_row(&vector)?;
            }
        }

        self.refit_bm25();
        self.rebuild_manifest_ranges();
        self.save()?;

        info!("Index updated: {} chunks total", self.chunks.len());
        Ok(())
    }

    /// Hybrid top-k search: cosine ranking over the embedding matrix and
    /// BM25 over chunk texts, fused with RRF.
    pub async fn search(
        &self,
        query: &str,
        top_k: usize,
        embedder: &EmbeddingProvider,
    ) -> anyhow::Result<Vec<SearchHit>> {
        if self.chunks.is_empty() {
            return Ok(Vec::new());
        }

        let query_vectors = embedder.embed(&[query]).await?;
        let query_vector = query_vectors
            .first()
            .ok_or_else(|| anyhow::anyhow!("Embedder returned no vector for the query"))?;

        let mut semantic: Vec<(usize, f32)> = self
            .embeddings
            .cosine_scores(query_vector)
            .into_iter()
            .enumerate()
            .collect();
        semantic.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        semantic.truncate(top_k * 2);

        let lexical = self.bm25.search(query, top_k * 2);

        let fused = rrf_fuse(&[semantic, lexical], RRF_K);

        Ok(fused
            .into_iter()
            .take(top_k)
            .map(|(pos, score)| self.hit(pos, score))
            .collect())
    }

    /// Resolve a chunk position to a result record.
    pub fn hit(&self, pos: usize, score: f32) -> SearchHit {
        let chunk = &self.chunks[pos];
        SearchHit {
            text: chunk.text.clone(),
            filename: chunk.filename.clone(),
            chunk_idx: chunk.chunk_idx,
            heading: chunk.heading.clone(),
            section_path: chunk.section_path.clone(),
            score,
        }
    }

    /// Persist manifest, chunks and embeddings as one unit.
    pub fn save(&self) -> anyhow::Result<()> {
        std::fs::create_dir_all(&self.index_dir)
            .with_context(|| format!("Failed to create {}", self.index_dir.display()))?;

        let manifest_json = serde_json::to_string_pretty(&self.manifest)?;
        std::fs::write(self.index_dir.join(MANIFEST_FILE), manifest_json)?;

        let chunks_json = serde_json::to_string_pretty(&self.chunks)?;
        std::fs::write(self.index_dir.join(CHUNKS_FILE), chunks_json)?;

        let embeddings_path = self.index_dir.join(EMBEDDINGS_FILE);
        if self.chunks.is_empty() {
            if embeddings_path.exists() {
                std::fs::remove_file(&embeddings_path)?;
            }
        } else {
            self.embeddings.save(&embeddings_path)?;
        }

        Ok(())
    }

    fn chunk_file(&self, docs_dir: &Path, filename: &str) -> anyhow::Result<Vec<Chunk>> {
        let path = docs_dir.join(filename);

        if self.options.structured {
            let elements = loader::load_document_structured(&path)?;
            let chunker =
                StructuredChunker::new(self.options.chunk_size, self.options.chunk_overlap);
            Ok(chunker.chunk(&elements, filename))
        } else {
            let text = loader::load_document(&path)?;
            let chunker = PlainChunker::new(self.options.chunk_size, self.options.chunk_overlap);
            Ok(chunker.chunk(&text, filename))
        }
    }

    fn refit_bm25(&mut self) {
        let texts: Vec<&str> = self.chunks.iter().map(|c| c.text.as_str()).collect();
        self.bm25.fit(&texts);
    }

    /// Recompute every file's `[chunk_start, chunk_end)` by scanning the
    /// final chunk sequence once. Required after structural mutation:
    /// removals shift the positions of every file after them.
    fn rebuild_manifest_ranges(&mut self) {
        for entry in self.manifest.values_mut() {
            entry.chunk_start = 0;
            entry.chunk_end = 0;
        }

        let mut seen_start: std::collections::BTreeMap<&str, (usize, usize)> = Default::default();
        for (pos, chunk) in self.chunks.iter().enumerate() {
            seen_start
                .entry(chunk.filename.as_str())
                .and_modify(|(_, end)| *end = pos + 1)
                .or_insert((pos, pos + 1));
        }

        let ranges: Vec<(String, usize, usize)> = seen_start
            .into_iter()
            .map(|(name, (start, end))| (name.to_string(), start, end))
            .collect();
        for (name, start, end) in ranges {
            if let Some(entry) = self.manifest.get_mut(&name) {
                entry.chunk_start = start;
                entry.chunk_end = end;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::embedding::{EmbeddingMode, EmbeddingProvider};

    fn simulated() -> EmbeddingProvider {
        EmbeddingProvider::new(
            "simulated".to_string(),
            EmbeddingMode::Simulated { dimensions: 16 },
        )
        .unwrap()
    }

    fn write_docs(dir: &Path, docs: &[(&str, &str)]) {
        for (name, text) in docs {
            std::fs::write(dir.join(name), text).unwrap();
        }
    }

    async fn built_index(docs_dir: &Path, index_dir: &Path) -> HybridIndex {
        let mut index = HybridIndex::new(index_dir, IndexOptions::default());
        index.build(docs_dir, &simulated()).await.unwrap();
        index
    }

    fn artifact_bytes(index_dir: &Path) -> (Vec<u8>, Vec<u8>, Vec<u8>) {
        (
            std::fs::read(index_dir.join(MANIFEST_FILE)).unwrap(),
            std::fs::read(index_dir.join(CHUNKS_FILE)).unwrap(),
            std::fs::read(index_dir.join(EMBEDDINGS_FILE)).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_build_and_search() {
        let docs = tempfile::tempdir().unwrap();
        let idx = tempfile::tempdir().unwrap();
        write_docs(
            docs.path(),
            &[
                ("cats.txt", "Cats purr loudly. Cats nap all day."),
                ("dogs.txt", "Dogs bark at strangers. Dogs fetch sticks."),
            ],
        );

        let index = built_index(docs.path(), idx.path()).await;
        assert!(!index.is_empty());

        let hits = index.search("dogs bark", 5, &simulated()).await.unwrap();
        assert!(!hits.is_empty());
        assert_eq!(hits[0].filename, "dogs.txt");
    }

    #[tokio::test]
    async fn test_search_on_empty_index() {
        let idx = tempfile::tempdir().unwrap();
        let index = HybridIndex::new(idx.path(), IndexOptions::default());
        let hits = index.search("anything", 5, &simulated()).await.unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn test_load_missing_index_is_empty() {
        let idx = tempfile::tempdir().unwrap();
        let index = HybridIndex::load(idx.path().join("nope"), IndexOptions::default()).unwrap();
        assert!(index.is_empty());
        assert!(index.manifest().is_empty());
    }

    #[tokio::test]
    async fn test_reindex_noop_is_byte_identical() {
        let docs = tempfile::tempdir().unwrap();
        let idx = tempfile::tempdir().unwrap();
        write_docs(docs.path(), &[("a.txt", "Alpha beta gamma. Delta epsilon.")]);

        let mut index = built_index(docs.path(), idx.path()).await;
        index.reindex(docs.path(), &simulated()).await.unwrap();
        let first = artifact_bytes(idx.path());

        index.reindex(docs.path(), &simulated()).await.unwrap();
        let second = artifact_bytes(idx.path());

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_reindex_after_removal_leaves_contiguous_ranges() {
        let docs = tempfile::tempdir().unwrap();
        let idx = tempfile::tempdir().unwrap();
        write_docs(
            docs.path(),
            &[
                ("a.txt", "First file one. First file two. First file three."),
                ("b.txt", "Second file here. More second file text."),
                ("c.txt", "Third file content. Even more third file."),
            ],
        );

        let mut index = built_index(docs.path(), idx.path()).await;
        std::fs::remove_file(docs.path().join("b.txt")).unwrap();
        index.reindex(docs.path(), &simulated()).await.unwrap();

        assert!(index.chunks().iter().all(|c| c.filename != "b.txt"));
        assert!(!index.manifest().contains_key("b.txt"));

        // Manifest ranges form a contiguous, gap-free partition of the
        // chunk sequence.
        let mut ranges: Vec<(usize, usize)> = index
            .manifest()
            .values()
            .map(|e| (e.chunk_start, e.chunk_end))
            .collect();
        ranges.sort();
        let mut expected_start = 0;
        for (start, end) in ranges {
            assert_eq!(start, expected_start);
            assert!(end >= start);
            expected_start = end;
        }
        assert_eq!(expected_start, index.len());

        // Every range matches its file's actual chunks.
        for (name, entry) in index.manifest() {
            for pos in entry.chunk_start..entry.chunk_end {
                assert_eq!(&index.chunks()[pos].filename, name);
            }
        }
    }

    #[tokio::test]
    async fn test_reindex_preserves_untouched_chunks() {
        let docs = tempfile::tempdir().unwrap();
        let idx = tempfile::tempdir().unwrap();
        write_docs(
            docs.path(),
            &[
                ("keep.txt", "Stable text stays the same."),
                ("edit.txt", "Original wording here."),
            ],
        );

        let mut index = built_index(docs.path(), idx.path()).await;
        let kept_before: Vec<Chunk> = index
            .chunks()
            .iter()
            .filter(|c| c.filename == "keep.txt")
            .cloned()
            .collect();

        write_docs(docs.path(), &[("edit.txt", "Completely new wording now.")]);
        index.reindex(docs.path(), &simulated()).await.unwrap();

        let kept_after: Vec<Chunk> = index
            .chunks()
            .iter()
            .filter(|c| c.filename == "keep.txt")
            .cloned()
            .collect();
        assert_eq!(kept_before, kept_after);
        assert!(index
            .chunks()
            .iter()
            .any(|c| c.text.contains("new wording")));
    }

    #[tokio::test]
    async fn test_change_detection_classifies_edit_as_changed() {
        let docs = tempfile::tempdir().unwrap();
        let idx = tempfile::tempdir().unwrap();
        write_docs(docs.path(), &[("a.txt", "Some original content here.")]);

        let index = built_index(docs.path(), idx.path()).await;
        let (needs, diff) = index.needs_reindex(docs.path()).unwrap();
        assert!(!needs);
        assert!(diff.is_empty());

        write_docs(docs.path(), &[("a.txt", "Some original content herf.")]);
        let (needs, diff) = index.needs_reindex(docs.path()).unwrap();
        assert!(needs);
        assert_eq!(diff.changed, vec!["a.txt"]);
        assert!(diff.added.is_empty());
        assert!(diff.removed.is_empty());
    }

    #[tokio::test]
    async fn test_save_load_round_trip_preserves_search() {
        let docs = tempfile::tempdir().unwrap();
        let idx = tempfile::tempdir().unwrap();
        write_docs(
            docs.path(),
            &[
                ("a.txt", "Ramen recipes need broth. Broth takes hours."),
                ("b.txt", "Quick salads need no cooking at all."),
            ],
        );

        let index = built_index(docs.path(), idx.path()).await;
        let before = index.search("broth recipes", 5, &simulated()).await.unwrap();

        let reloaded = HybridIndex::load(idx.path(), IndexOptions::default()).unwrap();
        let after = reloaded
            .search("broth recipes", 5, &simulated())
            .await
            .unwrap();

        assert_eq!(before.len(), after.len());
        for (b, a) in before.iter().zip(after.iter()) {
            assert_eq!(b.filename, a.filename);
            assert_eq!(b.chunk_idx, a.chunk_idx);
            assert_eq!(b.text, a.text);
            assert!((b.score - a.score).abs() < 1e-6);
        }
    }

    #[tokio::test]
    async fn test_structured_build_tags_headings() {
        let docs = tempfile::tempdir().unwrap();
        let idx = tempfile::tempdir().unwrap();
        write_docs(
            docs.path(),
            &[(
                "doc.md",
                "# Delivery\n\nGoods ship within five days.\n\n# Billing\n\nInvoices are due monthly.\n",
            )],
        );

        let options = IndexOptions {
            structured: true,
            ..IndexOptions::default()
        };
        let mut index = HybridIndex::new(idx.path(), options);
        index.build(docs.path(), &simulated()).await.unwrap();

        assert_eq!(index.len(), 2);
        assert_eq!(index.chunks()[0].heading.as_deref(), Some("Delivery"));
        assert_eq!(index.chunks()[1].heading.as_deref(), Some("Billing"));
    }

    #[tokio::test]
    async fn test_reindex_to_empty_removes_embeddings_file() {
        let docs = tempfile::tempdir().unwrap();
        let idx = tempfile::tempdir().unwrap();
        write_docs(docs.path(), &[("only.txt", "Lone content here.")]);

        let mut index = built_index(docs.path(), idx.path()).await;
        assert!(idx.path().join(EMBEDDINGS_FILE).exists());

        std::fs::remove_file(docs.path().join("only.txt")).unwrap();
        index.reindex(docs.path(), &simulated()).await.unwrap();

        assert!(index.is_empty());
        assert!(!idx.path().join(EMBEDDINGS_FILE).exists());

        let reloaded = HybridIndex::load(idx.path(), IndexOptions::default()).unwrap();
        assert!(reloaded.is_empty());
    }
}
