//! Extensible search strategy registry
//!
//! Each strategy turns a query into a hit list its own way; adding a new
//! strategy means implementing one trait and registering it in
//! `with_builtins`.

use std::collections::BTreeMap;

use async_trait::async_trait;
use regex::Regex;

use crate::chunker::Chunk;
use crate::embedding::EmbeddingProvider;
use crate::index::{HybridIndex, SearchHit};

#[async_trait]
pub trait SearchStrategy: Send + Sync + std::fmt::Debug {
    fn name(&self) -> &'static str;
    fn description(&self) -> &'static str;

    async fn run(
        &self,
        query: &str,
        index: &HybridIndex,
        embedder: &EmbeddingProvider,
        top_k: usize,
    ) -> anyhow::Result<Vec<SearchHit>>;
}

#[derive(Default)]
pub struct StrategyRegistry {
    strategies: BTreeMap<&'static str, Box<dyn SearchStrategy>>,
}

impl StrategyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(Hybrid));
        registry.register(Box::new(Heading));
        registry.register(Box::new(HeadingSemantic));
        registry.register(Box::new(SectionPath));
        registry
    }

    pub fn register(&mut self, strategy: Box<dyn SearchStrategy>) {
        self.strategies.insert(strategy.name(), strategy);
    }

    pub fn get(&self, name: &str) -> anyhow::Result<&dyn SearchStrategy> {
        self.strategies.get(name).map(|s| s.as_ref()).ok_or_else(|| {
            let available = self
                .strategies
                .keys()
                .copied()
                .collect::<Vec<_>>()
                .join(", ");
            anyhow::anyhow!("Unknown strategy '{}'. Available: {}", name, available)
        })
    }

    /// All strategies as (name, description), in name order.
    pub fn list(&self) -> Vec<(&'static str, &'static str)> {
        self.strategies
            .values()
            .map(|s| (s.name(), s.description()))
            .collect()
    }
}

/// Standard BM25 + semantic search with RRF fusion.
#[derive(Debug)]
pub struct Hybrid;

#[async_trait]
impl SearchStrategy for Hybrid {
    fn name(&self) -> &'static str {
        "hybrid"
    }

    fn description(&self) -> &'static str {
        "Standard BM25 + semantic search (RRF fusion)"
    }

    async fn run(
        &self,
        query: &str,
        index: &HybridIndex,
        embedder: &EmbeddingProvider,
        top_k: usize,
    ) -> anyhow::Result<Vec<SearchHit>> {
        index.search(query, top_k, embedder).await
    }
}

/// All chunks whose heading contains the query as a keyword.
#[derive(Debug)]
pub struct Heading;

#[async_trait]
impl SearchStrategy for Heading {
    fn name(&self) -> &'static str {
        "heading"
    }

    fn description(&self) -> &'static str {
        "Chunks under headings matching the query keyword"
    }

    async fn run(
        &self,
        query: &str,
        index: &HybridIndex,
        _embedder: &EmbeddingProvider,
        top_k: usize,
    ) -> anyhow::Result<Vec<SearchHit>> {
        let mut hits = heading_matches(index.chunks(), query)?;
        hits.truncate(top_k);
        Ok(hits)
    }
}

/// Semantic heading match: find headings whose chunks score well in a
/// hybrid search, then return every chunk under those headings.
#[derive(Debug)]
pub struct HeadingSemantic;

#[async_trait]
impl SearchStrategy for HeadingSemantic {
    fn name(&self) -> &'static str {
        "heading-semantic"
    }

    fn description(&self) -> &'static str {
        "Semantic heading match, then all chunks under those headings"
    }

    async fn run(
        &self,
        query: &str,
        index: &HybridIndex,
        embedder: &EmbeddingProvider,
        top_k: usize,
    ) -> anyhow::Result<Vec<SearchHit>> {
        let candidates = index.search(query, top_k * 3, embedder).await?;

        let headings: Vec<&str> = {
            let mut seen: Vec<&str> = Vec::new();
            for hit in &candidates {
                if let Some(h) = hit.heading.as_deref() {
                    if !seen.contains(&h) {
                        seen.push(h);
                    }
                }
            }
            seen
        };

        // Without heading metadata (plain-chunked index) this degrades to
        // a hybrid search.
        if headings.is_empty() {
            let mut hits = candidates;
            hits.truncate(top_k);
            return Ok(hits);
        }

        let mut hits = chunks_under_headings(index.chunks(), &headings);
        hits.truncate(top_k);
        Ok(hits)
    }
}

/// Match the query anywhere in a chunk's section hierarchy.
#[derive(Debug)]
pub struct SectionPath;

#[async_trait]
impl SearchStrategy for SectionPath {
    fn name(&self) -> &'static str {
        "section-path"
    }

    fn description(&self) -> &'static str {
        "Chunks whose section hierarchy matches the query keyword"
    }

    async fn run(
        &self,
        query: &str,
        index: &HybridIndex,
        _embedder: &EmbeddingProvider,
        top_k: usize,
    ) -> anyhow::Result<Vec<SearchHit>> {
        let mut hits = section_path_matches(index.chunks(), query)?;
        hits.truncate(top_k);
        Ok(hits)
    }
}

fn keyword_pattern(query: &str) -> anyhow::Result<Regex> {
    Ok(Regex::new(&format!("(?i){}", regex::escape(query)))?)
}

fn metadata_hit(chunk: &Chunk) -> SearchHit {
    SearchHit {
        text: chunk.text.clone(),
        filename: chunk.filename.clone(),
        chunk_idx: chunk.chunk_idx,
        heading: chunk.heading.clone(),
        section_path: chunk.section_path.clone(),
        score: 1.0,
    }
}

fn sort_by_position(hits: &mut [SearchHit]) {
    hits.sort_by(|a, b| {
        a.filename
            .cmp(&b.filename)
            .then(a.chunk_idx.cmp(&b.chunk_idx))
    });
}

/// Chunks whose heading contains the query, case-insensitively, in
/// document order.
pub fn heading_matches(chunks: &[Chunk], query: &str) -> anyhow::Result<Vec<SearchHit>> {
    let pattern = keyword_pattern(query)?;

    let mut hits: Vec<SearchHit> = chunks
        .iter()
        .filter(|c| c.heading.as_deref().is_some_and(|h| pattern.is_match(h)))
        .map(metadata_hit)
        .collect();

    sort_by_position(&mut hits);
    Ok(hits)
}

/// Chunks whose section hierarchy contains the query at any level.
pub fn section_path_matches(chunks: &[Chunk], query: &str) -> anyhow::Result<Vec<SearchHit>> {
    let pattern = keyword_pattern(query)?;

    let mut hits: Vec<SearchHit> = chunks
        .iter()
        .filter(|c| c.section_path.iter().any(|s| pattern.is_match(s)))
        .map(metadata_hit)
        .collect();

    sort_by_position(&mut hits);
    Ok(hits)
}

/// All chunks filed under any of the given headings, in document order.
pub fn chunks_under_headings(chunks: &[Chunk], headings: &[&str]) -> Vec<SearchHit> {
    let mut hits: Vec<SearchHit> = chunks
        .iter()
        .filter(|c| c.heading.as_deref().is_some_and(|h| headings.contains(&h)))
        .map(metadata_hit)
        .collect();

    sort_by_position(&mut hits);
    hits
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(filename: &str, idx: usize, heading: Option<&str>, path: &[&str]) -> Chunk {
        Chunk {
            text: format!("body {}", idx),
            filename: filename.to_string(),
            chunk_idx: idx,
            heading: heading.map(|h| h.to_string()),
            section_path: path.iter().map(|s| s.to_string()).collect(),
            element_type: None,
        }
    }

    fn corpus() -> Vec<Chunk> {
        vec![
            chunk("b.md", 0, Some("Delivery Terms"), &["Delivery Terms"]),
            chunk("a.md", 0, Some("Billing"), &["Billing"]),
            chunk(
                "a.md",
                1,
                Some("Late Fees"),
                &["Billing", "Late Fees"],
            ),
            chunk("a.md", 2, None, &[]),
        ]
    }

    #[test]
    fn test_heading_match_is_case_insensitive() {
        let hits = heading_matches(&corpus(), "delivery").unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].heading.as_deref(), Some("Delivery Terms"));
        assert_eq!(hits[0].score, 1.0);
    }

    #[test]
    fn test_heading_match_sorted_by_file_then_position() {
        let hits = heading_matches(&corpus(), "l").unwrap();
        let order: Vec<(&str, usize)> = hits
            .iter()
            .map(|h| (h.filename.as_str(), h.chunk_idx))
            .collect();
        assert_eq!(order, vec![("a.md", 0), ("a.md", 1), ("b.md", 0)]);
    }

    #[test]
    fn test_section_path_matches_parent_level() {
        // "billing" appears only as the parent of "Late Fees" for chunk 1.
        let hits = section_path_matches(&corpus(), "billing").unwrap();
        assert_eq!(hits.len(), 2);
        assert!(hits.iter().any(|h| h.heading.as_deref() == Some("Late Fees")));
    }

    #[test]
    fn test_query_with_regex_metacharacters_is_literal() {
        let chunks = vec![chunk("a.md", 0, Some("Q1 (draft)"), &["Q1 (draft)"])];
        let hits = heading_matches(&chunks, "(draft)").unwrap();
        assert_eq!(hits.len(), 1);
        assert!(heading_matches(&chunks, "(x)").unwrap().is_empty());
    }

    #[test]
    fn test_chunks_under_headings() {
        let hits = chunks_under_headings(&corpus(), &["Billing", "Late Fees"]);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].chunk_idx, 0);
        assert_eq!(hits[1].chunk_idx, 1);
    }

    #[test]
    fn test_registry_lookup_and_unknown() {
        let registry = StrategyRegistry::with_builtins();
        assert!(registry.get("hybrid").is_ok());
        assert!(registry.get("heading-semantic").is_ok());

        let err = registry.get("nope").unwrap_err().to_string();
        assert!(err.contains("Unknown strategy"));
        assert!(err.contains("hybrid"));
        assert!(err.contains("section-path"));
    }

    #[test]
    fn test_registry_list_is_sorted() {
        let registry = StrategyRegistry::with_builtins();
        let names: Vec<&str> = registry.list().iter().map(|(n, _)| *n).collect();
        assert_eq!(
            names,
            vec!["heading", "heading-semantic", "hybrid", "section-path"]
        );
    }
}
