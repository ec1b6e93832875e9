//! Okapi BM25 lexical scoring

use regex::Regex;
use rustc_hash::{FxHashMap, FxHashSet};

/// BM25 parameters
const K1: f32 = 1.5;
const B: f32 = 0.75;

/// Term-statistics model over the chunk text sequence.
///
/// Entirely derived state: rebuilt with [`Bm25::fit`] on every index
/// mutation and on load, never persisted. Deterministic for a fixed chunk
/// set and query.
#[derive(Default)]
pub struct Bm25 {
    /// term -> number of chunks containing it
    doc_freq: FxHashMap<String, usize>,
    /// per-chunk term counts, positionally aligned with the chunk sequence
    term_freqs: Vec<FxHashMap<String, usize>>,
    /// per-chunk token counts
    doc_lengths: Vec<usize>,
    avg_doc_len: f32,
    num_docs: usize,
}

impl Bm25 {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the full model from scratch. Position in `texts` is the
    /// chunk position reported by [`Bm25::search`].
    pub fn fit(&mut self, texts: &[&str]) {
        self.doc_freq.clear();
        self.term_freqs.clear();
        self.doc_lengths.clear();
        self.num_docs = texts.len();

        let mut total_len = 0usize;

        for text in texts {
            let tokens = tokenize(text);
            self.doc_lengths.push(tokens.len());
            total_len += tokens.len();

            let mut tf: FxHashMap<String, usize> = FxHashMap::default();
            let mut seen: FxHashSet<&str> = FxHashSet::default();

            for token in &tokens {
                *tf.entry(token.clone()).or_insert(0) += 1;
            }
            for token in &tokens {
                if seen.insert(token.as_str()) {
                    *self.doc_freq.entry(token.clone()).or_insert(0) += 1;
                }
            }

            self.term_freqs.push(tf);
        }

        self.avg_doc_len = if self.num_docs > 0 {
            total_len as f32 / self.num_docs as f32
        } else {
            0.0
        };
    }

    /// Score a query against every chunk.
    pub fn score_query(&self, query: &str) -> Vec<f32> {
        let mut scores = vec![0.0f32; self.num_docs];

        for term in tokenize(query) {
            // Terms outside the fitted vocabulary contribute nothing.
            let df = match self.doc_freq.get(&term) {
                Some(df) => *df as f32,
                None => continue,
            };

            let n = self.num_docs as f32;
            let idf = ((n - df + 0.5) / (df + 0.5) + 1.0).ln();

            for (pos, tf_map) in self.term_freqs.iter().enumerate() {
                let tf = match tf_map.get(&term) {
                    Some(tf) => *tf as f32,
                    None => continue,
                };

                let doc_len = self.doc_lengths[pos] as f32;
                let norm = 1.0 - B + B * doc_len / self.avg_doc_len;
                scores[pos] += idf * tf * (K1 + 1.0) / (tf + K1 * norm);
            }
        }

        scores
    }

    /// Top-k chunk positions by BM25 score, descending. Chunks scoring
    /// zero or less are omitted.
    pub fn search(&self, query: &str, top_k: usize) -> Vec<(usize, f32)> {
        let mut scored: Vec<(usize, f32)> = self
            .score_query(query)
            .into_iter()
            .enumerate()
            .filter(|(_, s)| *s > 0.0)
            .collect();

        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(top_k);
        scored
    }
}

/// Case-folded runs of Unicode word characters. No stemming, no stop words.
pub fn tokenize(text: &str) -> Vec<String> {
    let re = Regex::new(r"\w+").unwrap();
    re.find_iter(text)
        .map(|m| m.as_str().to_lowercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fit(texts: &[&str]) -> Bm25 {
        let mut model = Bm25::new();
        model.fit(texts);
        model
    }

    #[test]
    fn test_tokenize_case_folds_and_keeps_short_tokens() {
        let tokens = tokenize("Hej! Ärende-nr 7: a B");
        assert_eq!(tokens, vec!["hej", "ärende", "nr", "7", "a", "b"]);
    }

    #[test]
    fn test_higher_term_frequency_ranks_first() {
        let model = fit(&["cat dog", "dog dog dog"]);
        let results = model.search("dog", 10);

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].0, 1);
        assert_eq!(results[1].0, 0);
        assert!(results[0].1 > results[1].1);
    }

    #[test]
    fn test_non_matching_chunks_omitted() {
        let model = fit(&["alpha beta", "gamma delta"]);
        let results = model.search("alpha", 10);

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].0, 0);
    }

    #[test]
    fn test_unknown_term_scores_nothing() {
        let model = fit(&["alpha beta"]);
        assert!(model.search("zeppelin", 10).is_empty());
    }

    #[test]
    fn test_deterministic_across_calls() {
        let model = fit(&[
            "the quick brown fox",
            "the lazy dog",
            "quick quick slow",
            "brown dogs and brown cats",
        ]);
        let first = model.search("quick brown", 4);
        for _ in 0..5 {
            assert_eq!(model.search("quick brown", 4), first);
        }
    }

    #[test]
    fn test_refit_replaces_model() {
        let mut model = fit(&["alpha"]);
        model.fit(&["beta", "beta gamma"]);

        assert!(model.search("alpha", 10).is_empty());
        assert_eq!(model.search("beta", 10).len(), 2);
    }

    #[test]
    fn test_empty_corpus() {
        let model = fit(&[]);
        assert!(model.search("anything", 5).is_empty());
    }
}
