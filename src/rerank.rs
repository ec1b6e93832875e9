//! LLM relevance scoring over hybrid search candidates
//!
//! Category search runs a broad hybrid retrieval and asks the model to
//! grade each candidate 0-10 against the category. Candidates the model
//! does not return a score for are dropped, not defaulted.

use serde::Deserialize;
use tracing::info;

use crate::index::SearchHit;
use crate::llm::AnthropicClient;

/// Minimum relevance grade a candidate must reach to be reported.
pub const RELEVANCE_THRESHOLD: u8 = 5;

/// Candidates fetched from the index before grading.
pub const CANDIDATE_POOL: usize = 20;

const MAX_PASSAGE_CHARS: usize = 1500;

const SYSTEM_PROMPT: &str = "You are an expert at analyzing contract and \
procurement documents.

Your task: given a category and a set of text passages, grade how relevant \
each passage is to the category.

ALWAYS answer with valid JSON, a list of objects:
[
  {\"index\": 0, \"score\": 8, \"rationale\": \"Short explanation\"},
  {\"index\": 1, \"score\": 2, \"rationale\": \"Short explanation\"},
  ...
]

- \"score\" is 0-10 where 10 = extremely relevant to the category
- Be generous about what counts as relevant: synonyms, related concepts, \
implications
- If a passage only touches the category tangentially, give 3-4
- If it is directly about the category, give 7-10";

/// A hit with its model-assigned grade.
#[derive(Debug, Clone)]
pub struct ScoredHit {
    pub hit: SearchHit,
    pub relevance: u8,
    pub rationale: String,
}

#[derive(Deserialize)]
struct ScoreEntry {
    index: usize,
    score: u8,
    #[serde(default)]
    rationale: String,
}

pub struct Reranker {
    client: AnthropicClient,
    threshold: u8,
}

impl Reranker {
    pub fn new(client: AnthropicClient) -> Self {
        Self {
            client,
            threshold: RELEVANCE_THRESHOLD,
        }
    }

    pub fn with_threshold(mut self, threshold: u8) -> Self {
        self.threshold = threshold;
        self
    }

    /// Grade candidates against a category, keep those at or above the
    /// relevance threshold, highest grade first.
    pub async fn rerank(
        &self,
        category: &str,
        candidates: Vec<SearchHit>,
    ) -> anyhow::Result<Vec<ScoredHit>> {
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        info!("Grading {} candidates against \"{}\"", candidates.len(), category);

        let passages = candidates
            .iter()
            .enumerate()
            .map(|(i, hit)| {
                format!("[{}] (Source: {})\n{}", i, hit.filename, truncate(&hit.text))
            })
            .collect::<Vec<_>>()
            .join("\n\n");

        let prompt = format!(
            "Category: \"{}\"\n\nGrade the relevance (0-10) of each passage below:\n\n{}\n\nAnswer with a JSON list. Include all {} passages.",
            category,
            passages,
            candidates.len()
        );

        let response = self.client.generate(SYSTEM_PROMPT, &prompt, 2048).await?;
        let mut scored = merge_scores(candidates, &response)?;

        scored.retain(|s| s.relevance >= self.threshold);
        scored.sort_by(|a, b| b.relevance.cmp(&a.relevance));
        Ok(scored)
    }
}

/// Char-boundary-safe prefix of a passage.
fn truncate(text: &str) -> &str {
    if text.len() <= MAX_PASSAGE_CHARS {
        return text;
    }
    let mut end = MAX_PASSAGE_CHARS;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

/// Pair candidates with the grades in a model response. The response may
/// be wrapped in a markdown code fence. Candidates whose index is missing
/// from the response are dropped.
pub fn merge_scores(candidates: Vec<SearchHit>, response: &str) -> anyhow::Result<Vec<ScoredHit>> {
    let mut text = response.trim();
    if let Some(stripped) = text.strip_prefix("```") {
        let stripped = stripped.split_once('\n').map(|(_, rest)| rest).unwrap_or("");
        text = stripped.rsplit_once("```").map(|(body, _)| body).unwrap_or(stripped);
    }

    let entries: Vec<ScoreEntry> = serde_json::from_str(text.trim())
        .map_err(|e| anyhow::anyhow!("Model did not return valid JSON scores: {}", e))?;

    let mut by_index: Vec<Option<ScoreEntry>> = Vec::new();
    by_index.resize_with(candidates.len(), || None);
    for entry in entries {
        if entry.index < candidates.len() {
            let idx = entry.index;
            by_index[idx] = Some(entry);
        }
    }

    Ok(candidates
        .into_iter()
        .zip(by_index)
        .filter_map(|(hit, entry)| {
            entry.map(|e| ScoredHit {
                hit,
                relevance: e.score.min(10),
                rationale: e.rationale,
            })
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(filename: &str, text: &str) -> SearchHit {
        SearchHit {
            text: text.to_string(),
            filename: filename.to_string(),
            chunk_idx: 0,
            heading: None,
            section_path: Vec::new(),
            score: 1.0,
        }
    }

    #[test]
    fn test_merge_scores_plain_json() {
        let candidates = vec![hit("a.txt", "alpha"), hit("b.txt", "beta")];
        let response = r#"[
            {"index": 0, "score": 8, "rationale": "on topic"},
            {"index": 1, "score": 2, "rationale": "off topic"}
        ]"#;

        let scored = merge_scores(candidates, response).unwrap();
        assert_eq!(scored.len(), 2);
        assert_eq!(scored[0].relevance, 8);
        assert_eq!(scored[0].rationale, "on topic");
        assert_eq!(scored[1].hit.filename, "b.txt");
    }

    #[test]
    fn test_merge_scores_strips_code_fence() {
        let candidates = vec![hit("a.txt", "alpha")];
        let response = "```json\n[{\"index\": 0, \"score\": 7}]\n```";

        let scored = merge_scores(candidates, response).unwrap();
        assert_eq!(scored.len(), 1);
        assert_eq!(scored[0].relevance, 7);
        assert_eq!(scored[0].rationale, "");
    }

    #[test]
    fn test_merge_scores_drops_unscored_candidates() {
        let candidates = vec![hit("a.txt", "alpha"), hit("b.txt", "beta")];
        let response = r#"[{"index": 1, "score": 9, "rationale": "good"}]"#;

        let scored = merge_scores(candidates, response).unwrap();
        assert_eq!(scored.len(), 1);
        assert_eq!(scored[0].hit.filename, "b.txt");
    }

    #[test]
    fn test_merge_scores_ignores_out_of_range_index() {
        let candidates = vec![hit("a.txt", "alpha")];
        let response = r#"[
            {"index": 0, "score": 6},
            {"index": 99, "score": 10}
        ]"#;

        let scored = merge_scores(candidates, response).unwrap();
        assert_eq!(scored.len(), 1);
        assert_eq!(scored[0].relevance, 6);
    }

    #[test]
    fn test_merge_scores_rejects_non_json() {
        let candidates = vec![hit("a.txt", "alpha")];
        assert!(merge_scores(candidates, "I cannot grade these.").is_err());
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        let text = "å".repeat(1600);
        let cut = truncate(&text);
        assert!(cut.len() <= MAX_PASSAGE_CHARS);
        assert!(cut.chars().all(|c| c == 'å'));
    }
}
