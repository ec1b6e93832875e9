//! Reciprocal Rank Fusion
//!
//! Merges independently ordered candidate lists by rank rather than raw
//! score, so BM25 scores and cosine similarities never need to be put on
//! a common scale.

use rustc_hash::FxHashMap;

/// Standard RRF constant from Cormack, Clarke and Buettcher (SIGIR 2009).
pub const RRF_K: usize = 60;

/// Fuse ranked lists of (chunk position, score) pairs.
///
/// Each item at 0-based rank `r` contributes `1 / (k + r + 1)` to its
/// position's accumulator; input scores are ignored. The output is ordered
/// by fused score descending. Tie order is unspecified and callers must
/// not depend on it.
pub fn rrf_fuse(ranked_lists: &[Vec<(usize, f32)>], k: usize) -> Vec<(usize, f32)> {
    let mut scores: FxHashMap<usize, f32> = FxHashMap::default();

    for ranked in ranked_lists {
        for (rank, (pos, _score)) in ranked.iter().enumerate() {
            *scores.entry(*pos).or_insert(0.0) += 1.0 / (k + rank + 1) as f32;
        }
    }

    let mut fused: Vec<(usize, f32)> = scores.into_iter().collect();
    fused.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    fused
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_in_every_list_wins() {
        let lists = vec![
            vec![(7, 0.9), (1, 0.5), (2, 0.1)],
            vec![(7, 12.0), (3, 4.0)],
            vec![(7, 1.0), (2, 0.9), (1, 0.8)],
        ];
        let fused = rrf_fuse(&lists, RRF_K);

        assert_eq!(fused[0].0, 7);
        // Rank 0 in all three lists is the maximum possible score.
        let expected = 3.0 / (RRF_K + 1) as f32;
        assert!((fused[0].1 - expected).abs() < 1e-6);
    }

    #[test]
    fn test_consensus_beats_single_list_top() {
        // Position 5 is near the top of both lists; 9 tops only one.
        let lists = vec![
            vec![(9, 100.0), (5, 50.0)],
            vec![(5, 0.9), (4, 0.8), (9, 0.1)],
        ];
        let fused = rrf_fuse(&lists, RRF_K);

        let score_of = |pos: usize| {
            fused
                .iter()
                .find(|(p, _)| *p == pos)
                .map(|(_, s)| *s)
                .unwrap()
        };
        assert!(score_of(5) > score_of(4));
    }

    #[test]
    fn test_absent_position_contributes_nothing() {
        let lists = vec![vec![(1, 1.0)], vec![(2, 1.0)]];
        let fused = rrf_fuse(&lists, RRF_K);

        assert_eq!(fused.len(), 2);
        let expected = 1.0 / (RRF_K + 1) as f32;
        for (_, score) in &fused {
            assert!((score - expected).abs() < 1e-6);
        }
    }

    #[test]
    fn test_raw_scores_ignored() {
        let lists = vec![vec![(1, 1000.0), (2, 0.001)], vec![(2, 0.5), (1, 0.4)]];
        let fused = rrf_fuse(&lists, RRF_K);

        let s1 = fused.iter().find(|(p, _)| *p == 1).unwrap().1;
        let s2 = fused.iter().find(|(p, _)| *p == 2).unwrap().1;
        assert!((s1 - s2).abs() < 1e-6);
    }

    #[test]
    fn test_empty_input() {
        assert!(rrf_fuse(&[], RRF_K).is_empty());
        assert!(rrf_fuse(&[vec![], vec![]], RRF_K).is_empty());
    }
}
