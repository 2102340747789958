//! Reciprocal Rank Fusion (RRF) for hybrid search.
//!
//! Merges multiple ranked lists without score normalization.
//! Formula: score = Σ weight / (k + rank + 1) for each ranking list, with
//! `rank` counted from 0.
//!
//! Items appearing near the top of several lists get boosted scores.

use std::collections::HashMap;
use std::hash::Hash;

/// Default smoothing constant.
pub const DEFAULT_RRF_K: f64 = 60.0;

/// RRF fusion configuration.
#[derive(Debug, Clone, Copy)]
pub struct RrfConfig {
    /// The k parameter for the RRF formula (default: 60.0).
    /// Dampens the advantage of the very first ranks.
    pub k: f64,
}

impl Default for RrfConfig {
    fn default() -> Self {
        Self { k: DEFAULT_RRF_K }
    }
}

/// An item with its fused score (higher is better).
#[derive(Debug, Clone, PartialEq)]
pub struct RankedItem<T> {
    pub item: T,
    pub score: f64,
}

/// A ranked list paired with its fusion weight.
#[derive(Debug, Clone)]
pub struct WeightedRanking<T> {
    pub ranking: Vec<T>,
    pub weight: f64,
}

impl<T> WeightedRanking<T> {
    pub fn new(ranking: Vec<T>, weight: f64) -> Self {
        Self { ranking, weight }
    }
}

/// Fuses ranked lists using Reciprocal Rank Fusion with equal weights.
///
/// Each list must be pre-sorted by relevance (best first). `get_id` maps an
/// item to its identity; the first occurrence of an identity is the one kept
/// in the output.
///
/// # Example
///
/// ```
/// use memrank::rrf::{reciprocal_rank_fusion, RrfConfig};
///
/// let fused = reciprocal_rank_fusion(
///     vec![vec!["a", "b", "c"], vec!["b", "c", "d"]],
///     |s| *s,
///     RrfConfig::default(),
/// );
/// assert_eq!(fused[0].item, "b");
/// assert_eq!(fused.len(), 4);
/// ```
pub fn reciprocal_rank_fusion<T, K, F>(
    rankings: Vec<Vec<T>>,
    get_id: F,
    config: RrfConfig,
) -> Vec<RankedItem<T>>
where
    F: Fn(&T) -> K,
    K: Eq + Hash,
{
    let weighted = rankings
        .into_iter()
        .map(|ranking| WeightedRanking::new(ranking, 1.0))
        .collect();
    weighted_rrf(weighted, get_id, config)
}

/// Fuses ranked lists using weighted Reciprocal Rank Fusion.
///
/// Each contribution `1 / (k + rank + 1)` is multiplied by the weight of the
/// list it comes from. A weight of 0 makes a list inert: its items may still
/// appear through other lists, and an item found only in zero-weight lists
/// scores exactly 0.
///
/// Output is sorted by accumulated score, descending. The sort is stable, so
/// equal scores keep the order in which items were first seen.
pub fn weighted_rrf<T, K, F>(
    rankings: Vec<WeightedRanking<T>>,
    get_id: F,
    config: RrfConfig,
) -> Vec<RankedItem<T>>
where
    F: Fn(&T) -> K,
    K: Eq + Hash,
{
    if rankings.is_empty() {
        return vec![];
    }

    // Position of each identity in `fused`, in first-seen order
    let mut positions: HashMap<K, usize> = HashMap::new();
    let mut fused: Vec<RankedItem<T>> = Vec::new();

    for WeightedRanking { ranking, weight } in rankings {
        for (rank, item) in ranking.into_iter().enumerate() {
            let contribution = weight / (config.k + rank as f64 + 1.0);
            let id = get_id(&item);

            match positions.get(&id) {
                Some(&position) => fused[position].score += contribution,
                None => {
                    positions.insert(id, fused.len());
                    fused.push(RankedItem {
                        item,
                        score: contribution,
                    });
                }
            }
        }
    }

    fused.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    fused
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(fused: &[RankedItem<&'static str>]) -> Vec<&'static str> {
        fused.iter().map(|r| r.item).collect()
    }

    #[test]
    fn test_rrf_fusion_basic() {
        let fused = reciprocal_rank_fusion(
            vec![vec!["a", "b", "c"], vec!["b", "c", "d"]],
            |s| *s,
            RrfConfig::default(),
        );

        assert_eq!(fused.len(), 4);
        // b and c appear in both lists near the top
        assert_eq!(fused[0].item, "b");
        assert_eq!(fused[1].item, "c");
        assert!(fused[0].score > fused[1].score);
    }

    #[test]
    fn test_rrf_fusion_empty_rankings() {
        let fused = reciprocal_rank_fusion(Vec::<Vec<&str>>::new(), |s| *s, RrfConfig::default());
        assert!(fused.is_empty());
    }

    #[test]
    fn test_rrf_fusion_single_list_preserves_order() {
        let fused = reciprocal_rank_fusion(
            vec![vec!["x", "y", "z"]],
            |s| *s,
            RrfConfig::default(),
        );

        assert_eq!(ids(&fused), vec!["x", "y", "z"]);
        assert!((fused[0].score - 1.0 / 61.0).abs() < 1e-12);
        assert!((fused[2].score - 1.0 / 63.0).abs() < 1e-12);
    }

    #[test]
    fn test_rrf_fusion_duplicate_documents() {
        let fused = reciprocal_rank_fusion(
            vec![vec!["m"], vec!["m"], vec!["m"]],
            |s| *s,
            RrfConfig::default(),
        );

        assert_eq!(fused.len(), 1);
        let expected = 3.0 * (1.0 / (DEFAULT_RRF_K + 1.0));
        assert!((fused[0].score - expected).abs() < 1e-12);
    }

    #[test]
    fn test_rrf_smaller_k_gives_higher_top_score() {
        let rankings = vec![vec!["only"]];
        let k60 = reciprocal_rank_fusion(rankings.clone(), |s| *s, RrfConfig { k: 60.0 });
        let k1 = reciprocal_rank_fusion(rankings, |s| *s, RrfConfig { k: 1.0 });

        assert!(k1[0].score > k60[0].score);
        assert!((k1[0].score - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_rrf_ties_keep_first_seen_order() {
        // a and b sit at mirrored ranks, so their scores are equal
        let fused = reciprocal_rank_fusion(
            vec![vec!["a", "b"], vec!["b", "a"]],
            |s| *s,
            RrfConfig::default(),
        );

        assert_eq!(fused[0].score, fused[1].score);
        assert_eq!(ids(&fused), vec!["a", "b"]);
    }

    #[test]
    fn test_rrf_fusion_empty_lists_in_vector() {
        let fused = reciprocal_rank_fusion(
            vec![vec![], vec!["solo"]],
            |s| *s,
            RrfConfig::default(),
        );
        assert_eq!(ids(&fused), vec!["solo"]);
    }

    #[test]
    fn test_weighted_rrf_zero_weight_item_scores_zero() {
        let fused = weighted_rrf(
            vec![
                WeightedRanking::new(vec!["shared", "lexical-only"], 1.0),
                WeightedRanking::new(vec!["vector-only", "shared"], 0.0),
            ],
            |s| *s,
            RrfConfig::default(),
        );

        let vector_only = fused.iter().find(|r| r.item == "vector-only").unwrap();
        assert_eq!(vector_only.score, 0.0);

        // shared scores from the weighted list only
        let shared = fused.iter().find(|r| r.item == "shared").unwrap();
        assert!((shared.score - 1.0 / 61.0).abs() < 1e-12);
        assert_eq!(fused.last().unwrap().item, "vector-only");
    }

    #[test]
    fn test_weighted_rrf_weight_shifts_ranking() {
        let rankings = |bm25: f64, vector: f64| {
            weighted_rrf(
                vec![
                    WeightedRanking::new(vec!["lexical"], bm25),
                    WeightedRanking::new(vec!["semantic"], vector),
                ],
                |s: &&str| *s,
                RrfConfig::default(),
            )
        };

        assert_eq!(rankings(2.0, 1.0)[0].item, "lexical");
        assert_eq!(rankings(1.0, 2.0)[0].item, "semantic");
    }

    #[test]
    fn test_rrf_keeps_first_occurrence() {
        #[derive(Debug, Clone)]
        struct Hit {
            id: u32,
            source: &'static str,
        }

        let fused = reciprocal_rank_fusion(
            vec![
                vec![Hit { id: 7, source: "first" }],
                vec![Hit { id: 7, source: "second" }],
            ],
            |h| h.id,
            RrfConfig::default(),
        );

        assert_eq!(fused.len(), 1);
        assert_eq!(fused[0].item.source, "first");
    }

    #[test]
    fn test_rrf_fusion_order_consistency() {
        let run = || {
            reciprocal_rank_fusion(
                vec![vec!["a", "b", "c", "d"], vec!["d", "c", "e"]],
                |s| *s,
                RrfConfig::default(),
            )
        };
        assert_eq!(ids(&run()), ids(&run()));
    }
}
