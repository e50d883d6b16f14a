//! Advisory layer that flags selector drift
//!
//! Suggestions are heuristic reports for a human to act on; chains are never
//! mutated automatically because selector order also encodes intent
//! (most-specific-first).

use crate::chain::ChainRegistry;
use crate::metrics::{MetricsStore, SelectorHitMetrics};
use serde::Serialize;
use tracing::debug;

/// Minimum attempts before a chain is eligible for suggestions
pub const MIN_SAMPLE_SIZE: u64 = 10;

/// Primary hit rate below which promotion is suggested
pub const PRIMARY_HIT_FLOOR: f64 = 0.5;

/// Success rate below which more fallbacks are suggested
pub const SUCCESS_RATE_FLOOR: f64 = 0.8;

/// Kind of optimization being proposed
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SuggestionKind {
    /// Promote the selector at `index` to primary
    PromoteSelector {
        /// Index of the selector with the most hits
        index: usize,

        /// The selector expression at that index
        selector: String,

        /// Hits recorded at that index
        hit_count: u64,
    },

    /// The chain misses too often; add more fallback selectors
    AddFallbacks {
        /// Observed success rate
        success_rate: f64,
    },
}

/// One advisory suggestion for a chain
#[derive(Debug, Clone, Serialize)]
pub struct Suggestion {
    /// Chain the suggestion applies to
    pub chain_key: String,

    /// What to change
    pub kind: SuggestionKind,

    /// Human-readable rationale
    pub rationale: String,
}

/// Produce suggestions for every chain with enough samples
pub fn suggest_optimizations(registry: &ChainRegistry, metrics: &MetricsStore) -> Vec<Suggestion> {
    let mut suggestions = Vec::new();

    for snapshot in metrics.snapshot_all() {
        let total = snapshot.total_attempts();
        if total < MIN_SAMPLE_SIZE {
            debug!(
                key = %snapshot.chain_key,
                attempts = total,
                "skipping advisory, sample too small"
            );
            continue;
        }
        suggestions.extend(suggest_for_chain(registry, &snapshot));
    }

    suggestions.sort_by(|a, b| a.chain_key.cmp(&b.chain_key));
    suggestions
}

fn suggest_for_chain(registry: &ChainRegistry, snapshot: &SelectorHitMetrics) -> Vec<Suggestion> {
    let mut out = Vec::new();
    let total = snapshot.total_attempts();

    if snapshot.primary_hit_rate() < PRIMARY_HIT_FLOOR {
        if let Some(best) = snapshot.best_index() {
            if best != 0 {
                let selector = registry
                    .get(&snapshot.chain_key)
                    .and_then(|chain| {
                        chain.all_selectors().get(best).map(|s| s.to_string())
                    })
                    .unwrap_or_default();

                out.push(Suggestion {
                    chain_key: snapshot.chain_key.clone(),
                    kind: SuggestionKind::PromoteSelector {
                        index: best,
                        selector,
                        hit_count: snapshot.hits_at(best),
                    },
                    rationale: format!(
                        "primary hit rate {:.0}% over {} attempts; index {} wins most often",
                        snapshot.primary_hit_rate() * 100.0,
                        total,
                        best
                    ),
                });
            }
        }
    }

    if snapshot.success_rate() < SUCCESS_RATE_FLOOR {
        out.push(Suggestion {
            chain_key: snapshot.chain_key.clone(),
            kind: SuggestionKind::AddFallbacks {
                success_rate: snapshot.success_rate(),
            },
            rationale: format!(
                "success rate {:.0}% over {} attempts; chain needs more fallback selectors",
                snapshot.success_rate() * 100.0,
                total
            ),
        });
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::SelectorChain;

    fn registry_with(key: &str) -> ChainRegistry {
        let registry = ChainRegistry::new();
        registry
            .register(SelectorChain::new(key, "#a").with_fallbacks(["#b", "#c"]))
            .unwrap();
        registry
    }

    #[test]
    fn test_no_suggestion_below_sample_threshold() {
        let registry = registry_with("k");
        let metrics = MetricsStore::new();
        for _ in 0..9 {
            metrics.record_hit("k", 1, 1.0);
        }

        assert!(suggest_optimizations(&registry, &metrics).is_empty());
    }

    #[test]
    fn test_promotion_suggested_once_threshold_crossed() {
        let registry = registry_with("k");
        let metrics = MetricsStore::new();
        for _ in 0..20 {
            metrics.record_hit("k", 1, 1.0);
        }

        let suggestions = suggest_optimizations(&registry, &metrics);
        assert_eq!(suggestions.len(), 1);
        match &suggestions[0].kind {
            SuggestionKind::PromoteSelector {
                index,
                selector,
                hit_count,
            } => {
                assert_eq!(*index, 1);
                assert_eq!(selector, "#b");
                assert_eq!(*hit_count, 20);
            }
            other => panic!("expected promotion, got {:?}", other),
        }
    }

    #[test]
    fn test_add_fallbacks_suggested_on_low_success() {
        let registry = registry_with("k");
        let metrics = MetricsStore::new();
        for _ in 0..7 {
            metrics.record_hit("k", 0, 1.0);
        }
        for _ in 0..5 {
            metrics.record_miss("k", 1.0);
        }

        // 7/12 success, 7/12 primary rate (> 0.5) - only the fallback advice fires
        let suggestions = suggest_optimizations(&registry, &metrics);
        assert_eq!(suggestions.len(), 1);
        assert!(matches!(
            suggestions[0].kind,
            SuggestionKind::AddFallbacks { .. }
        ));
    }

    #[test]
    fn test_healthy_chain_gets_no_suggestions() {
        let registry = registry_with("k");
        let metrics = MetricsStore::new();
        for _ in 0..30 {
            metrics.record_hit("k", 0, 1.0);
        }

        assert!(suggest_optimizations(&registry, &metrics).is_empty());
    }

    #[test]
    fn test_both_suggestions_can_fire() {
        let registry = registry_with("k");
        let metrics = MetricsStore::new();
        for _ in 0..4 {
            metrics.record_hit("k", 2, 1.0);
        }
        for _ in 0..6 {
            metrics.record_miss("k", 1.0);
        }

        let suggestions = suggest_optimizations(&registry, &metrics);
        assert_eq!(suggestions.len(), 2);
    }

    #[test]
    fn test_no_promotion_when_primary_is_best_despite_low_rate() {
        let registry = registry_with("k");
        let metrics = MetricsStore::new();
        // Primary wins whenever anything wins, but misses dominate
        for _ in 0..4 {
            metrics.record_hit("k", 0, 1.0);
        }
        for _ in 0..8 {
            metrics.record_miss("k", 1.0);
        }

        let suggestions = suggest_optimizations(&registry, &metrics);
        assert_eq!(suggestions.len(), 1);
        assert!(matches!(
            suggestions[0].kind,
            SuggestionKind::AddFallbacks { .. }
        ));
    }
}
