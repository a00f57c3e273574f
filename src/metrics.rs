// This file is part of Recslab.
// Licensed under the MIT license, see LICENSE.md for details.
// SPDX-License-Identifier: MIT

//! Top-k ranking metrics over held-out relevance sets.
//!
//! `predicted` is one ranked item list per user (as produced by
//! [`top_k`]); `actual` is the per-user set of relevant items from a held-out
//! split. All metrics are averaged over users and are 0.0 when there are no
//! users.
//!
//! [`top_k`]: crate::scoring::top_k

use std::fmt;

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::sparse::CsrMatrix;

/// Relevance sets for a held-out split: per user, the items observed there.
pub fn ground_truth(test: &CsrMatrix) -> Vec<FxHashSet<i32>> {
    (0..test.n_rows)
        .map(|u| test.row_cols(u).iter().copied().collect())
        .collect()
}

/// Fraction of users with at least one relevant item in their top k.
pub fn hit_rate_at_k(predicted: &[Vec<i32>], actual: &[FxHashSet<i32>], k: usize) -> f64 {
    if predicted.is_empty() {
        return 0.0;
    }
    let hits = predicted
        .iter()
        .zip(actual)
        .filter(|(pred, truth)| pred.iter().take(k).any(|i| truth.contains(i)))
        .count();
    hits as f64 / predicted.len() as f64
}

/// Mean fraction of the k recommendation slots holding a relevant item.
pub fn precision_at_k(predicted: &[Vec<i32>], actual: &[FxHashSet<i32>], k: usize) -> f64 {
    if predicted.is_empty() || k == 0 {
        return 0.0;
    }
    let total: usize = predicted
        .iter()
        .zip(actual)
        .map(|(pred, truth)| pred.iter().take(k).filter(|i| truth.contains(i)).count())
        .sum();
    total as f64 / (predicted.len() * k) as f64
}

/// Mean fraction of each user's relevant items found in their top k. Users
/// with an empty relevance set contribute 0.
pub fn recall_at_k(predicted: &[Vec<i32>], actual: &[FxHashSet<i32>], k: usize) -> f64 {
    if predicted.is_empty() {
        return 0.0;
    }
    let total: f64 = predicted
        .iter()
        .zip(actual)
        .map(|(pred, truth)| {
            if truth.is_empty() {
                return 0.0;
            }
            let found = pred.iter().take(k).filter(|i| truth.contains(i)).count();
            found as f64 / truth.len() as f64
        })
        .sum();
    total / predicted.len() as f64
}

fn dcg(rels: impl Iterator<Item = f64>) -> f64 {
    rels.enumerate()
        .map(|(idx, rel)| rel / ((idx + 2) as f64).log2())
        .sum()
}

/// Mean normalized discounted cumulative gain with binary relevance. The
/// ideal list is the retrieved relevance vector sorted descending; users with
/// no relevant item retrieved contribute 0.
pub fn ndcg_at_k(predicted: &[Vec<i32>], actual: &[FxHashSet<i32>], k: usize) -> f64 {
    if predicted.is_empty() {
        return 0.0;
    }
    let total: f64 = predicted
        .iter()
        .zip(actual)
        .map(|(pred, truth)| {
            let rels: Vec<f64> = pred
                .iter()
                .take(k)
                .map(|i| if truth.contains(i) { 1.0 } else { 0.0 })
                .collect();
            let gain = dcg(rels.iter().copied());
            let mut ideal = rels;
            ideal.sort_unstable_by(|a, b| b.total_cmp(a));
            let ideal_gain = dcg(ideal.into_iter());
            if ideal_gain > 0.0 {
                gain / ideal_gain
            } else {
                0.0
            }
        })
        .sum();
    total / predicted.len() as f64
}

/// Fraction of users with a non-empty recommendation list.
pub fn user_coverage(predicted: &[Vec<i32>]) -> f64 {
    if predicted.is_empty() {
        return 0.0;
    }
    let covered = predicted.iter().filter(|p| !p.is_empty()).count();
    covered as f64 / predicted.len() as f64
}

/// Fraction of the catalog recommended to at least one user.
pub fn item_coverage(predicted: &[Vec<i32>], n_items: usize) -> f64 {
    if n_items == 0 {
        return 0.0;
    }
    let recommended: FxHashSet<i32> = predicted.iter().flatten().copied().collect();
    recommended.len() as f64 / n_items as f64
}

/// Bundle of the standard top-k ranking metrics.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RankingMetrics {
    pub hit_rate: f64,
    pub precision: f64,
    pub recall: f64,
    pub ndcg: f64,
    pub user_coverage: f64,
    pub item_coverage: f64,
}

impl fmt::Display for RankingMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&rendered)
    }
}

/// Compute every ranking metric over one set of recommendation lists.
pub fn evaluate(
    predicted: &[Vec<i32>],
    actual: &[FxHashSet<i32>],
    k: usize,
    n_items: usize,
) -> RankingMetrics {
    RankingMetrics {
        hit_rate: hit_rate_at_k(predicted, actual, k),
        precision: precision_at_k(predicted, actual, k),
        recall: recall_at_k(predicted, actual, k),
        ndcg: ndcg_at_k(predicted, actual, k),
        user_coverage: user_coverage(predicted),
        item_coverage: item_coverage(predicted, n_items),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn truth(sets: &[&[i32]]) -> Vec<FxHashSet<i32>> {
        sets.iter().map(|s| s.iter().copied().collect()).collect()
    }

    #[test]
    fn hit_rate_counts_users_with_any_hit() {
        let predicted = vec![vec![1, 2], vec![3, 4], vec![5, 6]];
        let actual = truth(&[&[2], &[9], &[]]);
        assert_abs_diff_eq!(hit_rate_at_k(&predicted, &actual, 2), 1.0 / 3.0);
    }

    #[test]
    fn precision_counts_slots() {
        let predicted = vec![vec![1, 2, 3, 4]];
        let actual = truth(&[&[2, 4, 7]]);
        assert_abs_diff_eq!(precision_at_k(&predicted, &actual, 4), 0.5);
        // at k=2 only [1, 2] counts: one relevant item in two slots
        assert_abs_diff_eq!(precision_at_k(&predicted, &actual, 2), 0.5);
    }

    #[test]
    fn recall_skips_empty_truth() {
        let predicted = vec![vec![1, 2], vec![3]];
        let actual = truth(&[&[1, 5, 6, 7], &[]]);
        // user 0 recovers 1 of 4; user 1 contributes 0
        assert_abs_diff_eq!(recall_at_k(&predicted, &actual, 2), 0.125);
    }

    #[test]
    fn ndcg_rewards_early_placement() {
        let actual = truth(&[&[7]]);
        let early = vec![vec![7, 1, 2]];
        let late = vec![vec![1, 2, 7]];
        let e = ndcg_at_k(&early, &actual, 3);
        let l = ndcg_at_k(&late, &actual, 3);
        assert_abs_diff_eq!(e, 1.0, epsilon = 1e-9);
        assert!(l < e && l > 0.0);
        // hit at rank 3: dcg = 1/log2(4) = 0.5, idcg = 1
        assert_abs_diff_eq!(l, 0.5, epsilon = 1e-9);
    }

    #[test]
    fn coverage_metrics() {
        let predicted = vec![vec![0, 1], vec![], vec![1, 2]];
        assert_abs_diff_eq!(user_coverage(&predicted), 2.0 / 3.0);
        assert_abs_diff_eq!(item_coverage(&predicted, 6), 0.5);
        assert_eq!(item_coverage(&predicted, 0), 0.0);
    }

    #[test]
    fn empty_inputs_are_all_zero() {
        let metrics = evaluate(&[], &[], 10, 0);
        assert_eq!(metrics.hit_rate, 0.0);
        assert_eq!(metrics.precision, 0.0);
        assert_eq!(metrics.recall, 0.0);
        assert_eq!(metrics.ndcg, 0.0);
        assert_eq!(metrics.user_coverage, 0.0);
        assert_eq!(metrics.item_coverage, 0.0);
    }

    #[test]
    fn metrics_render_as_json() {
        let metrics = evaluate(&[vec![1]], &truth(&[&[1]]), 1, 2);
        let rendered = metrics.to_string();
        let parsed: RankingMetrics = serde_json::from_str(&rendered).unwrap();
        assert_eq!(parsed, metrics);
    }
}
