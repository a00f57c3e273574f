// This file is part of Recslab.
// Licensed under the MIT license, see LICENSE.md for details.
// SPDX-License-Identifier: MIT

//! Pairwise similarity over the co-observed entries of two sparse vectors.
//!
//! Vectors are (sorted column indices, values) pairs as stored in
//! [`CsrMatrix`] rows; only coordinates observed in both vectors enter any
//! sum. Degenerate cases (no co-observed entries, zero denominators) yield
//! 0.0 rather than an error.
//!
//! [`CsrMatrix`]: crate::sparse::CsrMatrix

use serde::{Deserialize, Serialize};

/// Similarity measure for neighborhood models.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Similarity {
    Cosine,
    Pearson,
    /// `1 / (1 + euclidean distance)`.
    Euclidean,
    /// `1 / (1 + manhattan distance)`.
    Manhattan,
    /// Jaccard overlap of the coordinates valued 1.0 (for binary data).
    Jaccard,
}

impl Similarity {
    /// Compute this similarity between two sparse vectors.
    pub fn compute(
        &self,
        a_cols: &[i32],
        a_vals: &[f32],
        b_cols: &[i32],
        b_vals: &[f32],
    ) -> f32 {
        let pairs = co_observed(a_cols, a_vals, b_cols, b_vals);
        match self {
            Similarity::Cosine => cosine(&pairs),
            Similarity::Pearson => pearson(&pairs),
            Similarity::Euclidean => euclidean(&pairs),
            Similarity::Manhattan => manhattan(&pairs),
            Similarity::Jaccard => jaccard(&pairs),
        }
    }
}

/// Merge-join two sorted sparse vectors into their co-observed value pairs.
fn co_observed(a_cols: &[i32], a_vals: &[f32], b_cols: &[i32], b_vals: &[f32]) -> Vec<(f32, f32)> {
    let mut pairs = Vec::with_capacity(a_cols.len().min(b_cols.len()));
    let (mut i, mut j) = (0, 0);
    while i < a_cols.len() && j < b_cols.len() {
        match a_cols[i].cmp(&b_cols[j]) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                pairs.push((a_vals[i], b_vals[j]));
                i += 1;
                j += 1;
            }
        }
    }
    pairs
}

fn cosine(pairs: &[(f32, f32)]) -> f32 {
    if pairs.is_empty() {
        return 0.0;
    }
    let mut dot = 0.0f32;
    let mut na = 0.0f32;
    let mut nb = 0.0f32;
    for (a, b) in pairs {
        dot += a * b;
        na += a * a;
        nb += b * b;
    }
    if na == 0.0 || nb == 0.0 {
        0.0
    } else {
        dot / (na.sqrt() * nb.sqrt())
    }
}

fn pearson(pairs: &[(f32, f32)]) -> f32 {
    if pairs.len() < 2 {
        return 0.0;
    }
    let n = pairs.len() as f32;
    let a_mean = pairs.iter().map(|(a, _)| a).sum::<f32>() / n;
    let b_mean = pairs.iter().map(|(_, b)| b).sum::<f32>() / n;

    let mut num = 0.0f32;
    let mut da = 0.0f32;
    let mut db = 0.0f32;
    for (a, b) in pairs {
        let (a, b) = (a - a_mean, b - b_mean);
        num += a * b;
        da += a * a;
        db += b * b;
    }
    let denom = da.sqrt() * db.sqrt();
    if denom == 0.0 {
        0.0
    } else {
        num / denom
    }
}

fn euclidean(pairs: &[(f32, f32)]) -> f32 {
    if pairs.is_empty() {
        return 0.0;
    }
    let d2: f32 = pairs.iter().map(|(a, b)| (a - b) * (a - b)).sum();
    1.0 / (1.0 + d2.sqrt())
}

fn manhattan(pairs: &[(f32, f32)]) -> f32 {
    if pairs.is_empty() {
        return 0.0;
    }
    let d: f32 = pairs.iter().map(|(a, b)| (a - b).abs()).sum();
    1.0 / (1.0 + d)
}

fn jaccard(pairs: &[(f32, f32)]) -> f32 {
    let mut intersect = 0usize;
    let mut union = 0usize;
    for (a, b) in pairs {
        let (a, b) = (*a == 1.0, *b == 1.0);
        if a && b {
            intersect += 1;
        }
        if a || b {
            union += 1;
        }
    }
    if union == 0 {
        0.0
    } else {
        intersect as f32 / union as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn cosine_identical_vectors() {
        let cols = [0, 2, 5];
        let vals = [1.0, 2.0, 3.0];
        let s = Similarity::Cosine.compute(&cols, &vals, &cols, &vals);
        assert_abs_diff_eq!(s, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn cosine_orthogonal_on_shared_support() {
        let s = Similarity::Cosine.compute(&[0, 1], &[1.0, 0.0], &[0, 1], &[0.0, 1.0]);
        assert_abs_diff_eq!(s, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn no_overlap_is_zero() {
        for sim in [
            Similarity::Cosine,
            Similarity::Pearson,
            Similarity::Euclidean,
            Similarity::Manhattan,
            Similarity::Jaccard,
        ] {
            let s = sim.compute(&[0, 1], &[1.0, 2.0], &[2, 3], &[1.0, 2.0]);
            assert_eq!(s, 0.0);
        }
    }

    #[test]
    fn pearson_perfect_linear_relation() {
        let a_cols = [1, 3, 4, 7];
        let a_vals = [1.0, 2.0, 3.0, 4.0];
        let b_vals = [2.0, 4.0, 6.0, 8.0];
        let s = Similarity::Pearson.compute(&a_cols, &a_vals, &a_cols, &b_vals);
        assert_abs_diff_eq!(s, 1.0, epsilon = 1e-6);

        let neg: Vec<f32> = b_vals.iter().map(|v| -v).collect();
        let s = Similarity::Pearson.compute(&a_cols, &a_vals, &a_cols, &neg);
        assert_abs_diff_eq!(s, -1.0, epsilon = 1e-6);
    }

    #[test]
    fn pearson_needs_two_points() {
        let s = Similarity::Pearson.compute(&[3], &[2.0], &[3], &[4.0]);
        assert_eq!(s, 0.0);
    }

    #[test]
    fn euclidean_and_manhattan_distances() {
        // co-observed values differ by (3, 4): euclidean 5, manhattan 7
        let cols = [0, 1];
        let s = Similarity::Euclidean.compute(&cols, &[0.0, 0.0], &cols, &[3.0, 4.0]);
        assert_abs_diff_eq!(s, 1.0 / 6.0, epsilon = 1e-6);
        let s = Similarity::Manhattan.compute(&cols, &[0.0, 0.0], &cols, &[3.0, 4.0]);
        assert_abs_diff_eq!(s, 1.0 / 8.0, epsilon = 1e-6);
    }

    #[test]
    fn jaccard_binary_overlap() {
        let cols = [0, 1, 2, 3];
        let a = [1.0, 1.0, 0.0, 0.0];
        let b = [1.0, 0.0, 1.0, 0.0];
        let s = Similarity::Jaccard.compute(&cols, &a, &cols, &b);
        assert_abs_diff_eq!(s, 1.0 / 3.0, epsilon = 1e-6);
    }
}
