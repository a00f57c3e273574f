// This file is part of Recslab.
// Licensed under the MIT license, see LICENSE.md for details.
// SPDX-License-Identifier: MIT

//! Neighborhood (k-nearest-neighbor) rating prediction.
//!
//! Both predictors take the user-by-item rating matrix and its transpose,
//! built once by the caller, so each lookup has contiguous access to the
//! relevant rows and columns. Predictions are the similarity-weighted average
//! of the `k` most similar neighbors with strictly positive similarity;
//! `None` is returned when no such neighbor exists.

mod accum;

use accum::NeighborAccumulator;

use crate::similarities::Similarity;
use crate::sparse::CsrMatrix;

/// Predict `ratings[user, item]` from the `k` most similar users who rated
/// the item.
pub fn predict_user_knn(
    ui: &CsrMatrix,
    iu: &CsrMatrix,
    user: usize,
    item: usize,
    k: usize,
    sim: Similarity,
) -> Option<f32> {
    let target_cols = ui.row_cols(user);
    let target_vals = ui.row_vals(user);

    let mut acc = NeighborAccumulator::new(k);
    for (other, rating) in iu.row_entries(item) {
        let other = other as usize;
        if other == user {
            continue;
        }
        let s = sim.compute(target_cols, target_vals, ui.row_cols(other), ui.row_vals(other));
        if s > 0.0 {
            acc.add(s, rating);
        }
    }
    acc.average()
}

/// Predict `ratings[user, item]` from the `k` most similar items the user
/// has rated.
pub fn predict_item_knn(
    ui: &CsrMatrix,
    iu: &CsrMatrix,
    user: usize,
    item: usize,
    k: usize,
    sim: Similarity,
) -> Option<f32> {
    let target_cols = iu.row_cols(item);
    let target_vals = iu.row_vals(item);

    let mut acc = NeighborAccumulator::new(k);
    for (other, rating) in ui.row_entries(user) {
        let other = other as usize;
        if other == item {
            continue;
        }
        let s = sim.compute(target_cols, target_vals, iu.row_cols(other), iu.row_vals(other));
        if s > 0.0 {
            acc.add(s, rating);
        }
    }
    acc.average()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sparse::CooMatrixBuilder;
    use approx::assert_abs_diff_eq;

    /// Three users; users 0 and 1 rate identically where they overlap.
    fn sample() -> (CsrMatrix, CsrMatrix) {
        let mut bld = CooMatrixBuilder::new();
        bld.add_entry(0, 0, 4.0);
        bld.add_entry(0, 1, 2.0);
        bld.add_entry(1, 0, 4.0);
        bld.add_entry(1, 1, 2.0);
        bld.add_entry(1, 2, 5.0);
        bld.add_entry(2, 0, 1.0);
        bld.add_entry(2, 1, 5.0);
        bld.add_entry(2, 2, 2.0);
        let ui = CsrMatrix::from_coo(&bld.finish(), 3, 3);
        let iu = ui.transpose();
        (ui, iu)
    }

    #[test]
    fn user_knn_follows_similar_neighbor() {
        let (ui, iu) = sample();
        // user 0 has not rated item 2; user 1 (cosine 1.0) rated it 5,
        // user 2 also rated it but is less similar
        let pred = predict_user_knn(&ui, &iu, 0, 2, 1, Similarity::Cosine).unwrap();
        assert_abs_diff_eq!(pred, 5.0, epsilon = 1e-5);
    }

    #[test]
    fn user_knn_weights_multiple_neighbors() {
        let (ui, iu) = sample();
        let pred = predict_user_knn(&ui, &iu, 0, 2, 2, Similarity::Cosine).unwrap();
        // both raters contribute, weighted by their similarity to user 0
        assert!(pred > 2.0 && pred < 5.0);
    }

    #[test]
    fn no_neighbors_yields_none() {
        let mut bld = CooMatrixBuilder::new();
        bld.add_entry(0, 0, 3.0);
        bld.add_entry(1, 1, 4.0);
        let ui = CsrMatrix::from_coo(&bld.finish(), 2, 2);
        let iu = ui.transpose();
        // nobody else rated item 1, and user 0 shares no support with user 1
        assert_eq!(predict_user_knn(&ui, &iu, 0, 1, 3, Similarity::Cosine), None);
    }

    #[test]
    fn item_knn_uses_co_rated_items() {
        let (ui, iu) = sample();
        // predict item 2 for user 0 from items 0 and 1, which user 0 rated
        let pred = predict_item_knn(&ui, &iu, 0, 2, 2, Similarity::Cosine);
        assert!(pred.is_some());
        let pred = pred.unwrap();
        assert!((1.0..=5.0).contains(&pred));
    }
}
