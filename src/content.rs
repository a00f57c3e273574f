// This file is part of Recslab.
// Licensed under the MIT license, see LICENSE.md for details.
// SPDX-License-Identifier: MIT

//! Content-based scoring from item genre flags.
//!
//! A user's profile is the mean genre vector of the items they rated at or
//! above a "liked" threshold on the raw rating scale; items are then scored
//! by cosine similarity between the profile and the item's genre row.

use ndarray::{Array2, Axis};
use rayon::prelude::*;

use log::*;

use crate::errors::{Error, Result};
use crate::sparse::CsrMatrix;

/// Default rating at or above which an item counts as liked.
pub const DEFAULT_LIKE_THRESHOLD: f32 = 4.0;

/// Average the genre rows of each user's liked items.
///
/// `ratings` must hold raw (uncentered) rating values; `genres` has one 0/1
/// row per item. Users with no liked items get a zero profile.
pub fn user_genre_profiles(
    ratings: &CsrMatrix,
    genres: &Array2<f32>,
    like_threshold: f32,
) -> Result<Array2<f32>> {
    if genres.nrows() != ratings.n_cols {
        return Err(Error::InvalidArgument(format!(
            "genre matrix has {} rows for {} items",
            genres.nrows(),
            ratings.n_cols
        )));
    }

    let n_genres = genres.ncols();
    let mut profiles = Array2::<f32>::zeros((ratings.n_rows, n_genres));

    debug!(
        "building {} genre profiles over {} genres",
        ratings.n_rows, n_genres
    );
    profiles
        .outer_iter_mut()
        .into_par_iter()
        .enumerate()
        .for_each(|(user, mut profile)| {
            let mut liked = 0usize;
            for (item, rating) in ratings.row_entries(user) {
                if rating >= like_threshold {
                    profile += &genres.row(item as usize);
                    liked += 1;
                }
            }
            if liked > 0 {
                profile /= liked as f32;
            }
        });

    Ok(profiles)
}

/// Dense (users, items) matrix of cosine similarities between user profiles
/// and item genre rows. Zero-norm profiles or genre rows score 0.
pub fn content_scores(profiles: &Array2<f32>, genres: &Array2<f32>) -> Result<Array2<f32>> {
    if profiles.ncols() != genres.ncols() {
        return Err(Error::InvalidArgument(format!(
            "profiles have {} genres, items have {}",
            profiles.ncols(),
            genres.ncols()
        )));
    }

    let normalized = |m: &Array2<f32>| {
        let mut out = m.clone();
        for mut row in out.axis_iter_mut(Axis(0)) {
            let norm = row.dot(&row).sqrt();
            if norm > 0.0 {
                row /= norm;
            }
        }
        out
    };

    let p = normalized(profiles);
    let g = normalized(genres);
    Ok(p.dot(&g.t()))
}
