// This file is part of Recslab.
// Licensed under the MIT license, see LICENSE.md for details.
// SPDX-License-Identifier: MIT

//! Small recommender-systems research toolkit.
//!
//! Recslab fits latent-factor models (alternating least squares, plain and
//! bias-augmented) and neighborhood models on sparse user-item rating
//! matrices, blends them with content-based genre similarity, and scores the
//! results with standard top-k ranking metrics.

pub mod als;
pub mod content;
pub mod data;
pub mod errors;
pub mod knn;
pub mod metrics;
pub mod parallel;
pub mod scoring;
pub mod similarities;
pub mod sparse;

pub use errors::{Error, Result};
