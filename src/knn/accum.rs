// This file is part of Recslab.
// Licensed under the MIT license, see LICENSE.md for details.
// SPDX-License-Identifier: MIT

//! Accumulator for neighbor scores in k-NN.

use std::collections::BinaryHeap;

use ordered_float::NotNan;

/// Keep the `limit` highest-weight neighbors seen so far, as a bounded
/// min-heap keyed on weight.
pub(super) struct NeighborAccumulator {
    limit: usize,
    heap: BinaryHeap<AccEntry>,
}

impl NeighborAccumulator {
    pub fn new(limit: usize) -> Self {
        NeighborAccumulator {
            limit,
            heap: BinaryHeap::with_capacity(limit + 1),
        }
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Offer a neighbor; it is kept only while it ranks among the `limit`
    /// highest weights.
    pub fn add(&mut self, weight: f32, rating: f32) {
        let Ok(weight) = NotNan::new(weight) else {
            return;
        };
        let entry = AccEntry { weight, rating };
        if self.heap.len() < self.limit {
            self.heap.push(entry);
        } else if let Some(min) = self.heap.peek() {
            if entry.weight > min.weight {
                self.heap.push(entry);
                while self.heap.len() > self.limit {
                    self.heap.pop();
                }
            }
        }
    }

    /// Weighted average of the kept ratings, with weight magnitudes as the
    /// weights; `None` when no neighbor was kept.
    pub fn average(&self) -> Option<f32> {
        if self.heap.is_empty() {
            return None;
        }
        let mut total = 0.0f32;
        let mut weighted = 0.0f32;
        for entry in self.heap.iter() {
            let w = entry.weight.into_inner().abs();
            total += w;
            weighted += w * entry.rating;
        }
        if total == 0.0 {
            None
        } else {
            Some(weighted / total)
        }
    }
}

/// Entries in the accumulator heap.
#[derive(Debug, Clone, Copy)]
struct AccEntry {
    weight: NotNan<f32>,
    rating: f32,
}

impl PartialEq for AccEntry {
    fn eq(&self, other: &Self) -> bool {
        self.weight == other.weight
    }
}

impl Eq for AccEntry {}

impl PartialOrd for AccEntry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for AccEntry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // reverse the ordering to make a min-heap
        other.weight.cmp(&self.weight)
    }
}
