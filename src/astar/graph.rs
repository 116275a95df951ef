// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

/// Represents a one-way connection between two vertices with a non-negative weight.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightedEdge<V> {
    pub from: V,
    pub to: V,
    pub weight: f64,
}

impl<V> WeightedEdge<V> {
    pub fn new(from: V, to: V, weight: f64) -> Self {
        Self { from, to, weight }
    }
}

/// AStarGraph is the capability required by [solve](super::solve) from a graph:
/// enumeration of outgoing edges and an estimate of the remaining distance to the goal.
///
/// The estimate must never exceed the true remaining cost (the heuristic must be
/// [admissible](https://en.wikipedia.org/wiki/Admissible_heuristic)) for the found
/// routes to be optimal. This is not verified.
pub trait AStarGraph<V> {
    /// Returns all edges going out of `v`. Edge weights must not be negative.
    fn neighbors(&self, v: &V) -> Vec<WeightedEdge<V>>;

    /// Returns a lower bound of the cost of getting from `v` to `goal`.
    fn estimated_distance_to_goal(&self, v: &V, goal: &V) -> f64;
}
