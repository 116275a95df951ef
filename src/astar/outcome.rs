// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::time::Duration;

/// Recommended time budget for [solve](super::solve).
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Terminal state of a route search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SolverOutcome {
    /// A route to the goal was found.
    Solved,

    /// The goal is not reachable from the start.
    Unsolvable,

    /// The search has exceeded its time budget before reaching a conclusion.
    ///
    /// Concluding that no route exists requires traversing everything reachable
    /// from the start, which on large graphs can take a very long time.
    /// The time budget protects against resource exhaustion.
    Timeout,
}

impl std::fmt::Display for SolverOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Solved => write!(f, "solved"),
            Self::Unsolvable => write!(f, "unsolvable"),
            Self::Timeout => write!(f, "timeout"),
        }
    }
}

/// Result of [solve](super::solve).
#[derive(Debug, Clone, PartialEq)]
pub struct Solution<V> {
    pub outcome: SolverOutcome,

    /// Vertices from the start to the goal (both inclusive).
    /// Empty unless `outcome` is [SolverOutcome::Solved].
    pub path: Vec<V>,

    /// Total weight of `path`. Zero unless `outcome` is [SolverOutcome::Solved].
    pub weight: f64,

    /// Number of vertices removed from the frontier and expanded.
    pub states_explored: usize,

    /// Wall-clock time spent on the search.
    pub exploration_time: Duration,
}

impl<V> Solution<V> {
    pub fn is_solved(&self) -> bool {
        self.outcome == SolverOutcome::Solved
    }
}
