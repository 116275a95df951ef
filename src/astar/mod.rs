// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

mod graph;
mod outcome;
mod solver;

pub use graph::{AStarGraph, WeightedEdge};
pub use outcome::{Solution, SolverOutcome, DEFAULT_TIMEOUT};
pub use solver::solve;
