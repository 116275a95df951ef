// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

use super::{AStarGraph, Solution, SolverOutcome};
use crate::MinPQ;

fn reconstruct_path<V: Clone + Eq + Hash>(edge_to: &HashMap<V, V>, mut last: V) -> Vec<V> {
    let mut path = vec![last.clone()];

    while let Some(v) = edge_to.get(&last) {
        path.push(v.clone());
        last = v.clone();
    }

    path.reverse();
    path
}

/// Uses the [A* algorithm](https://en.wikipedia.org/wiki/A*_search_algorithm)
/// to find the shortest route from `start` to `goal` in the provided graph.
///
/// The frontier is ordered by `distance from start + graph.estimated_distance_to_goal`,
/// and every vertex is present in the frontier at most once - when a shorter way to an
/// already queued vertex is found, its priority is lowered in place.
///
/// `timeout` limits the wall-clock time of the search. It is checked before
/// expanding every vertex, so the search can only stop between expansions. Once the
/// budget is exceeded, [SolverOutcome::Timeout] is returned, with an empty path.
/// The recommended value is [DEFAULT_TIMEOUT](super::DEFAULT_TIMEOUT).
///
/// All state is local to the call, so the same graph may be searched concurrently.
pub fn solve<V, G>(graph: &G, start: V, goal: V, timeout: Duration) -> Solution<V>
where
    V: Clone + Eq + Hash,
    G: AStarGraph<V> + ?Sized,
{
    let started = Instant::now();

    let mut fringe: MinPQ<V, f64> = MinPQ::default();
    let mut dist_to: HashMap<V, f64> = HashMap::default();
    let mut edge_to: HashMap<V, V> = HashMap::default();
    let mut states_explored: usize = 0;
    let mut timed_out = false;

    let initial_priority = graph.estimated_distance_to_goal(&start, &goal);
    dist_to.insert(start.clone(), 0.0);
    let queued = fringe.insert(start, initial_priority);
    debug_assert!(queued.is_ok(), "frontier desynchronized: {:?}", queued);

    loop {
        match fringe.peek_min() {
            Err(_) => break,
            Ok(v) if *v == goal => break,
            Ok(_) => {}
        }

        if started.elapsed() >= timeout {
            timed_out = true;
            break;
        }

        let Ok((v, _)) = fringe.pop_min() else {
            break;
        };
        states_explored += 1;

        let v_dist = dist_to.get(&v).copied().unwrap_or(f64::INFINITY);

        for edge in graph.neighbors(&v) {
            let candidate = v_dist + edge.weight;
            if candidate >= dist_to.get(&edge.to).copied().unwrap_or(f64::INFINITY) {
                continue;
            }

            let priority = candidate + graph.estimated_distance_to_goal(&edge.to, &goal);
            dist_to.insert(edge.to.clone(), candidate);
            edge_to.insert(edge.to.clone(), v.clone());

            let queued = if fringe.contains(&edge.to) {
                fringe.change_priority(&edge.to, priority)
            } else {
                fringe.insert(edge.to, priority)
            };
            debug_assert!(queued.is_ok(), "frontier desynchronized: {:?}", queued);
        }
    }

    let (outcome, path, weight) = if timed_out {
        (SolverOutcome::Timeout, Vec::default(), 0.0)
    } else if let Some(&weight) = dist_to.get(&goal) {
        (SolverOutcome::Solved, reconstruct_path(&edge_to, goal), weight)
    } else {
        (SolverOutcome::Unsolvable, Vec::default(), 0.0)
    };

    let exploration_time = started.elapsed();
    log::debug!(
        "A*: {} after exploring {} states in {:?}",
        outcome,
        states_explored,
        exploration_time,
    );

    Solution {
        outcome,
        path,
        weight,
        states_explored,
        exploration_time,
    }
}
