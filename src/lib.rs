// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

//! Nearest-node lookup, location search and routing over
//! [OpenStreetMap](https://www.openstreetmap.org/) street data.
//!
//! A [Graph] of street nodes is wrapped in a [StreetMap], which projects all nodes
//! into a flat frame and indexes them in a [KDTree] for nearest-node lookups,
//! while location names are indexed in a [TrieSet] for prefix and exact searches.
//! Routes are found with A* ([solve]), which works over any [AStarGraph].
//!
//! # Example
//!
//! ```no_run
//! let mut g = streetmap::Graph::new();
//! let osm_options = streetmap::osm::Options {
//!     file_format: streetmap::osm::FileFormat::Unknown,
//!     ..Default::default()
//! };
//! streetmap::osm::add_features_from_file(
//!     &mut g,
//!     &osm_options,
//!     "path/to/berkeley.osm.gz",
//! ).expect("failed to load berkeley.osm.gz");
//!
//! let map = streetmap::StreetMap::new(g);
//! let start = map.closest(-122.2578, 37.8721).expect("empty map");
//! let end = map.closest(-122.2690, 37.8695).expect("empty map");
//! let route = map.route(start, end, streetmap::DEFAULT_TIMEOUT);
//!
//! println!("Route ({}): {:?}", route.outcome, route.path);
//! println!("Top Dog: {:?}", map.search_exact("top dog"));
//! ```

mod astar;
mod distance;
mod graph;
mod kd;
mod locations;
pub mod osm;
mod point;
mod pq;
mod projection;
mod trie;

pub use astar::{solve, AStarGraph, Solution, SolverOutcome, WeightedEdge, DEFAULT_TIMEOUT};
pub use distance::earth_distance;
pub use graph::Graph;
pub use kd::{nearest_linear, KDTree};
pub use locations::{clean_string, Location, StreetMap};
pub use point::Point;
pub use pq::{MinPQ, QueueError};
pub use projection::{Projection, TransverseMercator};
pub use trie::TrieSet;

/// Represents an element of the [Graph] - an intersection, a point along a street,
/// or a named location.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: i64,
    pub name: Option<String>,
    pub lat: f64,
    pub lon: f64,
}

/// Represents an outgoing (one-way) connection from a specific [Node].
///
/// `cost` must not be smaller than the crow-flies distance between the two nodes
/// (in kilometers), as this is what the routing heuristic assumes.
///
/// Due to implementation details, `to` might not exist in the [Graph].
/// Users must silently ignore such edges.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    pub to: i64,
    pub cost: f64,
}
