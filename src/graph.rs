// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use crate::astar::{AStarGraph, WeightedEdge};
use crate::{earth_distance, Edge, Node};
use std::collections::btree_map::{BTreeMap, Entry};

/// Represents a street network as a set of [Nodes](Node)
/// and [Edges](Edge) between them.
///
/// Route search over the graph is available through [AStarGraph],
/// with edge costs and the heuristic both expressed in kilometers.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Graph(pub(crate) BTreeMap<i64, (Node, Vec<Edge>)>);

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of nodes in the graph.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns an iterator over all [Nodes](Node) in the graph, ordered by id.
    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.0.values().map(|(node, _)| node)
    }

    /// Retrieves a [Node] with the provided id.
    pub fn get_node(&self, id: i64) -> Option<&Node> {
        self.0.get(&id).map(|(node, _)| node)
    }

    /// Creates or updates a [Node] with `node.id`.
    ///
    /// All outgoing and incoming edges are preserved.
    /// Moving a node might result in violation of the [Edge] cost invariant
    /// (and thus break route finding).
    pub fn set_node(&mut self, node: Node) {
        match self.0.entry(node.id) {
            Entry::Vacant(e) => {
                e.insert((node, Vec::default()));
            }
            Entry::Occupied(mut e) => {
                debug_assert_eq!(e.get().0.id, node.id);
                e.get_mut().0 = node;
            }
        }
    }

    /// Deletes a [Node] with a given `id`.
    ///
    /// While all outgoing edges are removed, incoming edges are preserved
    /// (as this would require a walk over all nodes in the graph).
    pub fn delete_node(&mut self, id: i64) {
        self.0.remove(&id);
    }

    /// Finds the [Node] closest to the given position.
    ///
    /// This function requires computing the distance to every [Node] in the graph,
    /// and is not suitable for large graphs. See [StreetMap::closest](crate::StreetMap::closest).
    pub fn find_nearest_node(&self, lat: f64, lon: f64) -> Option<&Node> {
        self.iter()
            .map(|nd| (earth_distance(lat, lon, nd.lat, nd.lon), nd))
            .min_by(|(a_dist, _), (b_dist, _)| a_dist.total_cmp(b_dist))
            .map(|(_, nd)| nd)
    }

    /// Gets all outgoing [Edges](Edge) from a node with a given id.
    pub fn get_edges(&self, from_id: i64) -> &[Edge] {
        self.0
            .get(&from_id)
            .map(|(_, e)| e.as_slice())
            .unwrap_or_default()
    }

    /// Returns true if the node with the given id has at least one outgoing [Edge]
    /// to a node which exists in the graph.
    pub fn has_neighbors(&self, id: i64) -> bool {
        self.get_edges(id).iter().any(|e| self.0.contains_key(&e.to))
    }

    /// Gets the cost of an [Edge] from one node to another.
    /// If such an edge doesn't exist, returns [f64::INFINITY].
    pub fn get_edge(&self, from_id: i64, to_id: i64) -> f64 {
        self.get_edges(from_id)
            .iter()
            .find(|edge| edge.to == to_id)
            .map(|edge| edge.cost)
            .unwrap_or(f64::INFINITY)
    }

    /// Creates or updates an [Edge] from a node with a given id.
    /// Edges from non-existing nodes are ignored.
    pub fn set_edge(&mut self, from_id: i64, edge: Edge) {
        if let Some((_, edges)) = self.0.get_mut(&from_id) {
            if let Some(candidate) = edges.iter_mut().find(|e| e.to == edge.to) {
                *candidate = edge;
            } else {
                edges.push(edge);
            }
        }
    }

    /// Creates or updates edges in both directions between two existing nodes,
    /// with the cost set to the crow-flies distance between them.
    pub fn connect(&mut self, a: i64, b: i64) {
        let cost = match (self.get_node(a), self.get_node(b)) {
            (Some(na), Some(nb)) => earth_distance(na.lat, na.lon, nb.lat, nb.lon),
            _ => return,
        };
        self.set_edge(a, Edge { to: b, cost });
        self.set_edge(b, Edge { to: a, cost });
    }

    /// Removes an edge from one node to another.
    pub fn delete_edge(&mut self, from_id: i64, to_id: i64) {
        if let Some((_, edges)) = self.0.get_mut(&from_id) {
            if let Some(idx) = edges.iter().position(|edge| edge.to == to_id) {
                edges.swap_remove(idx);
            }
        }
    }
}

impl AStarGraph<i64> for Graph {
    fn neighbors(&self, v: &i64) -> Vec<WeightedEdge<i64>> {
        self.get_edges(*v)
            .iter()
            // Edges may point to deleted nodes; such edges are skipped
            .filter(|edge| self.0.contains_key(&edge.to))
            .map(|edge| WeightedEdge::new(*v, edge.to, edge.cost))
            .collect()
    }

    fn estimated_distance_to_goal(&self, v: &i64, goal: &i64) -> f64 {
        match (self.get_node(*v), self.get_node(*goal)) {
            (Some(a), Some(b)) => earth_distance(a.lat, a.lon, b.lat, b.lon),
            _ => 0.0,
        }
    }
}
