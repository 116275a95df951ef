// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::collections::hash_map::{Entry, HashMap};
use std::collections::BTreeMap;
use std::time::Duration;

use crate::astar::{self, Solution};
use crate::kd::nearest_linear;
use crate::{Graph, KDTree, Point, Projection, TransverseMercator, TrieSet};

/// Normalizes a location name for searching: drops everything except
/// ASCII letters and spaces, and lowercases the result.
///
/// `"Peet's Coffee & Tea"` becomes `"peets coffee  tea"`.
pub fn clean_string(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_ascii_alphabetic() || *c == ' ')
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Named [Node](crate::Node), as returned by [StreetMap::search_exact].
#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    pub id: i64,
    pub name: String,
    pub lat: f64,
    pub lon: f64,
}

/// StreetMap wraps a [Graph] with indices for fast nearest-node lookups
/// and location name searches.
///
/// All nodes are projected into a flat frame with the provided [Projection]
/// and stored in a [KDTree]. Named nodes are additionally indexed by their
/// [cleaned](clean_string) names in a [TrieSet].
///
/// The map is immutable after construction and can be freely shared between threads.
#[derive(Debug, Clone)]
pub struct StreetMap<P = TransverseMercator> {
    graph: Graph,
    projection: P,

    tree: KDTree,
    points: Vec<Point>,
    point_nodes: HashMap<Point, i64>,

    trie: TrieSet,
    nodes_by_name: HashMap<String, BTreeMap<i64, String>>,
    representative_names: HashMap<String, String>,
}

impl StreetMap<TransverseMercator> {
    /// Indexes a [Graph], using a [TransverseMercator] projection centered
    /// on the bounding box of all nodes.
    pub fn new(graph: Graph) -> Self {
        let projection = TransverseMercator::centered_on_bbox(graph.iter().map(|n| (n.lat, n.lon)))
            .unwrap_or_default();
        Self::with_projection(graph, projection)
    }
}

impl<P: Projection> StreetMap<P> {
    /// Indexes a [Graph] using the provided [Projection].
    pub fn with_projection(graph: Graph, projection: P) -> Self {
        let mut points = Vec::with_capacity(graph.len());
        let mut point_nodes: HashMap<Point, i64> = HashMap::with_capacity(graph.len());
        let mut trie = TrieSet::new();
        let mut nodes_by_name: HashMap<String, BTreeMap<i64, String>> = HashMap::default();
        let mut representative_names: HashMap<String, String> = HashMap::default();

        for node in graph.iter() {
            let p = projection.project(node.lon, node.lat);
            match point_nodes.entry(p) {
                Entry::Vacant(e) => {
                    e.insert(node.id);
                    points.push(p);
                }
                Entry::Occupied(mut e) => {
                    // Nodes at the same position are indistinguishable for the index,
                    // prefer the one which can be routed from.
                    if !graph.has_neighbors(*e.get()) && graph.has_neighbors(node.id) {
                        e.insert(node.id);
                    }
                }
            }

            if let Some(ref name) = node.name {
                let cleaned = clean_string(name);
                if cleaned.is_empty() {
                    continue;
                }

                trie.add(&cleaned);
                nodes_by_name
                    .entry(cleaned.clone())
                    .or_default()
                    .insert(node.id, name.clone());
                representative_names.insert(cleaned, name.clone());
            }
        }

        let tree = KDTree::from_points(points.iter().copied());
        log::debug!(
            "indexed {} nodes at {} distinct positions, {} distinct names",
            graph.len(),
            tree.len(),
            trie.len(),
        );

        Self {
            graph,
            projection,
            tree,
            points,
            point_nodes,
            trie,
            nodes_by_name,
            representative_names,
        }
    }

    /// Returns the underlying [Graph].
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Returns the id of the node closest to the given position, which has at least
    /// one neighbor. Returns `None` if there are no such nodes.
    pub fn closest(&self, lon: f64, lat: f64) -> Option<i64> {
        let query = self.projection.project(lon, lat);
        let nearest = self.tree.nearest(query.x, query.y)?;
        let id = self.point_nodes.get(&nearest).copied()?;
        if self.graph.has_neighbors(id) {
            return Some(id);
        }

        // The nearest node is isolated. Its own nearest neighbor is itself,
        // so the only bounded way forward is to skip all isolated nodes.
        log::warn!("closest node {} has no neighbors, falling back to linear search", id);
        let connected = self.points.iter().filter(|p| {
            self.point_nodes
                .get(*p)
                .is_some_and(|&id| self.graph.has_neighbors(id))
        });
        let nearest = nearest_linear(connected, query.x, query.y)?;
        self.point_nodes.get(&nearest).copied()
    }

    /// Returns display names of all locations whose [cleaned](clean_string) name
    /// starts with the cleaned `prefix`. A name shared by multiple nodes is returned
    /// once per node.
    pub fn search_by_prefix(&self, prefix: &str) -> Vec<String> {
        self.trie
            .keys_with_prefix(&clean_string(prefix))
            .iter()
            .filter_map(|key| self.nodes_by_name.get(key))
            .flat_map(|nodes| nodes.values().cloned())
            .collect()
    }

    /// Returns all locations whose [cleaned](clean_string) name is equal to the cleaned `name`.
    pub fn search_exact(&self, name: &str) -> Vec<Location> {
        let cleaned = clean_string(name);
        let Some(key) = self.trie.keys_that_match(&cleaned) else {
            return Vec::default();
        };

        self.nodes_by_name
            .get(key)
            .into_iter()
            .flatten()
            .filter_map(|(&id, name)| {
                let node = self.graph.get_node(id)?;
                Some(Location {
                    id,
                    name: name.clone(),
                    lat: node.lat,
                    lon: node.lon,
                })
            })
            .collect()
    }

    /// Returns one of the display names of locations sharing the
    /// [cleaned](clean_string) version of `name`.
    pub fn representative_name(&self, name: &str) -> Option<&str> {
        self.representative_names
            .get(&clean_string(name))
            .map(String::as_str)
    }

    /// Finds the shortest route between two nodes of the [Graph],
    /// see [astar::solve].
    pub fn route(&self, start: i64, goal: i64, timeout: Duration) -> Solution<i64> {
        astar::solve(&self.graph, start, goal, timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Node, SolverOutcome, DEFAULT_TIMEOUT};

    fn node(id: i64, name: Option<&str>, lat: f64, lon: f64) -> Node {
        Node {
            id,
            name: name.map(str::to_string),
            lat,
            lon,
        }
    }

    fn berkeley() -> StreetMap {
        //      1 ────── 2 ────── 3
        //      │                 │
        //      4 ────── 5 ────── 6
        //
        //  10, 11, 12: named, isolated locations
        let mut g = Graph::new();
        g.set_node(node(1, None, 37.870, -122.270));
        g.set_node(node(2, Some("Shattuck & Center"), 37.870, -122.268));
        g.set_node(node(3, None, 37.870, -122.266));
        g.set_node(node(4, None, 37.868, -122.270));
        g.set_node(node(5, Some("Top Dog"), 37.868, -122.268));
        g.set_node(node(6, None, 37.868, -122.266));
        for (a, b) in [(1, 2), (2, 3), (1, 4), (3, 6), (4, 5), (5, 6)] {
            g.connect(a, b);
        }

        g.set_node(node(10, Some("Top Dog"), 37.8675, -122.2580));
        g.set_node(node(11, Some("Tops Bar"), 37.8690, -122.2690));
        g.set_node(node(12, Some("Peet's Coffee & Tea"), 37.8795, -122.2690));
        g.set_node(node(13, Some("1234"), 37.8795, -122.2690));
        StreetMap::new(g)
    }

    #[test]
    fn clean() {
        assert_eq!(clean_string("Peet's Coffee & Tea"), "peets coffee  tea");
        assert_eq!(clean_string("TOP DOG"), "top dog");
        assert_eq!(clean_string("Café"), "caf");
        assert_eq!(clean_string("42"), "");
    }

    #[test]
    fn closest() {
        let m = berkeley();
        assert_eq!(m.closest(-122.2701, 37.8701), Some(1));
        assert_eq!(m.closest(-122.2679, 37.8681), Some(5));
        assert_eq!(m.closest(-122.2, 37.9), Some(3));
    }

    #[test]
    fn closest_skips_isolated_nodes() {
        let m = berkeley();

        // Right at the isolated "Top Dog" (10), far east of the grid
        assert_eq!(m.closest(-122.2580, 37.8675), Some(6));

        // Right at the isolated "Tops Bar" (11), which is closer to the grid's 2 and 5
        let id = m.closest(-122.2690, 37.8690).unwrap();
        assert!(m.graph().has_neighbors(id));
    }

    #[test]
    fn closest_without_connected_nodes() {
        let mut g = Graph::new();
        g.set_node(node(1, Some("Lonely"), 37.87, -122.27));
        let m = StreetMap::new(g);
        assert_eq!(m.closest(-122.27, 37.87), None);

        let m = StreetMap::new(Graph::new());
        assert_eq!(m.closest(-122.27, 37.87), None);
    }

    #[test]
    fn closest_skips_nodes_with_dangling_edges() {
        let mut g = Graph::new();
        g.set_node(node(1, None, 0.0, 0.0));
        g.set_node(node(2, None, 0.0, 1.0));
        g.set_node(node(3, None, 0.0, 5.0));
        g.set_node(node(4, None, 0.0, 6.0));
        g.connect(1, 2);
        g.connect(3, 4);

        // 1 keeps its edge to the removed 2
        g.delete_node(2);

        let m = StreetMap::with_projection(g, |lon: f64, lat: f64| Point::new(lon, lat));
        assert_eq!(m.closest(0.0, 0.0), Some(3));
        assert_eq!(m.route(3, 4, DEFAULT_TIMEOUT).outcome, SolverOutcome::Solved);
    }

    #[test]
    fn closest_prefers_connected_node_at_shared_position() {
        let mut g = Graph::new();
        g.set_node(node(1, Some("Kiosk"), 0.0, 0.0));
        g.set_node(node(2, None, 0.0, 0.0));
        g.set_node(node(3, None, 0.0, 1.0));
        g.connect(2, 3);

        let m = StreetMap::with_projection(g, |lon: f64, lat: f64| Point::new(lon, lat));
        assert_eq!(m.closest(0.0, 0.0), Some(2));
        assert_eq!(m.closest(0.1, 0.0), Some(2));

        // The isolated node is still searchable by name
        assert_eq!(m.search_exact("kiosk").len(), 1);
    }

    #[test]
    fn search_by_prefix() {
        let m = berkeley();

        let mut got = m.search_by_prefix("top");
        got.sort();
        assert_eq!(got, vec!["Top Dog", "Top Dog", "Tops Bar"]);

        assert_eq!(m.search_by_prefix("TOP D"), vec!["Top Dog", "Top Dog"]);
        assert_eq!(m.search_by_prefix("peet's"), vec!["Peet's Coffee & Tea"]);
        assert!(m.search_by_prefix("zzz").is_empty());
        assert_eq!(m.search_by_prefix("").len(), 5);
    }

    #[test]
    fn search_exact() {
        let m = berkeley();

        let got = m.search_exact("top dog!");
        assert_eq!(
            got,
            vec![
                Location {
                    id: 5,
                    name: "Top Dog".to_string(),
                    lat: 37.868,
                    lon: -122.268,
                },
                Location {
                    id: 10,
                    name: "Top Dog".to_string(),
                    lat: 37.8675,
                    lon: -122.2580,
                },
            ]
        );

        assert!(m.search_exact("Shattuck and Center").is_empty());
        assert_eq!(m.search_exact("shattuck  center").len(), 1);
        assert!(m.search_exact("top").is_empty());
        assert!(m.search_exact("").is_empty());
        assert!(m.search_exact("1234").is_empty());
    }

    #[test]
    fn representative_name() {
        let m = berkeley();
        assert_eq!(m.representative_name("TOPS BAR"), Some("Tops Bar"));
        assert_eq!(m.representative_name("top dog"), Some("Top Dog"));
        assert_eq!(m.representative_name("nope"), None);
    }

    #[test]
    fn route() {
        let m = berkeley();
        let start = m.closest(-122.270, 37.870).unwrap();
        let goal = m.closest(-122.266, 37.868).unwrap();

        let s = m.route(start, goal, DEFAULT_TIMEOUT);
        assert_eq!(s.outcome, SolverOutcome::Solved);
        assert_eq!(s.path.first(), Some(&1));
        assert_eq!(s.path.last(), Some(&6));
        assert_eq!(s.path.len(), 4);

        let s = m.route(1, 10, DEFAULT_TIMEOUT);
        assert_eq!(s.outcome, SolverOutcome::Unsolvable);
    }

    #[test]
    fn custom_projection() {
        let mut g = Graph::new();
        g.set_node(node(1, None, 0.0, 0.0));
        g.set_node(node(2, None, 0.0, 10.0));
        g.connect(1, 2);

        // Flat, equirectangular frame
        let m = StreetMap::with_projection(g, |lon: f64, lat: f64| Point::new(lon, lat));
        assert_eq!(m.closest(4.0, 0.0), Some(1));
        assert_eq!(m.closest(6.0, 0.0), Some(2));
    }

    #[test]
    fn shared_between_threads() {
        fn assert_send_sync<T: Send + Sync>(_: &T) {}

        let m = berkeley();
        assert_send_sync(&m);

        std::thread::scope(|s| {
            let handles: Vec<_> = (0..4)
                .map(|_| s.spawn(|| m.closest(-122.2679, 37.8681)))
                .collect();
            for h in handles {
                assert_eq!(h.join().unwrap(), Some(5));
            }
        });
    }
}
