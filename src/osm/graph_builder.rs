// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::collections::HashSet;

use crate::{Graph, Node};

use super::{model, Options};

/// Helper object used for storing state related to converting [OSM features](model::Feature)
/// into a [Graph].
pub(super) struct GraphBuilder<'a> {
    g: &'a mut Graph,
    options: &'a Options<'a>,
    unused_nodes: HashSet<i64>,
    ignore_bbox: bool,
    skipped_ways: usize,
}

impl<'a> GraphBuilder<'a> {
    /// Create a new, empty graph builder.
    pub(super) fn new(g: &'a mut Graph, options: &'a Options<'a>) -> Self {
        let ignore_bbox =
            options.bbox.iter().all(|&x| x == 0.0) || options.bbox.iter().any(|x| !x.is_finite());
        if !ignore_bbox && (options.bbox[0] > options.bbox[2] || options.bbox[1] > options.bbox[3]) {
            log::warn!("bounding box {:?} is empty - no nodes will be loaded", options.bbox);
        }

        Self {
            g,
            options,
            unused_nodes: HashSet::default(),
            ignore_bbox,
            skipped_ways: 0,
        }
    }

    /// Add all features from the provided iterator.
    pub(super) fn add_features<E, I>(&mut self, features: I) -> Result<(), E>
    where
        I: IntoIterator<Item = Result<model::Feature, E>>,
    {
        for f in features {
            self.add_feature(f?);
        }
        self.cleanup();
        Ok(())
    }

    /// Removes nodes which are neither a part of a street, nor a named location.
    fn cleanup(&mut self) {
        let before = self.g.len();
        for &id in &self.unused_nodes {
            if self.g.get_node(id).is_some_and(|n| n.name.is_none()) {
                self.g.delete_node(id);
            }
        }

        log::info!(
            "loaded graph with {} nodes ({} unused nodes dropped, {} non-routable ways skipped)",
            self.g.len(),
            before - self.g.len(),
            self.skipped_ways,
        );
    }

    fn add_feature(&mut self, f: model::Feature) {
        match f {
            model::Feature::Node(n) => self.add_node(n),
            model::Feature::Way(w) => self.add_way(w),
        }
    }

    fn add_node(&mut self, mut n: model::Node) {
        if !self.is_in_bbox(n.lat, n.lon) {
            return;
        }

        self.g.set_node(Node {
            id: n.id,
            name: n.tags.remove("name"),
            lat: n.lat,
            lon: n.lon,
        });
        self.unused_nodes.insert(n.id);
    }

    fn is_in_bbox(&self, lat: f64, lon: f64) -> bool {
        if self.ignore_bbox {
            return true;
        }
        let [min_lon, min_lat, max_lon, max_lat] = self.options.bbox;
        lat >= min_lat && lat <= max_lat && lon >= min_lon && lon <= max_lon
    }

    fn is_routable(&self, w: &model::Way) -> bool {
        w.tags
            .get("highway")
            .is_some_and(|h| self.options.highways.contains(&h.as_str()))
    }

    fn add_way(&mut self, w: model::Way) {
        if !self.is_routable(&w) {
            self.skipped_ways += 1;
            return;
        }

        // Nodes outside of the bounding box (or missing from the file) split the way
        for pair in w.nodes.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if a == b || self.g.get_node(a).is_none() || self.g.get_node(b).is_none() {
                continue;
            }

            self.g.connect(a, b);
            self.unused_nodes.remove(&a);
            self.unused_nodes.remove(&b);
        }
    }
}
