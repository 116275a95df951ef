// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use crate::Point;

/// KDTree implements the [k-d tree data structure](https://en.wikipedia.org/wiki/K-d_tree)
/// over 2-dimensional [Points](Point), which speeds up nearest-neighbor search for large datasets.
///
/// The tree is built by sequential insertion, in input order, without any rebalancing.
/// The root divides the plane on the x axis, its children on the y axis, and so on.
/// Points strictly smaller on the dividing axis go into the left subtree,
/// everything else (including ties) goes into the right subtree.
///
/// The tree is a set - inserting a point equal to an already stored one is rejected.
#[derive(Debug, Clone, Default)]
pub struct KDTree {
    root: Option<Box<KDNode>>,
    len: usize,
}

#[derive(Debug, Clone)]
struct KDNode {
    point: Point,
    x_divides: bool,
    left: Option<Box<KDNode>>,
    right: Option<Box<KDNode>>,
}

impl KDNode {
    fn leaf(point: Point, x_divides: bool) -> Self {
        Self {
            point,
            x_divides,
            left: None,
            right: None,
        }
    }

    /// Returns true if `p` belongs to the left (strictly smaller) side of this node.
    #[inline]
    fn goes_left(&self, p: &Point) -> bool {
        if self.x_divides {
            p.x < self.point.x
        } else {
            p.y < self.point.y
        }
    }

    /// Squared distance from `p` to the line splitting this node's subtrees.
    #[inline]
    fn axis_distance_squared(&self, p: &Point) -> f64 {
        let d = if self.x_divides {
            p.x - self.point.x
        } else {
            p.y - self.point.y
        };
        d * d
    }

    fn nearest(&self, query: &Point, mut best: Point, mut best_dist: f64) -> (Point, f64) {
        // The pivot itself is always a candidate
        let pivot_dist = query.distance_squared(&self.point);
        if pivot_dist < best_dist {
            best = self.point;
            best_dist = pivot_dist;
        }

        // Select which branch to recurse into first
        let (first, second) = if self.goes_left(query) {
            (&self.left, &self.right)
        } else {
            (&self.right, &self.left)
        };

        if let Some(ref branch) = first {
            (best, best_dist) = branch.nearest(query, best, best_dist);
        }

        // A closer point is possible in the second branch if and only if
        // the splitting axis is closer than the current best candidate.
        if let Some(ref branch) = second {
            if self.axis_distance_squared(query) < best_dist {
                (best, best_dist) = branch.nearest(query, best, best_dist);
            }
        }

        (best, best_dist)
    }
}

impl KDTree {
    /// Creates an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a tree by inserting all points in iteration order.
    /// Duplicate points are skipped.
    pub fn from_points<I: IntoIterator<Item = Point>>(points: I) -> Self {
        let mut tree = Self::new();
        let mut duplicates: usize = 0;
        for p in points {
            if !tree.insert(p) {
                duplicates += 1;
            }
        }
        if duplicates > 0 {
            log::debug!("k-d tree: skipped {} duplicate point(s)", duplicates);
        }
        tree
    }

    /// Returns the number of points in the tree.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Adds a point to the tree. Returns `false` (leaving the tree untouched)
    /// if an equal point is already present.
    pub fn insert(&mut self, point: Point) -> bool {
        let mut slot = &mut self.root;
        let mut x_divides = true;

        while let Some(node) = slot {
            if node.point == point {
                return false;
            }
            x_divides = !node.x_divides;
            slot = if node.goes_left(&point) {
                &mut node.left
            } else {
                &mut node.right
            };
        }

        *slot = Some(Box::new(KDNode::leaf(point, x_divides)));
        self.len += 1;
        true
    }

    /// Finds the stored point closest (in euclidean distance) to `(x, y)`.
    /// Returns `None` only if the tree is empty.
    ///
    /// When multiple points are equally close, any of them may be returned.
    pub fn nearest(&self, x: f64, y: f64) -> Option<Point> {
        let root = self.root.as_ref()?;
        let query = Point::new(x, y);
        let (best, _) = root.nearest(&query, root.point, f64::INFINITY);
        Some(best)
    }

    /// Returns an iterator over all points in the tree, in pre-order.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            stack: self.root.as_deref().into_iter().collect(),
        }
    }
}

impl FromIterator<Point> for KDTree {
    fn from_iter<I: IntoIterator<Item = Point>>(iter: I) -> Self {
        Self::from_points(iter)
    }
}

/// Pre-order iterator over the points of a [KDTree].
pub struct Iter<'a> {
    stack: Vec<&'a KDNode>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a Point;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        if let Some(ref right) = node.right {
            self.stack.push(right);
        }
        if let Some(ref left) = node.left {
            self.stack.push(left);
        }
        Some(&node.point)
    }
}

/// Finds the point closest to `(x, y)` by computing the distance to every
/// provided point. Returns `None` if `points` is empty.
///
/// This is the baseline for [KDTree::nearest], and is not suitable for large datasets.
pub fn nearest_linear<'a, I: IntoIterator<Item = &'a Point>>(
    points: I,
    x: f64,
    y: f64,
) -> Option<Point> {
    let query = Point::new(x, y);
    points
        .into_iter()
        .map(|p| (query.distance_squared(p), *p))
        .min_by(|(a, _), (b, _)| a.total_cmp(b))
        .map(|(_, p)| p)
}
