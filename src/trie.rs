// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::collections::BTreeMap;

/// TrieSet is a set of strings stored as a [prefix tree](https://en.wikipedia.org/wiki/Trie),
/// supporting exact membership tests and enumeration of all keys with a given prefix.
///
/// Keys are stored verbatim - callers are expected to normalize them beforehand
/// (see [clean_string](crate::clean_string)). Empty keys are never stored.
#[derive(Debug, Clone, Default)]
pub struct TrieSet {
    root: TrieNode,
    len: usize,
}

#[derive(Debug, Clone, Default)]
struct TrieNode {
    is_key: bool,
    children: BTreeMap<char, TrieNode>,
}

impl TrieNode {
    fn collect_keys(&self, prefix: &mut String, out: &mut Vec<String>) {
        if self.is_key {
            out.push(prefix.clone());
        }
        for (&c, child) in &self.children {
            prefix.push(c);
            child.collect_keys(prefix, out);
            prefix.pop();
        }
    }
}

impl TrieSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of keys in the set.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Removes all keys from the set.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Adds a key to the set. Empty keys are ignored.
    pub fn add(&mut self, key: &str) {
        if key.is_empty() {
            return;
        }

        let mut node = &mut self.root;
        for c in key.chars() {
            node = node.children.entry(c).or_default();
        }

        if !node.is_key {
            node.is_key = true;
            self.len += 1;
        }
    }

    /// Returns true if `key` was added to the set.
    pub fn contains(&self, key: &str) -> bool {
        self.find(key).is_some_and(|n| n.is_key)
    }

    /// Returns all keys starting with `prefix`, in lexicographic order
    /// (by unicode scalar values). An empty prefix matches every key.
    pub fn keys_with_prefix(&self, prefix: &str) -> Vec<String> {
        let mut keys = Vec::default();
        if let Some(node) = self.find(prefix) {
            node.collect_keys(&mut prefix.to_string(), &mut keys);
        }
        keys
    }

    /// Exact-match probe: returns `key` if it is in the set.
    pub fn keys_that_match<'k>(&self, key: &'k str) -> Option<&'k str> {
        if self.contains(key) {
            Some(key)
        } else {
            None
        }
    }

    /// Returns the longest key in the set which is a prefix of `query`.
    pub fn longest_prefix_of(&self, query: &str) -> Option<String> {
        let mut node = &self.root;
        let mut longest = None;

        for (i, c) in query.char_indices() {
            match node.children.get(&c) {
                Some(child) => node = child,
                None => break,
            }
            if node.is_key {
                longest = Some(i + c.len_utf8());
            }
        }

        longest.map(|end| query[..end].to_string())
    }

    fn find(&self, prefix: &str) -> Option<&TrieNode> {
        let mut node = &self.root;
        for c in prefix.chars() {
            node = node.children.get(&c)?;
        }
        Some(node)
    }
}

impl<'a> FromIterator<&'a str> for TrieSet {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        let mut t = Self::new();
        for key in iter {
            t.add(key);
        }
        t
    }
}
