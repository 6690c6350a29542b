//! Role inheritance graph
//!
//! Directed edges point from a child role to the parent roles it inherits.
//! A role may have several parents and diamond shapes are legal; cycles are
//! rejected at insertion time.
//!
//! Ancestor enumeration is breadth-first starting from the direct parents,
//! in parent registration order, and never revisits a role. That order is the
//! precedence order the evaluator uses among inherited rules.


use indexmap::{IndexMap, IndexSet};
use std::collections::{HashSet, VecDeque};

/// Outcome of an edge insertion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeInsert {
    /// Edge recorded
    Added,
    /// Edge already present
    Exists,
    /// Edge would close a cycle; graph unchanged
    Cycle,
}

#[derive(Debug, Clone, Default)]
pub struct InheritanceGraph {
    /// child -> parents, both in insertion order
    parents: IndexMap<String, IndexSet<String>>,
}

impl InheritanceGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_edge(&self, role: &str, parent: &str) -> bool {
        self.parents
            .get(role)
            .is_some_and(|set| set.contains(parent))
    }

    /// Returns `true` if `target` is reachable from `start` by following parent edges
    ///
    /// `start` itself is not considered; the walk begins at its direct parents.
    pub fn reaches(&self, start: &str, target: &str) -> bool {
        let mut visited: HashSet<&str> = HashSet::new();
        let mut queue: VecDeque<&str> = VecDeque::new();

        if let Some(direct) = self.parents.get(start) {
            queue.extend(direct.iter().map(String::as_str));
        }

        while let Some(current) = queue.pop_front() {
            if current == target {
                return true;
            }
            if !visited.insert(current) {
                continue;
            }
            if let Some(next) = self.parents.get(current) {
                queue.extend(
                    next.iter()
                        .map(String::as_str)
                        .filter(|name| !visited.contains(name)),
                );
            }
        }

        false
    }

    /// Records `role` inheriting from `parent`
    ///
    /// Both names must already be validated by the caller. Self-inheritance
    /// is reported as a cycle.
    pub fn insert_edge(&mut self, role: &str, parent: &str) -> EdgeInsert {
        if self.has_edge(role, parent) {
            return EdgeInsert::Exists;
        }
        if role == parent || self.reaches(parent, role) {
            return EdgeInsert::Cycle;
        }

        self.parents
            .entry(role.to_string())
            .or_default()
            .insert(parent.to_string());
        EdgeInsert::Added
    }

    /// Direct parents of `role`, in registration order
    pub fn direct_parents(&self, role: &str) -> Vec<String> {
        self.parents
            .get(role)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// All ancestors of `role`, breadth-first, each exactly once
    pub fn ancestors(&self, role: &str) -> Vec<String> {
        let mut order: Vec<String> = Vec::new();
        let mut seen: HashSet<&str> = HashSet::new();
        let mut queue: VecDeque<&str> = VecDeque::new();

        seen.insert(role);
        if let Some(direct) = self.parents.get(role) {
            for parent in direct {
                if seen.insert(parent.as_str()) {
                    queue.push_back(parent.as_str());
                }
            }
        }

        while let Some(current) = queue.pop_front() {
            order.push(current.to_string());
            if let Some(next) = self.parents.get(current) {
                for parent in next {
                    if seen.insert(parent.as_str()) {
                        queue.push_back(parent.as_str());
                    }
                }
            }
        }

        order
    }

    /// Number of recorded edges
    pub fn edge_count(&self) -> usize {
        self.parents.values().map(IndexSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.edge_count() == 0
    }
}
