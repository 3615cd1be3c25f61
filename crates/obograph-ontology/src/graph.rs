//! Directed multigraph keyed by term id.
//!
//! Edges point from a specific term to the more generic term it
//! generalizes to (child → parent). Each ordered pair of nodes may carry
//! several edges as long as their kinds differ (`is_a`, `part_of`, ...).
//!
//! Two mirrored indexes are kept so both directions are O(1) to enter:
//! - `successors`: child → parent → kinds
//! - `predecessors`: parent → child → kinds

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};

use serde::{Deserialize, Serialize};

use crate::{Attributes, GraphError, TermId};

/// Kinds of the parallel edges between one ordered pair of nodes.
pub type EdgeKinds = BTreeSet<String>;

type Adjacency = HashMap<TermId, BTreeMap<TermId, EdgeKinds>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Towards more generic terms (child → parent).
    Outgoing,
    /// Towards more specific terms (parent → child).
    Incoming,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OboGraph {
    nodes: HashMap<TermId, Attributes>,
    successors: Adjacency,
    predecessors: Adjacency,
    edge_count: usize,
}

impl OboGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of edges, counting parallel edges of different kinds separately.
    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    /// Insert a node, or replace the attributes of an existing one (its
    /// edges are kept). Returns the previous attributes.
    pub fn add_node(&mut self, id: impl Into<TermId>, attributes: Attributes) -> Option<Attributes> {
        self.nodes.insert(id.into(), attributes)
    }

    /// Remove a node and every edge touching it.
    pub fn remove_node(&mut self, id: &str) -> Option<Attributes> {
        let attributes = self.nodes.remove(id)?;

        if let Some(parents) = self.successors.remove(id) {
            for (parent, kinds) in parents {
                self.edge_count -= kinds.len();
                detach(&mut self.predecessors, &parent, id);
            }
        }
        if let Some(children) = self.predecessors.remove(id) {
            for (child, kinds) in children {
                self.edge_count -= kinds.len();
                detach(&mut self.successors, &child, id);
            }
        }

        Some(attributes)
    }

    /// Add a `kind` edge from `child` to `parent`. Both nodes must exist.
    ///
    /// Returns `false` when an edge of the same kind already links the pair.
    pub fn add_edge(&mut self, child: &str, parent: &str, kind: &str) -> Result<bool, GraphError> {
        for end in [child, parent] {
            if !self.contains_node(end) {
                return Err(GraphError::MissingNode(end.to_string()));
            }
        }

        let added = self
            .successors
            .entry(child.to_string())
            .or_default()
            .entry(parent.to_string())
            .or_default()
            .insert(kind.to_string());
        if added {
            self.predecessors
                .entry(parent.to_string())
                .or_default()
                .entry(child.to_string())
                .or_default()
                .insert(kind.to_string());
            self.edge_count += 1;
        }
        Ok(added)
    }

    pub fn remove_edge(&mut self, child: &str, parent: &str, kind: &str) -> bool {
        let removed = remove_kind(&mut self.successors, child, parent, kind);
        if removed {
            remove_kind(&mut self.predecessors, parent, child, kind);
            self.edge_count -= 1;
        }
        removed
    }

    pub fn attributes(&self, id: &str) -> Option<&Attributes> {
        self.nodes.get(id)
    }

    pub fn attributes_mut(&mut self, id: &str) -> Option<&mut Attributes> {
        self.nodes.get_mut(id)
    }

    /// Direct neighbors in `direction`; empty for unknown ids.
    pub fn neighbors<'a>(
        &'a self,
        id: &str,
        direction: Direction,
    ) -> impl Iterator<Item = &'a TermId> + 'a {
        let adjacency = match direction {
            Direction::Outgoing => &self.successors,
            Direction::Incoming => &self.predecessors,
        };
        adjacency.get(id).into_iter().flat_map(|targets| targets.keys())
    }

    /// Immediate parents (more generic terms).
    pub fn successors<'a>(&'a self, id: &str) -> impl Iterator<Item = &'a TermId> + 'a {
        self.neighbors(id, Direction::Outgoing)
    }

    /// Immediate children (more specific terms).
    pub fn predecessors<'a>(&'a self, id: &str) -> impl Iterator<Item = &'a TermId> + 'a {
        self.neighbors(id, Direction::Incoming)
    }

    pub fn out_degree(&self, id: &str) -> usize {
        degree(&self.successors, id)
    }

    pub fn in_degree(&self, id: &str) -> usize {
        degree(&self.predecessors, id)
    }

    pub fn edge_kinds(&self, child: &str, parent: &str) -> Option<&EdgeKinds> {
        self.successors.get(child)?.get(parent)
    }

    /// Nodes in unspecified order.
    pub fn nodes(&self) -> impl Iterator<Item = (&TermId, &Attributes)> {
        self.nodes.iter()
    }

    pub fn node_ids(&self) -> impl Iterator<Item = &TermId> {
        self.nodes.keys()
    }

    /// `(child, parent, kind)` for every edge, in unspecified order.
    pub fn edges(&self) -> impl Iterator<Item = (&TermId, &TermId, &str)> {
        self.successors.iter().flat_map(|(child, parents)| {
            parents.iter().flat_map(move |(parent, kinds)| {
                kinds.iter().map(move |kind| (child, parent, kind.as_str()))
            })
        })
    }

    /// Every node reachable from `start` by one or more steps in `direction`.
    ///
    /// `start` itself is never part of the result. `None` if `start` is not
    /// in the graph.
    pub fn reachable(&self, start: &str, direction: Direction) -> Option<BTreeSet<TermId>> {
        if !self.contains_node(start) {
            return None;
        }

        let mut visited: HashSet<&TermId> = HashSet::new();
        let mut queue: VecDeque<&TermId> = self.neighbors(start, direction).collect();
        while let Some(id) = queue.pop_front() {
            if id.as_str() == start || !visited.insert(id) {
                continue;
            }
            queue.extend(self.neighbors(id, direction));
        }

        Some(visited.into_iter().cloned().collect())
    }

    /// Sorted, serializable copy of the whole graph.
    pub fn snapshot(&self) -> GraphSnapshot {
        let mut nodes: Vec<NodeSnapshot> = self
            .nodes
            .iter()
            .map(|(id, attributes)| NodeSnapshot {
                id: id.clone(),
                attributes: attributes.clone(),
            })
            .collect();
        nodes.sort_by(|a, b| a.id.cmp(&b.id));

        let mut edges: Vec<EdgeSnapshot> = self
            .edges()
            .map(|(child, parent, kind)| EdgeSnapshot {
                child: child.clone(),
                parent: parent.clone(),
                kind: kind.to_string(),
            })
            .collect();
        edges.sort();

        GraphSnapshot { nodes, edges }
    }
}

fn degree(adjacency: &Adjacency, id: &str) -> usize {
    adjacency
        .get(id)
        .map(|targets| targets.values().map(BTreeSet::len).sum())
        .unwrap_or(0)
}

fn detach(adjacency: &mut Adjacency, from: &str, to: &str) {
    if let Some(targets) = adjacency.get_mut(from) {
        targets.remove(to);
        if targets.is_empty() {
            adjacency.remove(from);
        }
    }
}

fn remove_kind(adjacency: &mut Adjacency, from: &str, to: &str, kind: &str) -> bool {
    let Some(targets) = adjacency.get_mut(from) else {
        return false;
    };
    let Some(kinds) = targets.get_mut(to) else {
        return false;
    };
    let removed = kinds.remove(kind);
    if kinds.is_empty() {
        targets.remove(to);
    }
    if targets.is_empty() {
        adjacency.remove(from);
    }
    removed
}

// ============================================================================
// Snapshot (export format)
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub nodes: Vec<NodeSnapshot>,
    pub edges: Vec<EdgeSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSnapshot {
    pub id: TermId,
    pub attributes: Attributes,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EdgeSnapshot {
    pub child: TermId,
    pub parent: TermId,
    pub kind: String,
}
