//! Read-only query layer over a loaded ontology graph.

use std::collections::{BTreeMap, BTreeSet, HashSet, VecDeque};
use std::fs;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

use obograph_obo::{parse_obo_with, Attributes, OboDocument, TermId, TermRecord};
use tracing::{debug, info};

use crate::{
    Direction, GraphBuilder, LoadError, LoadOptions, OboGraph, QueryError, StructuralError,
};

/// An ontology loaded from OBO text: the term graph plus its single root.
///
/// Edges run child → parent, so "ancestors" are reached by following
/// outgoing edges and "descendants" by following incoming ones. The root
/// is computed once at load time.
#[derive(Debug, Clone)]
pub struct Ontology {
    graph: OboGraph,
    root_id: TermId,
    header: Attributes,
    typedefs: Vec<TermRecord>,
}

impl Ontology {
    // ========================================================================
    // Loading
    // ========================================================================

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        Self::from_path_with(path, &LoadOptions::default())
    }

    pub fn from_path_with(path: impl AsRef<Path>, options: &LoadOptions) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let ontology = Self::from_obo_str_with(&text, options)?;
        info!(
            path = %path.display(),
            terms = ontology.len(),
            edges = ontology.graph.edge_count(),
            root = %ontology.root_id,
            "loaded ontology"
        );
        Ok(ontology)
    }

    pub fn from_reader(mut reader: impl Read, options: &LoadOptions) -> Result<Self, LoadError> {
        let mut text = String::new();
        reader.read_to_string(&mut text).map_err(LoadError::Read)?;
        Self::from_obo_str_with(&text, options)
    }

    pub fn from_obo_str(text: &str) -> Result<Self, LoadError> {
        Self::from_obo_str_with(text, &LoadOptions::default())
    }

    pub fn from_obo_str_with(text: &str, options: &LoadOptions) -> Result<Self, LoadError> {
        let document = parse_obo_with(text, &options.parse)?;
        Self::from_document(document, options)
    }

    pub fn from_document(document: OboDocument, options: &LoadOptions) -> Result<Self, LoadError> {
        let OboDocument {
            header,
            terms,
            typedefs,
            relationships,
        } = document;

        let mut builder = GraphBuilder::new();
        builder.add_terms(terms).add_relationships(relationships);
        let graph = builder.build()?;

        Ok(Self::from_parts(graph, header, typedefs, options.check_acyclic)?)
    }

    /// Wrap an already built graph (no header, no typedefs).
    pub fn from_graph(graph: OboGraph, check_acyclic: bool) -> Result<Self, StructuralError> {
        Self::from_parts(graph, Attributes::new(), Vec::new(), check_acyclic)
    }

    fn from_parts(
        graph: OboGraph,
        header: Attributes,
        typedefs: Vec<TermRecord>,
        check_acyclic: bool,
    ) -> Result<Self, StructuralError> {
        let root_id = find_root(&graph)?;
        if check_acyclic {
            ensure_acyclic(&graph)?;
        }
        debug!(root = %root_id, terms = graph.node_count(), "resolved ontology root");

        Ok(Self {
            graph,
            root_id,
            header,
            typedefs,
        })
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn root_id(&self) -> &str {
        &self.root_id
    }

    /// Header tags of the source file (`format-version`, `ontology`, ...).
    pub fn header(&self) -> &Attributes {
        &self.header
    }

    pub fn typedefs(&self) -> &[TermRecord] {
        &self.typedefs
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.graph.contains_node(id)
    }

    /// Shared view of the underlying graph.
    pub fn graph(&self) -> &OboGraph {
        &self.graph
    }

    /// Mutable view of the underlying graph.
    ///
    /// Changes are visible to every later query. The root id is not
    /// recomputed; keeping the graph a single-rooted DAG is up to the caller.
    pub fn graph_mut(&mut self) -> &mut OboGraph {
        &mut self.graph
    }

    /// Independent copy of the underlying graph.
    pub fn graph_deep_copy(&self) -> OboGraph {
        self.graph.clone()
    }

    pub fn into_graph(self) -> OboGraph {
        self.graph
    }

    // ========================================================================
    // Queries
    // ========================================================================

    fn require(&self, id: &str) -> Result<(), QueryError> {
        if self.graph.contains_node(id) {
            Ok(())
        } else {
            Err(QueryError::UnknownTerm(id.to_string()))
        }
    }

    fn closure(
        &self,
        id: &str,
        direction: Direction,
        include_self: bool,
    ) -> Result<BTreeSet<TermId>, QueryError> {
        let mut found = self
            .graph
            .reachable(id, direction)
            .ok_or_else(|| QueryError::UnknownTerm(id.to_string()))?;
        if include_self {
            found.insert(id.to_string());
        }
        Ok(found)
    }

    fn adjacent(
        &self,
        id: &str,
        direction: Direction,
        include_self: bool,
    ) -> Result<BTreeSet<TermId>, QueryError> {
        self.require(id)?;
        let mut found: BTreeSet<TermId> = self.graph.neighbors(id, direction).cloned().collect();
        if include_self {
            found.insert(id.to_string());
        }
        Ok(found)
    }

    /// All more generic terms: the transitive closure of the parent relation.
    pub fn ancestors(&self, id: &str, include_self: bool) -> Result<BTreeSet<TermId>, QueryError> {
        self.closure(id, Direction::Outgoing, include_self)
    }

    /// All more specific terms: the transitive closure of the child relation.
    pub fn descendants(
        &self,
        id: &str,
        include_self: bool,
    ) -> Result<BTreeSet<TermId>, QueryError> {
        self.closure(id, Direction::Incoming, include_self)
    }

    pub fn parents(&self, id: &str, include_self: bool) -> Result<BTreeSet<TermId>, QueryError> {
        self.adjacent(id, Direction::Outgoing, include_self)
    }

    pub fn children(&self, id: &str, include_self: bool) -> Result<BTreeSet<TermId>, QueryError> {
        self.adjacent(id, Direction::Incoming, include_self)
    }

    /// Snapshot of every term id.
    pub fn terms(&self) -> BTreeSet<TermId> {
        self.graph.node_ids().cloned().collect()
    }

    /// Snapshot of `id → name` for every term that has a name.
    pub fn term_id_to_label_map(&self) -> BTreeMap<TermId, String> {
        self.graph
            .nodes()
            .filter_map(|(id, attributes)| {
                let label = attributes.get("name")?.first()?;
                Some((id.clone(), label.clone()))
            })
            .collect()
    }

    pub fn label(&self, id: &str) -> Result<Option<&str>, QueryError> {
        Ok(self
            .attributes(id)?
            .get("name")
            .and_then(|names| names.first())
            .map(String::as_str))
    }

    pub fn attributes(&self, id: &str) -> Result<&Attributes, QueryError> {
        self.graph
            .attributes(id)
            .ok_or_else(|| QueryError::UnknownTerm(id.to_string()))
    }

    /// Whether `src` is a strict ancestor of `dest`.
    ///
    /// Fails with [`QueryError::SelfRelation`] when `src == dest`.
    pub fn exists_path(&self, src: &str, dest: &str) -> Result<bool, QueryError> {
        if src == dest {
            return Err(QueryError::SelfRelation {
                query: "exists_path",
                term: src.to_string(),
            });
        }
        self.require(src)?;
        Ok(self.ancestors(dest, false)?.contains(src))
    }

    /// Whether `t1` and `t2` share at least one direct parent.
    ///
    /// Fails with [`QueryError::SelfRelation`] when `t1 == t2`.
    pub fn terms_are_siblings(&self, t1: &str, t2: &str) -> Result<bool, QueryError> {
        if t1 == t2 {
            return Err(QueryError::SelfRelation {
                query: "terms_are_siblings",
                term: t1.to_string(),
            });
        }
        let parents = self.parents(t1, false)?;
        self.require(t2)?;
        Ok(self.graph.successors(t2).any(|p| parents.contains(p)))
    }
}

impl FromStr for Ontology {
    type Err = LoadError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        Self::from_obo_str(text)
    }
}

// ============================================================================
// Load-time structure checks
// ============================================================================

/// The unique term without outgoing (parent) edges.
fn find_root(graph: &OboGraph) -> Result<TermId, StructuralError> {
    let mut roots: Vec<TermId> = graph
        .node_ids()
        .filter(|id| graph.successors(id).next().is_none())
        .cloned()
        .collect();

    match roots.len() {
        0 => Err(StructuralError::NoRoot),
        1 => Ok(roots.remove(0)),
        _ => {
            roots.sort();
            Err(StructuralError::MultipleRoots { roots })
        }
    }
}

/// Kahn's algorithm from the root downwards. Whatever is never released
/// sits on, or below, a cycle.
fn ensure_acyclic(graph: &OboGraph) -> Result<(), StructuralError> {
    let mut pending: BTreeMap<&str, usize> = graph
        .node_ids()
        .map(|id| (id.as_str(), graph.successors(id).count()))
        .collect();
    let mut ready: VecDeque<&str> = pending
        .iter()
        .filter(|&(_, &count)| count == 0)
        .map(|(&id, _)| id)
        .collect();

    while let Some(id) = ready.pop_front() {
        pending.remove(id);
        for child in graph.predecessors(id) {
            if let Some(count) = pending.get_mut(child.as_str()) {
                *count -= 1;
                if *count == 0 {
                    ready.push_back(child.as_str());
                }
            }
        }
    }

    let Some((&start, _)) = pending.iter().next() else {
        return Ok(());
    };

    // Every remaining term still has a remaining parent, so walking upwards
    // through remaining terms must revisit one that lies on a cycle.
    let mut seen: HashSet<&str> = HashSet::new();
    let mut current = start;
    while seen.insert(current) {
        match graph
            .successors(current)
            .find(|parent| pending.contains_key(parent.as_str()))
        {
            Some(parent) => current = parent.as_str(),
            None => break,
        }
    }
    Err(StructuralError::Cycle {
        term: current.to_string(),
    })
}
