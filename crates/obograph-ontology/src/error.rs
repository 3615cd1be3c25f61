use std::path::PathBuf;

use obograph_obo::OboParseError;
use thiserror::Error;

use crate::TermId;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GraphError {
    #[error("term `{0}` is not in the graph")]
    MissingNode(TermId),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BuildError {
    #[error("term `{id}` is declared more than once")]
    DuplicateTerm { id: TermId },

    #[error("`{kind}` edge `{child}` -> `{parent}` references unknown term `{missing}`")]
    DanglingEdge {
        child: TermId,
        parent: TermId,
        kind: String,
        missing: TermId,
    },
}

/// Graph-shape violations that make an ontology unusable.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StructuralError {
    #[error("ontology has no root term (every term has a parent)")]
    NoRoot,

    #[error("ontology has {} root terms: {}", .roots.len(), .roots.join(", "))]
    MultipleRoots { roots: Vec<TermId> },

    #[error("ontology contains a cycle through `{term}`")]
    Cycle { term: TermId },
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read ontology input: {0}")]
    Read(#[source] std::io::Error),

    #[error(transparent)]
    Parse(#[from] OboParseError),

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error(transparent)]
    Structure(#[from] StructuralError),
}

/// Per-query failures. The ontology stays usable afterwards.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueryError {
    #[error("unknown term `{0}`")]
    UnknownTerm(TermId),

    #[error("{query}: cannot decide the relation of `{term}` to itself")]
    SelfRelation { query: &'static str, term: TermId },
}
