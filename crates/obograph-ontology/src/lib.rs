//! Ontology graphs loaded from OBO files.
//!
//! ```text
//! OBO text ──parse──► OboDocument ──GraphBuilder──► OboGraph ──► Ontology
//!                      (obograph-obo)                  │          root + queries
//!                                                      └─ child → parent edges
//! ```
//!
//! - [`OboGraph`]: a directed multigraph keyed by term id with forward and
//!   backward adjacency, plus breadth-first reachability.
//! - [`GraphBuilder`]: order-independent construction from parsed records.
//! - [`Ontology`]: single-rooted, acyclic view answering ancestor/descendant
//!   closure, parent/child, path-existence and sibling queries.
//!
//! ```
//! use obograph_ontology::Ontology;
//!
//! let onto: Ontology = "[Term]\nid: R\n\n[Term]\nid: C\nis_a: R\n\n[Term]\nid: G\nis_a: C\n"
//!     .parse()
//!     .unwrap();
//! assert_eq!(onto.root_id(), "R");
//! assert!(onto.exists_path("R", "G").unwrap());
//! assert!(!onto.exists_path("G", "R").unwrap());
//! ```

pub mod builder;
mod error;
pub mod graph;
mod ontology;
mod options;

pub use builder::GraphBuilder;
pub use error::{BuildError, GraphError, LoadError, QueryError, StructuralError};
pub use graph::{Direction, EdgeKinds, GraphSnapshot, OboGraph};
pub use obograph_obo::{Attributes, ParseOptions, TermId};
pub use ontology::Ontology;
pub use options::LoadOptions;
