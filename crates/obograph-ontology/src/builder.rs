//! Materializes parsed records into an [`OboGraph`].

use obograph_obo::{RelationshipRecord, TermRecord};
use tracing::debug;

use crate::{BuildError, GraphError, OboGraph};

/// Collects terms and relationships in any order, then builds the graph.
///
/// Edges may name terms added before or after them; they are only
/// resolved in [`GraphBuilder::build`].
#[derive(Debug, Clone, Default)]
pub struct GraphBuilder {
    terms: Vec<TermRecord>,
    relationships: Vec<RelationshipRecord>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_term(&mut self, term: TermRecord) -> &mut Self {
        self.terms.push(term);
        self
    }

    pub fn add_terms(&mut self, terms: impl IntoIterator<Item = TermRecord>) -> &mut Self {
        self.terms.extend(terms);
        self
    }

    pub fn add_relationship(&mut self, relationship: RelationshipRecord) -> &mut Self {
        self.relationships.push(relationship);
        self
    }

    pub fn add_relationships(
        &mut self,
        relationships: impl IntoIterator<Item = RelationshipRecord>,
    ) -> &mut Self {
        self.relationships.extend(relationships);
        self
    }

    pub fn build(self) -> Result<OboGraph, BuildError> {
        let mut graph = OboGraph::new();

        for term in self.terms {
            if graph.contains_node(&term.id) {
                return Err(BuildError::DuplicateTerm { id: term.id });
            }
            graph.add_node(term.id, term.attributes);
        }

        for rel in self.relationships {
            graph
                .add_edge(&rel.child, &rel.parent, &rel.kind)
                .map_err(|GraphError::MissingNode(missing)| BuildError::DanglingEdge {
                    child: rel.child,
                    parent: rel.parent,
                    kind: rel.kind,
                    missing,
                })?;
        }

        debug!(
            terms = graph.node_count(),
            edges = graph.edge_count(),
            "built ontology graph"
        );
        Ok(graph)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rel(child: &str, parent: &str) -> RelationshipRecord {
        RelationshipRecord {
            child: child.to_string(),
            parent: parent.to_string(),
            kind: "is_a".to_string(),
            line: 0,
        }
    }

    #[test]
    fn edges_may_precede_their_terms() {
        let mut builder = GraphBuilder::new();
        builder
            .add_relationship(rel("leaf", "root"))
            .add_term(TermRecord::new("leaf").with_attribute("name", "a leaf"))
            .add_term(TermRecord::new("root"));
        let graph = builder.build().unwrap();

        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.attributes("leaf").unwrap()["name"], vec!["a leaf"]);
    }

    #[test]
    fn dangling_edges_are_rejected() {
        let mut builder = GraphBuilder::new();
        builder
            .add_term(TermRecord::new("leaf"))
            .add_relationship(rel("leaf", "ghost"));
        assert_eq!(
            builder.build().unwrap_err(),
            BuildError::DanglingEdge {
                child: "leaf".to_string(),
                parent: "ghost".to_string(),
                kind: "is_a".to_string(),
                missing: "ghost".to_string(),
            }
        );
    }

    #[test]
    fn duplicate_terms_are_rejected() {
        let mut builder = GraphBuilder::new();
        builder.add_terms([TermRecord::new("a"), TermRecord::new("a")]);
        assert_eq!(
            builder.build().unwrap_err(),
            BuildError::DuplicateTerm { id: "a".to_string() }
        );
    }
}
