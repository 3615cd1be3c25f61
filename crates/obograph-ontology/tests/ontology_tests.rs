use std::collections::BTreeSet;
use std::io::Write;
use std::path::PathBuf;

use obograph_ontology::{
    LoadError, LoadOptions, OboGraph, Ontology, ParseOptions, QueryError, StructuralError,
};

const ROOT: &str = "TAXRANK:0000000";

fn fixture_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/data/taxrank.obo")
}

fn taxrank() -> Ontology {
    Ontology::from_path(fixture_path()).expect("load taxrank fixture")
}

fn ids(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// R ← C ← G, plus X and Y under P and Z under Q, all under R.
const HIERARCHY: &str = "\
[Term]\nid: R\nname: rank\n
[Term]\nid: C\nname: child\nis_a: R\n
[Term]\nid: G\nname: grandchild\nis_a: C\n
[Term]\nid: P\nis_a: R\n
[Term]\nid: Q\nis_a: R\n
[Term]\nid: X\nis_a: P\n
[Term]\nid: Y\nis_a: P\n
[Term]\nid: Z\nis_a: Q\n
";

fn hierarchy() -> Ontology {
    HIERARCHY.parse().expect("parse hierarchy")
}

// ============================================================================
// Fixture file
// ============================================================================

#[test]
fn loads_fixture_with_header_and_typedefs() {
    let onto = taxrank();
    assert_eq!(onto.root_id(), ROOT);
    assert_eq!(onto.len(), 11);
    assert!(!onto.contains("TAXRANK:0000099"), "obsolete term is dropped");
    assert_eq!(onto.header()["ontology"], vec!["taxrank"]);
    assert_eq!(onto.typedefs().len(), 1);
    assert_eq!(onto.typedefs()[0].id, "part_of");
}

#[test]
fn fixture_ancestors() {
    let onto = taxrank();
    assert!(onto.ancestors(ROOT, false).unwrap().is_empty());
    assert_eq!(onto.ancestors(ROOT, true).unwrap(), ids(&[ROOT]));

    let term = "TAXRANK:0000003";
    assert_eq!(onto.ancestors(term, false).unwrap(), ids(&[ROOT]));
    assert_eq!(onto.ancestors(term, true).unwrap(), ids(&[ROOT, term]));
}

#[test]
fn fixture_descendants_children_and_parents() {
    let onto = taxrank();
    let below = onto.descendants(ROOT, false).unwrap();
    assert_eq!(below.len(), 10);
    assert_eq!(onto.descendants(ROOT, true).unwrap().len(), below.len() + 1);

    let children = onto.children(ROOT, false).unwrap();
    assert!(!children.is_empty());
    assert_eq!(onto.children(ROOT, true).unwrap().len(), children.len() + 1);

    let term = "TAXRANK:0000004";
    assert_eq!(onto.parents(term, false).unwrap(), ids(&[ROOT]));
    assert_eq!(onto.parents(term, true).unwrap(), ids(&[ROOT, term]));
}

#[test]
fn fixture_labels() {
    let onto = taxrank();
    let labels = onto.term_id_to_label_map();
    assert_eq!(labels.len(), 11);
    assert_eq!(labels[ROOT], "taxonomic_rank");
    assert_eq!(labels["TAXRANK:0000001"], "phylum");
    assert_eq!(
        labels["TAXRANK:0000010"],
        "subclass {note=\"kept in the value\"} of things"
    );
    assert_eq!(onto.label("TAXRANK:0000005").unwrap(), Some("genus"));

    let species = onto.attributes("TAXRANK:0000006").unwrap();
    assert_eq!(
        species["def"],
        vec!["\"The basic unit of biological classification, and a taxonomic rank.\" [TAXRANK:curators]"]
    );
}

#[test]
fn fixture_exists_path() {
    let onto = taxrank();
    let (t1, t2, t3) = (ROOT, "TAXRANK:0000004", "TAXRANK:0000005");
    assert!(onto.exists_path(t1, t2).unwrap());
    assert!(onto.exists_path(t1, t3).unwrap());
    assert!(!onto.exists_path(t2, t1).unwrap());
    assert!(!onto.exists_path(t2, t3).unwrap());
}

#[test]
fn fixture_siblings() {
    let onto = taxrank();
    let (t1, t2, t3) = (ROOT, "TAXRANK:0000004", "TAXRANK:0000005");
    assert!(onto.terms_are_siblings(t2, t3).unwrap());
    assert!(!onto.terms_are_siblings(t1, t2).unwrap());
    assert!(!onto.terms_are_siblings(t1, t3).unwrap());
}

#[test]
fn shared_graph_mutations_are_visible_but_deep_copies_are_isolated() {
    let mut onto = taxrank();
    let before = onto.len();

    let mut copy = onto.graph_deep_copy();
    copy.remove_node("TAXRANK:0000004");
    assert_eq!(copy.node_count(), before - 1);
    assert_eq!(onto.len(), before);
    assert!(onto.contains("TAXRANK:0000004"));
    assert!(onto.terms_are_siblings("TAXRANK:0000004", "TAXRANK:0000005").unwrap());

    onto.graph_mut().remove_node("TAXRANK:0000004");
    assert_eq!(onto.graph().node_count(), before - 1);
    assert_eq!(
        onto.parents("TAXRANK:0000004", false),
        Err(QueryError::UnknownTerm("TAXRANK:0000004".to_string()))
    );
    assert!(!onto.children(ROOT, false).unwrap().contains("TAXRANK:0000004"));
}

#[test]
fn terms_and_label_map_are_snapshots() {
    let onto = taxrank();
    let mut terms = onto.terms();
    terms.clear();
    let mut labels = onto.term_id_to_label_map();
    labels.insert(ROOT.to_string(), "renamed".to_string());

    assert_eq!(onto.terms().len(), 11);
    assert_eq!(onto.label(ROOT).unwrap(), Some("taxonomic_rank"));
}

#[test]
fn loads_from_reader() {
    let text = std::fs::read(fixture_path()).unwrap();
    let onto = Ontology::from_reader(text.as_slice(), &LoadOptions::default()).unwrap();
    assert_eq!(onto.root_id(), ROOT);
}

#[test]
fn keeping_obsolete_terms_adds_a_second_root() {
    let options = LoadOptions {
        parse: ParseOptions {
            ignore_obsolete: false,
            ..ParseOptions::default()
        },
        ..LoadOptions::default()
    };
    let err = Ontology::from_path_with(fixture_path(), &options).unwrap_err();
    match err {
        LoadError::Structure(StructuralError::MultipleRoots { roots }) => {
            assert_eq!(roots, vec![ROOT.to_string(), "TAXRANK:0000099".to_string()]);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn missing_file_is_an_io_error() {
    let err = Ontology::from_path("/definitely/not/here.obo").unwrap_err();
    assert!(matches!(err, LoadError::Io { .. }), "err={err}");
}

#[test]
fn loads_from_a_temp_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(HIERARCHY.as_bytes()).unwrap();
    let onto = Ontology::from_path(file.path()).unwrap();
    assert_eq!(onto.root_id(), "R");
}

// ============================================================================
// Rank hierarchy scenarios
// ============================================================================

#[test]
fn grandchild_closure() {
    let onto = hierarchy();
    assert_eq!(onto.root_id(), "R");
    assert_eq!(onto.ancestors("G", false).unwrap(), ids(&["C", "R"]));
    assert_eq!(onto.ancestors("G", true).unwrap(), ids(&["G", "C", "R"]));
    assert_eq!(onto.parents("G", false).unwrap(), ids(&["C"]));
    assert!(onto.children("R", false).unwrap().contains("C"));
    assert_eq!(onto.descendants("C", false).unwrap(), ids(&["G"]));
    assert!(onto.exists_path("R", "G").unwrap());
    assert!(!onto.exists_path("G", "R").unwrap());
}

#[test]
fn siblings_share_a_direct_parent() {
    let onto = hierarchy();
    assert!(onto.terms_are_siblings("X", "Y").unwrap());
    assert!(!onto.terms_are_siblings("X", "Z").unwrap());
    // Same grandparent is not enough.
    assert!(!onto.terms_are_siblings("X", "G").unwrap());
}

#[test]
fn self_relations_are_undecidable() {
    let onto = hierarchy();
    assert_eq!(
        onto.exists_path("C", "C"),
        Err(QueryError::SelfRelation {
            query: "exists_path",
            term: "C".to_string()
        })
    );
    assert_eq!(
        onto.terms_are_siblings("X", "X"),
        Err(QueryError::SelfRelation {
            query: "terms_are_siblings",
            term: "X".to_string()
        })
    );
    // The ontology is still usable afterwards.
    assert!(onto.exists_path("R", "C").unwrap());
}

#[test]
fn unknown_terms_are_reported() {
    let onto = hierarchy();
    let unknown = || QueryError::UnknownTerm("nope".to_string());
    assert_eq!(onto.ancestors("nope", false), Err(unknown()));
    assert_eq!(onto.descendants("nope", true), Err(unknown()));
    assert_eq!(onto.parents("nope", false), Err(unknown()));
    assert_eq!(onto.children("nope", true), Err(unknown()));
    assert_eq!(onto.label("nope"), Err(unknown()));
    assert_eq!(onto.exists_path("nope", "G"), Err(unknown()));
    assert_eq!(onto.exists_path("R", "nope"), Err(unknown()));
    assert_eq!(onto.terms_are_siblings("X", "nope"), Err(unknown()));
    assert_eq!(onto.terms_are_siblings("nope", "X"), Err(unknown()));
}

#[test]
fn unlabeled_terms_are_left_out_of_the_label_map() {
    let labels = hierarchy().term_id_to_label_map();
    assert_eq!(
        labels.keys().cloned().collect::<BTreeSet<_>>(),
        ids(&["R", "C", "G"])
    );
}

#[test]
fn relationship_edges_count_as_parents() {
    let onto: Ontology = "[Term]\nid: R\n\n[Term]\nid: A\nis_a: R\n\n[Term]\nid: B\nis_a: R\nrelationship: part_of A\n"
        .parse()
        .unwrap();
    assert_eq!(onto.parents("B", false).unwrap(), ids(&["A", "R"]));
    assert!(onto.exists_path("A", "B").unwrap());
    assert_eq!(
        onto.graph().edge_kinds("B", "A").unwrap().iter().collect::<Vec<_>>(),
        vec!["part_of"]
    );
}

// ============================================================================
// Load failures
// ============================================================================

#[test]
fn undeclared_parent_fails_the_load() {
    let err = Ontology::from_obo_str("[Term]\nid: R\n\n[Term]\nid: C\nis_a: NOWHERE\n").unwrap_err();
    assert!(matches!(err, LoadError::Parse(_)), "err={err}");
}

#[test]
fn multiple_roots_fail_the_load() {
    let err = Ontology::from_obo_str("[Term]\nid: A\n\n[Term]\nid: B\n").unwrap_err();
    match err {
        LoadError::Structure(StructuralError::MultipleRoots { roots }) => {
            assert_eq!(roots, vec!["A".to_string(), "B".to_string()])
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn empty_input_has_no_root() {
    let err = Ontology::from_obo_str("format-version: 1.2\n").unwrap_err();
    assert!(
        matches!(err, LoadError::Structure(StructuralError::NoRoot)),
        "err={err}"
    );
}

#[test]
fn cycles_fail_the_load() {
    let text = "[Term]\nid: R\n\n[Term]\nid: A\nis_a: R\nis_a: C\n\n[Term]\nid: B\nis_a: A\n\n[Term]\nid: C\nis_a: B\n\n[Term]\nid: D\nis_a: C\n";
    let err = Ontology::from_obo_str(text).unwrap_err();
    match err {
        LoadError::Structure(StructuralError::Cycle { term }) => {
            assert!(["A", "B", "C"].contains(&term.as_str()), "term={term}");
        }
        other => panic!("unexpected error: {other}"),
    }

    let unchecked = LoadOptions {
        check_acyclic: false,
        ..LoadOptions::default()
    };
    let onto = Ontology::from_obo_str_with(text, &unchecked).unwrap();
    assert_eq!(onto.ancestors("D", false).unwrap(), ids(&["A", "B", "C", "R"]));
    assert!(!onto.ancestors("A", false).unwrap().contains("A"));
}

#[test]
fn self_loop_is_a_cycle() {
    let err = Ontology::from_obo_str("[Term]\nid: R\n\n[Term]\nid: A\nis_a: R\nis_a: A\n").unwrap_err();
    assert!(
        matches!(err, LoadError::Structure(StructuralError::Cycle { ref term }) if term == "A"),
        "err={err}"
    );
}

#[test]
fn wraps_a_hand_built_graph() {
    let mut graph = OboGraph::new();
    graph.add_node("root", Default::default());
    graph.add_node("leaf", Default::default());
    graph.add_edge("leaf", "root", "is_a").unwrap();

    let onto = Ontology::from_graph(graph, true).unwrap();
    assert_eq!(onto.root_id(), "root");
    assert!(onto.header().is_empty());
    assert_eq!(onto.ancestors("leaf", false).unwrap(), ids(&["root"]));
}
