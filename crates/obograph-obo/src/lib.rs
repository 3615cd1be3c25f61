//! OBO flat-file parsing (`.obo`)
//!
//! This crate reads the stanza-based OBO text format and produces plain
//! records: term stanzas with their tag-value attributes, typedef stanzas,
//! the header block, and the directed parent edges declared through `is_a`
//! and `relationship` tags.
//!
//! It performs the checks that only need the text itself (syntax, duplicate
//! ids, references to undeclared terms). Graph-level invariants (single
//! root, acyclicity) are enforced by `obograph-ontology` at load time.
//!
//! ```
//! use obograph_obo::parse_obo;
//!
//! let doc = parse_obo(
//!     "format-version: 1.2\n\n[Term]\nid: X:0\nname: root\n\n[Term]\nid: X:1\nname: leaf\nis_a: X:0 ! root\n",
//! )
//! .unwrap();
//! assert_eq!(doc.terms.len(), 2);
//! assert_eq!(doc.relationships[0].parent, "X:0");
//! ```

pub mod document;
mod error;
pub mod lexer;

use std::collections::BTreeMap;

pub use document::{
    parse_obo, parse_obo_with, OboDocument, ParseOptions, RelationshipRecord, StanzaKind,
    TermRecord, IS_A,
};
pub use error::OboParseError;
pub use lexer::{parse_tag_value_line, unescape_value, Qualifier, TagValue};

/// A term identifier such as `TAXRANK:0000001`.
pub type TermId = String;

/// Tag → values, in file order. Every tag is treated as repeatable.
pub type Attributes = BTreeMap<String, Vec<String>>;
