//! Stanza assembly: logical lines → header, term/typedef records and
//! parent edges.

use std::collections::HashMap;
use std::fmt;

use nom::{
    bytes::complete::take_till1,
    character::complete::{char as pchar, space0},
    combinator::{all_consuming, opt, rest},
    sequence::{delimited, preceded, terminated},
    IResult,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::lexer::{logical_lines, parse_tag_value_line, TagValue};
use crate::{Attributes, OboParseError, TermId};

/// Edge kind used for `is_a` tags.
pub const IS_A: &str = "is_a";

// ============================================================================
// Records
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StanzaKind {
    Term,
    Typedef,
    Instance,
    Other(String),
}

impl StanzaKind {
    fn from_header(name: &str) -> Self {
        match name {
            "Term" => StanzaKind::Term,
            "Typedef" => StanzaKind::Typedef,
            "Instance" => StanzaKind::Instance,
            other => StanzaKind::Other(other.to_string()),
        }
    }
}

impl fmt::Display for StanzaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StanzaKind::Term => write!(f, "Term"),
            StanzaKind::Typedef => write!(f, "Typedef"),
            StanzaKind::Instance => write!(f, "Instance"),
            StanzaKind::Other(name) => write!(f, "{name}"),
        }
    }
}

/// A `[Term]` or `[Typedef]` stanza. `attributes` holds every tag except `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermRecord {
    pub id: TermId,
    pub attributes: Attributes,
    /// Line of the stanza header.
    pub line: usize,
}

impl TermRecord {
    pub fn new(id: impl Into<TermId>) -> Self {
        Self {
            id: id.into(),
            attributes: Attributes::new(),
            line: 0,
        }
    }

    pub fn with_attribute(mut self, tag: &str, value: &str) -> Self {
        self.attributes
            .entry(tag.to_string())
            .or_default()
            .push(value.to_string());
        self
    }

    pub fn values(&self, tag: &str) -> &[String] {
        self.attributes.get(tag).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn first(&self, tag: &str) -> Option<&str> {
        self.values(tag).first().map(String::as_str)
    }

    /// The `name` tag (the term label).
    pub fn name(&self) -> Option<&str> {
        self.first("name")
    }

    pub fn is_obsolete(&self) -> bool {
        self.first("is_obsolete")
            .map_or(false, |v| v.eq_ignore_ascii_case("true"))
    }

    /// Text of the quoted part of the `def` tag, without its xref list.
    ///
    /// The definition ends at the first unescaped `"` followed by the xref
    /// list (`[...]`) or by the end of the value, so quoted xref
    /// descriptions are not swallowed.
    pub fn definition(&self) -> Option<&str> {
        let body = self.first("def")?.trim_start().strip_prefix('"')?;
        let mut escaped = false;
        for (idx, c) in body.char_indices() {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => {
                    let after = body[idx + 1..].trim_start();
                    if after.is_empty() || after.starts_with('[') {
                        return Some(&body[..idx]);
                    }
                }
                _ => {}
            }
        }
        None
    }
}

/// A directed edge from a specific term to a more generic one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RelationshipRecord {
    pub child: TermId,
    pub parent: TermId,
    /// `is_a`, or the relationship type of a `relationship` tag.
    pub kind: String,
    pub line: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OboDocument {
    /// Tag-value pairs before the first stanza.
    pub header: Attributes,
    pub terms: Vec<TermRecord>,
    pub typedefs: Vec<TermRecord>,
    pub relationships: Vec<RelationshipRecord>,
}

impl OboDocument {
    fn header_value(&self, tag: &str) -> Option<&str> {
        self.header
            .get(tag)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    pub fn format_version(&self) -> Option<&str> {
        self.header_value("format-version")
    }

    pub fn data_version(&self) -> Option<&str> {
        self.header_value("data-version")
    }

    /// The `ontology` header tag (e.g. `taxrank`).
    pub fn ontology_name(&self) -> Option<&str> {
        self.header_value("ontology")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseOptions {
    /// Drop `[Term]` stanzas tagged `is_obsolete: true`.
    pub ignore_obsolete: bool,
    /// Turn `relationship: <type> <id>` tags into edges alongside `is_a`.
    pub include_relationships: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            ignore_obsolete: true,
            include_relationships: true,
        }
    }
}

// ============================================================================
// Parser
// ============================================================================

#[derive(Debug)]
struct RawStanza {
    kind: StanzaKind,
    line: usize,
    tags: Vec<TagValue>,
}

impl RawStanza {
    fn id(&self) -> Result<&str, OboParseError> {
        let mut ids = self.tags.iter().filter(|tv| tv.tag == "id");
        let first = ids.next().ok_or_else(|| OboParseError::MissingId {
            stanza: self.kind.to_string(),
            line: self.line,
        })?;
        if let Some(extra) = ids.next() {
            return Err(OboParseError::Line {
                line: extra.line,
                message: format!("stanza declares more than one `id` (first: `{}`)", first.value),
            });
        }
        Ok(first.value.as_str())
    }

    fn relationships(
        &self,
        id: &str,
        options: &ParseOptions,
    ) -> Result<Vec<RelationshipRecord>, OboParseError> {
        let mut out = Vec::new();
        for tv in &self.tags {
            let (kind, parent) = match tv.tag.as_str() {
                IS_A => (IS_A, tv.value.split_whitespace().next()),
                "relationship" if options.include_relationships => {
                    let mut tokens = tv.value.split_whitespace();
                    match (tokens.next(), tokens.next()) {
                        (Some(kind), Some(parent)) => (kind, Some(parent)),
                        _ => {
                            return Err(OboParseError::Line {
                                line: tv.line,
                                message: "`relationship` expects `<type> <term id>`".to_string(),
                            })
                        }
                    }
                }
                _ => continue,
            };
            let parent = parent.ok_or_else(|| OboParseError::Line {
                line: tv.line,
                message: format!("`{kind}` is missing its target term id"),
            })?;
            out.push(RelationshipRecord {
                child: id.to_string(),
                parent: parent.to_string(),
                kind: kind.to_string(),
                line: tv.line,
            });
        }
        Ok(out)
    }

    fn into_record(self) -> Result<TermRecord, OboParseError> {
        let id = self.id()?.to_string();
        let mut attributes = Attributes::new();
        for tv in self.tags {
            if tv.tag == "id" {
                continue;
            }
            attributes.entry(tv.tag).or_default().push(tv.value);
        }
        Ok(TermRecord {
            id,
            attributes,
            line: self.line,
        })
    }
}

/// Parse OBO text with [`ParseOptions::default`].
pub fn parse_obo(text: &str) -> Result<OboDocument, OboParseError> {
    parse_obo_with(text, &ParseOptions::default())
}

pub fn parse_obo_with(text: &str, options: &ParseOptions) -> Result<OboDocument, OboParseError> {
    let mut header = Attributes::new();
    let mut stanzas: Vec<RawStanza> = Vec::new();

    for logical in logical_lines(text)? {
        let line = logical.text.trim();
        if line.is_empty() || line.starts_with('!') {
            continue;
        }

        if line.starts_with('[') {
            let name = parse_stanza_header(line).map_err(|message| OboParseError::Line {
                line: logical.line,
                message,
            })?;
            stanzas.push(RawStanza {
                kind: StanzaKind::from_header(name),
                line: logical.line,
                tags: Vec::new(),
            });
            continue;
        }

        let tv = parse_tag_value_line(line, logical.line)?;
        match stanzas.last_mut() {
            Some(stanza) => stanza.tags.push(tv),
            None => header.entry(tv.tag).or_default().push(tv.value),
        }
    }

    assemble(header, stanzas, options)
}

fn assemble(
    header: Attributes,
    stanzas: Vec<RawStanza>,
    options: &ParseOptions,
) -> Result<OboDocument, OboParseError> {
    let mut doc = OboDocument {
        header,
        ..OboDocument::default()
    };
    let mut declared: HashMap<TermId, usize> = HashMap::new();

    for stanza in stanzas {
        match stanza.kind {
            StanzaKind::Term => {
                let id = stanza.id()?;
                let relationships = stanza.relationships(id, options)?;
                let record = stanza.into_record()?;
                if options.ignore_obsolete && record.is_obsolete() {
                    debug!(id = %record.id, line = record.line, "dropping obsolete term");
                    continue;
                }
                if let Some(&first_line) = declared.get(&record.id) {
                    return Err(OboParseError::DuplicateTerm {
                        id: record.id,
                        first_line,
                        line: record.line,
                    });
                }
                declared.insert(record.id.clone(), record.line);
                doc.relationships.extend(relationships);
                doc.terms.push(record);
            }
            StanzaKind::Typedef => doc.typedefs.push(stanza.into_record()?),
            _ => debug!(stanza = %stanza.kind, line = stanza.line, "skipping stanza"),
        }
    }

    if let Some(rel) = doc
        .relationships
        .iter()
        .find(|rel| !declared.contains_key(&rel.parent))
    {
        return Err(OboParseError::UndeclaredTerm {
            child: rel.child.clone(),
            parent: rel.parent.clone(),
            kind: rel.kind.clone(),
            line: rel.line,
        });
    }

    Ok(doc)
}

/// `[Name]`, optionally followed by a `!` comment.
fn parse_stanza_header(line: &str) -> Result<&str, String> {
    fn parser(input: &str) -> IResult<&str, &str> {
        terminated(
            delimited(
                pchar('['),
                take_till1(|c: char| c == ']' || c == '['),
                pchar(']'),
            ),
            preceded(space0, opt(preceded(pchar('!'), rest))),
        )(input)
    }

    let (_, name) = all_consuming(parser)(line).map_err(|_| {
        if line.contains(']') {
            format!("malformed stanza header `{line}`")
        } else {
            format!("unterminated stanza header `{line}`")
        }
    })?;
    let name = name.trim();
    if name.is_empty() {
        return Err("empty stanza header".to_string());
    }
    Ok(name)
}
