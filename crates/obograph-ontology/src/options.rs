use obograph_obo::ParseOptions;
use serde::{Deserialize, Serialize};

/// Knobs for loading an [`Ontology`](crate::Ontology).
///
/// Deserializes from partial JSON; missing fields take their defaults:
///
/// ```
/// use obograph_ontology::LoadOptions;
///
/// let options: LoadOptions =
///     serde_json::from_str(r#"{ "parse": { "ignore_obsolete": false } }"#).unwrap();
/// assert!(!options.parse.ignore_obsolete);
/// assert!(options.parse.include_relationships);
/// assert!(options.check_acyclic);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadOptions {
    pub parse: ParseOptions,
    /// Reject graphs containing a cycle at load time.
    pub check_acyclic: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            parse: ParseOptions::default(),
            check_acyclic: true,
        }
    }
}
