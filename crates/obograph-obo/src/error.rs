use thiserror::Error;

use crate::TermId;

#[derive(Debug, Error)]
pub enum OboParseError {
    #[error("parse error on line {line}: {message}")]
    Line { line: usize, message: String },

    #[error("[{stanza}] stanza starting on line {line} has no `id` tag")]
    MissingId { stanza: String, line: usize },

    #[error("duplicate term id `{id}` on line {line} (first declared on line {first_line})")]
    DuplicateTerm {
        id: TermId,
        first_line: usize,
        line: usize,
    },

    #[error("`{kind}` on line {line} links `{child}` to undeclared term `{parent}`")]
    UndeclaredTerm {
        child: TermId,
        parent: TermId,
        kind: String,
        line: usize,
    },
}

impl OboParseError {
    /// The 1-based source line the error points at.
    pub fn line(&self) -> usize {
        match self {
            OboParseError::Line { line, .. }
            | OboParseError::MissingId { line, .. }
            | OboParseError::DuplicateTerm { line, .. }
            | OboParseError::UndeclaredTerm { line, .. } => *line,
        }
    }
}
