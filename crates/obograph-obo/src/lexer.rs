//! Line-level lexing for OBO text.
//!
//! Two passes happen here:
//! - physical lines are joined into logical lines (a line ending in an
//!   unescaped `\` continues onto the next one), and
//! - a logical `tag: value` line is split into tag, unescaped value,
//!   trailing-modifier qualifiers (`{name="value", ...}`) and comment.

use nom::{
    branch::alt,
    bytes::complete::take_till1,
    character::complete::{char as pchar, multispace0},
    combinator::{all_consuming, map},
    error::{Error as NomError, ErrorKind},
    multi::separated_list0,
    sequence::{delimited, preceded, terminated},
    IResult,
};
use serde::{Deserialize, Serialize};

use crate::OboParseError;

/// One `name=value` entry of a trailing modifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Qualifier {
    pub name: String,
    pub value: String,
}

/// A lexed `tag: value` line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagValue {
    pub tag: String,
    /// Unescaped value with the trailing modifier and comment removed.
    pub value: String,
    pub qualifiers: Vec<Qualifier>,
    pub comment: Option<String>,
    /// 1-based line the (logical) line started on.
    pub line: usize,
}

/// A logical line: continuations already joined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LogicalLine {
    pub line: usize,
    pub text: String,
}

pub(crate) fn logical_lines(text: &str) -> Result<Vec<LogicalLine>, OboParseError> {
    let mut out = Vec::new();
    let mut pending: Option<LogicalLine> = None;

    for (index, raw) in text.lines().enumerate() {
        let (body, continues) = split_continuation(raw);
        match pending.as_mut() {
            Some(open) => open.text.push_str(body),
            None => {
                pending = Some(LogicalLine {
                    line: index + 1,
                    text: body.to_string(),
                })
            }
        }
        if !continues {
            out.extend(pending.take());
        }
    }

    if let Some(open) = pending {
        return Err(OboParseError::Line {
            line: open.line,
            message: "line continuation runs past the end of the input".to_string(),
        });
    }
    Ok(out)
}

/// Strip a continuation backslash. An even run of trailing backslashes is a
/// sequence of escaped backslashes, not a continuation.
fn split_continuation(raw: &str) -> (&str, bool) {
    let trailing = raw.chars().rev().take_while(|&c| c == '\\').count();
    if trailing % 2 == 1 {
        (&raw[..raw.len() - 1], true)
    } else {
        (raw, false)
    }
}

/// Decode OBO escapes: `\n`, `\t`, `\W` (space), and `\x` → `x` otherwise.
pub fn unescape_value(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('W') => out.push(' '),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

/// Lex a single logical `tag: value` line.
pub fn parse_tag_value_line(line: &str, line_no: usize) -> Result<TagValue, OboParseError> {
    let to_err = |message: String| OboParseError::Line {
        line: line_no,
        message,
    };

    let (tag, rest) = split_tag(line.trim()).map_err(to_err)?;
    let segments = split_value(rest);

    let value = segments.value.trim();
    if value.is_empty() {
        return Err(to_err(format!("tag `{tag}` has an empty value")));
    }

    let qualifiers = match segments.modifier {
        Some(text) => parse_qualifiers(text).map_err(to_err)?,
        None => Vec::new(),
    };

    Ok(TagValue {
        tag: tag.to_string(),
        value: unescape_value(value),
        qualifiers,
        comment: segments
            .comment
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string),
        line: line_no,
    })
}

fn split_tag(line: &str) -> Result<(&str, &str), String> {
    fn parser(input: &str) -> IResult<&str, &str> {
        terminated(take_till1(|c: char| c == ':' || c.is_whitespace()), pchar(':'))(input)
    }

    parser(line)
        .map(|(rest, tag)| (tag, rest))
        .map_err(|_| format!("expected `tag: value`, found `{line}`"))
}

#[derive(Debug, PartialEq, Eq)]
struct ValueSegments<'a> {
    value: &'a str,
    modifier: Option<&'a str>,
    comment: Option<&'a str>,
}

/// Find the comment and trailing-modifier boundaries of a raw value.
///
/// Quoted strings shield `!` and `{`. A `{...}` only counts as a trailing
/// modifier when nothing but whitespace or a comment follows it; otherwise
/// the braces are part of the value. A quote that is never closed, or a
/// `{` that is never closed, is plain text.
fn split_value(rest: &str) -> ValueSegments<'_> {
    [(true, true), (false, true), (true, false), (false, false)]
        .into_iter()
        .find_map(|(quotes, braces)| scan_value(rest, quotes, braces))
        .unwrap_or(ValueSegments {
            value: rest,
            modifier: None,
            comment: None,
        })
}

/// One pass over the value. `None` when the pass leaves a quote or a
/// modifier open; with both `quotes` and `braces` off it always succeeds.
fn scan_value(rest: &str, quotes: bool, braces: bool) -> Option<ValueSegments<'_>> {
    let mut in_quotes = false;
    let mut escaped = false;
    let mut modifier_open: Option<usize> = None;
    let mut modifier_close: Option<usize> = None;
    let mut comment_at: Option<usize> = None;

    for (idx, c) in rest.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        if c == '\\' {
            escaped = true;
            continue;
        }

        if modifier_close.is_some() {
            if c.is_whitespace() {
                continue;
            }
            if c == '!' {
                comment_at = Some(idx);
                break;
            }
            modifier_open = None;
            modifier_close = None;
        }

        if modifier_open.is_some() {
            if c == '}' {
                modifier_close = Some(idx);
            }
            continue;
        }

        match c {
            '"' if quotes => in_quotes = !in_quotes,
            '!' if !in_quotes => {
                comment_at = Some(idx);
                break;
            }
            '{' if braces && !in_quotes => modifier_open = Some(idx),
            _ => {}
        }
    }

    if in_quotes {
        return None;
    }

    let comment = comment_at.map(|idx| &rest[idx + 1..]);
    match (modifier_open, modifier_close) {
        (Some(open), Some(close)) => Some(ValueSegments {
            value: &rest[..open],
            modifier: Some(&rest[open + 1..close]),
            comment,
        }),
        (Some(_), None) => None,
        _ => Some(ValueSegments {
            value: &rest[..comment_at.unwrap_or(rest.len())],
            modifier: None,
            comment,
        }),
    }
}

fn quoted(input: &str) -> IResult<&str, String> {
    let (body, _) = pchar('"')(input)?;
    let mut escaped = false;
    for (idx, c) in body.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            '"' => return Ok((&body[idx + 1..], unescape_value(&body[..idx]))),
            _ => {}
        }
    }
    Err(nom::Err::Error(NomError::new(input, ErrorKind::Char)))
}

fn parse_qualifiers(text: &str) -> Result<Vec<Qualifier>, String> {
    fn bare(input: &str) -> IResult<&str, String> {
        map(take_till1(|c: char| c == ',' || c.is_whitespace()), unescape_value)(input)
    }

    fn qualifier(input: &str) -> IResult<&str, Qualifier> {
        let (input, name) = preceded(
            multispace0,
            take_till1(|c: char| c == '=' || c == ',' || c.is_whitespace()),
        )(input)?;
        let (input, _) = delimited(multispace0, pchar('='), multispace0)(input)?;
        let (input, value) = alt((quoted, bare))(input)?;
        Ok((
            input,
            Qualifier {
                name: name.to_string(),
                value,
            },
        ))
    }

    all_consuming(terminated(
        separated_list0(preceded(multispace0, pchar(',')), qualifier),
        multispace0,
    ))(text)
    .map(|(_, v)| v)
    .map_err(|_| format!("malformed trailing modifier `{{{text}}}`"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_continuation_lines() {
        let lines = logical_lines("name: a very \\\nlong name\nid: X:1\n").unwrap();
        assert_eq!(
            lines,
            vec![
                LogicalLine {
                    line: 1,
                    text: "name: a very long name".to_string()
                },
                LogicalLine {
                    line: 3,
                    text: "id: X:1".to_string()
                },
            ]
        );
    }

    #[test]
    fn escaped_trailing_backslash_is_not_a_continuation() {
        let lines = logical_lines("comment: ends with \\\\\nid: X:1").unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].text, "comment: ends with \\\\");
    }

    #[test]
    fn dangling_continuation_is_rejected() {
        let err = logical_lines("id: X:1\nname: open \\").unwrap_err();
        assert_eq!(err.line(), 2);
    }

    #[test]
    fn splits_comment_and_modifier() {
        let tv = parse_tag_value_line(
            "is_a: X:0 {source=\"PMID:1\", cardinality=2} ! root term",
            7,
        )
        .unwrap();
        assert_eq!(tv.tag, "is_a");
        assert_eq!(tv.value, "X:0");
        assert_eq!(
            tv.qualifiers,
            vec![
                Qualifier {
                    name: "source".to_string(),
                    value: "PMID:1".to_string()
                },
                Qualifier {
                    name: "cardinality".to_string(),
                    value: "2".to_string()
                },
            ]
        );
        assert_eq!(tv.comment.as_deref(), Some("root term"));
        assert_eq!(tv.line, 7);
    }

    #[test]
    fn quotes_shield_comment_and_braces() {
        let tv = parse_tag_value_line(r#"def: "a {curly} thing! really" [X:1]"#, 1).unwrap();
        assert_eq!(tv.value, r#""a {curly} thing! really" [X:1]"#);
        assert!(tv.qualifiers.is_empty());
        assert!(tv.comment.is_none());
    }

    #[test]
    fn braces_followed_by_text_stay_in_value() {
        let tv = parse_tag_value_line("name: set {a} of things", 1).unwrap();
        assert_eq!(tv.value, "set {a} of things");
        assert!(tv.qualifiers.is_empty());
    }

    #[test]
    fn unclosed_brace_stays_in_value() {
        let tv = parse_tag_value_line("name: set {a", 1).unwrap();
        assert_eq!(tv.value, "set {a");
        assert!(tv.qualifiers.is_empty());

        let tv = parse_tag_value_line("name: set {a ! note", 1).unwrap();
        assert_eq!(tv.value, "set {a");
        assert_eq!(tv.comment.as_deref(), Some("note"));

        let tv = parse_tag_value_line(r#"is_a: X:0 {source="a""#, 1).unwrap();
        assert_eq!(tv.value, r#"X:0 {source="a""#);
    }

    #[test]
    fn unbalanced_quote_is_plain_text() {
        let tv = parse_tag_value_line(r#"name: 12" pipe fitting"#, 1).unwrap();
        assert_eq!(tv.value, r#"12" pipe fitting"#);

        let tv = parse_tag_value_line(r#"comment: see "the note"#, 1).unwrap();
        assert_eq!(tv.value, r#"see "the note"#);
        assert!(tv.comment.is_none());

        let tv = parse_tag_value_line(r#"name: 12" pipe {x=1} ! fitting"#, 1).unwrap();
        assert_eq!(tv.value, r#"12" pipe"#);
        assert_eq!(
            tv.qualifiers,
            vec![Qualifier {
                name: "x".to_string(),
                value: "1".to_string()
            }]
        );
        assert_eq!(tv.comment.as_deref(), Some("fitting"));
    }

    #[test]
    fn decodes_escapes() {
        let tv = parse_tag_value_line(r"name: a\Wb\tc \! d \{e\}", 1).unwrap();
        assert_eq!(tv.value, "a b\tc ! d {e}");
        assert!(tv.comment.is_none());
    }

    #[test]
    fn rejects_malformed_lines() {
        for line in [
            "no colon here",
            ": missing tag",
            "name:",
            "name: ! only a comment",
            "is_a: X:0 {=oops}",
        ] {
            let err = parse_tag_value_line(line, 3).unwrap_err();
            assert!(
                matches!(err, OboParseError::Line { line: 3, .. }),
                "line={line:?} err={err}"
            );
        }
    }
}
