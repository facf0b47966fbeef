//! Lexical scanning of `:name` placeholders.
//!
//! The scanner walks the SQL once with a small state machine so that text inside string
//! literals, quoted identifiers, comments, and dollar-quoted bodies is never mistaken for a
//! placeholder. A placeholder is the longest identifier following a single `:`, so `:id` never
//! matches inside `:identifier`.

use std::borrow::Cow;
use std::ops::Range;

mod parsers;
mod scanner;

use parsers::{
    QuoteEnd, is_block_comment_end, is_block_comment_start, is_cast, is_line_comment_start,
    matches_tag, quote_end, try_start_dollar_quote,
};
use scanner::{State, scan_identifier};

/// A named placeholder located in a SQL string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder<'a> {
    /// Name without the leading `:`.
    pub name: &'a str,
    /// Byte range covering the `:` and the name.
    pub span: Range<usize>,
}

/// List every named placeholder in `sql`, in order of appearance.
#[must_use]
pub fn named_placeholders(sql: &str) -> Vec<Placeholder<'_>> {
    let mut found = Vec::new();
    let mut state = State::Normal;
    let mut idx = 0;
    let bytes = sql.as_bytes();

    while idx < bytes.len() {
        let b = bytes[idx];
        match state {
            State::Normal => match b {
                b'\'' => state = State::SingleQuoted,
                b'"' => state = State::DoubleQuoted,
                b'`' => state = State::Backticked,
                _ if is_line_comment_start(bytes, idx) => state = State::LineComment,
                _ if is_block_comment_start(bytes, idx) => state = State::BlockComment(1),
                _ if is_cast(bytes, idx) => idx += 1,
                b':' => {
                    if let Some(end) = scan_identifier(bytes, idx + 1) {
                        found.push(Placeholder {
                            name: &sql[idx + 1..end],
                            span: idx..end,
                        });
                        idx = end - 1;
                    }
                }
                b'$' => {
                    if let Some((tag, advance)) = try_start_dollar_quote(bytes, idx) {
                        state = State::DollarQuoted(tag);
                        idx = advance;
                    }
                }
                _ => {}
            },
            State::SingleQuoted | State::DoubleQuoted | State::Backticked => {
                let quote = match state {
                    State::SingleQuoted => b'\'',
                    State::DoubleQuoted => b'"',
                    _ => b'`',
                };
                if b == quote {
                    match quote_end(bytes, idx, quote) {
                        QuoteEnd::Escaped => idx += 1,
                        QuoteEnd::Closed => state = State::Normal,
                    }
                }
            }
            State::LineComment => {
                if b == b'\n' {
                    state = State::Normal;
                }
            }
            State::BlockComment(depth) => {
                if is_block_comment_start(bytes, idx) {
                    state = State::BlockComment(depth + 1);
                    idx += 1;
                } else if is_block_comment_end(bytes, idx) {
                    state = if depth == 1 {
                        State::Normal
                    } else {
                        State::BlockComment(depth - 1)
                    };
                    idx += 1;
                }
            }
            State::DollarQuoted(ref tag) => {
                if b == b'$' && matches_tag(bytes, idx, tag) {
                    let tag_len = tag.len();
                    state = State::Normal;
                    idx += tag_len + 1;
                }
            }
        }

        idx += 1;
    }

    found
}

/// Replace placeholders for which `replace` returns `Some`, leaving the rest untouched.
///
/// Returns a borrowed `Cow` when nothing was replaced.
pub fn rewrite_named_placeholders<'a, F>(sql: &'a str, mut replace: F) -> Cow<'a, str>
where
    F: FnMut(&str) -> Option<String>,
{
    let mut out: Option<String> = None;
    let mut copied_to = 0;

    for placeholder in named_placeholders(sql) {
        if let Some(replacement) = replace(placeholder.name) {
            let buf = out.get_or_insert_with(|| String::with_capacity(sql.len() + 16));
            buf.push_str(&sql[copied_to..placeholder.span.start]);
            buf.push_str(&replacement);
            copied_to = placeholder.span.end;
        }
    }

    match out {
        Some(mut buf) => {
            buf.push_str(&sql[copied_to..]);
            Cow::Owned(buf)
        }
        None => Cow::Borrowed(sql),
    }
}
