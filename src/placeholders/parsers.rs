pub(super) fn is_line_comment_start(bytes: &[u8], idx: usize) -> bool {
    bytes.get(idx) == Some(&b'-') && bytes.get(idx + 1) == Some(&b'-')
}

pub(super) fn is_block_comment_start(bytes: &[u8], idx: usize) -> bool {
    bytes.get(idx) == Some(&b'/') && bytes.get(idx + 1) == Some(&b'*')
}

pub(super) fn is_block_comment_end(bytes: &[u8], idx: usize) -> bool {
    bytes.get(idx) == Some(&b'*') && bytes.get(idx + 1) == Some(&b'/')
}

/// `::` is a Postgres cast, never a placeholder.
pub(super) fn is_cast(bytes: &[u8], idx: usize) -> bool {
    bytes.get(idx) == Some(&b':') && bytes.get(idx + 1) == Some(&b':')
}

/// Outcome of seeing `quote` at `idx` while inside a literal delimited by `quote`.
///
/// A doubled delimiter is an escape and keeps the literal open.
pub(super) enum QuoteEnd {
    Escaped,
    Closed,
}

pub(super) fn quote_end(bytes: &[u8], idx: usize, quote: u8) -> QuoteEnd {
    if bytes.get(idx + 1) == Some(&quote) {
        QuoteEnd::Escaped
    } else {
        QuoteEnd::Closed
    }
}

/// Recognize `$tag$` (or `$$`) at `start`. Returns the tag and the index of the closing `$`.
pub(super) fn try_start_dollar_quote(bytes: &[u8], start: usize) -> Option<(String, usize)> {
    let rest = bytes.get(start + 1..)?;
    let tag_len = rest
        .iter()
        .position(|b| !(b.is_ascii_alphanumeric() || *b == b'_'))?;
    if rest[tag_len] != b'$' {
        return None;
    }
    let tag = std::str::from_utf8(&rest[..tag_len]).ok()?.to_owned();
    Some((tag, start + 1 + tag_len))
}

pub(super) fn matches_tag(bytes: &[u8], idx: usize, tag: &str) -> bool {
    let end = idx + 1 + tag.len();
    end < bytes.len()
        && bytes[idx + 1..=end].starts_with(tag.as_bytes())
        && bytes.get(end) == Some(&b'$')
}
