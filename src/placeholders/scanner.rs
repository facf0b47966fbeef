#[derive(Clone)]
pub(super) enum State {
    Normal,
    SingleQuoted,
    DoubleQuoted,
    Backticked,
    LineComment,
    BlockComment(u32),
    DollarQuoted(String),
}

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_'
}

fn is_ident_continue(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Returns the end (exclusive) of the identifier starting at `start`, if there is one.
pub(super) fn scan_identifier(bytes: &[u8], start: usize) -> Option<usize> {
    if !bytes.get(start).copied().is_some_and(is_ident_start) {
        return None;
    }
    let mut idx = start + 1;
    while idx < bytes.len() && is_ident_continue(bytes[idx]) {
        idx += 1;
    }
    Some(idx)
}

#[cfg(test)]
mod tests {
    use super::scan_identifier;

    #[test]
    fn identifier_bounds() {
        assert_eq!(scan_identifier(b":ids)", 1), Some(4));
        assert_eq!(scan_identifier(b":_a1", 1), Some(4));
        assert_eq!(scan_identifier(b":1a", 1), None);
        assert_eq!(scan_identifier(b":", 1), None);
    }
}
