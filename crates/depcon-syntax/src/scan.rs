//! Byte-level scanning helpers shared by the parser.
//!
//! The parser never tokenizes. Instead it works on a *blanked* copy of the
//! source where comments and preprocessor lines are replaced by spaces and
//! literals by `"` bytes. The blanked text has the same length as the source,
//! so every offset found in it can be used to slice the original text.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ScanMode {
    Code,
    LineComment,
    BlockComment,
    StringLiteral,
    /// `@"..."` (and `$@"..."`): backslashes are literal, `""` escapes a quote.
    VerbatimString,
    /// `"""..."""`: closed by the same number of quotes that opened it.
    RawString(usize),
    CharLiteral,
}

/// Iterate through `text` and invoke `f` for each byte with the mode the byte
/// belongs to. Delimiters (comment openers, quotes) report the mode they open
/// or close, never [`ScanMode::Code`].
pub(crate) fn scan_modes(text: &str, mut f: impl FnMut(usize, u8, ScanMode)) {
    let bytes = text.as_bytes();
    let mut mode = ScanMode::Code;
    let mut at_line_start = true;
    let mut idx = 0;
    while idx < bytes.len() {
        let b = bytes[idx];
        match mode {
            ScanMode::Code => {
                let next = bytes.get(idx + 1).copied();
                if b == b'/' && next == Some(b'/') || b == b'#' && at_line_start {
                    // Preprocessor directives (`#region`, `#if`) are line trivia too.
                    mode = ScanMode::LineComment;
                    continue;
                }
                if b == b'/' && next == Some(b'*') {
                    f(idx, b, ScanMode::BlockComment);
                    f(idx + 1, b'*', ScanMode::BlockComment);
                    mode = ScanMode::BlockComment;
                    idx += 2;
                    continue;
                }
                if let Some(prefix) = verbatim_prefix_len(&bytes[idx..]) {
                    for offset in 0..prefix {
                        f(idx + offset, bytes[idx + offset], ScanMode::VerbatimString);
                    }
                    mode = ScanMode::VerbatimString;
                    idx += prefix;
                    at_line_start = false;
                    continue;
                }
                if b == b'"' || b == b'$' && next == Some(b'"') {
                    let start = if b == b'$' { idx + 1 } else { idx };
                    let quotes = bytes[start..].iter().take_while(|&&q| q == b'"').count();
                    let (opened, len) = if quotes >= 3 {
                        (ScanMode::RawString(quotes), start - idx + quotes)
                    } else {
                        (ScanMode::StringLiteral, start - idx + 1)
                    };
                    for offset in 0..len {
                        f(idx + offset, bytes[idx + offset], opened);
                    }
                    mode = opened;
                    idx += len;
                    at_line_start = false;
                    continue;
                }
                if b == b'\'' {
                    f(idx, b, ScanMode::CharLiteral);
                    mode = ScanMode::CharLiteral;
                    idx += 1;
                    at_line_start = false;
                    continue;
                }

                f(idx, b, ScanMode::Code);
                if b == b'\n' {
                    at_line_start = true;
                } else if !b.is_ascii_whitespace() {
                    at_line_start = false;
                }
            }
            ScanMode::LineComment => {
                f(idx, b, mode);
                if b == b'\n' {
                    mode = ScanMode::Code;
                    at_line_start = true;
                }
            }
            ScanMode::BlockComment => {
                if b == b'*' && bytes.get(idx + 1) == Some(&b'/') {
                    f(idx, b, mode);
                    f(idx + 1, b'/', mode);
                    mode = ScanMode::Code;
                    idx += 2;
                    continue;
                }
                f(idx, b, mode);
            }
            ScanMode::StringLiteral | ScanMode::CharLiteral => {
                let close = if mode == ScanMode::StringLiteral {
                    b'"'
                } else {
                    b'\''
                };
                if b == b'\\' {
                    f(idx, b, mode);
                    if let Some(&escaped) = bytes.get(idx + 1) {
                        f(idx + 1, escaped, mode);
                    }
                    idx += 2;
                    continue;
                }
                f(idx, b, mode);
                // Unterminated literals stop at the end of the line.
                if b == close || b == b'\n' {
                    mode = ScanMode::Code;
                    at_line_start = b == b'\n';
                }
            }
            ScanMode::VerbatimString => {
                f(idx, b, mode);
                if b == b'"' {
                    if bytes.get(idx + 1) == Some(&b'"') {
                        f(idx + 1, b'"', mode);
                        idx += 2;
                        continue;
                    }
                    mode = ScanMode::Code;
                }
            }
            ScanMode::RawString(quotes) => {
                if bytes[idx..].iter().take_while(|&&q| q == b'"').count() >= quotes {
                    for offset in 0..quotes {
                        f(idx + offset, b'"', mode);
                    }
                    mode = ScanMode::Code;
                    idx += quotes;
                    continue;
                }
                f(idx, b, mode);
            }
        }

        idx += 1;
    }
}

fn verbatim_prefix_len(bytes: &[u8]) -> Option<usize> {
    match bytes {
        [b'@', b'"', ..] => Some(2),
        [b'@', b'$', b'"', ..] | [b'$', b'@', b'"', ..] => Some(3),
        _ => None,
    }
}

/// Returns a copy of `text` with comments blanked to spaces and literals to `"`.
///
/// Newlines inside comments are kept so line-based reasoning still works.
pub(crate) fn blank_trivia(text: &str) -> String {
    let mut out = text.as_bytes().to_vec();
    scan_modes(text, |idx, b, mode| match mode {
        ScanMode::Code => {}
        ScanMode::LineComment | ScanMode::BlockComment => {
            if b != b'\n' {
                out[idx] = b' ';
            }
        }
        ScanMode::StringLiteral
        | ScanMode::VerbatimString
        | ScanMode::RawString(_)
        | ScanMode::CharLiteral => out[idx] = b'"',
    });
    // Only whole multi-byte characters inside comments/literals were replaced,
    // and always by ASCII, so the result is still valid UTF-8.
    String::from_utf8(out).unwrap_or_else(|err| String::from_utf8_lossy(err.as_bytes()).into_owned())
}

pub(crate) fn is_ident_char_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'@' || b >= 0x80
}

pub(crate) fn is_boundary(text: &[u8], idx: usize) -> bool {
    if idx >= text.len() {
        return true;
    }
    !is_ident_char_byte(text[idx])
}

/// Returns `true` when `word` occurs in `code` as a whole identifier.
pub(crate) fn contains_word(code: &str, word: &str) -> bool {
    let bytes = code.as_bytes();
    let mut search = 0;
    while let Some(rel) = code[search..].find(word) {
        let idx = search + rel;
        let before_ok = idx == 0 || is_boundary(bytes, idx - 1);
        if before_ok && is_boundary(bytes, idx + word.len()) {
            return true;
        }
        search = idx + word.len();
    }
    false
}

pub(crate) fn skip_ws(code: &[u8], mut idx: usize, end: usize) -> usize {
    while idx < end && code[idx].is_ascii_whitespace() {
        idx += 1;
    }
    idx
}

/// Finds the byte matching the `open` delimiter at `start` in blanked `code`.
pub(crate) fn matching_close(code: &[u8], start: usize, open: u8, close: u8) -> Option<usize> {
    if code.get(start).copied()? != open {
        return None;
    }
    let mut depth = 0usize;
    for (idx, &b) in code.iter().enumerate().skip(start) {
        if b == open {
            depth += 1;
        } else if b == close {
            depth -= 1;
            if depth == 0 {
                return Some(idx);
            }
        }
    }
    None
}

/// Splits `code[start..end]` on `,` outside of parentheses, brackets, braces
/// and generic argument lists. Returns the ranges of the pieces (untrimmed).
///
/// `<` only opens a generic list when it directly follows an identifier
/// (`List<int, string>`), so comparisons such as `a < b` do not nest.
pub(crate) fn split_top_level_commas(code: &[u8], start: usize, end: usize) -> Vec<(usize, usize)> {
    let mut pieces = Vec::new();
    let mut depth = 0usize;
    let mut angle = 0usize;
    let mut piece_start = start;
    for idx in start..end {
        match code[idx] {
            b'(' | b'[' | b'{' => depth += 1,
            b')' | b']' | b'}' => depth = depth.saturating_sub(1),
            b'<' if idx > start && is_ident_char_byte(code[idx - 1]) => angle += 1,
            b'>' if angle > 0 => angle -= 1,
            b',' if depth == 0 && angle == 0 => {
                pieces.push((piece_start, idx));
                piece_start = idx + 1;
            }
            _ => {}
        }
    }
    pieces.push((piece_start, end));
    pieces
}

/// Position of the first top-level assignment-like `=` (including `=>`) in
/// `code[start..end]`, ignoring `==`, `!=`, `<=` and `>=`.
pub(crate) fn find_top_level_eq(code: &[u8], start: usize, end: usize) -> Option<usize> {
    let mut depth = 0usize;
    for idx in start..end {
        match code[idx] {
            b'(' | b'[' | b'{' => depth += 1,
            b')' | b']' | b'}' => depth = depth.saturating_sub(1),
            b'=' if depth == 0 => {
                let prev = if idx > start { code[idx - 1] } else { b' ' };
                let next = code.get(idx + 1).copied().unwrap_or(b' ');
                if next == b'=' || matches!(prev, b'=' | b'!' | b'<' | b'>') {
                    continue;
                }
                return Some(idx);
            }
            _ => {}
        }
    }
    None
}

pub(crate) fn compact_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blanks_comments_and_literals_without_moving_offsets() {
        let src = "a = \"{\"; // }\n/* { */ b = '}';";
        let blanked = blank_trivia(src);
        assert_eq!(blanked.len(), src.len());
        assert!(!blanked.contains('{'));
        assert!(!blanked.contains('}'));
        assert_eq!(&blanked[..4], "a = ");
        assert!(blanked.contains("b = "));
    }

    #[test]
    fn verbatim_and_raw_strings_hide_braces() {
        let src = "x = @\"c:\\{\"\"}\"; y = \"\"\"{ \" }\"\"\"; z = $\"{a}\";";
        let blanked = blank_trivia(src);
        assert!(!blanked.contains('{'), "{blanked}");
        assert!(blanked.contains("y = "));
        assert!(blanked.ends_with(';'));
    }

    #[test]
    fn preprocessor_lines_are_trivia() {
        let src = "#region Fields\nint x;\n    #endregion\n";
        let blanked = blank_trivia(src);
        assert!(!blanked.contains("region"));
        assert!(blanked.contains("int x;"));
    }

    #[test]
    fn splits_generic_arguments_as_one_piece() {
        let code = b"Dictionary<string, int> a, b = f(1, 2), c";
        let pieces: Vec<_> = split_top_level_commas(code, 0, code.len())
            .into_iter()
            .map(|(s, e)| std::str::from_utf8(&code[s..e]).unwrap().trim().to_string())
            .collect();
        assert_eq!(pieces, vec!["Dictionary<string, int> a", "b = f(1, 2)", "c"]);
    }

    #[test]
    fn top_level_eq_skips_comparisons() {
        let code = b"bool b => x == y";
        assert_eq!(find_top_level_eq(code, 0, code.len()), Some(7));
        let code = b"a <= b";
        assert_eq!(find_top_level_eq(code, 0, code.len()), None);
    }
}
