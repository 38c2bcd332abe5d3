/// Indents every line of `text` by `amount` copies of `ch`.
///
/// Line terminators are kept as they are: `\n`, `\r\n`, a lone `\r` and the other Unicode line
/// boundaries such as form feed or `U+2028`. A trailing line without a terminator is indented
/// too. Empty input produces empty output.
///
/// # Parameters
///
/// - `text` - The (possibly multi-line) text to indent
/// - `amount` - How many padding characters to prepend to each line
/// - `ch` - The padding character
///
/// # Returns
///
/// * `String` - The indented text
///
/// # Examples
/// ```rust
/// use model_factory::utility::indent;
///
/// assert_eq!(indent("a\nb\n", 2, ' '), "  a\n  b\n");
/// assert_eq!(indent("x\r\ny", 1, '-'), "-x\r\n-y");
/// ```
pub fn indent(text: &str, amount: usize, ch: char) -> String {
    let padding: String = std::iter::repeat_n(ch, amount).collect();
    let mut out = String::with_capacity(text.len() + padding.len() * (text.lines().count() + 1));

    for line in split_lines_keep_ends(text) {
        out.push_str(&padding);
        out.push_str(line);
    }

    out
}

/// Line boundaries, including the ASCII separator controls and the Unicode line and
/// paragraph separators
fn is_line_boundary(c: char) -> bool {
    matches!(
        c,
        '\n' | '\r'
            | '\u{0b}'
            | '\u{0c}'
            | '\u{1c}'
            | '\u{1d}'
            | '\u{1e}'
            | '\u{85}'
            | '\u{2028}'
            | '\u{2029}'
    )
}

/// Splits `text` into lines, each slice still ending with its terminator.
fn split_lines_keep_ends(text: &str) -> Vec<&str> {
    let mut lines = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if !is_line_boundary(c) {
            continue;
        }
        let mut end = i + c.len_utf8();
        // \r\n counts as a single terminator
        if c == '\r' {
            if let Some(&(j, '\n')) = chars.peek() {
                end = j + 1;
                chars.next();
            }
        }
        lines.push(&text[start..end]);
        start = end;
    }

    if start < text.len() {
        lines.push(&text[start..]);
    }

    lines
}
