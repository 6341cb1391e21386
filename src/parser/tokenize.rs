//! Quote-aware whitespace tokenizer shared by `RewriteCond` and
//! `RewriteRule` argument splitting (§4.2).
//!
//! Lifted near-verbatim from the upstream crate's
//! `conditions::parse::{tokenize, end_quote}`: it splits on unquoted
//! whitespace, treats a matched `'`/`"` pair as one token (consuming the
//! quote characters, keeping interior whitespace), and counts backslashes
//! modulo two so an escaped quote (`\"`) doesn't end the token early.

/// Find the index of the closing quote matching `quote` starting the scan
/// at `index`, honoring backslash escapes. Returns `None` if unterminated.
fn end_quote(s: &str, index: usize, quote: char) -> Option<usize> {
    let mut backslashes = 0;
    for (i, c) in s.char_indices().skip(index) {
        if c == quote && backslashes % 2 == 0 {
            return Some(i);
        }
        if c == '\\' {
            backslashes += 1;
            continue;
        }
        backslashes = 0;
    }
    None
}

/// Split `s` on unquoted whitespace. `None` means an unclosed quotation was
/// found.
pub fn tokenize(s: &str) -> Option<Vec<String>> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut chars = s.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        if c.is_whitespace() {
            if !current.is_empty() {
                tokens.push(std::mem::take(&mut current));
            }
            continue;
        }
        if c == '\'' || c == '"' {
            let end = end_quote(s, i + 1, c)?;
            // Append into `current` rather than pushing a separate token —
            // a quoted span glued directly against unquoted text (no
            // separating whitespace) is one token, e.g. `foo"bar baz"qux`.
            current.push_str(&s[i + 1..end]);
            // Skip past the consumed quoted span; char_indices continues
            // from the byte index, so fast-forward the iterator.
            while let Some(&(j, _)) = chars.peek() {
                if j <= end {
                    chars.next();
                } else {
                    break;
                }
            }
            continue;
        }
        current.push(c);
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    Some(tokens)
}
