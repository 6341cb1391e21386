//! URL component parsing and reassembly.
//!
//! Kept deliberately small and string-method based (`split_once`,
//! `starts_with`) rather than pulling in a URL crate — the grammar this core
//! needs (`scheme "://" host "/" path ["?" query]`) is narrower than general
//! URL parsing, and the upstream crate's own `extra::split_query`/
//! `join_query` helpers take the same plain-`str` approach for the query
//! string half of this problem.

/// The four components a rewrite substitution can rewrite independently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlParts {
    pub scheme: String,
    pub host: String,
    /// Without a leading `/`.
    pub path: String,
    /// Without a leading `?`.
    pub query: String,
    /// Whether the authority was followed by a `/` at all, distinct from
    /// `path` being empty. `http://example.com` (no separator) and
    /// `http://example.com/` (root path) both parse to `path == ""`, but
    /// only the latter should reassemble with a trailing slash — otherwise
    /// reassembling an untouched `http://example.com` would insert a `/`
    /// it never had, breaking the "engine off / no match ⇒ finalUrl =
    /// inputUrl" invariant.
    pub has_path: bool,
}

impl UrlParts {
    pub fn reassemble(&self) -> String {
        let mut out = format!("{}://{}", self.scheme, self.host);
        if self.has_path || !self.path.is_empty() {
            out.push('/');
            out.push_str(&self.path);
        }
        if !self.query.is_empty() {
            out.push('?');
            out.push_str(&self.query);
        }
        out
    }
}

/// Parse `scheme://host[/path][?query]` into its components. Returns
/// `None` if the input has no `"://"` separator.
pub fn parse(url: &str) -> Option<UrlParts> {
    let (scheme, rest) = url.split_once("://")?;
    let (authority_and_path, query) = rest.split_once('?').unwrap_or((rest, ""));
    let (host, path, has_path) = match authority_and_path.split_once('/') {
        Some((host, path)) => (host, path, true),
        None => (authority_and_path, "", false),
    };
    Some(UrlParts {
        scheme: scheme.to_owned(),
        host: host.to_owned(),
        path: path.to_owned(),
        query: query.to_owned(),
        has_path,
    })
}

/// Case-insensitive check for `^https?://`, used to decide whether a
/// resolved substitution should be treated as an absolute URL rewrite.
///
/// Compares raw bytes rather than slicing `s` at a fixed byte offset —
/// `s` is arbitrary rewrite-substitution output and may contain multi-byte
/// UTF-8 characters before byte 8, where a `&str` slice would panic.
pub fn is_absolute(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes
        .get(..7)
        .is_some_and(|p| p.eq_ignore_ascii_case(b"http://"))
        || bytes
            .get(..8)
            .is_some_and(|p| p.eq_ignore_ascii_case(b"https://"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_url() {
        let parts = parse("http://example.com/test/path?a=1").unwrap();
        assert_eq!(parts.scheme, "http");
        assert_eq!(parts.host, "example.com");
        assert_eq!(parts.path, "test/path");
        assert_eq!(parts.query, "a=1");
    }

    #[test]
    fn parses_url_with_no_path_or_query() {
        let parts = parse("https://example.com").unwrap();
        assert_eq!(parts.path, "");
        assert_eq!(parts.query, "");
    }

    #[test]
    fn reassemble_roundtrips() {
        let parts = parse("http://example.com/test?x=1").unwrap();
        assert_eq!(parts.reassemble(), "http://example.com/test?x=1");
    }

    #[test]
    fn reassemble_without_query_omits_separator() {
        let parts = parse("http://example.com/test").unwrap();
        assert_eq!(parts.reassemble(), "http://example.com/test");
    }

    #[test]
    fn is_absolute_is_case_insensitive() {
        assert!(is_absolute("HTTP://x"));
        assert!(is_absolute("HtTpS://x"));
        assert!(!is_absolute("/relative/path"));
        assert!(!is_absolute("ftp://x"));
    }

    #[test]
    fn is_absolute_does_not_panic_on_short_or_multibyte_input() {
        assert!(!is_absolute(""));
        assert!(!is_absolute("a"));
        assert!(!is_absolute("aaaaaa\u{20ac}/x"));
    }

    #[test]
    fn reassemble_without_path_omits_trailing_slash() {
        let parts = parse("http://example.com").unwrap();
        assert_eq!(parts.reassemble(), "http://example.com");
    }

    #[test]
    fn reassemble_keeps_explicit_root_path_slash() {
        let parts = parse("http://example.com/").unwrap();
        assert_eq!(parts.path, "");
        assert!(parts.has_path);
        assert_eq!(parts.reassemble(), "http://example.com/");
    }
}
