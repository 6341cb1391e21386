//! `RewriteRule` matching and substitution (§4.3 "Rule evaluation" /
//! "Substitution").
//!
//! The upstream crate's `Rule` couples pattern compilation, matching, and
//! `try_rewrite` interpolation (including percent-encoding captured groups
//! unless `[NE]`) into one type built directly off `FromStr`. This core
//! keeps the match/substitution *logic* but drops the percent-encoding
//! step: the distilled specification's flag-application table lists
//! `noescape` among the flags that are "parsed but have no observable
//! effect on the computed URL in this core", which only holds if
//! substitutions are never escaped in the first place.

use crate::url::{self, UrlParts};

/// Compute the path a rule's pattern is matched against: `current_path`
/// with the active `rewrite_base` prefix stripped, if present.
pub fn match_path<'a>(current_path: &'a str, rewrite_base: &str) -> &'a str {
    if rewrite_base == "/" {
        return current_path;
    }
    let base = rewrite_base.trim_matches('/');
    if base.is_empty() {
        return current_path;
    }
    match current_path.strip_prefix(base) {
        Some(rest) => rest.strip_prefix('/').unwrap_or(rest),
        None => current_path,
    }
}

/// The URL components after applying a resolved (variable-expanded)
/// substitution string, per the Absolute/Relative cases in §4.3.
pub fn apply_substitution(
    resolved: &str,
    current: &UrlParts,
    rewrite_base: &str,
    qsappend: bool,
    qsdiscard: bool,
) -> UrlParts {
    if url::is_absolute(resolved) {
        if let Some(parsed) = url::parse(resolved) {
            let query = merge_query(&parsed.query, &current.query, qsappend, qsdiscard);
            return UrlParts {
                scheme: parsed.scheme,
                host: parsed.host,
                path: parsed.path,
                query,
                has_path: parsed.has_path,
            };
        }
    }

    let (new_path, new_query) = resolved.split_once('?').unwrap_or((resolved, ""));
    let path = join_base(new_path, rewrite_base);
    let query = merge_query(new_query, &current.query, qsappend, qsdiscard);

    UrlParts {
        scheme: current.scheme.clone(),
        host: current.host.clone(),
        path,
        query,
        has_path: true,
    }
}

fn join_base(new_path: &str, rewrite_base: &str) -> String {
    if new_path.starts_with('/') || rewrite_base == "/" {
        return new_path.trim_start_matches('/').to_owned();
    }
    let base = rewrite_base.trim_matches('/');
    if base.is_empty() {
        new_path.to_owned()
    } else {
        format!("{base}/{new_path}")
    }
}

fn merge_query(new_query: &str, original_query: &str, qsappend: bool, qsdiscard: bool) -> String {
    if qsdiscard {
        return new_query.to_owned();
    }
    if qsappend && !original_query.is_empty() {
        return if new_query.is_empty() {
            original_query.to_owned()
        } else {
            format!("{new_query}&{original_query}")
        };
    }
    if new_query.is_empty() {
        original_query.to_owned()
    } else {
        new_query.to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parts(scheme: &str, host: &str, path: &str, query: &str) -> UrlParts {
        UrlParts {
            scheme: scheme.to_owned(),
            host: host.to_owned(),
            path: path.to_owned(),
            query: query.to_owned(),
            has_path: true,
        }
    }

    #[test]
    fn strips_matching_base() {
        assert_eq!(match_path("app/docs/readme", "/app/"), "docs/readme");
    }

    #[test]
    fn leaves_path_unchanged_when_base_does_not_match() {
        assert_eq!(match_path("docs/readme", "/app/"), "docs/readme");
    }

    #[test]
    fn root_base_is_a_no_op() {
        assert_eq!(match_path("docs/readme", "/"), "docs/readme");
    }

    #[test]
    fn relative_substitution_keeps_scheme_and_host() {
        let current = parts("http", "example.com", "old", "");
        let result = apply_substitution("new/path", &current, "/", false, false);
        assert_eq!(result.scheme, "http");
        assert_eq!(result.host, "example.com");
        assert_eq!(result.path, "new/path");
    }

    #[test]
    fn absolute_substitution_overwrites_scheme_and_host() {
        let current = parts("http", "example.com", "old", "");
        let result = apply_substitution("https://other.test/x", &current, "/", false, false);
        assert_eq!(result.scheme, "https");
        assert_eq!(result.host, "other.test");
        assert_eq!(result.path, "x");
    }

    #[test]
    fn relative_path_is_prefixed_with_non_root_base() {
        let current = parts("http", "example.com", "old", "");
        let result = apply_substitution("new", &current, "/app/", false, false);
        assert_eq!(result.path, "app/new");
    }

    #[test]
    fn qsdiscard_drops_original_query() {
        let current = parts("http", "example.com", "old", "a=1");
        let result = apply_substitution("new?b=2", &current, "/", false, true);
        assert_eq!(result.query, "b=2");
    }

    #[test]
    fn qsappend_joins_new_and_original_query() {
        let current = parts("http", "example.com", "old", "a=1");
        let result = apply_substitution("new?b=2", &current, "/", true, false);
        assert_eq!(result.query, "b=2&a=1");
    }

    #[test]
    fn empty_new_query_inherits_original_by_default() {
        let current = parts("http", "example.com", "old", "a=1");
        let result = apply_substitution("new", &current, "/", false, false);
        assert_eq!(result.query, "a=1");
    }
}
