//! Regex safety layer.
//!
//! Produces a compiled matcher for a rewrite/condition pattern, or a typed
//! [`PatternError`] describing why the pattern was rejected. Rejection is
//! always the safe outcome: a pattern this layer refuses is reported to the
//! caller as `valid=false` rather than ever being handed to a backtracking
//! engine that might misbehave on crafted input.
//!
//! The heuristics below are a textual blacklist, not a parser — they are a
//! conservative proxy for catastrophic-backtracking risk, not a proof. False
//! positives (rejecting a legal, safe Apache pattern) are acceptable; false
//! negatives are not supposed to happen for the constructs this layer
//! specifically targets, but no guarantee is made for constructs outside
//! that set.

use once_cell::sync::Lazy;
use regex::Regex as HeuristicRegex;
use regex_automata::{
    MatchKind,
    meta::{self, Regex},
    util,
};

use crate::config::EngineConfig;
use crate::error::PatternError;

/// PCRE-only syntax this layer refuses to even attempt to compile.
const PCRE_ONLY_TOKENS: &[&str] = &["(?R)", "(?P>", "(?(DEFINE)", "(?&", "(*", "\\K", "(?|"];

/// Matches a parenthesized group containing a top-level quantifier,
/// immediately followed by another quantifier — the shape of `(a+)+`.
static NESTED_QUANTIFIER: Lazy<HeuristicRegex> =
    Lazy::new(|| HeuristicRegex::new(r"\([^()]*[+*][^()]*\)[+*]").unwrap());

/// A pattern compiled by the safety layer, bounded to reject subjects
/// longer than the configured cap rather than attempt to match them.
#[derive(Debug)]
pub struct CompiledPattern {
    regex: Regex,
    max_subject_len: usize,
}

impl CompiledPattern {
    /// Attempt a match, returning the captured groups (slot 0 is the full
    /// match) as owned strings, bounded to the first 10 slots per the
    /// fixed-width capture convention (§3, "Capture slots as fixed-width
    /// arrays").
    ///
    /// Subjects longer than the configured cap never match — this is a
    /// length check, not an error; see [`crate::safety`] module docs.
    pub fn captures(&self, subject: &str) -> Option<Vec<String>> {
        if subject.len() > self.max_subject_len {
            return None;
        }
        let mut caps = self.regex.create_captures();
        self.regex.captures(subject, &mut caps);
        if !caps.is_match() {
            return None;
        }
        let groups = (0..10)
            .map(|i| {
                caps.get_group(i)
                    .map(|span| subject[span].to_owned())
                    .unwrap_or_default()
            })
            .collect();
        Some(groups)
    }

    /// Boolean form of [`CompiledPattern::captures`], used by conditions
    /// which never read backreferences from their own match outcome.
    pub fn is_match(&self, subject: &str) -> bool {
        if subject.len() > self.max_subject_len {
            return false;
        }
        self.regex.is_match(subject)
    }
}

fn has_overlapping_alternation(pattern: &str) -> bool {
    let mut depth = 0i32;
    let mut group_start = None;
    let bytes = pattern.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 1,
            b'(' => {
                if depth == 0 {
                    group_start = Some(i);
                }
                depth += 1;
            }
            b')' => {
                depth -= 1;
                if depth == 0 {
                    if let Some(start) = group_start.take() {
                        let inner = &pattern[start + 1..i];
                        let quantified = matches!(bytes.get(i + 1), Some(b'+' | b'*'))
                            || pattern[i + 1..].starts_with('{');
                        if quantified && inner.contains('|') {
                            let alts: Vec<&str> = inner.split('|').collect();
                            for w in alts.windows(2) {
                                if w[0] == w[1] {
                                    return true;
                                }
                            }
                        }
                    }
                }
            }
            _ => {}
        }
        i += 1;
    }
    false
}

/// Compile `pattern` into a [`CompiledPattern`], or reject it with a typed
/// [`PatternError`] describing the reason.
pub fn compile(
    pattern: &str,
    nocase: bool,
    config: &EngineConfig,
) -> Result<CompiledPattern, PatternError> {
    if pattern.len() > config.max_regex_subject_length {
        return Err(PatternError::PatternTooLong(config.max_regex_subject_length));
    }
    if let Some(token) = PCRE_ONLY_TOKENS.iter().find(|t| pattern.contains(**t)) {
        return Err(PatternError::UnsupportedPcre(token));
    }
    if NESTED_QUANTIFIER.is_match(pattern) {
        return Err(PatternError::DangerousPattern(
            "nested quantifiers risk catastrophic backtracking",
        ));
    }
    if has_overlapping_alternation(pattern) {
        return Err(PatternError::DangerousPattern(
            "overlapping alternatives repeated risk catastrophic backtracking",
        ));
    }

    let regex = Regex::builder()
        .configure(
            meta::Config::new()
                .nfa_size_limit(Some(10 * (1 << 20)))
                .hybrid_cache_capacity(2 * (1 << 20))
                .match_kind(MatchKind::LeftmostFirst)
                .utf8_empty(true),
        )
        .syntax(util::syntax::Config::new().case_insensitive(nocase))
        .build(pattern)
        .map_err(|err| PatternError::InvalidSyntax(err.to_string()))?;

    Ok(CompiledPattern {
        regex,
        max_subject_len: config.max_regex_subject_length,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> EngineConfig {
        EngineConfig::default()
    }

    #[test]
    fn rejects_nested_quantifiers() {
        let err = compile("^(a+)+$", false, &cfg()).unwrap_err();
        assert!(matches!(err, PatternError::DangerousPattern(_)));
    }

    #[test]
    fn rejects_overlapping_alternation() {
        let err = compile("(a|a){2,}", false, &cfg()).unwrap_err();
        assert!(matches!(err, PatternError::DangerousPattern(_)));
    }

    #[test]
    fn rejects_pcre_only_tokens() {
        let err = compile(r"(?R)foo", false, &cfg()).unwrap_err();
        assert!(matches!(err, PatternError::UnsupportedPcre(_)));
    }

    #[test]
    fn rejects_oversized_pattern() {
        let mut cfg = cfg();
        cfg.max_regex_subject_length = 4;
        let err = compile("^abcdef$", false, &cfg).unwrap_err();
        assert!(matches!(err, PatternError::PatternTooLong(_)));
    }

    #[test]
    fn compiles_and_matches_simple_pattern() {
        let compiled = compile(r"^/file/(.*)$", false, &cfg()).unwrap();
        let caps = compiled.captures("/file/my/doc.txt").unwrap();
        assert_eq!(caps[0], "/file/my/doc.txt");
        assert_eq!(caps[1], "my/doc.txt");
        assert!(compiled.captures("/nope").is_none());
    }

    #[test]
    fn nocase_flag_is_honored() {
        let compiled = compile("^TEST$", true, &cfg()).unwrap();
        assert!(compiled.is_match("test"));
        let compiled = compile("^TEST$", false, &cfg()).unwrap();
        assert!(!compiled.is_match("test"));
    }

    #[test]
    fn subject_over_cap_never_matches() {
        let mut cfg = cfg();
        cfg.max_regex_subject_length = 8192;
        let compiled = compile("^.*$", false, &cfg).unwrap();
        let long = "a".repeat(cfg.max_regex_subject_length + 1);
        assert!(!compiled.is_match(&long));
    }
}
