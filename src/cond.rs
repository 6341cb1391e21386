//! `RewriteCond` evaluation (§4.3 "Individual condition evaluation").
//!
//! Narrowed from the upstream crate's `conditions::matcher::Match`, which
//! also supports `-eq`/`-gt`/... integer comparisons and `-f`/`-d`/...
//! file-attribute tests. Those are out of scope here: the distilled
//! specification's `Cond` data model is exactly
//! `{test_string, cond_pattern, nocase, ornext, negated}` — a single regex
//! pattern match — and file-attribute tests are an explicit Non-goal
//! (§1, "does not simulate filesystem existence tests").

use crate::config::EngineConfig;
use crate::context::{Captures, Env};
use crate::{context, safety};

/// Outcome of evaluating one `RewriteCond` against the current state.
pub enum CondOutcome {
    /// Pattern compiled and was evaluated; `met` already accounts for
    /// `negated`. `captures` holds the raw (pre-negation) match's capture
    /// groups, present only when the (non-negated) pattern matched.
    Evaluated { met: bool, captures: Option<Vec<String>> },
    /// Pattern was rejected by the safety layer; always `met=false`,
    /// `valid=false` at the trace layer.
    Invalid { message: String },
}

/// Evaluate a single condition. `test_string` and `cond_pattern` are the
/// raw (unresolved) node fields; variable resolution happens here using the
/// engine's current `env`/backreference state.
pub fn evaluate(
    test_string: &str,
    cond_pattern: &str,
    nocase: bool,
    negated: bool,
    env: &Env,
    rule_captures: &Captures,
    cond_captures: &Captures,
    config: &EngineConfig,
) -> CondOutcome {
    let subject = context::resolve(test_string, env, rule_captures, cond_captures);
    let pattern = context::resolve(cond_pattern, env, rule_captures, cond_captures);

    let compiled = match safety::compile(&pattern, nocase, config) {
        Ok(compiled) => compiled,
        Err(err) => {
            return CondOutcome::Invalid {
                message: err.to_string(),
            };
        }
    };

    match compiled.captures(&subject) {
        Some(captures) => CondOutcome::Evaluated {
            met: !negated,
            captures: Some(captures),
        },
        None => CondOutcome::Evaluated {
            met: negated,
            captures: None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(vars: &[(&str, &str)]) -> Env {
        let map = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Env::new(map, String::new(), String::new())
    }

    #[test]
    fn matches_without_negation() {
        let env = env(&[("HTTP_HOST", "example.com")]);
        let caps = context::empty_captures();
        let outcome = evaluate(
            "%{HTTP_HOST}",
            "^example\\.com$",
            false,
            false,
            &env,
            &caps,
            &caps,
            &EngineConfig::default(),
        );
        assert!(matches!(outcome, CondOutcome::Evaluated { met: true, .. }));
    }

    #[test]
    fn negated_match_is_not_met() {
        let env = env(&[("HTTP_HOST", "www.example.com")]);
        let caps = context::empty_captures();
        let outcome = evaluate(
            "%{HTTP_HOST}",
            r"^www\.",
            true,
            true,
            &env,
            &caps,
            &caps,
            &EngineConfig::default(),
        );
        assert!(matches!(outcome, CondOutcome::Evaluated { met: false, .. }));
    }

    #[test]
    fn invalid_pattern_is_reported() {
        let env = env(&[]);
        let caps = context::empty_captures();
        let outcome = evaluate(
            "x",
            "^(a+)+$",
            false,
            false,
            &env,
            &caps,
            &caps,
            &EngineConfig::default(),
        );
        assert!(matches!(outcome, CondOutcome::Invalid { .. }));
    }
}
