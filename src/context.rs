//! Server-variable environment and the `%{NAME}` / `$N` / `%N` variable
//! expansion grammar (§6.3).
//!
//! Adapted from the upstream crate's `conditions::context::EngineCtx`, which
//! fans variable lookups out across typed `DateCtx`/`ServerCtx`/`RequestCtx`
//! sub-contexts. This core instead keeps a single `HashMap<String, String>`
//! per the distilled specification's "mapping from server-variable names to
//! string values" data model, seeded from the caller's `server_variables`
//! plus synthesized entries — the same synthesis `DateCtx` performs, just
//! flattened into one map instead of a second typed struct.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

static SERVER_VAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"%\{([A-Za-z0-9_]+)\}").unwrap());

/// Server-variable environment seeded once at the start of an evaluation.
#[derive(Debug, Clone)]
pub struct Env {
    vars: HashMap<String, String>,
}

impl Env {
    /// Build the environment for one evaluation: caller-supplied variables,
    /// overridden by the synthesized request variables, enriched with the
    /// current `TIME*` variables the way the upstream crate's `DateCtx`
    /// does.
    pub fn new(
        mut server_variables: HashMap<String, String>,
        request_uri: String,
        query_string: String,
    ) -> Self {
        server_variables.insert("REQUEST_URI".to_owned(), request_uri);
        server_variables.insert("QUERY_STRING".to_owned(), query_string);
        for (key, value) in synthesized_time_vars() {
            server_variables.entry(key.to_owned()).or_insert(value);
        }
        Self {
            vars: server_variables,
        }
    }

    /// Look up a single variable, resolving unknown names to the empty
    /// string per §6.3.
    pub fn get(&self, name: &str) -> &str {
        self.vars.get(name).map(String::as_str).unwrap_or("")
    }
}

fn synthesized_time_vars() -> [(&'static str, String); 8] {
    let now = chrono::Local::now();
    [
        ("TIME_YEAR", now.format("%Y").to_string()),
        ("TIME_MONTH", now.format("%m").to_string()),
        ("TIME_DAY", now.format("%d").to_string()),
        ("TIME_HOUR", now.format("%H").to_string()),
        ("TIME_MIN", now.format("%M").to_string()),
        ("TIME_SEC", now.format("%S").to_string()),
        ("TIME_WDAY", now.format("%A").to_string()),
        ("TIME", now.format("%Y-%m-%d %H:%M:%S").to_string()),
    ]
}

/// Fixed-width backreference slots. Slot 0 is the full match; slots 1-9 are
/// capture groups 1 through 9. Missing slots are the empty string.
pub type Captures = [String; 10];

pub fn empty_captures() -> Captures {
    Default::default()
}

/// Resolve `%{NAME}`, then `$N`, then `%N` in `expr`, each exactly once, in
/// that order (§6.3 / §4.3 "Variable resolution"). `$0` resolves to the
/// full rule match (the same pass that resolves `$1..$9`, per §4.3's
/// substitution step); `%0` is not part of the condition-backreference
/// grammar (§6.3 scopes it to `1-9`) and is left untouched.
pub fn resolve(expr: &str, env: &Env, rule_captures: &Captures, cond_captures: &Captures) -> String {
    let after_vars = SERVER_VAR.replace_all(expr, |c: &regex::Captures| env.get(&c[1]).to_owned());
    let after_rule = replace_digit_refs(&after_vars, '$', rule_captures, true);
    replace_digit_refs(&after_rule, '%', cond_captures, false)
}

fn replace_digit_refs(s: &str, marker: char, captures: &Captures, include_zero: bool) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if c == marker {
            if let Some(&d) = chars.peek() {
                if d.is_ascii_digit() && (d != '0' || include_zero) {
                    let slot = d.to_digit(10).unwrap() as usize;
                    out.push_str(&captures[slot]);
                    chars.next();
                    continue;
                }
            }
        }
        out.push(c);
    }
    out
}
