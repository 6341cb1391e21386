//! Lossless line-oriented parser (§4.2).
//!
//! `Document::parse` is total over `&str` input: every line produces
//! exactly one [`DirectiveNode`], and a malformed directive becomes a
//! `ParseError` node rather than aborting the parse. This mirrors the
//! upstream crate's per-directive `FromStr` implementations
//! (`Rule::from_str`, `Condition::from_str`, `State::from_str`), but instead
//! of bubbling a `Result` up through `ExpressionList::from_str` and
//! stopping at the first bad line, each directive's parse failure is
//! captured and the next line is still processed.

pub mod node;
mod tokenize;

use log::{trace, warn};

pub use node::{DirectiveNode, RuleFlags};

use crate::error::{CondParseError, DirectiveParseError, RuleParseError};

/// An ordered sequence of directive nodes produced by [`Document::parse`].
#[derive(Debug, Clone)]
pub struct Document {
    pub nodes: Vec<DirectiveNode>,
}

impl Document {
    /// Parse `text` into a [`Document`]. Never fails; malformed lines
    /// become [`DirectiveNode::ParseError`] nodes.
    pub fn parse(text: &str) -> Self {
        let nodes = text
            .split('\n')
            .enumerate()
            .map(|(i, line)| parse_line(i + 1, line.strip_suffix('\r').unwrap_or(line)))
            .collect();
        Document { nodes }
    }

    /// Count of parsed nodes, used by the host-boundary `max_rule_count`
    /// check before evaluation runs.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

fn parse_line(line_no: usize, raw_line: &str) -> DirectiveNode {
    let trimmed = raw_line.trim();
    if trimmed.is_empty() {
        return DirectiveNode::Blank {
            line_no,
            raw_line: raw_line.to_owned(),
        };
    }
    if let Some(text) = trimmed.strip_prefix('#') {
        return DirectiveNode::Comment {
            line_no,
            raw_line: raw_line.to_owned(),
            text: text.trim().to_owned(),
        };
    }

    let (name, rest) = trimmed
        .split_once(char::is_whitespace)
        .unwrap_or((trimmed, ""));
    let rest = rest.trim();
    let owned_raw = raw_line.to_owned();

    match name.to_ascii_lowercase().as_str() {
        "rewriteengine" => parse_engine_toggle(line_no, owned_raw, rest),
        "rewritebase" => parse_base(line_no, owned_raw, rest),
        "rewritecond" => parse_cond(line_no, owned_raw, rest),
        "rewriterule" => parse_rule(line_no, owned_raw, rest),
        _ => {
            trace!("line {line_no}: unrecognized directive {name:?}");
            DirectiveNode::Unknown {
                line_no,
                raw_line: owned_raw,
                directive_name: name.to_owned(),
                args: rest.to_owned(),
            }
        }
    }
}

fn parse_engine_toggle(line_no: usize, raw_line: String, rest: &str) -> DirectiveNode {
    match rest.to_ascii_lowercase().as_str() {
        "on" => DirectiveNode::EngineToggle {
            line_no,
            raw_line,
            on: true,
        },
        "off" => DirectiveNode::EngineToggle {
            line_no,
            raw_line,
            on: false,
        },
        _ => {
            let err = DirectiveParseError::InvalidEngineState(rest.to_owned());
            warn!("line {line_no}: {err}");
            DirectiveNode::ParseError {
                line_no,
                raw_line,
                message: err.to_string(),
            }
        }
    }
}

fn parse_base(line_no: usize, raw_line: String, rest: &str) -> DirectiveNode {
    if rest.is_empty() {
        let err = DirectiveParseError::MissingBase;
        warn!("line {line_no}: {err}");
        return DirectiveNode::ParseError {
            line_no,
            raw_line,
            message: err.to_string(),
        };
    }
    DirectiveNode::Base {
        line_no,
        raw_line,
        base: rest.to_owned(),
    }
}

fn parse_cond(line_no: usize, raw_line: String, rest: &str) -> DirectiveNode {
    let tokens = match tokenize::tokenize(rest) {
        Some(tokens) => tokens,
        None => {
            let err = DirectiveParseError::Cond(CondParseError::UnclosedQuotation);
            warn!("line {line_no}: {err}");
            return DirectiveNode::ParseError {
                line_no,
                raw_line,
                message: err.to_string(),
            };
        }
    };
    if tokens.len() < 2 {
        let err = DirectiveParseError::Cond(if tokens.is_empty() {
            CondParseError::MissingTestString
        } else {
            CondParseError::MissingPattern
        });
        warn!("line {line_no}: {err}");
        return DirectiveNode::ParseError {
            line_no,
            raw_line,
            message: err.to_string(),
        };
    }

    let test_string = tokens[0].clone();
    let (negated, cond_pattern) = match tokens[1].strip_prefix('!') {
        Some(rest) => (true, rest.to_owned()),
        None => (false, tokens[1].clone()),
    };

    let mut nocase = false;
    let mut ornext = false;
    if let Some(flag_list) = tokens.get(2) {
        for token in split_flag_list(flag_list) {
            match token.to_ascii_uppercase().as_str() {
                "NC" | "NOCASE" => nocase = true,
                "OR" | "ORNEXT" => ornext = true,
                _ => trace!("line {line_no}: ignoring unknown condition flag {token:?}"),
            }
        }
    }

    DirectiveNode::Cond {
        line_no,
        raw_line,
        test_string,
        cond_pattern,
        nocase,
        ornext,
        negated,
    }
}

fn parse_rule(line_no: usize, raw_line: String, rest: &str) -> DirectiveNode {
    let tokens = match tokenize::tokenize(rest) {
        Some(tokens) => tokens,
        None => {
            let err = DirectiveParseError::Rule(RuleParseError::UnclosedQuotation);
            warn!("line {line_no}: {err}");
            return DirectiveNode::ParseError {
                line_no,
                raw_line,
                message: err.to_string(),
            };
        }
    };
    if tokens.len() < 2 {
        let err = DirectiveParseError::Rule(if tokens.is_empty() {
            RuleParseError::MissingPattern
        } else {
            RuleParseError::MissingSubstitution
        });
        warn!("line {line_no}: {err}");
        return DirectiveNode::ParseError {
            line_no,
            raw_line,
            message: err.to_string(),
        };
    }

    let pattern = tokens[0].clone();
    let substitution = tokens[1].clone();
    let mut flags = RuleFlags::default();
    if let Some(flag_list) = tokens.get(2) {
        for token in split_flag_list(flag_list) {
            apply_rule_flag(line_no, &token, &mut flags);
        }
    }

    DirectiveNode::Rule {
        line_no,
        raw_line,
        pattern,
        substitution,
        flags,
    }
}

fn split_flag_list(s: &str) -> Vec<String> {
    let inner = s.strip_prefix('[').unwrap_or(s);
    let inner = inner.strip_suffix(']').unwrap_or(inner);
    inner
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_owned())
        .collect()
}

fn apply_rule_flag(line_no: usize, token: &str, flags: &mut RuleFlags) {
    let (prefix, value) = match token.split_once('=') {
        Some((p, v)) => (p, Some(v)),
        None => (token, None),
    };
    match prefix.to_ascii_uppercase().as_str() {
        "L" | "LAST" => flags.last = true,
        "R" | "REDIRECT" => {
            flags.redirect = Some(value.and_then(|v| v.parse().ok()).unwrap_or(302))
        }
        "NC" | "NOCASE" => flags.nocase = true,
        "QSA" | "QSAPPEND" => flags.qsappend = true,
        "QSD" | "QSDISCARD" => flags.qsdiscard = true,
        "NE" | "NOESCAPE" => flags.noescape = true,
        "N" | "NEXT" => flags.next = true,
        "END" => flags.end = true,
        "F" | "FORBIDDEN" => flags.forbidden = true,
        "G" | "GONE" => flags.gone = true,
        "C" | "CHAIN" => flags.chain = true,
        "S" | "SKIP" => flags.skip = Some(value.and_then(|v| v.parse().ok()).unwrap_or(1)),
        "PT" | "PASSTHROUGH" => flags.passthrough = true,
        "P" | "PROXY" => flags.proxy = true,
        "T" => flags.type_ = value.map(|v| v.to_owned()),
        "E" => {
            if let Some(v) = value {
                flags.env.push(v.to_owned());
            }
        }
        "CO" => {
            if let Some(v) = value {
                flags.cookie.push(v.to_owned());
            }
        }
        _ => trace!("line {line_no}: ignoring unknown rule flag {token:?}"),
    }
}
