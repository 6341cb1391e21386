//! Directive-sequence evaluation (§4.3).
//!
//! Walks a parsed [`crate::parser::Document`] once, maintaining the URL and
//! backreference state described in §3 as `EvalState`, and produces one
//! [`crate::TraceLine`] per non-blank source line. Grouping `RewriteCond`
//! runs into OR-chains and resolving them against a following `RewriteRule`
//! is the evaluator-side counterpart of the upstream crate's
//! `ExprGroup::{match_conditions, rewrite}`, restructured here for a single
//! forward pass that must emit a trace entry for every line it visits,
//! rather than jumping between rule groups by index.

use std::collections::HashMap;

use crate::config::EngineConfig;
use crate::context::{self, Captures, Env};
use crate::parser::Document;
use crate::parser::node::DirectiveNode;
use crate::url::UrlParts;
use crate::{Status, TraceLine, cond, rule, safety};

struct EvalState {
    current_path: String,
    has_path: bool,
    query_string: String,
    scheme: String,
    host: String,
    env: Env,
    rule_captures: Captures,
    cond_captures: Captures,
    rewrite_base: String,
    engine_enabled: bool,
    /// Set by `L`, `R`, `F`, `G`, `END`; never cleared once set, so it alone
    /// is sufficient to gate subsequent `Cond`/`Rule` nodes — `END`'s
    /// "hard stop" is just `stopped` with no reset path, not a distinct
    /// state (§4.3 "hardStop").
    stopped: bool,
    redirect: Option<u16>,
    iterations: u32,
}

pub(crate) struct RunOutput {
    pub final_url: String,
    pub status: Status,
    pub status_code: Option<u16>,
    pub trace: Vec<TraceLine>,
}

/// Run one evaluation of `document` against `url`, starting from
/// `server_variables`. `document` is never mutated and may be reused across
/// many calls; each call builds its own [`EvalState`] (§3, "Lifecycle").
pub(crate) fn run(
    document: &Document,
    url: UrlParts,
    server_variables: HashMap<String, String>,
    config: &EngineConfig,
) -> RunOutput {
    let request_uri = if url.query.is_empty() {
        format!("/{}", url.path)
    } else {
        format!("/{}?{}", url.path, url.query)
    };
    let query = url.query.clone();
    let mut state = EvalState {
        current_path: url.path,
        has_path: url.has_path,
        query_string: url.query,
        scheme: url.scheme,
        host: url.host,
        env: Env::new(server_variables, request_uri, query),
        rule_captures: context::empty_captures(),
        cond_captures: context::empty_captures(),
        rewrite_base: "/".to_owned(),
        engine_enabled: false,
        stopped: false,
        redirect: None,
        iterations: 0,
    };

    let nodes = &document.nodes;
    let mut trace = Vec::with_capacity(nodes.len());
    let mut limit_exceeded = false;
    let mut i = 0;

    while i < nodes.len() {
        match &nodes[i] {
            DirectiveNode::Blank { .. } => {
                i += 1;
            }
            DirectiveNode::Comment { line_no, raw_line, .. } => {
                trace.push(ok_line(*line_no, raw_line.clone()));
                i += 1;
            }
            DirectiveNode::EngineToggle { line_no, raw_line, on } => {
                state.engine_enabled = *on;
                trace.push(ok_line(*line_no, raw_line.clone()));
                i += 1;
            }
            DirectiveNode::Base { line_no, raw_line, base } => {
                let reached = state.engine_enabled;
                if reached {
                    state.rewrite_base = base.clone();
                }
                trace.push(TraceLine {
                    line_no: *line_no,
                    raw_line: raw_line.clone(),
                    valid: true,
                    reached,
                    met: true,
                    message: None,
                });
                i += 1;
            }
            DirectiveNode::Unknown {
                line_no,
                raw_line,
                directive_name,
                ..
            } => {
                let reached = state.engine_enabled;
                log::warn!("line {line_no}: unsupported directive {directive_name:?}");
                trace.push(TraceLine {
                    line_no: *line_no,
                    raw_line: raw_line.clone(),
                    valid: true,
                    reached,
                    met: false,
                    message: Some(format!("Unsupported directive: {directive_name}")),
                });
                i += 1;
            }
            DirectiveNode::ParseError { line_no, raw_line, message } => {
                trace.push(TraceLine {
                    line_no: *line_no,
                    raw_line: raw_line.clone(),
                    valid: false,
                    reached: true,
                    met: false,
                    message: Some(message.clone()),
                });
                i += 1;
            }
            DirectiveNode::Cond { .. } => {
                let start = i;
                let mut end = i;
                while end < nodes.len() && matches!(nodes[end], DirectiveNode::Cond { .. }) {
                    end += 1;
                }
                let group_satisfied = evaluate_group(&nodes[start..end], &mut state, &mut trace, config);
                i = end;
                if i < nodes.len() && matches!(nodes[i], DirectiveNode::Rule { .. }) {
                    evaluate_rule(&nodes[i], group_satisfied, &mut state, &mut trace, config);
                    i += 1;
                    if state.iterations > config.max_iterations {
                        limit_exceeded = true;
                        break;
                    }
                }
            }
            DirectiveNode::Rule { .. } => {
                evaluate_rule(&nodes[i], true, &mut state, &mut trace, config);
                i += 1;
                if state.iterations > config.max_iterations {
                    limit_exceeded = true;
                    break;
                }
            }
        }
    }

    log::debug!(
        "evaluation finished: {} iterations, {} trace lines, limit_exceeded={limit_exceeded}",
        state.iterations,
        trace.len()
    );

    let final_url = UrlParts {
        scheme: state.scheme,
        host: state.host,
        path: state.current_path,
        query: state.query_string,
        has_path: state.has_path,
    }
    .reassemble();

    let status = if state.redirect.is_some() {
        Status::Redirect
    } else if limit_exceeded {
        Status::LimitExceeded
    } else {
        Status::Ok
    };

    RunOutput {
        final_url,
        status,
        status_code: state.redirect,
        trace,
    }
}

fn ok_line(line_no: usize, raw_line: String) -> TraceLine {
    TraceLine {
        line_no,
        raw_line,
        valid: true,
        reached: true,
        met: true,
        message: None,
    }
}

/// Evaluate a contiguous run of `Cond` nodes as OR-chains joined by AND
/// (§4.3 "Condition grouping semantics"). Returns whether the whole group
/// is satisfied; the caller discards this when the run isn't immediately
/// followed by a `Rule`.
fn evaluate_group(
    nodes: &[DirectiveNode],
    state: &mut EvalState,
    trace: &mut Vec<TraceLine>,
    config: &EngineConfig,
) -> bool {
    if !state.engine_enabled || state.stopped {
        for node in nodes {
            if let DirectiveNode::Cond { line_no, raw_line, .. } = node {
                trace.push(TraceLine {
                    line_no: *line_no,
                    raw_line: raw_line.clone(),
                    valid: true,
                    reached: false,
                    met: false,
                    message: None,
                });
            }
        }
        return false;
    }

    let mut satisfied_overall = true;
    let mut last_hit_captures: Option<Captures> = None;
    let mut idx = 0;
    while idx < nodes.len() {
        let chain_start = idx;
        let mut chain_end = idx;
        while chain_end + 1 < nodes.len() && chain_ornext(&nodes[chain_end]) {
            chain_end += 1;
        }

        let mut chain_satisfied = false;
        for node in &nodes[chain_start..=chain_end] {
            let DirectiveNode::Cond {
                line_no,
                raw_line,
                test_string,
                cond_pattern,
                nocase,
                negated,
                ..
            } = node
            else {
                continue;
            };

            if chain_satisfied {
                trace.push(TraceLine {
                    line_no: *line_no,
                    raw_line: raw_line.clone(),
                    valid: true,
                    reached: false,
                    met: false,
                    message: None,
                });
                continue;
            }

            match cond::evaluate(
                test_string,
                cond_pattern,
                *nocase,
                *negated,
                &state.env,
                &state.rule_captures,
                &state.cond_captures,
                config,
            ) {
                cond::CondOutcome::Evaluated { met, captures } => {
                    trace.push(TraceLine {
                        line_no: *line_no,
                        raw_line: raw_line.clone(),
                        valid: true,
                        reached: true,
                        met,
                        message: None,
                    });
                    if met {
                        chain_satisfied = true;
                        if let Some(caps) = captures {
                            if caps.iter().any(|c| !c.is_empty()) {
                                last_hit_captures = Some(pad_captures(caps));
                            }
                        }
                    }
                }
                cond::CondOutcome::Invalid { message } => {
                    log::warn!("line {line_no}: {message}");
                    trace.push(TraceLine {
                        line_no: *line_no,
                        raw_line: raw_line.clone(),
                        valid: false,
                        reached: true,
                        met: false,
                        message: Some(message),
                    });
                }
            }
        }

        satisfied_overall &= chain_satisfied;
        idx = chain_end + 1;
    }

    if satisfied_overall {
        if let Some(caps) = last_hit_captures {
            state.cond_captures = caps;
        }
    }
    satisfied_overall
}

fn chain_ornext(node: &DirectiveNode) -> bool {
    matches!(node, DirectiveNode::Cond { ornext: true, .. })
}

fn pad_captures(caps: Vec<String>) -> Captures {
    let mut arr = context::empty_captures();
    for (slot, value) in caps.into_iter().take(10).enumerate() {
        arr[slot] = value;
    }
    arr
}

/// Evaluate one `Rule` node (§4.3 "Rule evaluation" / "Substitution" /
/// "Flag application"). `group_satisfied` is the outcome of the condition
/// group immediately preceding this rule (vacuously `true` when there was
/// none).
fn evaluate_rule(
    node: &DirectiveNode,
    group_satisfied: bool,
    state: &mut EvalState,
    trace: &mut Vec<TraceLine>,
    config: &EngineConfig,
) {
    let DirectiveNode::Rule {
        line_no,
        raw_line,
        pattern,
        substitution,
        flags,
    } = node
    else {
        unreachable!("evaluate_rule called on a non-Rule node")
    };

    if !state.engine_enabled || state.stopped || !group_satisfied {
        trace.push(TraceLine {
            line_no: *line_no,
            raw_line: raw_line.clone(),
            valid: true,
            reached: false,
            met: false,
            message: None,
        });
        return;
    }

    let match_subject = rule::match_path(&state.current_path, &state.rewrite_base).to_owned();

    let compiled = match safety::compile(pattern, flags.nocase, config) {
        Ok(compiled) => compiled,
        Err(err) => {
            log::warn!("line {line_no}: {err}");
            trace.push(TraceLine {
                line_no: *line_no,
                raw_line: raw_line.clone(),
                valid: false,
                reached: true,
                met: false,
                message: Some(err.to_string()),
            });
            return;
        }
    };

    let captures = match compiled.captures(&match_subject) {
        Some(captures) => captures,
        None => {
            trace.push(TraceLine {
                line_no: *line_no,
                raw_line: raw_line.clone(),
                valid: true,
                reached: true,
                met: false,
                message: None,
            });
            return;
        }
    };

    state.rule_captures = pad_captures(captures);
    trace.push(TraceLine {
        line_no: *line_no,
        raw_line: raw_line.clone(),
        valid: true,
        reached: true,
        met: true,
        message: None,
    });
    state.iterations += 1;

    if substitution != "-" {
        let resolved = context::resolve(substitution, &state.env, &state.rule_captures, &state.cond_captures);
        let current = UrlParts {
            scheme: state.scheme.clone(),
            host: state.host.clone(),
            path: state.current_path.clone(),
            query: state.query_string.clone(),
            has_path: state.has_path,
        };
        let updated = rule::apply_substitution(
            &resolved,
            &current,
            &state.rewrite_base,
            flags.qsappend,
            flags.qsdiscard,
        );
        state.scheme = updated.scheme;
        state.host = updated.host;
        state.current_path = updated.path;
        state.query_string = updated.query;
        state.has_path = updated.has_path;
    }

    if let Some(code) = flags.redirect {
        state.redirect = Some(code);
        state.stopped = true;
    }
    if flags.forbidden {
        state.redirect = Some(403);
        state.stopped = true;
    }
    if flags.gone {
        state.redirect = Some(410);
        state.stopped = true;
    }
    if flags.last {
        state.stopped = true;
    }
    if flags.end {
        state.stopped = true;
    }
}
