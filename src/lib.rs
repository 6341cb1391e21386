//! Offline evaluator for Apache `mod_rewrite` directives.
//!
//! Given a block of `RewriteEngine`/`RewriteBase`/`RewriteCond`/`RewriteRule`
//! text, a request URL, and a map of server variables, [`evaluate`] computes
//! the resulting URL, an optional HTTP status, and a per-line trace
//! explaining why each directive was reached, matched, and applied — without
//! any network I/O, filesystem access, or external process calls.
//!
//! # Example
//!
//! ```
//! use std::collections::HashMap;
//! use htaccess_core::{evaluate, EngineConfig, EvaluateInput, Status};
//!
//! let output = evaluate(
//!     EvaluateInput {
//!         url: "http://example.com/old".to_owned(),
//!         rules: "RewriteEngine On\nRewriteRule ^old$ /new [R=301,L]".to_owned(),
//!         server_variables: HashMap::new(),
//!     },
//!     &EngineConfig::default(),
//! );
//! assert_eq!(output.final_url, "http://example.com/new");
//! assert!(matches!(output.status, Status::Redirect));
//! ```

use std::collections::HashMap;

pub mod cond;
pub mod config;
pub mod context;
pub mod error;
mod evaluator;
pub mod parser;
pub mod rule;
pub mod safety;
pub mod url;

pub use config::EngineConfig;
use error::CoreError;

/// Input to one [`evaluate`] call: the request URL, the rewrite directive
/// text, and the server-variable environment it should run against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluateInput {
    pub url: String,
    pub rules: String,
    pub server_variables: HashMap<String, String>,
}

/// Outcome category for one [`evaluate`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Evaluation ran to completion with no redirecting flag set.
    Ok,
    /// A rule applied `R`, `F`, or `G`; `status_code` carries the HTTP code.
    Redirect,
    /// Rejected at the host boundary before evaluation started (oversized
    /// URL or rule count over `max_rule_count`).
    Error,
    /// Reserved for hosts that want to distinguish "ran, but used a
    /// directive surface this core does not implement" from `Ok`; this core
    /// never produces it itself — unsupported directives are traced, not
    /// rejected (§6.2).
    Unsupported,
    /// The `max_iterations` bound was hit; the trace contains everything
    /// produced up to that point.
    LimitExceeded,
}

/// One line of the evaluation trace, in source order. Blank source lines
/// produce no entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceLine {
    pub line_no: usize,
    pub raw_line: String,
    pub valid: bool,
    pub reached: bool,
    pub met: bool,
    pub message: Option<String>,
}

/// Result of one [`evaluate`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluateOutput {
    pub final_url: String,
    pub status: Status,
    pub status_code: Option<u16>,
    pub trace: Vec<TraceLine>,
}

/// Evaluate `input.rules` against `input.url`. Never panics and never
/// performs I/O; every failure mode materializes as trace content or an
/// output status (§7).
pub fn evaluate(input: EvaluateInput, config: &EngineConfig) -> EvaluateOutput {
    if input.url.len() > config.max_url_length {
        log::warn!("{}", CoreError::UrlTooLong(input.url.len()));
        return EvaluateOutput {
            final_url: input.url,
            status: Status::Error,
            status_code: None,
            trace: Vec::new(),
        };
    }

    let Some(parsed_url) = url::parse(&input.url) else {
        log::warn!("rejecting input: url has no scheme separator");
        return EvaluateOutput {
            final_url: input.url,
            status: Status::Error,
            status_code: None,
            trace: Vec::new(),
        };
    };

    let document = parser::Document::parse(&input.rules);
    log::debug!("parsed {} directive nodes", document.len());

    if let Some(max_rule_count) = config.max_rule_count {
        if document.len() > max_rule_count {
            log::warn!("{}", CoreError::TooManyRules(document.len()));
            return EvaluateOutput {
                final_url: input.url,
                status: Status::Error,
                status_code: None,
                trace: Vec::new(),
            };
        }
    }

    let result = evaluator::run(&document, parsed_url, input.server_variables, config);
    EvaluateOutput {
        final_url: result.final_url,
        status: result.status,
        status_code: result.status_code,
        trace: result.trace,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oversized_url_is_rejected_before_evaluation() {
        let mut config = EngineConfig::default();
        config.max_url_length = 8;
        let output = evaluate(
            EvaluateInput {
                url: "http://example.com/too/long".to_owned(),
                rules: String::new(),
                server_variables: HashMap::new(),
            },
            &config,
        );
        assert!(matches!(output.status, Status::Error));
        assert!(output.trace.is_empty());
        assert_eq!(output.final_url, "http://example.com/too/long");
    }

    #[test]
    fn oversized_rule_count_is_rejected_before_evaluation() {
        let mut config = EngineConfig::default();
        config.max_rule_count = Some(1);
        let output = evaluate(
            EvaluateInput {
                url: "http://example.com/x".to_owned(),
                rules: "RewriteEngine On\nRewriteRule ^x$ /y [L]".to_owned(),
                server_variables: HashMap::new(),
            },
            &config,
        );
        assert!(matches!(output.status, Status::Error));
        assert!(output.trace.is_empty());
    }

    #[test]
    fn url_without_scheme_is_rejected() {
        let output = evaluate(
            EvaluateInput {
                url: "/relative/only".to_owned(),
                rules: String::new(),
                server_variables: HashMap::new(),
            },
            &EngineConfig::default(),
        );
        assert!(matches!(output.status, Status::Error));
    }

    #[test]
    fn empty_rules_leave_url_unchanged() {
        let output = evaluate(
            EvaluateInput {
                url: "http://example.com/x".to_owned(),
                rules: String::new(),
                server_variables: HashMap::new(),
            },
            &EngineConfig::default(),
        );
        assert!(matches!(output.status, Status::Ok));
        assert_eq!(output.final_url, "http://example.com/x");
        assert!(output.trace.is_empty());
    }

    #[test]
    fn empty_rules_leave_path_less_url_unchanged() {
        let output = evaluate(
            EvaluateInput {
                url: "http://example.com".to_owned(),
                rules: String::new(),
                server_variables: HashMap::new(),
            },
            &EngineConfig::default(),
        );
        assert_eq!(output.final_url, "http://example.com");
    }

    #[test]
    fn empty_rules_leave_root_path_url_unchanged() {
        let output = evaluate(
            EvaluateInput {
                url: "http://example.com/".to_owned(),
                rules: String::new(),
                server_variables: HashMap::new(),
            },
            &EngineConfig::default(),
        );
        assert_eq!(output.final_url, "http://example.com/");
    }
}
