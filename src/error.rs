//! Error types surfaced while compiling patterns or parsing directive
//! arguments.
//!
//! None of these errors ever escape [`crate::evaluate`] — every variant is
//! converted into trace content (a [`crate::TraceLine`] with `valid=false`
//! and a human-readable `message`) rather than propagated to the caller.
//! They exist so the parser and safety layer can report *why* a line was
//! rejected instead of collapsing every failure into a single boolean.

use thiserror::Error;

/// Rejection reason produced by the [regex safety layer](crate::safety).
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PatternError {
    #[error("pattern exceeds the maximum subject length ({0} bytes)")]
    PatternTooLong(usize),

    #[error("pattern rejected: {0}")]
    DangerousPattern(&'static str),

    #[error("pattern uses an unsupported PCRE-only construct: {0}")]
    UnsupportedPcre(&'static str),

    #[error("invalid regex syntax: {0}")]
    InvalidSyntax(String),
}

/// Failure parsing a single `RewriteRule` argument list.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RuleParseError {
    #[error("rule is missing a pattern")]
    MissingPattern,

    #[error("rule is missing a substitution")]
    MissingSubstitution,

    #[error("quotation never closed in rule expression")]
    UnclosedQuotation,
}

/// Failure parsing a single `RewriteCond` argument list.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CondParseError {
    #[error("condition is missing a test string")]
    MissingTestString,

    #[error("condition is missing a pattern")]
    MissingPattern,

    #[error("quotation never closed in condition expression")]
    UnclosedQuotation,
}

/// Failure parsing a `RewriteEngine` or `RewriteBase` directive.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DirectiveParseError {
    #[error("RewriteEngine argument must be On or Off, got {0:?}")]
    InvalidEngineState(String),

    #[error("RewriteBase requires exactly one non-empty argument")]
    MissingBase,

    #[error(transparent)]
    Rule(#[from] RuleParseError),

    #[error(transparent)]
    Cond(#[from] CondParseError),
}

/// Errors rejected at the host boundary before the state machine runs,
/// per the input-shape error class in the core's error taxonomy.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CoreError {
    #[error("url length {0} exceeds configured maximum")]
    UrlTooLong(usize),

    #[error("rule count {0} exceeds configured maximum")]
    TooManyRules(usize),
}
