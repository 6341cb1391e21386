//! Resource bounds the caller configures per [`crate::evaluate`] call.
//!
//! These are the only knobs the core exposes; there is no configuration
//! *file* format here — a host that wants one (TOML, JSON, whatever)
//! populates this struct itself.

/// Resource bounds enforced while evaluating a rewrite document.
///
/// All bounds exist to guarantee termination and predictable latency on
/// arbitrary, possibly adversarial, input (§5 of the design). None of them
/// change the *meaning* of a rewrite document that stays within the
/// bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Rules whose condition group succeeds count toward this cap; once
    /// exceeded, evaluation halts with `status=LimitExceeded`.
    pub max_iterations: u32,
    /// Request URLs longer than this are rejected before evaluation runs.
    pub max_url_length: usize,
    /// Patterns longer than this are rejected outright, and match subjects
    /// longer than this never match, by the regex safety layer.
    pub max_regex_subject_length: usize,
    /// If set, documents parsing to more directive nodes than this are
    /// rejected before evaluation runs.
    pub max_rule_count: Option<usize>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            max_url_length: 8192,
            max_regex_subject_length: 2048,
            max_rule_count: None,
        }
    }
}
