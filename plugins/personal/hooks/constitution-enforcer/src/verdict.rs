//! Matching a response against the catalogue and deciding its fate.

use std::collections::HashSet;
use std::fmt;

use crate::rules::{catalogue, PatternRule};

/// Most labels a rejection report lists.
pub const MAX_REPORTED_LABELS: usize = 5;

/// Why a run approved without judging any text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    AlreadyRetrying,
    NoTranscriptPath,
    TranscriptUnavailable,
    NoAssistantTurn,
    EmptyResponse,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Self::AlreadyRetrying => "already retrying after a rejection",
            Self::NoTranscriptPath => "no transcript path",
            Self::TranscriptUnavailable => "transcript unavailable",
            Self::NoAssistantTurn => "no assistant turn in transcript",
            Self::EmptyResponse => "latest assistant turn has no text",
        };
        f.write_str(reason)
    }
}

/// Distinct labels of the rules that matched, in catalogue order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViolationReport {
    labels: Vec<&'static str>,
}

impl ViolationReport {
    /// Deduplicate (first occurrence wins) and keep at most `MAX_REPORTED_LABELS`.
    fn from_labels(matched: impl IntoIterator<Item = &'static str>) -> Self {
        let mut seen = HashSet::new();
        let labels = matched
            .into_iter()
            .filter(|label| seen.insert(*label))
            .take(MAX_REPORTED_LABELS)
            .collect();
        Self { labels }
    }

    pub fn labels(&self) -> &[&'static str] {
        &self.labels
    }
}

impl fmt::Display for ViolationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CONSTITUTION VIOLATION DETECTED. You MUST fix this and retry. \
             Violations: {}. \
             You are PROHIBITED from deferring requirements. \
             Solve the problem NOW or state BLOCKER: [specific issue] and ask for a decision.",
            self.labels.join(", ")
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Approve,
    Reject(ViolationReport),
}

/// Judge `text` against the built-in catalogue.
pub fn scan(text: &str) -> Decision {
    scan_with(catalogue(), text)
}

/// Every rule is evaluated; the report lists all distinct categories found.
pub fn scan_with(rules: &[PatternRule], text: &str) -> Decision {
    let matched: Vec<&'static str> = rules
        .iter()
        .filter(|rule| rule.is_match(text))
        .map(PatternRule::label)
        .collect();

    if matched.is_empty() {
        return Decision::Approve;
    }

    tracing::info!(?matched, "deferral patterns matched");
    Decision::Reject(ViolationReport::from_labels(matched))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
