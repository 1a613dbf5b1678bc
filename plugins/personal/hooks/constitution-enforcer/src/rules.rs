//! The deferral-language catalogue.
//!
//! A flat, ordered table of case-insensitive patterns, each tagged with the
//! label reported when it matches. Compiled once per process.

use regex::Regex;
use std::sync::LazyLock;

struct RuleDef {
    pattern: &'static str,
    label: &'static str,
    /// Occurrences followed by this pattern do not count.
    unless_followed_by: Option<&'static str>,
}

const fn rule(pattern: &'static str, label: &'static str) -> RuleDef {
    RuleDef {
        pattern,
        label,
        unless_followed_by: None,
    }
}

const DEFERRAL_PATTERNS: &[RuleDef] = &[
    // Hedging
    rule(r"\byou might want to\b", r#"Hedging: "you might want to""#),
    rule(r"\byou could also\b", r#"Hedging: "you could also""#),
    rule(
        r"\bconsider\s+(adding|implementing|using)\b",
        r#"Hedging: "consider""#,
    ),
    rule(r"\bit would be good to\b", r#"Hedging: "it would be good to""#),
    // Future promises
    rule(r"\bphase 2\b", r#"Deferral: "phase 2""#),
    rule(r"\bfuture enhancement\b", r#"Deferral: "future enhancement""#),
    rule(r"\bfuture iteration\b", r#"Deferral: "future iteration""#),
    rule(
        r"\bcan be\s+(added|implemented|made)\s+(later|more dynamic)\b",
        r#"Deferral: "can be X later""#,
    ),
    rule(r"\bwe can\s+\w+\s+later\b", r#"Deferral: "we can X later""#),
    rule(
        r"\bI(?:'ll| will)\s+\w+(?:\s+\w+)?\s+later\b",
        r#"Deferral: "I'll X later""#,
    ),
    rule(r"\bif needed\s*(in the future)?\b", r#"Deferral: "if needed""#),
    rule(r"\bwhen needed\b", r#"Deferral: "when needed""#),
    // Scope deferral
    rule(r"\bout of scope\b", r#"Deferral: "out of scope""#),
    rule(r"\bbeyond\s+(the\s+)?scope\b", r#"Deferral: "beyond scope""#),
    rule(r"\bnot in scope\b", r#"Deferral: "not in scope""#),
    rule(r"\boutside\s+(the\s+)?scope\b", r#"Deferral: "outside scope""#),
    // Responsibility shifting
    rule(r"\byou will need to\b", r#"Shifting: "you will need to""#),
    rule(r"\byou'll need to\b", r#"Shifting: "you'll need to""#),
    rule(r"\bdon't forget to\b", r#"Shifting: "don't forget to""#),
    rule(r"\bmake sure to\b", r#"Shifting: "make sure to""#),
    // Minimization
    rule(r"\bbasic implementation\b", r#"Minimization: "basic implementation""#),
    rule(r"\bsimplified\s+version\b", r#"Minimization: "simplified version""#),
    // "for now, I will ..." is first-person planning, not minimization.
    RuleDef {
        pattern: r"\bfor now\b",
        label: r#"Minimization: "for now""#,
        unless_followed_by: Some(r",?\s*I"),
    },
    rule(
        r"\buse a\s+(reasonable\s+)?default\b",
        r#"Minimization: "use a default""#,
    ),
    rule(r"\ba simple\s+approach\b", r#"Minimization: "a simple approach""#),
    // Code markers, C-style and shell-style comments
    rule(r"//\s*TODO\b", "Code marker: TODO"),
    rule(r"//\s*FIXME\b", "Code marker: FIXME"),
    rule(r"//\s*PLACEHOLDER\b", "Code marker: PLACEHOLDER"),
    rule(r"//\s*HACK\b", "Code marker: HACK"),
    rule(r"//\s*XXX\b", "Code marker: XXX"),
    rule(r"//\s*STUB\b", "Code marker: STUB"),
    rule(r"#\s*TODO\b", "Code marker: TODO"),
    rule(r"#\s*FIXME\b", "Code marker: FIXME"),
];

static CATALOGUE: LazyLock<Vec<PatternRule>> =
    LazyLock::new(|| DEFERRAL_PATTERNS.iter().map(PatternRule::compile).collect());

/// The compiled catalogue, in declaration order.
pub fn catalogue() -> &'static [PatternRule] {
    &CATALOGUE
}

/// A compiled pattern and the label it reports.
#[derive(Debug)]
pub struct PatternRule {
    pattern: Regex,
    exempt_suffix: Option<Regex>,
    label: &'static str,
}

impl PatternRule {
    fn compile(def: &RuleDef) -> Self {
        Self {
            pattern: case_insensitive(def.pattern),
            // Anchored at the end of each occurrence.
            exempt_suffix: def
                .unless_followed_by
                .map(|suffix| case_insensitive(&format!("^(?:{suffix})"))),
            label: def.label,
        }
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    /// True if any occurrence of the pattern counts.
    pub fn is_match(&self, text: &str) -> bool {
        match &self.exempt_suffix {
            None => self.pattern.is_match(text),
            Some(exempt) => self
                .pattern
                .find_iter(text)
                .any(|m| !exempt.is_match(&text[m.end()..])),
        }
    }
}

fn case_insensitive(pattern: &str) -> Regex {
    Regex::new(&format!("(?i){pattern}")).expect("catalogue pattern must compile")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
