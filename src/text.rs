//! Text Normalizer Module
//!
//! Strips structural noise (page-break markers, header labels) from raw
//! passage and question text, and extracts usable revision questions from
//! retrieved passages.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::clients::RetrievedPassage;

// == Public Constants ==
/// Maximum length of a normalized question, in characters
pub const MAX_QUESTION_LEN: usize = 200;

// == Patterns ==
static PAGE_BREAK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^-+\s*page\s+-+\s*").expect("valid page-break pattern"));
static DASH_RUN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-{3,}").expect("valid dash-run pattern"));
static LABEL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(index|chapter|section|part|revision|questions?)[\s:]+")
        .expect("valid label pattern")
});
static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace pattern"));
static ENUMERATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{1,3}[.)]\s*\(?\w?\)?").expect("valid enumeration pattern"));

/// Prefixes marking structural noise rather than content.
const NOISE_PREFIXES: [&str; 5] = ["index", "--- page", "chapter", "fig.", "plate"];

/// Section headers that look like questions but are not.
const HEADER_KEYWORDS: [&str; 10] = [
    "introduction",
    "the cell",
    "the light microscope",
    "the electron microscope",
    "classification",
    "preparation of",
    "estimation of",
    "external features",
    "magnification",
    "handling and care",
];

/// Interrogatives and instruction verbs that mark a real question.
const QUESTION_KEYWORDS: [&str; 19] = [
    "what",
    "why",
    "how",
    "when",
    "where",
    "which",
    "who",
    "explain",
    "define",
    "describe",
    "list",
    "state",
    "name",
    "give",
    "distinguish",
    "compare",
    "calculate",
    "discuss",
    "identify",
];

// == Normalization ==
/// Normalizes raw question text into its canonical form.
///
/// Removes page-break markers, dash runs, and leading structural labels,
/// collapses whitespace, and truncates to [`MAX_QUESTION_LEN`] characters at
/// the nearest word boundary without appending ellipsis markers.
///
/// Idempotent: `normalize_question(normalize_question(x)) == normalize_question(x)`.
/// All-boilerplate input yields an empty string; the caller decides fallback.
pub fn normalize_question(raw: &str) -> String {
    // One pass can uncover new leading boilerplate (stacked labels, markers
    // hidden behind dash runs), so run to a fixpoint; every pass only
    // removes characters, so this terminates quickly
    let mut text = normalize_pass(raw);
    loop {
        let next = normalize_pass(&text);
        if next == text {
            return text;
        }
        text = next;
    }
}

fn normalize_pass(raw: &str) -> String {
    let mut text = raw.trim().to_string();
    text = PAGE_BREAK_RE.replace(&text, "").into_owned();
    text = DASH_RUN_RE.replace_all(&text, "").into_owned();
    text = LABEL_RE.replace(text.trim_start(), "").into_owned();

    let collapsed = WHITESPACE_RE.replace_all(&text, " ");
    truncate_at_word_boundary(collapsed.trim(), MAX_QUESTION_LEN)
}

/// Truncates text to at most `max` characters, cutting back to the last
/// word boundary when one exists. Deterministic, no ellipsis.
fn truncate_at_word_boundary(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let cut: String = text.chars().take(max).collect();
    match cut.rfind(' ') {
        Some(idx) => cut[..idx].trim_end().to_string(),
        None => cut,
    }
}

/// Rough token estimate for prompt budgeting (four characters per token).
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count() / 4 + 1
}

// == Revision Question Extraction ==
/// Extracts usable revision questions from retrieved passages, in passage
/// order. Each passage holds one candidate question; structural noise and
/// section headers are rejected and exact duplicates dropped.
pub fn extract_revision_questions(passages: &[RetrievedPassage]) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut questions = Vec::new();

    for passage in passages {
        let Some(cleaned) = clean_line(&passage.text) else {
            continue;
        };
        if !is_likely_question(&cleaned) {
            continue;
        }
        if seen.insert(cleaned.clone()) {
            questions.push(cleaned);
        }
    }

    questions
}

/// Trims a candidate line and rejects structural noise. Returns `None` when
/// nothing usable remains.
fn clean_line(raw: &str) -> Option<String> {
    let text = raw.trim();
    if text.is_empty() {
        return None;
    }
    let lower = text.to_lowercase();
    if NOISE_PREFIXES.iter().any(|p| lower.starts_with(p)) {
        return None;
    }
    Some(text.to_string())
}

/// Distinguishes actual questions from section headers.
fn is_likely_question(text: &str) -> bool {
    let text = text.trim();
    if text.len() < 15 {
        return false;
    }

    let lower = text.to_lowercase();

    // Section headers are short titles without question characteristics
    if HEADER_KEYWORDS
        .iter()
        .any(|k| lower == *k || lower.starts_with(&format!("{} ", k)))
    {
        return false;
    }

    if text.contains('?') {
        return true;
    }

    if ENUMERATION_RE.is_match(text) {
        return true;
    }

    let has_keyword = QUESTION_KEYWORDS.iter().any(|w| lower.contains(w));
    if has_keyword {
        return true;
    }

    text.len() >= 50
}
