//! Small text helpers shared by the matcher, the resume loader and the insight prompts.

use regex::Regex;
use scraper::Html;

/// Plain text of an HTML fragment, whitespace collapsed. Non-HTML input passes through
/// with only whitespace normalised.
pub fn html_to_text(markup: &str) -> String {
    let fragment = Html::parse_fragment(markup);
    let text: Vec<&str> = fragment.root_element().text().collect();
    collapse_whitespace(&text.join(" "))
}

pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Matches `term` as a whole term (case-insensitive): it may not be glued to letters or
/// digits on either side. Unlike `\b`, this also works for terms such as `c++` or `.net`.
#[derive(Debug, Clone)]
pub struct TermPattern {
    term: String,
    regex: Regex,
}

impl TermPattern {
    pub fn new(term: &str) -> Option<Self> {
        let term = term.trim().to_lowercase();
        if term.is_empty() {
            return None;
        }
        let pattern = format!(
            r"(?i)(?:^|[^\p{{L}}\p{{N}}]){}(?:$|[^\p{{L}}\p{{N}}])",
            regex::escape(&term)
        );
        let regex = Regex::new(&pattern).ok()?;
        Some(Self { term, regex })
    }

    pub fn term(&self) -> &str {
        &self.term
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

/// Compiles patterns for every non-blank term; duplicates are kept once.
pub fn term_patterns<'a>(terms: impl IntoIterator<Item = &'a str>) -> Vec<TermPattern> {
    let mut patterns: Vec<TermPattern> = Vec::new();
    for term in terms {
        if let Some(pattern) = TermPattern::new(term) {
            if !patterns.iter().any(|p| p.term == pattern.term) {
                patterns.push(pattern);
            }
        }
    }
    patterns
}

/// At most `max_chars` characters of `text`, cut on a char boundary.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
