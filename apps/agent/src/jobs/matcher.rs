//! Relevance scoring: pluggable, trait-based scorer that measures a posting against the
//! skills found on the resume.
//!
//! Default: `KeywordRelevanceScorer` (deterministic whole-term matching).
//! `AppState` holds an `Arc<dyn RelevanceScorer>`.

use std::collections::BTreeSet;

use serde::Serialize;

use super::models::JobPosting;
use crate::text::{html_to_text, term_patterns};

/// Minimum score a posting must exceed to be kept.
pub const DEFAULT_RELEVANCE_THRESHOLD: i64 = 2;

const TITLE_WEIGHT: i64 = 2;
const DESCRIPTION_WEIGHT: i64 = 1;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Relevance {
    pub score: i64,
    /// Sorted, each skill once.
    pub matched_skills: Vec<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Trait definition
// ────────────────────────────────────────────────────────────────────────────

pub trait RelevanceScorer: Send + Sync {
    fn score(&self, job: &JobPosting, skills: &BTreeSet<String>) -> Relevance;
}

// ────────────────────────────────────────────────────────────────────────────
// KeywordRelevanceScorer
// ────────────────────────────────────────────────────────────────────────────

/// Algorithm:
/// 1. each skill found as a whole term in the title → +2
/// 2. each skill found as a whole term in the description text (markup stripped) → +1
///
/// A skill found in both places counts for both.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordRelevanceScorer;

impl RelevanceScorer for KeywordRelevanceScorer {
    fn score(&self, job: &JobPosting, skills: &BTreeSet<String>) -> Relevance {
        let patterns = term_patterns(skills.iter().map(String::as_str));
        let description = html_to_text(&job.description);

        let mut score = 0;
        let mut matched = BTreeSet::new();
        for pattern in &patterns {
            if pattern.is_match(&job.title) {
                score += TITLE_WEIGHT;
                matched.insert(pattern.term().to_string());
            }
            if pattern.is_match(&description) {
                score += DESCRIPTION_WEIGHT;
                matched.insert(pattern.term().to_string());
            }
        }

        Relevance {
            score,
            matched_skills: matched.into_iter().collect(),
        }
    }
}

/// Scores every posting, keeps those strictly above `threshold` and returns them best
/// first. Ties keep their input order.
pub fn rank_jobs(
    scorer: &dyn RelevanceScorer,
    jobs: Vec<JobPosting>,
    skills: &BTreeSet<String>,
    threshold: i64,
) -> Vec<JobPosting> {
    if skills.is_empty() {
        return Vec::new();
    }
    let mut ranked: Vec<JobPosting> = jobs
        .into_iter()
        .filter_map(|mut job| {
            let relevance = scorer.score(&job, skills);
            if relevance.score <= threshold {
                return None;
            }
            job.match_score = relevance.score;
            job.matched_skills = relevance.matched_skills;
            Some(job)
        })
        .collect();
    ranked.sort_by(|a, b| b.match_score.cmp(&a.match_score));
    ranked
}
