// Prompt constants and builders for the insight generator.

use std::collections::BTreeSet;

use crate::jobs::models::JobPosting;
use crate::text::{html_to_text, truncate_chars};

/// Job descriptions are cut to this many characters before they go into a prompt.
pub const DESCRIPTION_LIMIT: usize = 1000;

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You are a precise, structured assistant. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences.";

pub const CAREER_COACH_SYSTEM: &str = "You are a concise career coach. \
    Only use skills and experience the candidate actually lists.";

pub fn talking_points_prompt(job: &JobPosting, skills: &BTreeSet<String>) -> String {
    let skills: Vec<&str> = skills.iter().map(String::as_str).collect();
    format!(
        "Give 3 or 4 short talking points for a cover letter or interview. Each point ties one \
         of my skills to a requirement in the job description.\n\n\
         Job title: {title}\nCompany: {company}\nJob description: \"{description}\"\n\n\
         My skills: {skills}\n\n\
         Respond as {{\"points\": [\"...\", \"...\"]}}.",
        title = or_na(&job.title),
        company = or_na(&job.company),
        description = description_excerpt(job),
        skills = skills.join(", "),
    )
}

pub fn application_text_prompt(job: &JobPosting, resume_text: &str) -> String {
    format!(
        "Write a short cover letter (at most 180 words, plain text, no placeholders) for this \
         application. Base every claim on the resume.\n\n\
         Job title: {title}\nCompany: {company}\nJob description: \"{description}\"\n\n\
         Resume:\n{resume}",
        title = or_na(&job.title),
        company = or_na(&job.company),
        description = description_excerpt(job),
        resume = truncate_chars(resume_text.trim(), 4 * DESCRIPTION_LIMIT),
    )
}

fn description_excerpt(job: &JobPosting) -> String {
    let text = html_to_text(&job.description);
    let excerpt = truncate_chars(&text, DESCRIPTION_LIMIT);
    if excerpt.len() < text.len() {
        format!("{excerpt}...")
    } else {
        excerpt.to_string()
    }
}

fn or_na(value: &str) -> &str {
    if value.trim().is_empty() {
        "N/A"
    } else {
        value
    }
}
