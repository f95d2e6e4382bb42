//! Rule-based requirement scoring.
//!
//! Embedding distance measures textual closeness, not fulfillment: a CV
//! saying "English intermediate" sits closer to "English fluent" than one
//! saying "Vietnamese native, English fluent IELTS 7.5", yet only the latter
//! meets the requirement. This pass checks the requirements literally and
//! produces the symbolic half of the fused score.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

use crate::language::level_index;
use crate::{CandidateProfile, JobProfile, LanguageEntry};

const LANGUAGE_WEIGHT: f64 = 0.25;
const SKILL_WEIGHT: f64 = 0.50;
const EXPERIENCE_WEIGHT: f64 = 0.25;

// Detail lists are capped to keep result payloads small.
const MATCHED_MUST_CAP: usize = 10;
const MISSING_MUST_CAP: usize = 10;
const MATCHED_NICE_CAP: usize = 5;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SkillMatchDetails {
    pub must_have_coverage: f64,
    pub matched_must_have: Vec<String>,
    pub missing_must_have: Vec<String>,
    pub nice_to_have_coverage: f64,
    pub matched_nice_to_have: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SymbolicDetails {
    pub language: Vec<String>,
    pub skills: SkillMatchDetails,
    pub experience: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SymbolicResult {
    pub total_score: f64,
    pub language_score: f64,
    pub skill_score: f64,
    pub experience_score: f64,
    pub details: SymbolicDetails,
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn normalize_skill_name(skill: &str) -> String {
    skill.nfkc().collect::<String>().trim().to_lowercase()
}

/// Score language requirements against the candidate's listed languages.
/// Full credit when the candidate's ladder level meets or exceeds the
/// requirement, half credit when the gap is at most two steps.
pub fn score_language_match(
    jd_languages: &[LanguageEntry],
    cv_languages: &[LanguageEntry],
) -> (f64, Vec<String>) {
    if jd_languages.is_empty() {
        return (1.0, vec!["No language requirements specified".into()]);
    }
    if cv_languages.is_empty() {
        return (0.0, vec!["Candidate has no languages listed".into()]);
    }

    let cv_map: Vec<(String, String, usize)> = cv_languages
        .iter()
        .filter_map(|lang| {
            let name = lang.name.as_deref()?.trim().to_lowercase();
            if name.is_empty() {
                return None;
            }
            let level = lang.effective_level();
            let idx = level_index(&level);
            Some((name, level, idx))
        })
        .collect();

    // Unnamed requirement entries still count toward the denominator; they
    // can never earn credit.
    let total_requirements = jd_languages.len();
    let mut met = 0.0;
    let mut details = Vec::new();

    for req in jd_languages {
        let Some(req_name) = req.name.as_deref().map(|n| n.trim().to_lowercase()) else {
            continue;
        };
        if req_name.is_empty() {
            continue;
        }
        let req_level = req.level.clone().unwrap_or_default();
        let req_idx = level_index(&req_level);

        let matched = cv_map
            .iter()
            .find(|(cv_name, _, _)| req_name.contains(cv_name) || cv_name.contains(&req_name));

        match matched {
            Some((_, cv_level, cv_idx)) => {
                if *cv_idx >= req_idx {
                    met += 1.0;
                    details.push(format!(
                        "[OK] {req_name}: required {req_level}, has {cv_level}"
                    ));
                } else if req_idx - cv_idx <= 2 {
                    met += 0.5;
                    details.push(format!(
                        "[PARTIAL] {req_name}: required {req_level}, has {cv_level} (close)"
                    ));
                } else {
                    details.push(format!(
                        "[GAP] {req_name}: required {req_level}, has {cv_level} (insufficient)"
                    ));
                }
            }
            None => {
                details.push(format!(
                    "[MISSING] {req_name}: required {req_level}, not listed in CV"
                ));
            }
        }
    }

    (met / total_requirements as f64, details)
}

fn extract_candidate_skills(candidate: &CandidateProfile) -> BTreeSet<String> {
    candidate
        .skills
        .values()
        .flatten()
        .map(|entry| normalize_skill_name(entry.name()))
        .filter(|name| !name.is_empty())
        .collect()
}

fn extract_job_skills(job: &JobProfile) -> (BTreeSet<String>, BTreeSet<String>) {
    let collect = |groups: &[crate::RequirementGroup]| -> BTreeSet<String> {
        groups
            .iter()
            .flat_map(|group| group.items.iter())
            .map(|item| normalize_skill_name(item))
            .filter(|name| !name.is_empty())
            .collect()
    };

    let mut must_have = collect(&job.requirements.must_have);
    let nice_to_have = collect(&job.requirements.nice_to_have);

    // Skills listed in the job's skills block are treated as required.
    must_have.extend(
        job.skills
            .values()
            .flatten()
            .map(|skill| normalize_skill_name(skill))
            .filter(|name| !name.is_empty()),
    );

    (must_have, nice_to_have)
}

fn contains_either_way(a: &str, b: &str) -> bool {
    a.contains(b) || b.contains(a)
}

/// Coverage of must-have (80%) and nice-to-have (20%) skills, with
/// bidirectional substring matching so "postgresql" covers "postgres".
pub fn score_skill_match(
    job: &JobProfile,
    candidate: &CandidateProfile,
) -> (f64, SkillMatchDetails) {
    let cv_skills = extract_candidate_skills(candidate);
    let (must_have, nice_to_have) = extract_job_skills(job);

    if must_have.is_empty() && nice_to_have.is_empty() {
        return (
            1.0,
            SkillMatchDetails {
                note: Some("No skill requirements specified".into()),
                ..SkillMatchDetails::default()
            },
        );
    }

    let mut matched_must = Vec::new();
    let mut missing_must = Vec::new();
    for skill in &must_have {
        if cv_skills.iter().any(|cv| contains_either_way(skill, cv)) {
            matched_must.push(skill.clone());
        } else {
            missing_must.push(skill.clone());
        }
    }

    let matched_nice: Vec<String> = nice_to_have
        .iter()
        .filter(|skill| cv_skills.iter().any(|cv| contains_either_way(skill, cv)))
        .cloned()
        .collect();

    let must_coverage = if must_have.is_empty() {
        1.0
    } else {
        matched_must.len() as f64 / must_have.len() as f64
    };
    let nice_coverage = if nice_to_have.is_empty() {
        0.0
    } else {
        matched_nice.len() as f64 / nice_to_have.len() as f64
    };

    let score = must_coverage * 0.8 + nice_coverage * 0.2;

    // BTreeSet iteration already yields sorted names.
    let mut details = SkillMatchDetails {
        must_have_coverage: round1(must_coverage * 100.0),
        matched_must_have: matched_must,
        missing_must_have: missing_must,
        nice_to_have_coverage: round1(nice_coverage * 100.0),
        matched_nice_to_have: matched_nice,
        note: None,
    };
    details.matched_must_have.truncate(MATCHED_MUST_CAP);
    details.missing_must_have.truncate(MISSING_MUST_CAP);
    details.matched_nice_to_have.truncate(MATCHED_NICE_CAP);

    (score, details)
}

/// Experience-years alignment against the job's minimum.
pub fn score_experience_match(job: &JobProfile, candidate: &CandidateProfile) -> (f64, String) {
    let Some(min_years) = job.experience.min_years else {
        return (1.0, "No experience requirement specified".into());
    };

    let Some(cv_years) = candidate.headline.total_years_of_experience else {
        return (
            0.5,
            format!("Experience not specified in CV (required: {min_years}+ years)"),
        );
    };

    if cv_years >= min_years {
        if cv_years >= min_years * 1.5 {
            (
                1.0,
                format!("Exceeds requirement: {cv_years} years (required: {min_years}+)"),
            )
        } else {
            (
                1.0,
                format!("Meets requirement: {cv_years} years (required: {min_years}+)"),
            )
        }
    } else {
        let score = (cv_years / min_years).max(0.3);
        (
            score,
            format!("Below requirement: {cv_years} years (required: {min_years}+)"),
        )
    }
}

/// Weighted combination of the three symbolic factors.
pub fn calculate_symbolic_score(job: &JobProfile, candidate: &CandidateProfile) -> SymbolicResult {
    let (language_score, language_details) =
        score_language_match(&job.requirements.languages, &candidate.languages);
    let (skill_score, skill_details) = score_skill_match(job, candidate);
    let (experience_score, experience_detail) = score_experience_match(job, candidate);

    let total = language_score * LANGUAGE_WEIGHT
        + skill_score * SKILL_WEIGHT
        + experience_score * EXPERIENCE_WEIGHT;

    SymbolicResult {
        total_score: round4(total),
        language_score: round4(language_score),
        skill_score: round4(skill_score),
        experience_score: round4(experience_score),
        details: SymbolicDetails {
            language: language_details,
            skills: skill_details,
            experience: experience_detail,
        },
    }
}
