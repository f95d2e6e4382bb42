//! Token-economical profile summaries and the judgment prompt.
//!
//! Full profiles are too large to ship per candidate, so both sides are
//! reduced to the fields that actually move the assessment before the prompt
//! is assembled.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::{CandidateProfile, JobProfile, SkillEntry};

const RECENT_EXPERIENCE_CAP: usize = 3;
const HIGHLIGHTS_CAP: usize = 3;
const MUST_HAVE_PER_GROUP_CAP: usize = 5;
const MUST_HAVE_TOTAL_CAP: usize = 10;
const SKILLS_PER_CATEGORY_CAP: usize = 10;
const SKILLS_TOTAL_CAP: usize = 20;
const RESPONSIBILITIES_CAP: usize = 5;

/// Which side of the pair is being assessed for the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchDirection {
    /// The source is a candidate; jobs are judged for them.
    JobsForCandidate,
    /// The source is a job; candidates are judged for it.
    CandidatesForJob,
}

#[derive(Debug, Clone, Serialize)]
pub struct LanguageSummary {
    pub name: String,
    pub level: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExperienceSummary {
    pub title: Option<String>,
    pub company: Option<String>,
    pub duration: String,
    pub highlights: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CandidateSummary {
    pub name: Option<String>,
    pub position: Option<String>,
    pub seniority: Option<String>,
    pub years_experience: Option<f64>,
    pub skills: BTreeMap<String, Vec<String>>,
    pub recent_experience: Vec<ExperienceSummary>,
    pub languages: Vec<LanguageSummary>,
    pub domains: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct JobSummary {
    pub title: Option<String>,
    pub level: Option<String>,
    pub domain: Vec<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub working_mode: Option<String>,
    pub min_years: Option<f64>,
    pub must_have_requirements: Vec<String>,
    pub required_skills: Vec<String>,
    pub languages: Vec<LanguageSummary>,
    pub responsibilities: Vec<String>,
}

fn language_summaries(entries: &[crate::LanguageEntry]) -> Vec<LanguageSummary> {
    entries
        .iter()
        .filter_map(|lang| {
            lang.name.clone().map(|name| LanguageSummary {
                name,
                level: lang.level.clone(),
            })
        })
        .collect()
}

pub fn summarize_candidate(profile: &CandidateProfile) -> CandidateSummary {
    let skills: BTreeMap<String, Vec<String>> = profile
        .skills
        .iter()
        .filter_map(|(category, entries)| {
            let names: Vec<String> = entries
                .iter()
                .map(SkillEntry::name)
                .filter(|name| !name.is_empty())
                .map(str::to_string)
                .collect();
            (!names.is_empty()).then(|| (category.clone(), names))
        })
        .collect();

    let recent_experience = profile
        .experience
        .iter()
        .take(RECENT_EXPERIENCE_CAP)
        .map(|exp| ExperienceSummary {
            title: exp.title.clone(),
            company: exp.company.clone(),
            duration: format!(
                "{} - {}",
                exp.start_date.as_deref().unwrap_or(""),
                exp.end_date.as_deref().unwrap_or("Present")
            ),
            highlights: exp.highlights.iter().take(HIGHLIGHTS_CAP).cloned().collect(),
        })
        .collect();

    CandidateSummary {
        name: profile.identity.full_name.clone(),
        position: profile.headline.current_position.clone(),
        seniority: profile.headline.seniority.clone(),
        years_experience: profile.headline.total_years_of_experience,
        skills,
        recent_experience,
        languages: language_summaries(&profile.languages),
        domains: profile.domain_expertise.clone(),
    }
}

pub fn summarize_job(profile: &JobProfile) -> JobSummary {
    let mut must_have: Vec<String> = profile
        .requirements
        .must_have
        .iter()
        .flat_map(|group| group.items.iter().take(MUST_HAVE_PER_GROUP_CAP).cloned())
        .collect();
    must_have.truncate(MUST_HAVE_TOTAL_CAP);

    let mut required_skills: Vec<String> = profile
        .skills
        .values()
        .flat_map(|items| items.iter().take(SKILLS_PER_CATEGORY_CAP).cloned())
        .collect();
    required_skills.truncate(SKILLS_TOTAL_CAP);

    JobSummary {
        title: profile.title.clone(),
        level: profile.level.clone(),
        domain: profile.domain.clone(),
        company: profile.client.as_ref().and_then(|c| c.name.clone()),
        location: profile
            .employment
            .as_ref()
            .and_then(|e| e.location.clone()),
        working_mode: profile
            .employment
            .as_ref()
            .and_then(|e| e.working_mode.clone()),
        min_years: profile.experience.min_years,
        must_have_requirements: must_have,
        required_skills,
        languages: language_summaries(&profile.requirements.languages),
        responsibilities: profile
            .responsibilities
            .iter()
            .take(RESPONSIBILITIES_CAP)
            .cloned()
            .collect(),
    }
}

fn json_compact<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "null".into())
}

fn or_unknown(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("Unknown")
}

fn or_na(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("N/A")
}

fn years_or_na(value: Option<f64>) -> String {
    value
        .map(|y| y.to_string())
        .unwrap_or_else(|| "N/A".into())
}

/// Assemble the assessment prompt for one source/candidate pair.
pub fn build_judgment_prompt(
    cv: &CandidateSummary,
    jd: &JobSummary,
    direction: MatchDirection,
    vector_score_percent: i64,
) -> String {
    let context = match direction {
        MatchDirection::JobsForCandidate => format!(
            "Analyze how well this JOB matches this CANDIDATE.\n\
             \n\
             CANDIDATE:\n\
             - Name: {name}\n\
             - Current Role: {position} ({seniority})\n\
             - Experience: {years} years\n\
             - Skills: {skills}\n\
             - Domains: {domains}\n\
             - Languages: {cv_languages}\n\
             \n\
             JOB:\n\
             - Title: {title}\n\
             - Level: {level}\n\
             - Company: {company}\n\
             - Required Years: {min_years}+\n\
             - Must-Have: {must_have}\n\
             - Skills: {jd_skills}\n\
             - Languages: {jd_languages}",
            name = or_unknown(&cv.name),
            position = or_na(&cv.position),
            seniority = or_na(&cv.seniority),
            years = years_or_na(cv.years_experience),
            skills = json_compact(&cv.skills),
            domains = json_compact(&cv.domains),
            cv_languages = json_compact(&cv.languages),
            title = or_unknown(&jd.title),
            level = or_na(&jd.level),
            company = or_na(&jd.company),
            min_years = years_or_na(jd.min_years),
            must_have = json_compact(&jd.must_have_requirements),
            jd_skills = json_compact(&jd.required_skills),
            jd_languages = json_compact(&jd.languages),
        ),
        MatchDirection::CandidatesForJob => format!(
            "Analyze how well this CANDIDATE fits this JOB.\n\
             \n\
             JOB REQUIREMENTS:\n\
             - Title: {title}\n\
             - Level: {level}\n\
             - Required Years: {min_years}+\n\
             - Must-Have: {must_have}\n\
             - Skills: {jd_skills}\n\
             - Languages: {jd_languages}\n\
             - Key Responsibilities: {responsibilities}\n\
             \n\
             CANDIDATE:\n\
             - Name: {name}\n\
             - Current: {position} ({seniority})\n\
             - Experience: {years} years\n\
             - Skills: {skills}\n\
             - Languages: {cv_languages}\n\
             - Domains: {domains}",
            title = or_unknown(&jd.title),
            level = or_na(&jd.level),
            min_years = years_or_na(jd.min_years),
            must_have = json_compact(&jd.must_have_requirements),
            jd_skills = json_compact(&jd.required_skills),
            jd_languages = json_compact(&jd.languages),
            responsibilities = json_compact(&jd.responsibilities),
            name = or_unknown(&cv.name),
            position = or_na(&cv.position),
            seniority = or_na(&cv.seniority),
            years = years_or_na(cv.years_experience),
            skills = json_compact(&cv.skills),
            cv_languages = json_compact(&cv.languages),
            domains = json_compact(&cv.domains),
        ),
    };

    format!(
        "{context}\n\
         \n\
         Vector similarity score: {vector_score_percent}%\n\
         \n\
         Score this match from 0-100 based on:\n\
         1. Skills coverage (40%): How many required skills does the candidate have?\n\
         2. Experience fit (25%): Is experience level appropriate?\n\
         3. Domain relevance (20%): Industry/domain background match?\n\
         4. Language match (15%): Required language proficiency met?\n\
         \n\
         Return JSON only:\n\
         {{\"score\": <0-100>, \"explanation\": \"• Skills: [brief assessment] • Experience: [brief assessment] • Domain: [brief assessment] • Overall: [summary]\"}}"
    )
}
