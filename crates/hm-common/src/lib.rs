pub mod language;
pub mod logging;
pub mod matching;
pub mod rerank;
pub mod store;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Which side of the match a stored document belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentKind {
    #[serde(rename = "cv")]
    Candidate,
    #[serde(rename = "jd")]
    Job,
}

impl DocumentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::Candidate => "cv",
            DocumentKind::Job => "jd",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "cv" => Some(DocumentKind::Candidate),
            "jd" => Some(DocumentKind::Job),
            _ => None,
        }
    }

    /// The document kind a source of this kind is matched against.
    pub fn opposite(&self) -> Self {
        match self {
            DocumentKind::Candidate => DocumentKind::Job,
            DocumentKind::Job => DocumentKind::Candidate,
        }
    }
}

// Structured profile records as produced by the extraction collaborator and
// stored as JSONB. Absent collections deserialize to empty ones so the
// scorer never has to reason about null.

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Identity {
    pub full_name: Option<String>,
    pub location: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Headline {
    pub current_position: Option<String>,
    pub seniority: Option<String>,
    pub total_years_of_experience: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkillItem {
    pub name: String,
    pub years_used: Option<f64>,
    pub proficiency: Option<String>,
}

/// Skill lists arrive either as plain names or as objects with usage metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SkillEntry {
    Named(SkillItem),
    Plain(String),
}

impl SkillEntry {
    pub fn name(&self) -> &str {
        match self {
            SkillEntry::Named(item) => &item.name,
            SkillEntry::Plain(name) => name,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LanguageTest {
    pub name: Option<String>,
    pub score: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LanguageEntry {
    pub name: Option<String>,
    pub level: Option<String>,
    pub test: Option<LanguageTest>,
}

impl LanguageEntry {
    /// The most specific level string available: a certificate name + score
    /// wins over the free-form level, since it normalizes more precisely.
    pub fn effective_level(&self) -> String {
        if let Some(test) = &self.test {
            if let (Some(name), Some(score)) = (&test.name, &test.score) {
                return format!("{name} {score}");
            }
        }
        self.level.clone().unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectEntry {
    pub project_name: Option<String>,
    pub role: Option<String>,
    pub description: Option<String>,
    pub technologies: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperienceEntry {
    pub company: Option<String>,
    pub title: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub highlights: Vec<String>,
    pub projects: Vec<ProjectEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CandidateProfile {
    pub identity: Identity,
    pub headline: Headline,
    pub skills: BTreeMap<String, Vec<SkillEntry>>,
    pub experience: Vec<ExperienceEntry>,
    pub languages: Vec<LanguageEntry>,
    pub domain_expertise: Vec<String>,
}

impl CandidateProfile {
    pub fn total_skill_items(&self) -> usize {
        self.skills.values().map(Vec::len).sum()
    }

    pub fn total_project_count(&self) -> usize {
        self.experience.iter().map(|exp| exp.projects.len()).sum()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequirementGroup {
    pub category: Option<String>,
    pub items: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Requirements {
    pub must_have: Vec<RequirementGroup>,
    pub nice_to_have: Vec<RequirementGroup>,
    pub languages: Vec<LanguageEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobExperience {
    pub min_years: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientInfo {
    pub name: Option<String>,
    pub region: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Employment {
    pub location: Option<String>,
    pub working_mode: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobProfile {
    pub title: Option<String>,
    pub level: Option<String>,
    pub domain: Vec<String>,
    pub client: Option<ClientInfo>,
    pub employment: Option<Employment>,
    pub experience: JobExperience,
    pub responsibilities: Vec<String>,
    pub requirements: Requirements,
    pub skills: BTreeMap<String, Vec<String>>,
}

impl JobProfile {
    pub fn total_skill_items(&self) -> usize {
        self.skills.values().map(Vec::len).sum()
    }
}

/// A structured profile of either kind. Serializes with the same outer tag
/// the document store uses (`candidate_profile` / `job_profile`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Profile {
    #[serde(rename = "candidate_profile")]
    Candidate(CandidateProfile),
    #[serde(rename = "job_profile")]
    Job(JobProfile),
}

impl Profile {
    pub fn kind(&self) -> DocumentKind {
        match self {
            Profile::Candidate(_) => DocumentKind::Candidate,
            Profile::Job(_) => DocumentKind::Job,
        }
    }

    pub fn as_candidate(&self) -> Option<&CandidateProfile> {
        match self {
            Profile::Candidate(profile) => Some(profile),
            Profile::Job(_) => None,
        }
    }

    pub fn as_job(&self) -> Option<&JobProfile> {
        match self {
            Profile::Job(profile) => Some(profile),
            Profile::Candidate(_) => None,
        }
    }
}
