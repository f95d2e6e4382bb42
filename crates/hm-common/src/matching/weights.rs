use serde::{Deserialize, Serialize};

use crate::Profile;

/// Per-channel weights for the semantic distance blend.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightTriple {
    pub global: f64,
    pub skills_tech: f64,
    pub skills_language: f64,
}

impl WeightTriple {
    pub const fn new(global: f64, skills_tech: f64, skills_language: f64) -> Self {
        Self {
            global,
            skills_tech,
            skills_language,
        }
    }

    pub fn sum(&self) -> f64 {
        self.global + self.skills_tech + self.skills_language
    }
}

/// Baseline blend when no adaptive rule fires and the caller supplies nothing.
pub const DEFAULT_WEIGHTS: WeightTriple = WeightTriple::new(0.3, 0.5, 0.2);

/// Skill-heavy documents get shifted toward the tech channel; language-heavy
/// jobs get shifted toward the language channel. First matching rule wins.
pub fn calculate_adaptive_weights(profile: &Profile, default: WeightTriple) -> WeightTriple {
    match profile {
        Profile::Job(job) => {
            let skill_count = job.total_skill_items();
            let lang_req_count = job.requirements.languages.len();

            if skill_count > 15 {
                WeightTriple::new(0.20, 0.65, 0.15)
            } else if skill_count > 8 {
                WeightTriple::new(0.25, 0.60, 0.15)
            } else if lang_req_count > 2 {
                WeightTriple::new(0.25, 0.40, 0.35)
            } else {
                default
            }
        }
        Profile::Candidate(candidate) => {
            let skill_count = candidate.total_skill_items();
            let project_count = candidate.total_project_count();

            if skill_count > 20 || project_count > 5 {
                WeightTriple::new(0.20, 0.70, 0.10)
            } else if skill_count > 10 {
                WeightTriple::new(0.25, 0.60, 0.15)
            } else {
                default
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CandidateProfile, JobProfile, LanguageEntry, ProjectEntry, SkillEntry};

    fn job_with_skills(count: usize) -> Profile {
        let mut job = JobProfile::default();
        job.skills.insert(
            "backend".into(),
            (0..count).map(|i| format!("skill-{i}")).collect(),
        );
        Profile::Job(job)
    }

    fn candidate_with_skills(count: usize) -> Profile {
        let mut candidate = CandidateProfile::default();
        candidate.skills.insert(
            "backend".into(),
            (0..count)
                .map(|i| SkillEntry::Plain(format!("skill-{i}")))
                .collect(),
        );
        Profile::Candidate(candidate)
    }

    #[test]
    fn weight_rules_sum_to_one() {
        let triples = [
            DEFAULT_WEIGHTS,
            WeightTriple::new(0.20, 0.65, 0.15),
            WeightTriple::new(0.25, 0.60, 0.15),
            WeightTriple::new(0.25, 0.40, 0.35),
            WeightTriple::new(0.20, 0.70, 0.10),
        ];
        for triple in triples {
            assert!((triple.sum() - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn skill_heavy_job_shifts_to_tech_channel() {
        let weights = calculate_adaptive_weights(&job_with_skills(16), DEFAULT_WEIGHTS);
        assert_eq!(weights, WeightTriple::new(0.20, 0.65, 0.15));

        let weights = calculate_adaptive_weights(&job_with_skills(9), DEFAULT_WEIGHTS);
        assert_eq!(weights, WeightTriple::new(0.25, 0.60, 0.15));
    }

    #[test]
    fn language_heavy_job_shifts_to_language_channel() {
        let mut job = JobProfile::default();
        job.requirements.languages = vec![
            LanguageEntry::default(),
            LanguageEntry::default(),
            LanguageEntry::default(),
        ];
        let weights = calculate_adaptive_weights(&Profile::Job(job), DEFAULT_WEIGHTS);
        assert_eq!(weights, WeightTriple::new(0.25, 0.40, 0.35));
    }

    #[test]
    fn skill_count_rule_outranks_language_rule() {
        let mut job = JobProfile::default();
        job.skills
            .insert("backend".into(), (0..9).map(|i| format!("s{i}")).collect());
        job.requirements.languages = vec![LanguageEntry::default(); 3];
        let weights = calculate_adaptive_weights(&Profile::Job(job), DEFAULT_WEIGHTS);
        assert_eq!(weights, WeightTriple::new(0.25, 0.60, 0.15));
    }

    #[test]
    fn rich_candidate_profiles_shift_weights() {
        let weights = calculate_adaptive_weights(&candidate_with_skills(21), DEFAULT_WEIGHTS);
        assert_eq!(weights, WeightTriple::new(0.20, 0.70, 0.10));

        let mut candidate = CandidateProfile::default();
        candidate.experience.push(crate::ExperienceEntry {
            projects: vec![ProjectEntry::default(); 6],
            ..Default::default()
        });
        let weights =
            calculate_adaptive_weights(&Profile::Candidate(candidate), DEFAULT_WEIGHTS);
        assert_eq!(weights, WeightTriple::new(0.20, 0.70, 0.10));

        let weights = calculate_adaptive_weights(&candidate_with_skills(11), DEFAULT_WEIGHTS);
        assert_eq!(weights, WeightTriple::new(0.25, 0.60, 0.15));
    }

    #[test]
    fn sparse_profiles_keep_the_default() {
        let weights = calculate_adaptive_weights(&job_with_skills(3), DEFAULT_WEIGHTS);
        assert_eq!(weights, DEFAULT_WEIGHTS);

        let weights = calculate_adaptive_weights(&candidate_with_skills(5), DEFAULT_WEIGHTS);
        assert_eq!(weights, DEFAULT_WEIGHTS);
    }
}
