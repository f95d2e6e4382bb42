//! In-memory retriever for tests and local development.
//!
//! Mirrors the SQL backend's semantics: the same filter predicates, the same
//! missing-vector handling, and the same compressed shortlist ordering, just
//! computed over locally held vectors.

use async_trait::async_trait;

use super::{CandidateRetriever, MatchFilters, RetrievalError, ScoredDocument, StoredDocument};
use crate::matching::fusion::{compress_for_shortlist, semantic_distance, ChannelDistances};
use crate::matching::weights::WeightTriple;
use crate::{DocumentKind, Profile};

#[derive(Debug, Clone, Default)]
pub struct ChannelVectors {
    pub global: Option<Vec<f32>>,
    pub skills_tech: Option<Vec<f32>>,
    pub skills_language: Option<Vec<f32>>,
}

impl ChannelVectors {
    pub fn complete(global: Vec<f32>, skills_tech: Vec<f32>, skills_language: Vec<f32>) -> Self {
        Self {
            global: Some(global),
            skills_tech: Some(skills_tech),
            skills_language: Some(skills_language),
        }
    }

    fn is_complete(&self) -> bool {
        self.global.is_some() && self.skills_tech.is_some() && self.skills_language.is_some()
    }
}

#[derive(Debug, Default)]
pub struct InMemoryStore {
    entries: Vec<(StoredDocument, ChannelVectors)>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, document: StoredDocument, vectors: ChannelVectors) {
        self.entries.push((document, vectors));
    }

    fn entry(&self, id: i64) -> Option<&(StoredDocument, ChannelVectors)> {
        self.entries.iter().find(|(doc, _)| doc.id == id)
    }
}

/// Cosine distance as pgvector's `<=>` computes it (1 − cosine similarity).
fn cosine_distance(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() {
        tracing::warn!(
            a_len = a.len(),
            b_len = b.len(),
            "vector dimension mismatch; treating as maximally distant"
        );
        return 1.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 1.0;
    }

    1.0 - f64::from(dot / (norm_a * norm_b))
}

fn channel_distance(source: &Option<Vec<f32>>, target: &Option<Vec<f32>>) -> Option<f64> {
    match (source, target) {
        (Some(a), Some(b)) => Some(cosine_distance(a, b)),
        _ => None,
    }
}

fn passes_experience_filter(profile: &Profile, filters: &MatchFilters) -> bool {
    if filters.min_years.is_none() && filters.max_years.is_none() {
        return true;
    }
    let min = filters.min_years.unwrap_or(0.0);
    let max = filters.max_years.unwrap_or(50.0);

    match profile {
        Profile::Candidate(candidate) => {
            let years = candidate.headline.total_years_of_experience.unwrap_or(0.0);
            years >= min && years <= max
        }
        Profile::Job(job) => {
            // A job is in range when its minimum fits under the upper bound
            // and is not below the lower bound once unknowns default high.
            job.experience.min_years.unwrap_or(0.0) <= max
                && min <= job.experience.min_years.unwrap_or(50.0)
        }
    }
}

fn passes_skill_filter(profile: &Profile, filters: &MatchFilters) -> bool {
    if filters.required_skills.is_empty() {
        return true;
    }

    let haystack: Vec<String> = match profile {
        Profile::Candidate(candidate) => candidate
            .skills
            .values()
            .flatten()
            .map(|entry| entry.name().to_lowercase())
            .collect(),
        Profile::Job(job) => job
            .requirements
            .must_have
            .iter()
            .chain(job.requirements.nice_to_have.iter())
            .flat_map(|group| group.items.iter().cloned())
            .chain(job.skills.values().flatten().cloned())
            .map(|item| item.to_lowercase())
            .collect(),
    };

    filters.required_skills.iter().all(|skill| {
        let needle = skill.to_lowercase();
        haystack.iter().any(|name| name.contains(&needle))
    })
}

fn passes_domain_filter(profile: &Profile, filters: &MatchFilters) -> bool {
    if filters.domains.is_empty() {
        return true;
    }
    let domains: &[String] = match profile {
        Profile::Candidate(candidate) => &candidate.domain_expertise,
        Profile::Job(job) => &job.domain,
    };
    domains.iter().any(|d| filters.domains.contains(d))
}

fn passes_seniority_filter(profile: &Profile, filters: &MatchFilters) -> bool {
    if filters.seniority.is_empty() {
        return true;
    }
    let level = match profile {
        Profile::Candidate(candidate) => candidate.headline.seniority.as_deref(),
        Profile::Job(job) => job.level.as_deref(),
    };
    let Some(level) = level else {
        return false;
    };
    let level = level.to_lowercase();
    filters.seniority.iter().any(|s| s.to_lowercase() == level)
}

fn passes_filters(profile: &Profile, filters: &MatchFilters) -> bool {
    passes_experience_filter(profile, filters)
        && passes_skill_filter(profile, filters)
        && passes_domain_filter(profile, filters)
        && passes_seniority_filter(profile, filters)
}

#[async_trait]
impl CandidateRetriever for InMemoryStore {
    async fn has_all_channels(&self, id: i64) -> Result<bool, RetrievalError> {
        Ok(self
            .entry(id)
            .map(|(_, vectors)| vectors.is_complete())
            .unwrap_or(false))
    }

    async fn fetch_document(&self, id: i64) -> Result<Option<StoredDocument>, RetrievalError> {
        Ok(self.entry(id).map(|(doc, _)| doc.clone()))
    }

    async fn shortlist(
        &self,
        source_id: i64,
        target_kind: DocumentKind,
        filters: &MatchFilters,
        weights: WeightTriple,
        limit: usize,
    ) -> Result<Vec<ScoredDocument>, RetrievalError> {
        let (_, source_vectors) = self
            .entry(source_id)
            .ok_or(RetrievalError::NotFound(source_id))?;

        let mut scored: Vec<(f64, ScoredDocument)> = self
            .entries
            .iter()
            .filter(|(doc, vectors)| {
                doc.kind == target_kind
                    && doc.id != source_id
                    && vectors.is_complete()
                    && passes_filters(&doc.profile, filters)
            })
            .map(|(doc, vectors)| {
                let channels = ChannelDistances {
                    global: channel_distance(&source_vectors.global, &vectors.global),
                    skills_tech: channel_distance(
                        &source_vectors.skills_tech,
                        &vectors.skills_tech,
                    ),
                    skills_language: channel_distance(
                        &source_vectors.skills_language,
                        &vectors.skills_language,
                    ),
                };
                let compressed = compress_for_shortlist(semantic_distance(&channels, weights));
                (
                    compressed,
                    ScoredDocument {
                        document: doc.clone(),
                        channels,
                    },
                )
            })
            .collect();

        scored.sort_by(|a, b| {
            a.0.partial_cmp(&b.0)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.1.document.id.cmp(&b.1.document.id))
        });
        scored.truncate(limit);

        Ok(scored.into_iter().map(|(_, doc)| doc).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::weights::DEFAULT_WEIGHTS;
    use crate::{CandidateProfile, Headline, JobProfile};

    fn candidate_doc(id: i64, years: Option<f64>) -> StoredDocument {
        StoredDocument {
            id,
            kind: DocumentKind::Candidate,
            title: Some(format!("CV {id}")),
            owner_name: None,
            profile: Profile::Candidate(CandidateProfile {
                headline: Headline {
                    total_years_of_experience: years,
                    ..Headline::default()
                },
                ..CandidateProfile::default()
            }),
        }
    }

    fn job_doc(id: i64) -> StoredDocument {
        StoredDocument {
            id,
            kind: DocumentKind::Job,
            title: Some(format!("JD {id}")),
            owner_name: None,
            profile: Profile::Job(JobProfile::default()),
        }
    }

    fn unit_vectors(x: f32, y: f32) -> ChannelVectors {
        ChannelVectors::complete(vec![x, y], vec![x, y], vec![x, y])
    }

    #[tokio::test]
    async fn partial_vector_sets_are_invisible() {
        let mut store = InMemoryStore::new();
        store.insert(job_doc(1), unit_vectors(1.0, 0.0));
        store.insert(
            candidate_doc(2, None),
            ChannelVectors {
                global: Some(vec![1.0, 0.0]),
                skills_tech: None,
                skills_language: Some(vec![1.0, 0.0]),
            },
        );
        store.insert(candidate_doc(3, None), unit_vectors(1.0, 0.0));

        assert!(!store.has_all_channels(2).await.unwrap());
        assert!(store.has_all_channels(3).await.unwrap());

        let rows = store
            .shortlist(
                1,
                DocumentKind::Candidate,
                &MatchFilters::default(),
                DEFAULT_WEIGHTS,
                10,
            )
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].document.id, 3);
    }

    #[tokio::test]
    async fn shortlist_orders_by_distance_and_truncates() {
        let mut store = InMemoryStore::new();
        store.insert(job_doc(1), unit_vectors(1.0, 0.0));
        store.insert(candidate_doc(10, None), unit_vectors(0.0, 1.0)); // orthogonal
        store.insert(candidate_doc(11, None), unit_vectors(1.0, 0.0)); // identical
        store.insert(candidate_doc(12, None), unit_vectors(1.0, 0.5)); // close

        let rows = store
            .shortlist(
                1,
                DocumentKind::Candidate,
                &MatchFilters::default(),
                DEFAULT_WEIGHTS,
                2,
            )
            .await
            .unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].document.id, 11);
        assert_eq!(rows[1].document.id, 12);
    }

    #[tokio::test]
    async fn experience_filter_applies_to_candidates() {
        let mut store = InMemoryStore::new();
        store.insert(job_doc(1), unit_vectors(1.0, 0.0));
        store.insert(candidate_doc(2, Some(2.0)), unit_vectors(1.0, 0.0));
        store.insert(candidate_doc(3, Some(8.0)), unit_vectors(1.0, 0.0));
        store.insert(candidate_doc(4, None), unit_vectors(1.0, 0.0)); // unknown → 0

        let filters = MatchFilters {
            min_years: Some(5.0),
            ..MatchFilters::default()
        };
        let rows = store
            .shortlist(1, DocumentKind::Candidate, &filters, DEFAULT_WEIGHTS, 10)
            .await
            .unwrap();

        let ids: Vec<i64> = rows.iter().map(|r| r.document.id).collect();
        assert_eq!(ids, vec![3]);
    }

    #[tokio::test]
    async fn seniority_filter_is_case_insensitive() {
        let mut store = InMemoryStore::new();
        store.insert(job_doc(1), unit_vectors(1.0, 0.0));

        let mut senior = candidate_doc(2, None);
        if let Profile::Candidate(ref mut profile) = senior.profile {
            profile.headline.seniority = Some("Senior".into());
        }
        store.insert(senior, unit_vectors(1.0, 0.0));
        store.insert(candidate_doc(3, None), unit_vectors(1.0, 0.0));

        let filters = MatchFilters {
            seniority: vec!["senior".into()],
            ..MatchFilters::default()
        };
        let rows = store
            .shortlist(1, DocumentKind::Candidate, &filters, DEFAULT_WEIGHTS, 10)
            .await
            .unwrap();

        let ids: Vec<i64> = rows.iter().map(|r| r.document.id).collect();
        assert_eq!(ids, vec![2]);
    }

    #[tokio::test]
    async fn unknown_source_is_an_error() {
        let store = InMemoryStore::new();
        let result = store
            .shortlist(
                99,
                DocumentKind::Candidate,
                &MatchFilters::default(),
                DEFAULT_WEIGHTS,
                10,
            )
            .await;
        assert!(matches!(result, Err(RetrievalError::NotFound(99))));
    }
}
