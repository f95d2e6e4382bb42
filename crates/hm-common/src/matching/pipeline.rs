//! Two-stage ranking pipeline.
//!
//! Stage 1 shortlists by compressed weighted vector distance (pushed into
//! the retriever). Stage 2 re-scores the shortlist with the symbolic rules
//! and fuses both halves into the final hybrid distance.

use std::cmp::Ordering;

use serde::Serialize;

use super::fusion::{hybrid_distance, semantic_distance, ChannelDistances, FusionWeights};
use super::symbolic::{calculate_symbolic_score, SymbolicResult};
use super::weights::{calculate_adaptive_weights, WeightTriple, DEFAULT_WEIGHTS};
use crate::store::{CandidateRetriever, MatchFilters, RetrievalError, StoredDocument};
use crate::Profile;

#[derive(Debug, Clone)]
pub struct MatchingEngineConfig {
    /// Stage-1 shortlist size as a multiple of the requested top_k.
    pub shortlist_multiplier: usize,
    pub fusion: FusionWeights,
    pub use_adaptive_weights: bool,
    pub default_weights: WeightTriple,
}

impl Default for MatchingEngineConfig {
    fn default() -> Self {
        Self {
            shortlist_multiplier: 2,
            fusion: FusionWeights::default(),
            use_adaptive_weights: true,
            default_weights: DEFAULT_WEIGHTS,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RankedCandidate {
    pub id: i64,
    pub title: Option<String>,
    pub owner_name: Option<String>,
    pub profile: Profile,
    pub channels: ChannelDistances,
    pub semantic_distance: f64,
    pub symbolic: SymbolicResult,
    pub hybrid_distance: f64,
    pub weights_used: WeightTriple,
}

pub struct MatchingEngine<S> {
    store: S,
    config: MatchingEngineConfig,
}

impl<S: CandidateRetriever> MatchingEngine<S> {
    pub fn new(store: S, config: MatchingEngineConfig) -> Self {
        Self { store, config }
    }

    pub fn with_defaults(store: S) -> Self {
        Self::new(store, MatchingEngineConfig::default())
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Rank the opposite-kind documents against `source_id`.
    ///
    /// A source missing any embedding channel cannot be ranked and yields an
    /// empty result rather than an error.
    pub async fn rank(
        &self,
        source_id: i64,
        filters: &MatchFilters,
        weights: Option<WeightTriple>,
        top_k: usize,
    ) -> Result<Vec<RankedCandidate>, RetrievalError> {
        if !self.store.has_all_channels(source_id).await? {
            tracing::warn!(
                document_id = source_id,
                "source document is missing embedding channels; returning no matches"
            );
            return Ok(Vec::new());
        }

        let source = self
            .store
            .fetch_document(source_id)
            .await?
            .ok_or(RetrievalError::NotFound(source_id))?;

        let weights_used = match weights {
            Some(explicit) => explicit,
            None if self.config.use_adaptive_weights => {
                calculate_adaptive_weights(&source.profile, self.config.default_weights)
            }
            None => self.config.default_weights,
        };

        let shortlist = self
            .store
            .shortlist(
                source_id,
                source.kind.opposite(),
                filters,
                weights_used,
                top_k * self.config.shortlist_multiplier,
            )
            .await?;

        tracing::debug!(
            document_id = source_id,
            shortlisted = shortlist.len(),
            top_k,
            "stage-1 shortlist retrieved"
        );

        let mut ranked: Vec<RankedCandidate> = shortlist
            .into_iter()
            .filter_map(|scored| {
                let symbolic = self.symbolic_for_pair(&source, &scored.document)?;
                let semantic = semantic_distance(&scored.channels, weights_used);
                let hybrid =
                    hybrid_distance(semantic, symbolic.total_score, self.config.fusion);

                Some(RankedCandidate {
                    id: scored.document.id,
                    title: scored.document.title,
                    owner_name: scored.document.owner_name,
                    profile: scored.document.profile,
                    channels: scored.channels,
                    semantic_distance: semantic,
                    symbolic,
                    hybrid_distance: hybrid,
                    weights_used,
                })
            })
            .collect();

        ranked.sort_by(|a, b| {
            a.hybrid_distance
                .partial_cmp(&b.hybrid_distance)
                .unwrap_or(Ordering::Equal)
                .then(a.id.cmp(&b.id))
        });
        ranked.truncate(top_k);

        Ok(ranked)
    }

    /// The symbolic rules always evaluate the job's requirements against the
    /// candidate, whichever side the source is on.
    fn symbolic_for_pair(
        &self,
        source: &StoredDocument,
        target: &StoredDocument,
    ) -> Option<SymbolicResult> {
        match (&source.profile, &target.profile) {
            (Profile::Job(job), Profile::Candidate(candidate))
            | (Profile::Candidate(candidate), Profile::Job(job)) => {
                Some(calculate_symbolic_score(job, candidate))
            }
            _ => {
                tracing::warn!(
                    source_id = source.id,
                    target_id = target.id,
                    "same-kind document pair in shortlist; skipping"
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::{ChannelVectors, InMemoryStore};
    use crate::{
        CandidateProfile, DocumentKind, Headline, JobExperience, JobProfile, RequirementGroup,
        SkillEntry,
    };

    fn job_document(id: i64, must_have: &[&str]) -> StoredDocument {
        let mut job = JobProfile::default();
        job.requirements.must_have = vec![RequirementGroup {
            category: None,
            items: must_have.iter().map(|s| (*s).into()).collect(),
        }];
        job.experience = JobExperience {
            min_years: Some(3.0),
        };
        StoredDocument {
            id,
            kind: DocumentKind::Job,
            title: Some("Backend Engineer".into()),
            owner_name: Some("Acme".into()),
            profile: Profile::Job(job),
        }
    }

    fn candidate_document(id: i64, skills: &[&str], years: f64) -> StoredDocument {
        let mut candidate = CandidateProfile::default();
        candidate.skills.insert(
            "technical".into(),
            skills.iter().map(|s| SkillEntry::Plain((*s).into())).collect(),
        );
        candidate.headline = Headline {
            total_years_of_experience: Some(years),
            ..Headline::default()
        };
        StoredDocument {
            id,
            kind: DocumentKind::Candidate,
            title: Some(format!("CV {id}")),
            owner_name: None,
            profile: Profile::Candidate(candidate),
        }
    }

    fn vectors(x: f32, y: f32) -> ChannelVectors {
        ChannelVectors::complete(vec![x, y], vec![x, y], vec![x, y])
    }

    #[tokio::test]
    async fn source_missing_channels_ranks_nothing() {
        let mut store = InMemoryStore::new();
        store.insert(
            job_document(1, &["rust"]),
            ChannelVectors {
                global: Some(vec![1.0, 0.0]),
                skills_tech: None,
                skills_language: Some(vec![1.0, 0.0]),
            },
        );
        store.insert(candidate_document(2, &["rust"], 5.0), vectors(1.0, 0.0));

        let engine = MatchingEngine::with_defaults(store);
        let ranked = engine
            .rank(1, &MatchFilters::default(), None, 5)
            .await
            .unwrap();
        assert!(ranked.is_empty());
    }

    #[tokio::test]
    async fn symbolic_stage_reorders_semantically_close_candidates() {
        let mut store = InMemoryStore::new();
        store.insert(job_document(1, &["rust", "postgresql"]), vectors(1.0, 0.0));
        // Slightly closer vector, but no matching skills and too junior.
        store.insert(candidate_document(2, &["cobol"], 0.5), vectors(1.0, 0.05));
        // Slightly farther vector, full skill match and enough experience.
        store.insert(
            candidate_document(3, &["rust", "postgresql"], 5.0),
            vectors(1.0, 0.1),
        );

        let engine = MatchingEngine::with_defaults(store);
        let ranked = engine
            .rank(1, &MatchFilters::default(), None, 2)
            .await
            .unwrap();

        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].id, 3);
        assert!(ranked[0].hybrid_distance < ranked[1].hybrid_distance);
        assert_eq!(ranked[0].symbolic.skill_score, 1.0);
    }

    #[tokio::test]
    async fn explicit_weights_override_adaptive_ones() {
        let mut store = InMemoryStore::new();
        // 16 job skills would trigger the adaptive {0.20, 0.65, 0.15} rule.
        let mut job = job_document(1, &[]);
        if let Profile::Job(ref mut profile) = job.profile {
            profile.skills.insert(
                "backend".into(),
                (0..16).map(|i| format!("skill-{i}")).collect(),
            );
        }
        store.insert(job, vectors(1.0, 0.0));
        store.insert(candidate_document(2, &["skill-1"], 5.0), vectors(1.0, 0.2));

        let engine = MatchingEngine::with_defaults(store);

        let adaptive = engine
            .rank(1, &MatchFilters::default(), None, 5)
            .await
            .unwrap();
        assert_eq!(adaptive[0].weights_used, WeightTriple::new(0.20, 0.65, 0.15));

        let explicit = WeightTriple::new(0.4, 0.4, 0.2);
        let overridden = engine
            .rank(1, &MatchFilters::default(), Some(explicit), 5)
            .await
            .unwrap();
        assert_eq!(overridden[0].weights_used, explicit);
    }

    #[tokio::test]
    async fn stage_one_cut_is_twice_top_k() {
        let mut store = InMemoryStore::new();
        store.insert(job_document(1, &["rust"]), vectors(1.0, 0.0));
        // Four weak candidates sit closest; the strongest symbolic match is
        // the farthest vector and falls outside the 2·top_k cut.
        for (i, y) in [0.1f32, 0.2, 0.3, 0.4].iter().enumerate() {
            store.insert(
                candidate_document(10 + i as i64, &["cobol"], 5.0),
                vectors(1.0, *y),
            );
        }
        store.insert(candidate_document(20, &["rust"], 5.0), vectors(0.0, 1.0));

        let engine = MatchingEngine::with_defaults(store);
        let ranked = engine
            .rank(1, &MatchFilters::default(), None, 2)
            .await
            .unwrap();

        assert_eq!(ranked.len(), 2);
        assert!(ranked.iter().all(|r| r.id != 20));
    }

    #[tokio::test]
    async fn hybrid_ties_break_on_document_id() {
        let mut store = InMemoryStore::new();
        store.insert(job_document(1, &[]), vectors(1.0, 0.0));
        store.insert(candidate_document(7, &["rust"], 5.0), vectors(1.0, 0.0));
        store.insert(candidate_document(3, &["rust"], 5.0), vectors(1.0, 0.0));

        let engine = MatchingEngine::with_defaults(store);
        let ranked = engine
            .rank(1, &MatchFilters::default(), None, 5)
            .await
            .unwrap();

        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].hybrid_distance, ranked[1].hybrid_distance);
        assert_eq!(ranked[0].id, 3);
        assert_eq!(ranked[1].id, 7);
    }

    #[tokio::test]
    async fn candidate_sources_rank_jobs() {
        let mut store = InMemoryStore::new();
        store.insert(
            candidate_document(1, &["rust", "postgresql"], 6.0),
            vectors(1.0, 0.0),
        );
        store.insert(job_document(2, &["rust"]), vectors(1.0, 0.1));
        store.insert(job_document(3, &["haskell", "prolog"]), vectors(1.0, 0.1));

        let engine = MatchingEngine::with_defaults(store);
        let ranked = engine
            .rank(1, &MatchFilters::default(), None, 5)
            .await
            .unwrap();

        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].id, 2);
        assert!(ranked[0].symbolic.skill_score > ranked[1].symbolic.skill_score);
    }
}
