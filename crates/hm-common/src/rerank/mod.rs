//! Judgment-based reranking of the top ranked matches.
//!
//! Each shortlisted pair is assessed independently by the oracle under a
//! bounded fan-out. A failed or slow assessment degrades that one candidate
//! to its vector-derived score; it never drops the candidate or poisons the
//! batch.

pub mod oracle;
pub mod summary;

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::time::timeout;

use self::oracle::{parse_oracle_reply, JudgmentOracle, OracleError};
use self::summary::{
    build_judgment_prompt, summarize_candidate, summarize_job, MatchDirection,
};
use crate::matching::pipeline::RankedCandidate;
use crate::Profile;

const PARSE_FAILURE_EXPLANATION: &str =
    "• Analysis: LLM response parsing failed, using vector score as fallback.";

#[derive(Debug, Clone)]
pub struct RerankConfig {
    /// Upper bound on oracle calls per rerank request.
    pub max_candidates: usize,
    /// Concurrent in-flight oracle calls.
    pub concurrency: usize,
    /// Per-call deadline, enforced in addition to the client timeout.
    pub timeout: Duration,
}

impl Default for RerankConfig {
    fn default() -> Self {
        Self {
            max_candidates: 5,
            concurrency: 5,
            timeout: Duration::from_secs(30),
        }
    }
}

impl RerankConfig {
    pub fn from_env() -> Self {
        fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
            std::env::var(key).ok().and_then(|raw| raw.parse().ok())
        }

        let defaults = Self::default();
        Self {
            max_candidates: env_parse("HM_RERANK_MAX_CANDIDATES")
                .unwrap_or(defaults.max_candidates),
            concurrency: env_parse("HM_RERANK_CONCURRENCY").unwrap_or(defaults.concurrency),
            timeout: env_parse("HM_ORACLE_TIMEOUT_SECONDS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RerankedCandidate {
    pub id: i64,
    pub title: Option<String>,
    pub owner_name: Option<String>,
    /// Similarity percentage derived from the hybrid distance.
    pub vector_score: i64,
    pub llm_score: i64,
    pub explanation: String,
    pub profile: Profile,
    pub final_rank: usize,
}

pub struct RerankOrchestrator<O> {
    oracle: Arc<O>,
    config: RerankConfig,
}

fn truncated(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

fn vector_score_percent(hybrid_distance: f64) -> i64 {
    (((1.0 - hybrid_distance) * 100.0) as i64).clamp(0, 100)
}

impl<O: JudgmentOracle + 'static> RerankOrchestrator<O> {
    pub fn new(oracle: O, config: RerankConfig) -> Self {
        Self {
            oracle: Arc::new(oracle),
            config,
        }
    }

    /// Assess the top matches against the source and re-order them by the
    /// oracle's score. Ties keep the incoming (hybrid) order; ranks are
    /// dense from 1.
    pub async fn rerank(
        &self,
        source: &Profile,
        matches: &[RankedCandidate],
    ) -> Vec<RerankedCandidate> {
        let cap = self.config.max_candidates.min(matches.len());
        let candidates = &matches[..cap];
        if candidates.is_empty() {
            return Vec::new();
        }

        let semaphore = Arc::new(Semaphore::new(self.config.concurrency.max(1)));
        let mut handles = Vec::with_capacity(candidates.len());

        for candidate in candidates {
            let fallback = vector_score_percent(candidate.hybrid_distance);
            let prompt = self.prompt_for(source, candidate, fallback);

            let oracle = Arc::clone(&self.oracle);
            let semaphore = Arc::clone(&semaphore);
            let deadline = self.config.timeout;

            handles.push(tokio::spawn(async move {
                let Some(prompt) = prompt else {
                    return (
                        fallback,
                        "Reranking failed: unexpected document kind".to_string(),
                    );
                };

                let _permit = semaphore.acquire_owned().await.ok();

                match timeout(deadline, oracle.judge(&prompt)).await {
                    Ok(Ok(raw)) => match parse_oracle_reply(&raw, fallback) {
                        Ok(reply) => (reply.score, reply.explanation),
                        Err(_) => (fallback, PARSE_FAILURE_EXPLANATION.to_string()),
                    },
                    Ok(Err(err)) => (
                        fallback,
                        format!(
                            "• Error: Analysis unavailable - {}",
                            truncated(&err.to_string(), 80)
                        ),
                    ),
                    Err(_) => {
                        let err = OracleError::Timeout(deadline);
                        (
                            fallback,
                            format!(
                                "• Error: Analysis unavailable - {}",
                                truncated(&err.to_string(), 80)
                            ),
                        )
                    }
                }
            }));
        }

        let mut results = Vec::with_capacity(candidates.len());
        for (candidate, handle) in candidates.iter().zip(handles) {
            let fallback = vector_score_percent(candidate.hybrid_distance);
            let (llm_score, explanation) = match handle.await {
                Ok(outcome) => outcome,
                Err(err) => {
                    tracing::error!(candidate_id = candidate.id, error = %err, "rerank task failed");
                    (
                        fallback,
                        format!("Reranking failed: {}", truncated(&err.to_string(), 100)),
                    )
                }
            };

            results.push(RerankedCandidate {
                id: candidate.id,
                title: candidate.title.clone(),
                owner_name: candidate.owner_name.clone(),
                vector_score: fallback,
                llm_score,
                explanation,
                profile: candidate.profile.clone(),
                final_rank: 0,
            });
        }

        // Stable sort keeps the incoming hybrid order on equal scores.
        results.sort_by(|a, b| b.llm_score.cmp(&a.llm_score));
        for (idx, result) in results.iter_mut().enumerate() {
            result.final_rank = idx + 1;
        }

        results
    }

    fn prompt_for(
        &self,
        source: &Profile,
        candidate: &RankedCandidate,
        vector_score: i64,
    ) -> Option<String> {
        match (source, &candidate.profile) {
            (Profile::Candidate(cv), Profile::Job(jd)) => Some(build_judgment_prompt(
                &summarize_candidate(cv),
                &summarize_job(jd),
                MatchDirection::JobsForCandidate,
                vector_score,
            )),
            (Profile::Job(jd), Profile::Candidate(cv)) => Some(build_judgment_prompt(
                &summarize_candidate(cv),
                &summarize_job(jd),
                MatchDirection::CandidatesForJob,
                vector_score,
            )),
            _ => {
                tracing::warn!(
                    candidate_id = candidate.id,
                    "source and match are the same document kind; skipping oracle call"
                );
                None
            }
        }
    }
}
