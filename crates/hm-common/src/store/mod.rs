//! Document retrieval boundary.
//!
//! The ranking pipeline is generic over a retriever so the same engine runs
//! against Postgres/pgvector in production and an in-memory backend in tests.

pub mod memory;
pub mod pgvector;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::matching::fusion::ChannelDistances;
use crate::matching::weights::WeightTriple;
use crate::{DocumentKind, Profile};

#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("invalid database url: {0}")]
    InvalidConfig(String),
    #[error("failed to create database pool: {0}")]
    PoolCreation(#[from] deadpool_postgres::CreatePoolError),
    #[error("failed to get connection from pool: {0}")]
    Pool(#[from] deadpool_postgres::PoolError),
    #[error("query failed: {0}")]
    Query(#[from] tokio_postgres::Error),
    #[error("document {0} not found")]
    NotFound(i64),
    #[error("document {id} has malformed structured data: {source}")]
    Decode {
        id: i64,
        source: serde_json::Error,
    },
}

/// Structural predicates applied before any distance is computed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchFilters {
    pub min_years: Option<f64>,
    pub max_years: Option<f64>,
    pub required_skills: Vec<String>,
    pub domains: Vec<String>,
    pub seniority: Vec<String>,
}

impl MatchFilters {
    pub fn is_empty(&self) -> bool {
        self.min_years.is_none()
            && self.max_years.is_none()
            && self.required_skills.is_empty()
            && self.domains.is_empty()
            && self.seniority.is_empty()
    }
}

/// A document as stored by the ingestion side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredDocument {
    pub id: i64,
    pub kind: DocumentKind,
    pub title: Option<String>,
    pub owner_name: Option<String>,
    pub profile: Profile,
}

/// A shortlist row: document plus its per-channel distances to the source.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredDocument {
    pub document: StoredDocument,
    pub channels: ChannelDistances,
}

#[async_trait]
pub trait CandidateRetriever: Send + Sync {
    /// Whether the document has vectors for all three channels. Documents
    /// with a partial vector set are not rankable in either direction.
    async fn has_all_channels(&self, id: i64) -> Result<bool, RetrievalError>;

    async fn fetch_document(&self, id: i64) -> Result<Option<StoredDocument>, RetrievalError>;

    /// Stage-1 shortlist: documents of `target_kind` passing `filters` and
    /// holding all three vectors, ordered ascending by compressed weighted
    /// distance to `source_id`, truncated to `limit`. Ties break on id.
    async fn shortlist(
        &self,
        source_id: i64,
        target_kind: DocumentKind,
        filters: &MatchFilters,
        weights: WeightTriple,
        limit: usize,
    ) -> Result<Vec<ScoredDocument>, RetrievalError>;
}
