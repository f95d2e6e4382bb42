pub mod fusion;
pub mod pipeline;
pub mod symbolic;
pub mod weights;

pub use fusion::{ChannelDistances, FusionWeights};
pub use pipeline::{MatchingEngine, MatchingEngineConfig, RankedCandidate};
pub use symbolic::{calculate_symbolic_score, SymbolicResult};
pub use weights::{calculate_adaptive_weights, WeightTriple, DEFAULT_WEIGHTS};
