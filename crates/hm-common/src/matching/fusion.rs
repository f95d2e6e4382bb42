use serde::{Deserialize, Serialize};

use super::weights::WeightTriple;

/// Cosine distances per embedding channel. `None` means the document has no
/// vector for that channel and is treated as maximally distant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ChannelDistances {
    pub global: Option<f64>,
    pub skills_tech: Option<f64>,
    pub skills_language: Option<f64>,
}

/// Blend weights between the semantic and symbolic halves of the score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FusionWeights {
    pub semantic: f64,
    pub symbolic: f64,
}

impl Default for FusionWeights {
    fn default() -> Self {
        Self {
            semantic: 0.5,
            symbolic: 0.5,
        }
    }
}

pub fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

/// Weighted blend of per-channel cosine distances.
pub fn semantic_distance(channels: &ChannelDistances, weights: WeightTriple) -> f64 {
    channels.global.unwrap_or(1.0) * weights.global
        + channels.skills_tech.unwrap_or(1.0) * weights.skills_tech
        + channels.skills_language.unwrap_or(1.0) * weights.skills_language
}

/// Shortlist ordering heuristic: strong matches get a slight extra pull so
/// they survive the stage-1 cut. Monotonic, never applied to the fused score.
pub fn compress_for_shortlist(distance: f64) -> f64 {
    if distance < 0.3 {
        distance * 0.95
    } else if distance < 0.5 {
        distance * 0.98
    } else {
        distance
    }
}

/// Fuse semantic distance with the symbolic total into a single distance.
/// Both halves are expressed as similarities before blending; the result is
/// a distance again, rounded to four decimals.
pub fn hybrid_distance(
    semantic_distance: f64,
    symbolic_total: f64,
    weights: FusionWeights,
) -> f64 {
    let semantic_similarity = 1.0 - semantic_distance.min(1.0);
    let combined = semantic_similarity * weights.semantic + symbolic_total * weights.symbolic;
    round4(1.0 - combined)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::weights::DEFAULT_WEIGHTS;

    #[test]
    fn missing_channels_count_as_maximal_distance() {
        let channels = ChannelDistances {
            global: Some(0.2),
            skills_tech: None,
            skills_language: Some(0.4),
        };
        let d = semantic_distance(&channels, DEFAULT_WEIGHTS);
        assert!((d - (0.2 * 0.3 + 1.0 * 0.5 + 0.4 * 0.2)).abs() < 1e-9);
    }

    #[test]
    fn compression_is_monotonic_and_banded() {
        assert!((compress_for_shortlist(0.2) - 0.19).abs() < 1e-9);
        assert!((compress_for_shortlist(0.4) - 0.392).abs() < 1e-9);
        assert_eq!(compress_for_shortlist(0.7), 0.7);

        let mut prev = 0.0;
        for i in 0..=100 {
            let d = compress_for_shortlist(i as f64 / 100.0);
            assert!(d >= prev);
            prev = d;
        }
    }

    #[test]
    fn fusion_blends_similarities_evenly() {
        // sem_dist 0.2 → sim 0.8; 0.5·0.8 + 0.5·0.81 = 0.805 → distance 0.195
        let d = hybrid_distance(0.2, 0.81, FusionWeights::default());
        assert_eq!(d, 0.195);
    }

    #[test]
    fn semantic_distance_above_one_saturates() {
        let d = hybrid_distance(1.4, 0.0, FusionWeights::default());
        assert_eq!(d, 1.0);
    }

    #[test]
    fn results_are_rounded_to_four_decimals() {
        let d = hybrid_distance(0.123456, 0.654321, FusionWeights::default());
        assert_eq!(d, round4(d));
    }
}
