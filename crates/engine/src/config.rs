//! Recommender configuration.
//!
//! Fixed for the lifetime of a built model; a rebuild picks up the
//! configuration held by the handle.

use crate::error::{RecommendError, Result};
use models::KnnParams;
use pipeline::DEFAULT_CANDIDATE_CAP;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Score used when the collaborative model has no estimate
pub const NEUTRAL_SCORE: f32 = 3.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Most similar users consulted per prediction
    pub neighborhood_size: usize,
    /// Co-rated movies two users need before they count as neighbors
    pub min_support: usize,
    /// Neighbors required for a prediction
    pub min_neighbors: usize,
    pub collaborative_weight: f32,
    pub content_weight: f32,
    /// Maximum candidates scored per request
    pub candidate_cap: usize,
    /// Result count when the caller does not give one
    pub default_result_count: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            neighborhood_size: 30,
            min_support: 5,
            min_neighbors: 1,
            collaborative_weight: 0.7,
            content_weight: 0.3,
            candidate_cap: DEFAULT_CANDIDATE_CAP,
            default_result_count: 10,
        }
    }
}

impl EngineConfig {
    /// Load a configuration from a JSON file; absent fields keep their defaults
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            RecommendError::InvalidConfig(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&text)
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)
            .map_err(|e| RecommendError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_neighborhood_size(mut self, k: usize) -> Self {
        self.neighborhood_size = k;
        self
    }

    pub fn with_min_support(mut self, min: usize) -> Self {
        self.min_support = min;
        self
    }

    pub fn with_min_neighbors(mut self, min: usize) -> Self {
        self.min_neighbors = min;
        self
    }

    pub fn with_weights(mut self, collaborative: f32, content: f32) -> Self {
        self.collaborative_weight = collaborative;
        self.content_weight = content;
        self
    }

    /// Replace whichever weights are given, keeping the others
    pub fn with_weight_overrides(self, collaborative: Option<f32>, content: Option<f32>) -> Self {
        let collaborative = collaborative.unwrap_or(self.collaborative_weight);
        let content = content.unwrap_or(self.content_weight);
        self.with_weights(collaborative, content)
    }

    pub fn with_candidate_cap(mut self, cap: usize) -> Self {
        self.candidate_cap = cap;
        self
    }

    pub fn with_default_result_count(mut self, n: usize) -> Self {
        self.default_result_count = n;
        self
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: &str| Err(RecommendError::InvalidConfig(msg.to_string()));

        for (name, weight) in [
            ("collaborative_weight", self.collaborative_weight),
            ("content_weight", self.content_weight),
        ] {
            if !weight.is_finite() || weight < 0.0 {
                return Err(RecommendError::InvalidConfig(format!(
                    "{} must be a non-negative number, got {}",
                    name, weight
                )));
            }
        }
        if self.neighborhood_size == 0 {
            return invalid("neighborhood_size must be at least 1");
        }
        if self.min_support == 0 {
            return invalid("min_support must be at least 1");
        }
        if self.candidate_cap == 0 {
            return invalid("candidate_cap must be at least 1");
        }
        Ok(())
    }

    pub fn knn_params(&self) -> KnnParams {
        KnnParams::default()
            .with_neighborhood_size(self.neighborhood_size)
            .with_min_support(self.min_support)
            .with_min_neighbors(self.min_neighbors)
    }

    /// Upper bound of any hybrid score under these weights
    pub fn max_score(&self) -> f32 {
        (self.collaborative_weight + self.content_weight) * data_loader::MAX_RATING
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.neighborhood_size, 30);
        assert_eq!(config.min_support, 5);
        assert_eq!(config.candidate_cap, DEFAULT_CANDIDATE_CAP);
        assert_eq!(config.default_result_count, 10);
        assert!(config.validate().is_ok());
        assert!((config.max_score() - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config =
            EngineConfig::from_json_str(r#"{"collaborative_weight": 0.5, "content_weight": 0.5}"#)
                .unwrap();
        assert_eq!(config.collaborative_weight, 0.5);
        assert_eq!(config.neighborhood_size, 30);
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            EngineConfig::from_json_str("{not json"),
            Err(RecommendError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_validation() {
        let base = EngineConfig::default();
        assert!(base.clone().with_weights(-0.1, 0.3).validate().is_err());
        assert!(base.clone().with_weights(0.7, f32::NAN).validate().is_err());
        assert!(base.clone().with_neighborhood_size(0).validate().is_err());
        assert!(base.clone().with_min_support(0).validate().is_err());
        assert!(base.clone().with_candidate_cap(0).validate().is_err());
        // Weights need not sum to 1
        assert!(base.with_weights(1.0, 1.0).validate().is_ok());
    }

    #[test]
    fn test_weight_overrides() {
        let base = EngineConfig::default();

        let config = base.clone().with_weight_overrides(Some(0.5), None);
        assert_eq!(config.collaborative_weight, 0.5);
        assert_eq!(config.content_weight, 0.3);

        let config = base.clone().with_weight_overrides(None, Some(0.9));
        assert_eq!(config.collaborative_weight, 0.7);
        assert_eq!(config.content_weight, 0.9);

        assert_eq!(base.clone().with_weight_overrides(None, None), base);
    }

    #[test]
    fn test_knn_params() {
        let params = EngineConfig::default()
            .with_neighborhood_size(10)
            .with_min_support(2)
            .knn_params();
        assert_eq!(params.neighborhood_size, 10);
        assert_eq!(params.min_support, 2);
        assert_eq!(params.min_neighbors, 1);
    }
}
