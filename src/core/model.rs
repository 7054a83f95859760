//! Pre-trained scoring model.
//!
//! The recommender only ever sees a [`ScoringModel`]: a batch of feature
//! vectors in, one score per vector out. Production models are loaded from a
//! JSON artifact exported from the training pipeline; tests plug in stubs.

use crate::core::features::{FeatureVector, FEATURE_COUNT};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Errors raised while loading or evaluating a model
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("failed to read model artifact: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse model artifact: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid model artifact: {0}")]
    Invalid(String),

    #[error("model returned {got} scores for {expected} inputs")]
    LengthMismatch { expected: usize, got: usize },

    #[error("prediction failed: {0}")]
    Prediction(String),
}

/// Scores a batch of facilities
///
/// Implementations must return exactly one score per input vector, in input
/// order, and must be safe to call from many requests at once.
pub trait ScoringModel: Send + Sync {
    fn predict(&self, batch: &[FeatureVector]) -> Result<Vec<f64>, ModelError>;

    /// Short human-readable description for logs and health output
    fn describe(&self) -> String {
        "custom".to_string()
    }
}

impl<F> ScoringModel for F
where
    F: Fn(&[FeatureVector]) -> Result<Vec<f64>, ModelError> + Send + Sync,
{
    fn predict(&self, batch: &[FeatureVector]) -> Result<Vec<f64>, ModelError> {
        self(batch)
    }
}

/// On-disk model artifact
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelArtifact {
    Linear(LinearModel),
    TreeEnsemble(TreeEnsemble),
}

impl ModelArtifact {
    /// Read and validate an artifact from `path`
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ModelError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, ModelError> {
        let artifact: ModelArtifact = serde_json::from_str(raw)?;
        artifact.validate()?;
        Ok(artifact)
    }

    fn validate(&self) -> Result<(), ModelError> {
        match self {
            ModelArtifact::Linear(m) => m.validate(),
            ModelArtifact::TreeEnsemble(m) => m.validate(),
        }
    }

    pub fn into_model(self) -> Arc<dyn ScoringModel> {
        match self {
            ModelArtifact::Linear(m) => Arc::new(m),
            ModelArtifact::TreeEnsemble(m) => Arc::new(m),
        }
    }
}

/// Load a model artifact and wrap it for sharing across workers
pub fn load_model<P: AsRef<Path>>(path: P) -> Result<Arc<dyn ScoringModel>, ModelError> {
    ModelArtifact::load(path).map(ModelArtifact::into_model)
}

/// `score = intercept + sum(coefficients[i] * x[i])`
#[derive(Debug, Clone, Deserialize)]
pub struct LinearModel {
    #[serde(default)]
    pub intercept: f64,
    pub coefficients: Vec<f64>,
}

impl LinearModel {
    fn validate(&self) -> Result<(), ModelError> {
        if self.coefficients.len() != FEATURE_COUNT {
            return Err(ModelError::Invalid(format!(
                "expected {} coefficients, found {}",
                FEATURE_COUNT,
                self.coefficients.len()
            )));
        }
        if !self.intercept.is_finite() || self.coefficients.iter().any(|c| !c.is_finite()) {
            return Err(ModelError::Invalid("coefficients must be finite".into()));
        }
        Ok(())
    }

    fn score(&self, x: &FeatureVector) -> f64 {
        self.intercept
            + self
                .coefficients
                .iter()
                .zip(x.as_slice())
                .map(|(w, v)| w * v)
                .sum::<f64>()
    }
}

impl ScoringModel for LinearModel {
    fn predict(&self, batch: &[FeatureVector]) -> Result<Vec<f64>, ModelError> {
        Ok(batch.iter().map(|x| self.score(x)).collect())
    }

    fn describe(&self) -> String {
        "linear".to_string()
    }
}

/// How per-tree outputs are combined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Aggregation {
    /// Random-forest style average
    #[default]
    Mean,
    /// Gradient-boosting style sum
    Sum,
}

/// Ensemble of binary regression trees
#[derive(Debug, Clone, Deserialize)]
pub struct TreeEnsemble {
    #[serde(default)]
    pub aggregation: Aggregation,
    #[serde(default)]
    pub base_score: f64,
    pub trees: Vec<Tree>,
}

/// A single tree; node 0 is the root
#[derive(Debug, Clone, Deserialize)]
pub struct Tree {
    pub nodes: Vec<TreeNode>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
    /// Go to `left` when `x[feature] <= threshold`, otherwise `right`
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: f64,
    },
}

impl Tree {
    fn validate(&self, tree_index: usize) -> Result<(), ModelError> {
        if self.nodes.is_empty() {
            return Err(ModelError::Invalid(format!("tree {} has no nodes", tree_index)));
        }
        for (i, node) in self.nodes.iter().enumerate() {
            if let TreeNode::Split { feature, left, right, .. } = node {
                if *feature >= FEATURE_COUNT {
                    return Err(ModelError::Invalid(format!(
                        "tree {} node {} splits on unknown feature {}",
                        tree_index, i, feature
                    )));
                }
                // Children must point forward so evaluation always terminates
                for child in [*left, *right] {
                    if child <= i || child >= self.nodes.len() {
                        return Err(ModelError::Invalid(format!(
                            "tree {} node {} has invalid child {}",
                            tree_index, i, child
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    fn evaluate(&self, x: &FeatureVector) -> Result<f64, ModelError> {
        let mut index = 0;
        loop {
            match self.nodes.get(index) {
                Some(TreeNode::Leaf { value }) => return Ok(*value),
                Some(TreeNode::Split { feature, threshold, left, right }) => {
                    let v = x.get(*feature).ok_or_else(|| {
                        ModelError::Prediction(format!("feature {} out of range", feature))
                    })?;
                    index = if v <= *threshold { *left } else { *right };
                }
                None => {
                    return Err(ModelError::Prediction(format!("dangling node index {}", index)))
                }
            }
        }
    }
}

impl TreeEnsemble {
    fn validate(&self) -> Result<(), ModelError> {
        if self.trees.is_empty() {
            return Err(ModelError::Invalid("ensemble has no trees".into()));
        }
        self.trees
            .iter()
            .enumerate()
            .try_for_each(|(i, tree)| tree.validate(i))
    }

    fn score(&self, x: &FeatureVector) -> Result<f64, ModelError> {
        let mut total = 0.0;
        for tree in &self.trees {
            total += tree.evaluate(x)?;
        }
        let combined = match self.aggregation {
            Aggregation::Mean => total / self.trees.len() as f64,
            Aggregation::Sum => total,
        };
        Ok(self.base_score + combined)
    }
}

impl ScoringModel for TreeEnsemble {
    fn predict(&self, batch: &[FeatureVector]) -> Result<Vec<f64>, ModelError> {
        batch.iter().map(|x| self.score(x)).collect()
    }

    fn describe(&self) -> String {
        format!("tree_ensemble ({} trees, {:?})", self.trees.len(), self.aggregation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vector(distance: f64, open: f64) -> FeatureVector {
        FeatureVector::from([distance, open, 1.0, 0.0, 30.0, 0.0, 1.0])
    }

    #[test]
    fn test_linear_model() {
        let model = ModelArtifact::from_json(
            r#"{"kind":"linear","intercept":1.0,"coefficients":[-0.5,2.0,0,0,0,0,0]}"#,
        )
        .unwrap()
        .into_model();

        let scores = model.predict(&[vector(2.0, 1.0), vector(4.0, 0.0)]).unwrap();
        assert_eq!(scores, vec![2.0, -1.0]);
        assert_eq!(model.describe(), "linear");
    }

    #[test]
    fn test_linear_model_wrong_width() {
        let err = ModelArtifact::from_json(r#"{"kind":"linear","coefficients":[1.0,2.0]}"#)
            .unwrap_err();
        assert!(matches!(err, ModelError::Invalid(_)));
    }

    #[test]
    fn test_tree_ensemble_mean() {
        let json = r#"{
            "kind": "tree_ensemble",
            "aggregation": "mean",
            "trees": [
                {"nodes": [
                    {"feature": 0, "threshold": 3.0, "left": 1, "right": 2},
                    {"value": 1.0},
                    {"value": 0.0}
                ]},
                {"nodes": [
                    {"feature": 1, "threshold": 0.5, "left": 1, "right": 2},
                    {"value": 0.2},
                    {"value": 0.8}
                ]}
            ]
        }"#;
        let model = ModelArtifact::from_json(json).unwrap().into_model();

        let scores = model.predict(&[vector(1.0, 1.0), vector(5.0, 0.0)]).unwrap();
        assert!((scores[0] - 0.9).abs() < 1e-9);
        assert!((scores[1] - 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_tree_ensemble_sum_with_base() {
        let json = r#"{
            "kind": "tree_ensemble",
            "aggregation": "sum",
            "base_score": 0.5,
            "trees": [
                {"nodes": [{"value": 0.25}]},
                {"nodes": [{"value": 0.25}]}
            ]
        }"#;
        let model = ModelArtifact::from_json(json).unwrap().into_model();
        assert_eq!(model.predict(&[vector(1.0, 1.0)]).unwrap(), vec![1.0]);
    }

    #[test]
    fn test_tree_rejects_backward_child() {
        let json = r#"{
            "kind": "tree_ensemble",
            "trees": [{"nodes": [
                {"feature": 0, "threshold": 1.0, "left": 0, "right": 1},
                {"value": 1.0}
            ]}]
        }"#;
        assert!(matches!(
            ModelArtifact::from_json(json).unwrap_err(),
            ModelError::Invalid(_)
        ));
    }

    #[test]
    fn test_tree_rejects_unknown_feature() {
        let json = r#"{
            "kind": "tree_ensemble",
            "trees": [{"nodes": [
                {"feature": 7, "threshold": 1.0, "left": 1, "right": 2},
                {"value": 1.0},
                {"value": 0.0}
            ]}]
        }"#;
        assert!(ModelArtifact::from_json(json).is_err());
    }

    #[test]
    fn test_unknown_kind_fails_to_parse() {
        let err = ModelArtifact::from_json(r#"{"kind":"joblib"}"#).unwrap_err();
        assert!(matches!(err, ModelError::Parse(_)));
    }

    #[test]
    fn test_closure_model() {
        let model = |batch: &[FeatureVector]| -> Result<Vec<f64>, ModelError> {
            Ok(batch.iter().map(|x| -x.as_slice()[0]).collect())
        };
        assert_eq!(model.predict(&[vector(3.0, 1.0)]).unwrap(), vec![-3.0]);
    }

    #[test]
    fn test_missing_artifact_file() {
        let err = load_model("/nonexistent/model.json").err().unwrap();
        assert!(matches!(err, ModelError::Io(_)));
    }
}
