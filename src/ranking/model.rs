use std::path::Path;

use serde::Deserialize;
use tracing::info;

use super::error::FusionError;

/// A pluggable confidence model over candidate feature vectors.
///
/// Implementations must be deterministic: identical features and model state
/// always produce bit-identical scores. Scores land in `[0, 1]`.
pub trait FusionModel: Send + Sync {
    fn predict(&self, features: &[f64]) -> f64;

    /// Short identifier for logs.
    fn name(&self) -> &'static str;
}

/// One node of a serialized decision tree.
///
/// Trees are stored as flat arrays; `left`/`right` are node indices within
/// the same tree. Walks start at node 0.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        leaf: f64,
    },
}

#[derive(Debug, Clone, Deserialize)]
struct Tree {
    nodes: Vec<TreeNode>,
}

impl Tree {
    /// Walks the tree for one feature vector. Missing features read as 0.0.
    fn score(&self, features: &[f64]) -> f64 {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                TreeNode::Leaf { leaf } => return *leaf,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    let value = features.get(*feature).copied().unwrap_or(0.0);
                    idx = if value < *threshold { *left } else { *right };
                }
            }
        }
    }

    fn validate(&self, tree_idx: usize, num_features: usize) -> Result<(), FusionError> {
        if self.nodes.is_empty() {
            return Err(FusionError::InvalidModel {
                reason: format!("tree {tree_idx} has no nodes"),
            });
        }

        for (node_idx, node) in self.nodes.iter().enumerate() {
            if let TreeNode::Split {
                feature,
                threshold,
                left,
                right,
            } = node
            {
                if *feature >= num_features {
                    return Err(FusionError::InvalidModel {
                        reason: format!(
                            "tree {tree_idx} node {node_idx} references feature {feature}, \
                             but the model declares {num_features}"
                        ),
                    });
                }
                if !threshold.is_finite() {
                    return Err(FusionError::InvalidModel {
                        reason: format!("tree {tree_idx} node {node_idx} has non-finite threshold"),
                    });
                }
                // Children must point strictly forward so walks terminate.
                if *left >= self.nodes.len()
                    || *right >= self.nodes.len()
                    || *left <= node_idx
                    || *right <= node_idx
                {
                    return Err(FusionError::InvalidModel {
                        reason: format!(
                            "tree {tree_idx} node {node_idx} has out-of-order child indices"
                        ),
                    });
                }
            }
        }
        Ok(())
    }
}

/// A gradient-boosted tree ensemble loaded read-only at startup.
///
/// Trained offline; this type only performs inference. The serialized form
/// is JSON: `{num_features, base_score, trees: [{nodes: [...]}]}` with raw
/// tree outputs summed and squashed through a sigmoid.
#[derive(Debug, Clone, Deserialize)]
pub struct GradientBoostedModel {
    num_features: usize,
    base_score: f64,
    trees: Vec<Tree>,
}

impl GradientBoostedModel {
    /// Loads and validates a model file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, FusionError> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(FusionError::ModelNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path)?;
        let model: Self = serde_json::from_str(&content)?;
        model.validate()?;

        info!(
            path = %path.display(),
            trees = model.trees.len(),
            num_features = model.num_features,
            "Fusion model loaded"
        );
        Ok(model)
    }

    pub fn validate(&self) -> Result<(), FusionError> {
        if self.num_features < 2 {
            return Err(FusionError::InvalidModel {
                reason: "model must declare at least the two retrieval features".to_string(),
            });
        }
        if self.trees.is_empty() {
            return Err(FusionError::InvalidModel {
                reason: "model has no trees".to_string(),
            });
        }
        for (idx, tree) in self.trees.iter().enumerate() {
            tree.validate(idx, self.num_features)?;
        }
        Ok(())
    }

    pub fn num_features(&self) -> usize {
        self.num_features
    }
}

impl FusionModel for GradientBoostedModel {
    fn predict(&self, features: &[f64]) -> f64 {
        let raw: f64 = self.base_score + self.trees.iter().map(|t| t.score(features)).sum::<f64>();
        sigmoid(raw)
    }

    fn name(&self) -> &'static str {
        "gradient_boosted"
    }
}

#[inline]
fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Hand-tuned weighted fusion, used when no trained model file is configured.
///
/// The lexical signal carries slightly more weight than the semantic one,
/// and candidates where both signals are strong get an agreement bonus,
/// capped at 1.0. Monotone non-decreasing in both signals for fixed weights.
#[derive(Debug, Clone)]
pub struct WeightedFusionModel {
    fuzzy_weight: f64,
    embedding_weight: f64,
}

impl WeightedFusionModel {
    const AGREEMENT_BONUS: f64 = 1.2;
    const AGREEMENT_FLOOR: f64 = 0.5;

    pub fn new() -> Self {
        Self {
            fuzzy_weight: 0.6,
            embedding_weight: 0.4,
        }
    }

    pub fn with_weights(fuzzy_weight: f64, embedding_weight: f64) -> Self {
        Self {
            fuzzy_weight,
            embedding_weight,
        }
    }
}

impl Default for WeightedFusionModel {
    fn default() -> Self {
        Self::new()
    }
}

impl FusionModel for WeightedFusionModel {
    fn predict(&self, features: &[f64]) -> f64 {
        let fuzzy = features.first().copied().unwrap_or(0.0).clamp(0.0, 1.0);
        // Cosine arrives in [-1, 1]; rescale onto [0, 1].
        let embedding = ((features.get(1).copied().unwrap_or(0.0) + 1.0) / 2.0).clamp(0.0, 1.0);

        let total = self.fuzzy_weight + self.embedding_weight;
        if total <= 0.0 {
            return 0.0;
        }

        let mut score = (fuzzy * self.fuzzy_weight + embedding * self.embedding_weight) / total;
        if fuzzy > Self::AGREEMENT_FLOOR && embedding > Self::AGREEMENT_FLOOR {
            score *= Self::AGREEMENT_BONUS;
        }
        score.min(1.0)
    }

    fn name(&self) -> &'static str {
        "weighted"
    }
}
