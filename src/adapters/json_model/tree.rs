//! Tree classifier artifacts: a single decision tree and a forest of them.
//!
//! Trees are stored as a flat node list with node 0 as the root. A split
//! sends `x[feature] <= threshold` left. Children must have larger indices
//! than their parent, which keeps traversal bounded.

use serde::{Deserialize, Serialize};

use crate::domain::{ArtifactError, InferenceError};
use crate::ports::ProbabilisticClassifier;

use super::check_row;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    /// Per-class sample counts (or weights) reaching this leaf.
    Leaf { value: Vec<f64> },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeNodes {
    pub nodes: Vec<TreeNode>,
}

impl TreeNodes {
    fn validate(&self, name: &str, n_features: usize, n_outputs: usize) -> Result<(), ArtifactError> {
        if self.nodes.is_empty() {
            return Err(ArtifactError::decode(name, "tree has no nodes"));
        }
        for (i, node) in self.nodes.iter().enumerate() {
            match node {
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if *feature >= n_features {
                        return Err(ArtifactError::decode(
                            name,
                            format!("node {i} splits on feature {feature}, only {n_features} declared"),
                        ));
                    }
                    if !threshold.is_finite() {
                        return Err(ArtifactError::decode(name, format!("node {i} has a non-finite threshold")));
                    }
                    for child in [*left, *right] {
                        if child <= i || child >= self.nodes.len() {
                            return Err(ArtifactError::decode(
                                name,
                                format!("node {i} has invalid child index {child}"),
                            ));
                        }
                    }
                }
                TreeNode::Leaf { value } => {
                    if value.len() != n_outputs {
                        return Err(ArtifactError::decode(
                            name,
                            format!("leaf {i} has {} values, expected {n_outputs}", value.len()),
                        ));
                    }
                    if value.iter().any(|v| !v.is_finite() || *v < 0.0) {
                        return Err(ArtifactError::decode(
                            name,
                            format!("leaf {i} has a negative or non-finite value"),
                        ));
                    }
                    if value.iter().sum::<f64>() <= 0.0 {
                        return Err(ArtifactError::decode(name, format!("leaf {i} is empty")));
                    }
                }
            }
        }
        Ok(())
    }

    /// Normalized class distribution of the leaf `row` lands in.
    fn leaf_distribution(&self, row: &[f64]) -> Vec<f64> {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if row[*feature] <= *threshold { *left } else { *right };
                }
                TreeNode::Leaf { value } => {
                    let total: f64 = value.iter().sum();
                    return value.iter().map(|v| v / total).collect();
                }
            }
        }
    }
}

/// Single decision tree classifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    pub classes: Vec<i64>,
    pub n_features: usize,
    #[serde(flatten)]
    pub tree: TreeNodes,
    #[serde(default)]
    pub feature_names: Option<Vec<String>>,
}

impl DecisionTree {
    /// Check internal consistency.
    ///
    /// # Errors
    /// Returns `ArtifactError::Decode` describing the first inconsistency.
    pub fn validate(&self, name: &str) -> Result<(), ArtifactError> {
        validate_header(name, &self.classes, self.n_features)?;
        self.tree.validate(name, self.n_features, self.classes.len())
    }
}

impl ProbabilisticClassifier for DecisionTree {
    fn classes(&self) -> Option<&[i64]> {
        Some(&self.classes)
    }

    fn n_features(&self) -> usize {
        self.n_features
    }

    fn feature_names(&self) -> Option<&[String]> {
        self.feature_names.as_deref()
    }

    fn predict_proba(&self, row: &[f64]) -> Result<Vec<f64>, InferenceError> {
        check_row(row, self.n_features)?;
        Ok(self.tree.leaf_distribution(row))
    }
}

/// Forest of decision trees; class probabilities are averaged across trees.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForest {
    pub classes: Vec<i64>,
    pub n_features: usize,
    pub trees: Vec<TreeNodes>,
    #[serde(default)]
    pub feature_names: Option<Vec<String>>,
}

impl RandomForest {
    /// Check internal consistency.
    ///
    /// # Errors
    /// Returns `ArtifactError::Decode` describing the first inconsistency.
    pub fn validate(&self, name: &str) -> Result<(), ArtifactError> {
        validate_header(name, &self.classes, self.n_features)?;
        if self.trees.is_empty() {
            return Err(ArtifactError::decode(name, "forest has no trees"));
        }
        self.trees
            .iter()
            .try_for_each(|t| t.validate(name, self.n_features, self.classes.len()))
    }
}

impl ProbabilisticClassifier for RandomForest {
    fn classes(&self) -> Option<&[i64]> {
        Some(&self.classes)
    }

    fn n_features(&self) -> usize {
        self.n_features
    }

    fn feature_names(&self) -> Option<&[String]> {
        self.feature_names.as_deref()
    }

    fn predict_proba(&self, row: &[f64]) -> Result<Vec<f64>, InferenceError> {
        check_row(row, self.n_features)?;
        let mut acc = vec![0.0; self.classes.len()];
        for tree in &self.trees {
            for (a, p) in acc.iter_mut().zip(tree.leaf_distribution(row)) {
                *a += p;
            }
        }
        let n = self.trees.len() as f64;
        Ok(acc.into_iter().map(|a| a / n).collect())
    }
}

fn validate_header(name: &str, classes: &[i64], n_features: usize) -> Result<(), ArtifactError> {
    if classes.len() < 2 {
        return Err(ArtifactError::decode(name, "at least two classes are required"));
    }
    if n_features == 0 {
        return Err(ArtifactError::decode(name, "n_features must be > 0"));
    }
    Ok(())
}
