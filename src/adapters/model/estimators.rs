//! Estimators that can be exported to a JSON artifact.
//!
//! Both estimators decide between the artifact's two classes; the tree
//! ensemble may in principle emit any label listed in its leaves, which is
//! why the prediction service still validates what comes back.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

fn default_threshold() -> f64 {
    0.5
}

/// Trained estimator parameters, tagged by `kind`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Estimator {
    LogisticRegression(LogisticRegression),
    TreeEnsemble(TreeEnsemble),
}

impl Estimator {
    /// Check parameter shapes against the feature count and class list.
    pub(super) fn validate(&self, n_features: usize, classes: &[i64]) -> Result<(), String> {
        match self {
            Self::LogisticRegression(m) => m.validate(n_features),
            Self::TreeEnsemble(m) => m.validate(n_features, classes),
        }
    }

    /// Predict the label for one sample of validated width.
    pub(super) fn predict_one(&self, x: &[f64], classes: &[i64]) -> Result<i64, String> {
        match self {
            Self::LogisticRegression(m) => {
                let idx = usize::from(m.probability(x) >= m.threshold);
                classes
                    .get(idx)
                    .copied()
                    .ok_or_else(|| format!("class index {idx} out of range"))
            }
            Self::TreeEnsemble(m) => m.predict(x),
        }
    }

    /// Short name for logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::LogisticRegression(_) => "logistic_regression",
            Self::TreeEnsemble(_) => "tree_ensemble",
        }
    }
}

/// Binary logistic regression with optional standardization.
///
/// `z = intercept + sum(coef_i * (x_i - mean_i) / scale_i)`, positive when
/// `sigmoid(z) >= threshold`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticRegression {
    pub coefficients: Vec<f64>,
    pub intercept: f64,
    #[serde(default)]
    pub scaler_mean: Option<Vec<f64>>,
    #[serde(default)]
    pub scaler_scale: Option<Vec<f64>>,
    #[serde(default = "default_threshold")]
    pub threshold: f64,
}

impl LogisticRegression {
    fn validate(&self, n: usize) -> Result<(), String> {
        if self.coefficients.len() != n {
            return Err(format!(
                "coefficients has {} entries, expected {n}",
                self.coefficients.len()
            ));
        }
        if !self.intercept.is_finite() || self.coefficients.iter().any(|c| !c.is_finite()) {
            return Err("coefficients and intercept must be finite".into());
        }
        if !(self.threshold > 0.0 && self.threshold < 1.0) {
            return Err(format!("threshold {} must lie in (0, 1)", self.threshold));
        }
        match (&self.scaler_mean, &self.scaler_scale) {
            (None, None) => {}
            (Some(mean), Some(scale)) => {
                if mean.len() != n || scale.len() != n {
                    return Err("scaler_mean/scaler_scale lengths do not match feature_names".into());
                }
                if mean.iter().any(|m| !m.is_finite()) {
                    return Err("scaler_mean must be finite".into());
                }
                if scale.iter().any(|s| !s.is_finite() || *s == 0.0) {
                    return Err("scaler_scale must be finite and non-zero".into());
                }
            }
            _ => return Err("scaler_mean and scaler_scale must be given together".into()),
        }
        Ok(())
    }

    fn decision_function(&self, x: &[f64]) -> f64 {
        let mut z = self.intercept;
        for (i, (&xi, &coef)) in x.iter().zip(&self.coefficients).enumerate() {
            let standardized = match (&self.scaler_mean, &self.scaler_scale) {
                (Some(mean), Some(scale)) => (xi - mean[i]) / scale[i],
                _ => xi,
            };
            z += coef * standardized;
        }
        z
    }

    /// Probability of the positive class.
    #[must_use]
    pub fn probability(&self, x: &[f64]) -> f64 {
        1.0 / (1.0 + (-self.decision_function(x)).exp())
    }
}

/// Majority vote over decision trees.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeEnsemble {
    pub trees: Vec<DecisionTree>,
}

/// A decision tree stored as a flat node array; node 0 is the root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    pub nodes: Vec<TreeNode>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TreeNode {
    /// Go to `left` when `x[feature] <= threshold`, else to `right`.
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        class: i64,
    },
}

impl TreeEnsemble {
    fn validate(&self, n: usize, classes: &[i64]) -> Result<(), String> {
        if self.trees.is_empty() {
            return Err("tree_ensemble has no trees".into());
        }
        for (t, tree) in self.trees.iter().enumerate() {
            tree.validate(n, classes)
                .map_err(|e| format!("tree {t}: {e}"))?;
        }
        Ok(())
    }

    fn predict(&self, x: &[f64]) -> Result<i64, String> {
        let mut votes: BTreeMap<i64, usize> = BTreeMap::new();
        for tree in &self.trees {
            *votes.entry(tree.predict(x)?).or_default() += 1;
        }

        // Ascending key order: the first label with the top count wins ties.
        let mut best: Option<(i64, usize)> = None;
        for (label, count) in votes {
            if best.map_or(true, |(_, c)| count > c) {
                best = Some((label, count));
            }
        }
        best.map(|(label, _)| label)
            .ok_or_else(|| "tree_ensemble produced no votes".to_string())
    }
}

impl DecisionTree {
    fn validate(&self, n: usize, classes: &[i64]) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".into());
        }
        let len = self.nodes.len();
        for (idx, node) in self.nodes.iter().enumerate() {
            match *node {
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if feature >= n {
                        return Err(format!("node {idx} splits on feature {feature}, only {n} exist"));
                    }
                    if !threshold.is_finite() {
                        return Err(format!("node {idx} has a non-finite threshold"));
                    }
                    // Children must point forward so every walk terminates.
                    for child in [left, right] {
                        if child <= idx || child >= len {
                            return Err(format!("node {idx} has invalid child index {child}"));
                        }
                    }
                }
                TreeNode::Leaf { class } => {
                    if !classes.contains(&class) {
                        return Err(format!("node {idx} predicts unlisted class {class}"));
                    }
                }
            }
        }
        Ok(())
    }

    fn predict(&self, x: &[f64]) -> Result<i64, String> {
        let mut idx = 0;
        loop {
            match self.nodes.get(idx) {
                Some(TreeNode::Leaf { class }) => return Ok(*class),
                Some(TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    let value = x
                        .get(*feature)
                        .ok_or_else(|| format!("sample has no feature {feature}"))?;
                    idx = if *value <= *threshold { *left } else { *right };
                }
                None => return Err(format!("tree walk reached missing node {idx}")),
            }
        }
    }
}
