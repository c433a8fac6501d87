//! The pre-trained classifier behind the model-backed probability source.
//!
//! The scorer only sees the `ChurnModel` trait. `ModelBundle` is the
//! shipped implementation: a JSON export of the trained estimator together
//! with the feature info it was fitted on (numeric column names and the
//! categorical vocabularies) and a model card for the performance view.
//!
//! Categoricals are one-hot encoded as `<Feature>_<Category>`, e.g.
//! `Geography_Germany`. Tree splits and logistic coefficients refer to
//! these encoded column names.

use crate::{
    customer::{FeatureRow, FEATURE_NAMES, NUMERIC_FEATURES},
    error::{ChurnError, ChurnResult},
    types::Probability,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

/// An opaque classifier: one row of named features in, P(churn) out.
pub trait ChurnModel {
    fn name(&self) -> &str;

    /// Categories the model was trained on for `feature`, if it is categorical.
    fn vocabulary(&self, feature: &str) -> Option<&[String]>;

    fn predict_probability(&self, row: &FeatureRow) -> ChurnResult<Probability>;
}

// ── File shape ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoricalFeature {
    pub name:       String,
    pub categories: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureInfo {
    pub numeric_features:     Vec<String>,
    pub categorical_features: Vec<CategoricalFeature>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TreeNodeSpec {
    Split {
        feature:   String,
        threshold: f64,
        left:      usize,
        right:     usize,
    },
    Leaf {
        probability: f64,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeSpec {
    pub nodes: Vec<TreeNodeSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScalerParams {
    pub mean:  f64,
    pub scale: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EstimatorSpec {
    RandomForest {
        trees: Vec<TreeSpec>,
    },
    LogisticRegression {
        intercept:    f64,
        coefficients: BTreeMap<String, f64>,
        #[serde(default)]
        scaler:       BTreeMap<String, ScalerParams>,
    },
}

/// One row of the model comparison table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMetrics {
    pub model:     String,
    pub auc:       f64,
    pub accuracy:  f64,
    pub precision: f64,
    pub recall:    f64,
    pub f1:        f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureImportance {
    pub feature:    String,
    pub importance: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelCard {
    #[serde(default)]
    pub name:               String,
    #[serde(default)]
    pub comparison:         Vec<ModelMetrics>,
    #[serde(default)]
    pub feature_importance: Vec<FeatureImportance>,
}

impl ModelCard {
    /// The comparison row for the bundled model, if the card lists it.
    pub fn best(&self) -> Option<&ModelMetrics> {
        self.comparison.iter().find(|m| m.model == self.name)
    }

    /// Importances sorted descending, truncated to `n`.
    pub fn top_drivers(&self, n: usize) -> Vec<FeatureImportance> {
        let mut sorted = self.feature_importance.clone();
        sorted.sort_by(|a, b| {
            b.importance
                .partial_cmp(&a.importance)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        sorted.truncate(n);
        sorted
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BundleFile {
    pub feature_info: FeatureInfo,
    pub estimator:    EstimatorSpec,
    #[serde(default)]
    pub card:         ModelCard,
}

// ── Runtime form ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
enum TreeNode {
    Split { column: usize, threshold: f64, left: usize, right: usize },
    Leaf  { probability: f64 },
}

#[derive(Debug, Clone)]
enum Estimator {
    Forest(Vec<Vec<TreeNode>>),
    Logistic {
        intercept: f64,
        // (column, weight, mean, scale)
        terms:     Vec<(usize, f64, f64, f64)>,
    },
}

/// A loaded, validated model artifact. Immutable once built.
#[derive(Debug, Clone)]
pub struct ModelBundle {
    feature_info: FeatureInfo,
    columns:      Vec<String>,
    estimator:    Estimator,
    card:         ModelCard,
}

impl ModelBundle {
    /// Load the bundle from a JSON file.
    pub fn load(path: &Path) -> ChurnResult<Self> {
        if !path.exists() {
            return Err(ChurnError::missing("model bundle", path.display().to_string()));
        }
        let content = std::fs::read_to_string(path)?;
        let bundle = Self::from_json(&content)?;
        log::info!(
            "model: loaded '{}' from {} ({} encoded columns)",
            bundle.card.name,
            path.display(),
            bundle.columns.len(),
        );
        Ok(bundle)
    }

    pub fn from_json(content: &str) -> ChurnResult<Self> {
        let file: BundleFile = serde_json::from_str(content)?;
        Self::from_file(file)
    }

    pub fn from_file(file: BundleFile) -> ChurnResult<Self> {
        check_feature_info(&file.feature_info)?;
        let columns = encoded_columns(&file.feature_info);
        let index: HashMap<&str, usize> = columns
            .iter()
            .enumerate()
            .map(|(i, c)| (c.as_str(), i))
            .collect();

        let column_of = |name: &str| -> ChurnResult<usize> {
            index.get(name).copied().ok_or_else(|| {
                ChurnError::invalid(name, "model references a column missing from feature_info")
            })
        };

        let estimator = match file.estimator {
            EstimatorSpec::RandomForest { trees } => {
                if trees.is_empty() {
                    return Err(ChurnError::invalid("estimator", "random forest has no trees"));
                }
                let mut compiled = Vec::with_capacity(trees.len());
                for (t, tree) in trees.iter().enumerate() {
                    compiled.push(compile_tree(t, tree, &column_of)?);
                }
                Estimator::Forest(compiled)
            }
            EstimatorSpec::LogisticRegression { intercept, coefficients, scaler } => {
                let mut terms = Vec::with_capacity(coefficients.len());
                for (name, weight) in &coefficients {
                    let column = column_of(name.as_str())?;
                    let (mean, scale) = match scaler.get(name) {
                        Some(p) => (p.mean, p.scale),
                        None    => (0.0, 1.0),
                    };
                    if scale == 0.0 || !scale.is_finite() {
                        return Err(ChurnError::invalid(name.as_str(), "scaler scale must be non-zero"));
                    }
                    terms.push((column, *weight, mean, scale));
                }
                Estimator::Logistic { intercept, terms }
            }
        };

        Ok(Self {
            feature_info: file.feature_info,
            columns,
            estimator,
            card: file.card,
        })
    }

    pub fn card(&self) -> &ModelCard {
        &self.card
    }

    pub fn feature_info(&self) -> &FeatureInfo {
        &self.feature_info
    }

    /// Encoded column names, in the order `encode` produces values.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Numeric passthrough followed by one-hot categoricals.
    pub fn encode(&self, row: &FeatureRow) -> ChurnResult<Vec<f64>> {
        let mut values = Vec::with_capacity(self.columns.len());

        for name in &self.feature_info.numeric_features {
            let v = row
                .numeric_value(name)
                .ok_or_else(|| ChurnError::invalid(name.as_str(), "required feature not provided"))?;
            if !v.is_finite() {
                return Err(ChurnError::invalid(name.as_str(), "value is not finite"));
            }
            values.push(v);
        }

        for cat in &self.feature_info.categorical_features {
            let v = row
                .categorical_value(&cat.name)
                .ok_or_else(|| ChurnError::invalid(cat.name.as_str(), "required feature not provided"))?;
            if !cat.categories.iter().any(|c| c == v) {
                return Err(ChurnError::invalid(
                    cat.name.as_str(),
                    format!("'{v}' is not one of [{}]", cat.categories.join(", ")),
                ));
            }
            values.extend(cat.categories.iter().map(|c| if c == v { 1.0 } else { 0.0 }));
        }

        Ok(values)
    }
}

impl ChurnModel for ModelBundle {
    fn name(&self) -> &str {
        &self.card.name
    }

    fn vocabulary(&self, feature: &str) -> Option<&[String]> {
        self.feature_info
            .categorical_features
            .iter()
            .find(|c| c.name == feature)
            .map(|c| c.categories.as_slice())
    }

    fn predict_probability(&self, row: &FeatureRow) -> ChurnResult<Probability> {
        let x = self.encode(row)?;

        let p = match &self.estimator {
            Estimator::Forest(trees) => {
                let total: f64 = trees.iter().map(|nodes| walk_tree(nodes, &x)).sum();
                total / trees.len() as f64
            }
            Estimator::Logistic { intercept, terms } => {
                let z = terms.iter().fold(*intercept, |acc, (col, w, mean, scale)| {
                    acc + w * (x[*col] - mean) / scale
                });
                1.0 / (1.0 + (-z).exp())
            }
        };

        if !p.is_finite() {
            return Err(ChurnError::invalid("probability", "model produced a non-finite output"));
        }
        Ok(p.clamp(0.0, 1.0))
    }
}

/// The bundle must be fitted on exactly the training columns, with a
/// non-empty vocabulary for every categorical.
fn check_feature_info(info: &FeatureInfo) -> ChurnResult<()> {
    if info.numeric_features.iter().map(String::as_str).ne(NUMERIC_FEATURES) {
        return Err(ChurnError::invalid(
            "feature_info.numeric_features",
            format!("expected [{}]", NUMERIC_FEATURES.join(", ")),
        ));
    }
    for name in &FEATURE_NAMES[NUMERIC_FEATURES.len()..] {
        match info.categorical_features.iter().find(|c| c.name == *name) {
            None => {
                return Err(ChurnError::invalid(
                    "feature_info.categorical_features",
                    format!("no vocabulary for {name}"),
                ))
            }
            Some(c) if c.categories.is_empty() => {
                return Err(ChurnError::invalid(
                    "feature_info.categorical_features",
                    format!("empty vocabulary for {name}"),
                ))
            }
            Some(_) => {}
        }
    }
    Ok(())
}

fn encoded_columns(info: &FeatureInfo) -> Vec<String> {
    let mut columns: Vec<String> = info.numeric_features.clone();
    for cat in &info.categorical_features {
        columns.extend(cat.categories.iter().map(|c| format!("{}_{}", cat.name, c)));
    }
    columns
}

/// Children must sit after their parent in `nodes`, which rules out cycles.
fn compile_tree(
    tree_idx: usize,
    tree: &TreeSpec,
    column_of: &dyn Fn(&str) -> ChurnResult<usize>,
) -> ChurnResult<Vec<TreeNode>> {
    if tree.nodes.is_empty() {
        return Err(ChurnError::invalid(format!("trees[{tree_idx}]"), "tree has no nodes"));
    }
    let n = tree.nodes.len();

    tree.nodes
        .iter()
        .enumerate()
        .map(|(i, node)| match node {
            TreeNodeSpec::Split { feature, threshold, left, right } => {
                for child in [*left, *right] {
                    if child <= i || child >= n {
                        return Err(ChurnError::invalid(
                            format!("trees[{tree_idx}].nodes[{i}]"),
                            format!("child index {child} out of range"),
                        ));
                    }
                }
                Ok(TreeNode::Split {
                    column:    column_of(feature.as_str())?,
                    threshold: *threshold,
                    left:      *left,
                    right:     *right,
                })
            }
            TreeNodeSpec::Leaf { probability } => {
                if !(0.0..=1.0).contains(probability) {
                    return Err(ChurnError::invalid(
                        format!("trees[{tree_idx}].nodes[{i}]"),
                        format!("leaf probability {probability} outside [0, 1]"),
                    ));
                }
                Ok(TreeNode::Leaf { probability: *probability })
            }
        })
        .collect()
}

fn walk_tree(nodes: &[TreeNode], x: &[f64]) -> f64 {
    let mut i = 0;
    loop {
        match &nodes[i] {
            TreeNode::Leaf { probability } => return *probability,
            TreeNode::Split { column, threshold, left, right } => {
                i = if x[*column] <= *threshold { *left } else { *right };
            }
        }
    }
}
