//! Binary next-bar classifiers and the chronological model wrapper.

pub mod decision_tree;
pub mod logistic;
pub mod random_forest;
pub mod wrapper;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use decision_tree::DecisionTree;
pub use logistic::LogisticRegression;
pub use random_forest::RandomForest;
pub use wrapper::{FitReport, ModelWrapper};

#[derive(Debug, Error, PartialEq)]
pub enum ClassifierError {
    #[error("classifier has not been fitted")]
    NotFitted,

    #[error("training set is empty")]
    EmptyTrainingSet,

    #[error("feature matrix needs at least one column")]
    NoFeatures,

    #[error("feature matrix has {actual} values, expected {expected}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("classifier returned {actual} predictions for {expected} rows")]
    PredictionCount { expected: usize, actual: usize },

    #[error("classifier was fitted on {expected} features, got {actual}")]
    FeatureCountMismatch { expected: usize, actual: usize },

    #[error("label {value} at row {row} is not 0 or 1")]
    InvalidLabel { row: usize, value: u8 },

    #[error("feature {column} at row {row} is not finite")]
    NonFiniteFeature { row: usize, column: usize },
}

/// A binary classifier over row-major numeric feature matrices.
///
/// `data` holds `n_vars` values per case: `[case0_var0, case0_var1, ...]`.
/// Labels are 0 or 1. `fit` discards any previous training.
pub trait Classifier {
    fn name(&self) -> &'static str;

    fn fit(&mut self, data: &[f64], n_vars: usize, targets: &[u8]) -> Result<(), ClassifierError>;

    fn predict(&self, data: &[f64], n_vars: usize) -> Result<Vec<u8>, ClassifierError>;
}

/// Validate a training set and return its number of cases.
pub(crate) fn check_training(
    data: &[f64],
    n_vars: usize,
    targets: &[u8],
) -> Result<usize, ClassifierError> {
    if n_vars == 0 {
        return Err(ClassifierError::NoFeatures);
    }
    if targets.is_empty() {
        return Err(ClassifierError::EmptyTrainingSet);
    }
    if data.len() != targets.len() * n_vars {
        return Err(ClassifierError::DimensionMismatch {
            expected: targets.len() * n_vars,
            actual: data.len(),
        });
    }
    if let Some((row, &value)) = targets.iter().enumerate().find(|(_, y)| **y > 1) {
        return Err(ClassifierError::InvalidLabel { row, value });
    }
    if let Some(i) = data.iter().position(|x| !x.is_finite()) {
        return Err(ClassifierError::NonFiniteFeature {
            row: i / n_vars,
            column: i % n_vars,
        });
    }
    Ok(targets.len())
}

/// Validate a prediction matrix against the fitted width and return its
/// number of cases.
pub(crate) fn check_features(
    data: &[f64],
    n_vars: usize,
    fitted_vars: usize,
) -> Result<usize, ClassifierError> {
    if n_vars != fitted_vars {
        return Err(ClassifierError::FeatureCountMismatch {
            expected: fitted_vars,
            actual: n_vars,
        });
    }
    if data.len() % n_vars != 0 {
        return Err(ClassifierError::DimensionMismatch {
            expected: data.len() / n_vars * n_vars,
            actual: data.len(),
        });
    }
    Ok(data.len() / n_vars)
}

/// Fraction of matching labels; 0 for empty input.
pub fn accuracy(predicted: &[u8], actual: &[u8]) -> f64 {
    if actual.is_empty() {
        return 0.0;
    }
    let correct = predicted
        .iter()
        .zip(actual)
        .filter(|(p, a)| p == a)
        .count();
    correct as f64 / actual.len() as f64
}

/// Classifier family selectable from configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassifierKind {
    Tree,
    #[default]
    Forest,
    Logistic,
}

impl fmt::Display for ClassifierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ClassifierKind::Tree => "tree",
            ClassifierKind::Forest => "forest",
            ClassifierKind::Logistic => "logistic",
        };
        f.write_str(name)
    }
}

impl FromStr for ClassifierKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "tree" | "decision_tree" => Ok(ClassifierKind::Tree),
            "forest" | "random_forest" => Ok(ClassifierKind::Forest),
            "logistic" | "logistic_regression" => Ok(ClassifierKind::Logistic),
            other => Err(format!(
                "unknown classifier '{}' (expected tree, forest or logistic)",
                other
            )),
        }
    }
}

/// Hyperparameters for every classifier family; each family reads the
/// fields it needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierParams {
    pub kind: ClassifierKind,
    /// None grows trees until leaves are pure
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub n_trees: usize,
    pub seed: u64,
    pub learning_rate: f64,
    pub epochs: usize,
    pub l2: f64,
}

impl Default for ClassifierParams {
    fn default() -> Self {
        Self {
            kind: ClassifierKind::Forest,
            max_depth: None,
            min_samples_split: 2,
            n_trees: 100,
            seed: 42,
            learning_rate: 0.1,
            epochs: 500,
            l2: 1e-4,
        }
    }
}

impl ClassifierParams {
    pub fn build(&self) -> Box<dyn Classifier> {
        match self.kind {
            ClassifierKind::Tree => Box::new(
                DecisionTree::new(self.max_depth, self.min_samples_split),
            ),
            ClassifierKind::Forest => Box::new(RandomForest::new(
                self.n_trees,
                self.max_depth,
                self.min_samples_split,
                self.seed,
            )),
            ClassifierKind::Logistic => Box::new(LogisticRegression::new(
                self.learning_rate,
                self.epochs,
                self.l2,
            )),
        }
    }
}
