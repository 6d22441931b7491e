use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use tracing::debug;

use super::decision_tree::DecisionTree;
use super::{check_features, check_training, Classifier, ClassifierError};

/// Bagged ensemble of decision trees.
///
/// Each tree sees a bootstrap sample of the training rows and
/// `floor(sqrt(n_vars))` random features per split. Prediction is a hard
/// majority vote; an even split goes to 0. Fixed `seed` gives identical
/// forests on identical data.
#[derive(Debug, Clone)]
pub struct RandomForest {
    n_trees: usize,
    max_depth: Option<usize>,
    min_samples_split: usize,
    seed: u64,
    n_vars: usize,
    trees: Vec<DecisionTree>,
}

impl RandomForest {
    pub fn new(n_trees: usize, max_depth: Option<usize>, min_samples_split: usize, seed: u64) -> Self {
        Self {
            n_trees: n_trees.max(1),
            max_depth,
            min_samples_split,
            seed,
            n_vars: 0,
            trees: Vec::new(),
        }
    }

    pub fn n_trees(&self) -> usize {
        self.n_trees
    }

    pub fn is_fitted(&self) -> bool {
        !self.trees.is_empty()
    }

    /// Fraction of trees voting 1 for each case
    pub fn predict_proba(&self, data: &[f64], n_vars: usize) -> Result<Vec<f64>, ClassifierError> {
        if !self.is_fitted() {
            return Err(ClassifierError::NotFitted);
        }
        let n_cases = check_features(data, n_vars, self.n_vars)?;

        let mut votes = vec![0usize; n_cases];
        for tree in &self.trees {
            for (v, class) in votes.iter_mut().zip(tree.predict(data, n_vars)?) {
                *v += usize::from(class);
            }
        }

        let n_trees = self.trees.len() as f64;
        Ok(votes.into_iter().map(|v| v as f64 / n_trees).collect())
    }
}

impl Classifier for RandomForest {
    fn name(&self) -> &'static str {
        "random_forest"
    }

    fn fit(&mut self, data: &[f64], n_vars: usize, targets: &[u8]) -> Result<(), ClassifierError> {
        let n_cases = check_training(data, n_vars, targets)?;
        let max_features = ((n_vars as f64).sqrt().floor() as usize).max(1);
        let mut rng = StdRng::seed_from_u64(self.seed);

        let mut trees = Vec::with_capacity(self.n_trees);
        for _ in 0..self.n_trees {
            let rows: Vec<usize> = (0..n_cases).map(|_| rng.gen_range(0..n_cases)).collect();
            let mut tree = DecisionTree::new(self.max_depth, self.min_samples_split)
                .with_max_features(max_features, rng.next_u64());
            tree.fit_rows(data, n_vars, targets, rows)?;
            trees.push(tree);
        }

        debug!(
            trees = trees.len(),
            cases = n_cases,
            max_features,
            "random forest fitted"
        );

        self.n_vars = n_vars;
        self.trees = trees;
        Ok(())
    }

    fn predict(&self, data: &[f64], n_vars: usize) -> Result<Vec<u8>, ClassifierError> {
        let proba = self.predict_proba(data, n_vars)?;
        Ok(proba.into_iter().map(|p| u8::from(p > 0.5)).collect())
    }
}
