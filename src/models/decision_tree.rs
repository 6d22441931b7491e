use rand::rngs::StdRng;
use rand::SeedableRng;

use super::{check_features, check_training, Classifier, ClassifierError};

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Leaf {
        class: u8,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// Training set shared by every node during growth
struct TrainingSet<'a> {
    data: &'a [f64],
    n_vars: usize,
    targets: &'a [u8],
}

impl TrainingSet<'_> {
    fn value(&self, row: usize, feature: usize) -> f64 {
        self.data[row * self.n_vars + feature]
    }
}

fn gini(positives: usize, n: usize) -> f64 {
    if n == 0 {
        return 0.0;
    }
    let p = positives as f64 / n as f64;
    2.0 * p * (1.0 - p)
}

/// CART classification tree using Gini impurity.
///
/// Splits test `x[feature] <= threshold` with thresholds at midpoints
/// between consecutive distinct values. Leaves predict the majority class,
/// ties going to 0.
#[derive(Debug, Clone)]
pub struct DecisionTree {
    max_depth: Option<usize>,
    min_samples_split: usize,
    /// Features drawn at random per split; None considers all of them
    max_features: Option<usize>,
    seed: u64,
    n_vars: usize,
    nodes: Vec<Node>,
}

impl DecisionTree {
    pub fn new(max_depth: Option<usize>, min_samples_split: usize) -> Self {
        Self {
            max_depth,
            min_samples_split: min_samples_split.max(2),
            max_features: None,
            seed: 0,
            n_vars: 0,
            nodes: Vec::new(),
        }
    }

    /// Consider only `k` randomly chosen features at each split
    pub fn with_max_features(mut self, k: usize, seed: u64) -> Self {
        self.max_features = Some(k.max(1));
        self.seed = seed;
        self
    }

    pub fn is_fitted(&self) -> bool {
        !self.nodes.is_empty()
    }

    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], id: usize) -> usize {
            match nodes[id] {
                Node::Leaf { .. } => 0,
                Node::Split { left, right, .. } => 1 + walk(nodes, left).max(walk(nodes, right)),
            }
        }
        if self.nodes.is_empty() { 0 } else { walk(&self.nodes, 0) }
    }

    /// Fit on a subset of rows; repeated indices act as sample weights.
    pub fn fit_rows(
        &mut self,
        data: &[f64],
        n_vars: usize,
        targets: &[u8],
        rows: Vec<usize>,
    ) -> Result<(), ClassifierError> {
        check_training(data, n_vars, targets)?;
        if rows.is_empty() {
            return Err(ClassifierError::EmptyTrainingSet);
        }

        let set = TrainingSet {
            data,
            n_vars,
            targets,
        };
        let mut rng = StdRng::seed_from_u64(self.seed);

        self.n_vars = n_vars;
        self.nodes.clear();
        self.grow(&set, rows, 0, &mut rng);
        Ok(())
    }

    fn push(&mut self, node: Node) -> usize {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    fn grow(&mut self, set: &TrainingSet, rows: Vec<usize>, depth: usize, rng: &mut StdRng) -> usize {
        let positives = rows.iter().filter(|&&r| set.targets[r] == 1).count();
        let class = u8::from(positives * 2 > rows.len());

        let pure = positives == 0 || positives == rows.len();
        let too_deep = self.max_depth.is_some_and(|d| depth >= d);
        if pure || too_deep || rows.len() < self.min_samples_split {
            return self.push(Node::Leaf { class });
        }

        let features = self.candidate_features(set.n_vars, rng);
        let Some((feature, threshold)) = best_split(set, &rows, positives, &features) else {
            return self.push(Node::Leaf { class });
        };

        let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = rows
            .iter()
            .partition(|&&r| set.value(r, feature) <= threshold);
        if left_rows.is_empty() || right_rows.is_empty() {
            return self.push(Node::Leaf { class });
        }

        // reserve the slot so the parent precedes its children
        let id = self.push(Node::Leaf { class });
        let left = self.grow(set, left_rows, depth + 1, rng);
        let right = self.grow(set, right_rows, depth + 1, rng);
        self.nodes[id] = Node::Split {
            feature,
            threshold,
            left,
            right,
        };
        id
    }

    fn candidate_features(&self, n_vars: usize, rng: &mut StdRng) -> Vec<usize> {
        match self.max_features {
            Some(k) if k < n_vars => rand::seq::index::sample(rng, n_vars, k).into_vec(),
            _ => (0..n_vars).collect(),
        }
    }

    fn predict_one(&self, x: &[f64]) -> u8 {
        let mut id = 0;
        loop {
            match self.nodes[id] {
                Node::Leaf { class } => return class,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    id = if x[feature] <= threshold { left } else { right };
                }
            }
        }
    }
}

/// Lowest weighted Gini split over `features`, if any improves on the parent.
fn best_split(
    set: &TrainingSet,
    rows: &[usize],
    positives: usize,
    features: &[usize],
) -> Option<(usize, f64)> {
    let n = rows.len();
    let parent = gini(positives, n);
    let mut best: Option<(f64, usize, f64)> = None;
    let mut sorted = rows.to_vec();

    for &feature in features {
        sorted.sort_by(|&a, &b| set.value(a, feature).total_cmp(&set.value(b, feature)));

        let mut left_pos = 0;
        for i in 0..n - 1 {
            left_pos += usize::from(set.targets[sorted[i]]);
            let lo = set.value(sorted[i], feature);
            let hi = set.value(sorted[i + 1], feature);
            if lo >= hi {
                continue;
            }

            let n_left = i + 1;
            let n_right = n - n_left;
            let impurity = (n_left as f64 * gini(left_pos, n_left)
                + n_right as f64 * gini(positives - left_pos, n_right))
                / n as f64;

            if best.is_none_or(|(b, _, _)| impurity < b) {
                let mut threshold = lo + (hi - lo) / 2.0;
                if threshold >= hi {
                    threshold = lo;
                }
                best = Some((impurity, feature, threshold));
            }
        }
    }

    best.filter(|(impurity, _, _)| *impurity < parent - 1e-12)
        .map(|(_, feature, threshold)| (feature, threshold))
}

impl Classifier for DecisionTree {
    fn name(&self) -> &'static str {
        "decision_tree"
    }

    fn fit(&mut self, data: &[f64], n_vars: usize, targets: &[u8]) -> Result<(), ClassifierError> {
        let rows = (0..targets.len()).collect();
        self.fit_rows(data, n_vars, targets, rows)
    }

    fn predict(&self, data: &[f64], n_vars: usize) -> Result<Vec<u8>, ClassifierError> {
        if !self.is_fitted() {
            return Err(ClassifierError::NotFitted);
        }
        check_features(data, n_vars, self.n_vars)?;
        Ok(data.chunks(n_vars).map(|x| self.predict_one(x)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_learns_threshold() {
        let data: Vec<f64> = (0..20).map(|i| i as f64).collect();
        let targets: Vec<u8> = (0..20).map(|i| u8::from(i >= 12)).collect();

        let mut tree = DecisionTree::new(None, 2);
        tree.fit(&data, 1, &targets).unwrap();

        assert_eq!(tree.predict(&data, 1).unwrap(), targets);
        assert_eq!(tree.depth(), 1);
        assert_eq!(tree.predict(&[11.4, 11.6], 1).unwrap(), vec![0, 1]);
    }

    #[test]
    fn test_picks_informative_feature() {
        // column 0 is noise, column 1 decides the label
        let mut data = Vec::new();
        let mut targets = Vec::new();
        for i in 0..40 {
            data.push(((i * 7) % 13) as f64);
            data.push(if i % 2 == 0 { -1.0 } else { 1.0 });
            targets.push((i % 2) as u8);
        }

        let mut tree = DecisionTree::new(Some(3), 2);
        tree.fit(&data, 2, &targets).unwrap();

        assert_eq!(tree.predict(&[5.0, -1.0, 5.0, 1.0], 2).unwrap(), vec![0, 1]);
        assert_eq!(tree.depth(), 1);
    }

    #[test]
    fn test_xor_has_no_greedy_split() {
        let data = vec![0.0, 0.0, 0.0, 1.0, 1.0, 0.0, 1.0, 1.0];
        let targets = vec![0, 1, 1, 0];

        // no single split reduces impurity
        let mut tree = DecisionTree::new(None, 2);
        tree.fit(&data, 2, &targets).unwrap();
        assert_eq!(tree.depth(), 0);
        assert_eq!(tree.predict(&data, 2).unwrap(), vec![0, 0, 0, 0]);
    }

    #[test]
    fn test_majority_leaf_ties_to_zero() {
        let mut tree = DecisionTree::new(Some(0), 2);
        tree.fit(&[1.0, 2.0, 3.0, 4.0], 1, &[1, 0, 1, 0]).unwrap();
        assert_eq!(tree.predict(&[2.5], 1).unwrap(), vec![0]);

        tree.fit(&[1.0, 2.0, 3.0], 1, &[1, 0, 1]).unwrap();
        assert_eq!(tree.predict(&[2.5], 1).unwrap(), vec![1]);
    }

    #[test]
    fn test_constant_features_make_a_leaf() {
        let mut tree = DecisionTree::new(None, 2);
        tree.fit(&[1.0; 6], 1, &[0, 1, 1, 0, 1, 1]).unwrap();
        assert_eq!(tree.depth(), 0);
        assert_eq!(tree.predict(&[7.0], 1).unwrap(), vec![1]);
    }

    #[test]
    fn test_errors() {
        let tree = DecisionTree::new(None, 2);
        assert_eq!(tree.predict(&[1.0], 1), Err(ClassifierError::NotFitted));

        let mut tree = DecisionTree::new(None, 2);
        tree.fit(&[1.0, 2.0, 3.0, 4.0], 2, &[0, 1]).unwrap();
        assert_eq!(
            tree.predict(&[1.0, 2.0, 3.0], 3),
            Err(ClassifierError::FeatureCountMismatch {
                expected: 2,
                actual: 3
            })
        );
        assert_eq!(
            tree.fit(&[], 2, &[]),
            Err(ClassifierError::EmptyTrainingSet)
        );
    }
}
