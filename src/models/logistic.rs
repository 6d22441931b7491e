use tracing::debug;

use super::{check_features, check_training, Classifier, ClassifierError};

fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

/// L2-regularised logistic regression fitted by batch gradient descent on
/// standardised inputs. Predicts 1 when the probability exceeds 0.5.
#[derive(Debug, Clone)]
pub struct LogisticRegression {
    learning_rate: f64,
    epochs: usize,
    l2: f64,
    means: Vec<f64>,
    scales: Vec<f64>,
    weights: Vec<f64>,
    bias: f64,
}

impl LogisticRegression {
    pub fn new(learning_rate: f64, epochs: usize, l2: f64) -> Self {
        Self {
            learning_rate,
            epochs,
            l2: l2.max(0.0),
            means: Vec::new(),
            scales: Vec::new(),
            weights: Vec::new(),
            bias: 0.0,
        }
    }

    pub fn is_fitted(&self) -> bool {
        !self.weights.is_empty()
    }

    /// Weights in standardised units, one per feature
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    fn logit(&self, x: &[f64]) -> f64 {
        let mut z = self.bias;
        for j in 0..self.weights.len() {
            z += self.weights[j] * (x[j] - self.means[j]) / self.scales[j];
        }
        z
    }

    pub fn predict_proba(&self, data: &[f64], n_vars: usize) -> Result<Vec<f64>, ClassifierError> {
        if !self.is_fitted() {
            return Err(ClassifierError::NotFitted);
        }
        check_features(data, n_vars, self.weights.len())?;
        Ok(data.chunks(n_vars).map(|x| sigmoid(self.logit(x))).collect())
    }
}

impl Classifier for LogisticRegression {
    fn name(&self) -> &'static str {
        "logistic_regression"
    }

    fn fit(&mut self, data: &[f64], n_vars: usize, targets: &[u8]) -> Result<(), ClassifierError> {
        let n_cases = check_training(data, n_vars, targets)?;
        let n = n_cases as f64;

        let mut means = vec![0.0; n_vars];
        for x in data.chunks(n_vars) {
            for j in 0..n_vars {
                means[j] += x[j] / n;
            }
        }
        let mut scales = vec![0.0; n_vars];
        for x in data.chunks(n_vars) {
            for j in 0..n_vars {
                scales[j] += (x[j] - means[j]).powi(2) / n;
            }
        }
        // constant columns stay unscaled
        for s in scales.iter_mut() {
            *s = if *s > 0.0 { s.sqrt() } else { 1.0 };
        }

        let mut z = Vec::with_capacity(data.len());
        for x in data.chunks(n_vars) {
            for j in 0..n_vars {
                z.push((x[j] - means[j]) / scales[j]);
            }
        }

        let mut weights = vec![0.0; n_vars];
        let mut bias = 0.0;
        let mut grad = vec![0.0; n_vars];

        for _ in 0..self.epochs {
            grad.iter_mut().for_each(|g| *g = 0.0);
            let mut grad_bias = 0.0;

            for (x, &y) in z.chunks(n_vars).zip(targets) {
                let logit = bias + x.iter().zip(&weights).map(|(a, w)| a * w).sum::<f64>();
                let err = sigmoid(logit) - f64::from(y);
                for j in 0..n_vars {
                    grad[j] += err * x[j];
                }
                grad_bias += err;
            }

            for j in 0..n_vars {
                weights[j] -= self.learning_rate * (grad[j] / n + self.l2 * weights[j]);
            }
            bias -= self.learning_rate * grad_bias / n;
        }

        debug!(cases = n_cases, epochs = self.epochs, bias, "logistic regression fitted");

        self.means = means;
        self.scales = scales;
        self.weights = weights;
        self.bias = bias;
        Ok(())
    }

    fn predict(&self, data: &[f64], n_vars: usize) -> Result<Vec<u8>, ClassifierError> {
        let proba = self.predict_proba(data, n_vars)?;
        Ok(proba.into_iter().map(|p| u8::from(p > 0.5)).collect())
    }
}
