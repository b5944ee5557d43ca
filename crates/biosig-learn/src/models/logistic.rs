//! Multinomial logistic regression trained by batch gradient descent

use super::{Classifier, ModelArtifact};
use biosig_core::{SigError, SigResult};

pub struct LogisticRegression {
    learning_rate: f32,
    l2: f32,
    epochs: usize,
    weights: Vec<Vec<f32>>,
    bias: Vec<f32>,
    n_classes: usize,
}

impl LogisticRegression {
    pub fn new(learning_rate: f32, l2: f32, epochs: usize) -> SigResult<Self> {
        if learning_rate <= 0.0 || epochs == 0 {
            return Err(SigError::config(
                "logistic regression learning rate and epochs must be positive",
            ));
        }
        if l2 < 0.0 {
            return Err(SigError::config("l2 penalty must not be negative"));
        }
        Ok(LogisticRegression {
            learning_rate,
            l2,
            epochs,
            weights: Vec::new(),
            bias: Vec::new(),
            n_classes: 0,
        })
    }

    pub(super) fn from_fitted(
        weights: Vec<Vec<f32>>,
        bias: Vec<f32>,
        n_classes: usize,
    ) -> Self {
        LogisticRegression {
            learning_rate: 0.1,
            l2: 0.0,
            epochs: 0,
            weights,
            bias,
            n_classes,
        }
    }

    /// Class probabilities for one row via a max-shifted softmax
    fn probabilities(&self, row: &[f32]) -> Vec<f32> {
        let logits: Vec<f32> = (0..self.n_classes)
            .map(|class| {
                self.weights[class]
                    .iter()
                    .zip(row)
                    .map(|(w, x)| w * x)
                    .sum::<f32>()
                    + self.bias[class]
            })
            .collect();
        let max = logits.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
        let exps: Vec<f32> = logits.iter().map(|l| (l - max).exp()).collect();
        let total: f32 = exps.iter().sum();
        exps.iter().map(|e| e / total).collect()
    }
}

impl Classifier for LogisticRegression {
    fn fit(&mut self, x: &[Vec<f32>], y: &[usize], n_classes: usize) -> SigResult<()> {
        if x.is_empty() || x.len() != y.len() {
            return Err(SigError::data(
                "logistic regression fit needs matching non-empty x and y",
            ));
        }
        let dims = x[0].len();
        let n = x.len() as f32;

        self.n_classes = n_classes;
        self.weights = vec![vec![0.0; dims]; n_classes];
        self.bias = vec![0.0; n_classes];

        for _ in 0..self.epochs {
            let mut grad_w = vec![vec![0.0f32; dims]; n_classes];
            let mut grad_b = vec![0.0f32; n_classes];

            for (row, &label) in x.iter().zip(y) {
                let probs = self.probabilities(row);
                for class in 0..n_classes {
                    let error = probs[class] - if label == class { 1.0 } else { 0.0 };
                    for (g, &xi) in grad_w[class].iter_mut().zip(row) {
                        *g += error * xi;
                    }
                    grad_b[class] += error;
                }
            }

            for class in 0..n_classes {
                for (wi, g) in self.weights[class].iter_mut().zip(&grad_w[class]) {
                    *wi -= self.learning_rate * (g / n + self.l2 * *wi);
                }
                self.bias[class] -= self.learning_rate * grad_b[class] / n;
            }
        }
        Ok(())
    }

    fn predict_one(&self, row: &[f32]) -> SigResult<usize> {
        if self.weights.is_empty() {
            return Err(SigError::data(
                "logistic regression predict called before fit",
            ));
        }
        let probs = self.probabilities(row);
        let mut best = 0;
        for (class, &p) in probs.iter().enumerate() {
            if p > probs[best] {
                best = class;
            }
        }
        Ok(best)
    }

    fn artifact(&self) -> SigResult<ModelArtifact> {
        if self.weights.is_empty() {
            return Err(SigError::data(
                "logistic regression artifact requested before fit",
            ));
        }
        Ok(ModelArtifact::LogisticRegression {
            weights: self.weights.clone(),
            bias: self.bias.clone(),
            n_classes: self.n_classes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_three_class_separation() {
        let mut x = Vec::new();
        let mut y = Vec::new();
        for i in 0..15 {
            let j = (i % 5) as f32 * 0.02;
            x.push(vec![2.0 + j, 0.0]);
            y.push(0);
            x.push(vec![-2.0 - j, 0.0]);
            y.push(1);
            x.push(vec![0.0, 2.0 + j]);
            y.push(2);
        }

        let mut model = LogisticRegression::new(0.5, 0.0, 300).unwrap();
        model.fit(&x, &y, 3).unwrap();

        assert_eq!(model.predict_one(&[3.0, 0.0]).unwrap(), 0);
        assert_eq!(model.predict_one(&[-3.0, 0.0]).unwrap(), 1);
        assert_eq!(model.predict_one(&[0.0, 3.0]).unwrap(), 2);
    }

    #[test]
    fn test_probabilities_sum_to_one() {
        let mut model = LogisticRegression::new(0.1, 0.0, 50).unwrap();
        let x = vec![vec![1.0], vec![-1.0]];
        model.fit(&x, &[0, 1], 2).unwrap();

        let probs = model.probabilities(&[0.3]);
        assert!((probs.iter().sum::<f32>() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_bad_params_rejected() {
        assert!(LogisticRegression::new(0.0, 0.0, 10).is_err());
        assert!(LogisticRegression::new(0.1, -1.0, 10).is_err());
    }
}
