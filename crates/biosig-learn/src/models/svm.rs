//! Linear support vector machine, one-vs-rest with hinge-loss gradient descent

use super::{Classifier, ModelArtifact};
use biosig_core::{SigError, SigResult};

pub struct LinearSvm {
    c: f32,
    learning_rate: f32,
    epochs: usize,
    weights: Vec<Vec<f32>>,
    bias: Vec<f32>,
    n_classes: usize,
}

impl LinearSvm {
    pub fn new(c: f32, learning_rate: f32, epochs: usize) -> SigResult<Self> {
        if c <= 0.0 {
            return Err(SigError::config(format!(
                "svm regularization c must be positive, got {}",
                c
            )));
        }
        if learning_rate <= 0.0 || epochs == 0 {
            return Err(SigError::config(
                "svm learning rate and epochs must be positive",
            ));
        }
        Ok(LinearSvm {
            c,
            learning_rate,
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
        LinearSvm {
            c: 1.0,
            learning_rate: 0.01,
            epochs: 0,
            weights,
            bias,
            n_classes,
        }
    }

    fn score(&self, class: usize, row: &[f32]) -> f32 {
        self.weights[class]
            .iter()
            .zip(row)
            .map(|(w, x)| w * x)
            .sum::<f32>()
            + self.bias[class]
    }
}

impl Classifier for LinearSvm {
    fn fit(&mut self, x: &[Vec<f32>], y: &[usize], n_classes: usize) -> SigResult<()> {
        if x.is_empty() || x.len() != y.len() {
            return Err(SigError::data("svm fit needs matching non-empty x and y"));
        }
        let dims = x[0].len();
        let lambda = 1.0 / (self.c * x.len() as f32);

        self.n_classes = n_classes;
        self.weights = vec![vec![0.0; dims]; n_classes];
        self.bias = vec![0.0; n_classes];

        // One binary hinge problem per class
        for class in 0..n_classes {
            for _ in 0..self.epochs {
                for (row, &label) in x.iter().zip(y) {
                    let target = if label == class { 1.0 } else { -1.0 };
                    let margin = target * self.score(class, row);
                    let w = &mut self.weights[class];
                    if margin < 1.0 {
                        for (wi, &xi) in w.iter_mut().zip(row) {
                            *wi += self.learning_rate * (target * xi - lambda * *wi);
                        }
                        self.bias[class] += self.learning_rate * target;
                    } else {
                        for wi in w.iter_mut() {
                            *wi -= self.learning_rate * lambda * *wi;
                        }
                    }
                }
            }
        }
        Ok(())
    }

    fn predict_one(&self, row: &[f32]) -> SigResult<usize> {
        if self.weights.is_empty() {
            return Err(SigError::data("svm predict called before fit"));
        }
        let mut best = 0;
        let mut best_score = f32::NEG_INFINITY;
        for class in 0..self.n_classes {
            let score = self.score(class, row);
            if score > best_score {
                best_score = score;
                best = class;
            }
        }
        Ok(best)
    }

    fn artifact(&self) -> SigResult<ModelArtifact> {
        if self.weights.is_empty() {
            return Err(SigError::data("svm artifact requested before fit"));
        }
        Ok(ModelArtifact::LinearSvm {
            weights: self.weights.clone(),
            bias: self.bias.clone(),
            n_classes: self.n_classes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn separable() -> (Vec<Vec<f32>>, Vec<usize>) {
        let mut x = Vec::new();
        let mut y = Vec::new();
        for i in 0..20 {
            let jitter = (i % 5) as f32 * 0.01;
            x.push(vec![1.0 + jitter, 1.0 - jitter]);
            y.push(0);
            x.push(vec![-1.0 - jitter, -1.0 + jitter]);
            y.push(1);
        }
        (x, y)
    }

    #[test]
    fn test_separates_two_clusters() {
        let (x, y) = separable();
        let mut model = LinearSvm::new(1.0, 0.01, 100).unwrap();
        model.fit(&x, &y, 2).unwrap();

        assert_eq!(model.predict_one(&[2.0, 2.0]).unwrap(), 0);
        assert_eq!(model.predict_one(&[-2.0, -2.0]).unwrap(), 1);
    }

    #[test]
    fn test_predict_before_fit_fails() {
        let model = LinearSvm::new(1.0, 0.01, 10).unwrap();
        assert!(model.predict_one(&[0.0]).is_err());
        assert!(model.artifact().is_err());
    }

    #[test]
    fn test_bad_params_rejected() {
        assert!(LinearSvm::new(0.0, 0.01, 10).is_err());
        assert!(LinearSvm::new(1.0, 0.01, 0).is_err());
    }

    #[test]
    fn test_artifact_round_trip() {
        let (x, y) = separable();
        let mut model = LinearSvm::new(1.0, 0.01, 100).unwrap();
        model.fit(&x, &y, 2).unwrap();

        let restored = model.artifact().unwrap().into_classifier();
        assert_eq!(restored.predict_one(&[2.0, 2.0]).unwrap(), 0);
    }
}
