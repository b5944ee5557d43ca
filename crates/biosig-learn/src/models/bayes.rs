//! Gaussian naive Bayes classifier

use super::{Classifier, ModelArtifact};
use biosig_core::{SigError, SigResult};

pub struct GaussianNb {
    var_smoothing: f32,
    means: Vec<Vec<f32>>,
    variances: Vec<Vec<f32>>,
    priors: Vec<f32>,
}

impl GaussianNb {
    pub fn new(var_smoothing: f32) -> SigResult<Self> {
        if var_smoothing < 0.0 {
            return Err(SigError::config("var_smoothing must not be negative"));
        }
        Ok(GaussianNb {
            var_smoothing,
            means: Vec::new(),
            variances: Vec::new(),
            priors: Vec::new(),
        })
    }

    pub(super) fn from_fitted(
        means: Vec<Vec<f32>>,
        variances: Vec<Vec<f32>>,
        priors: Vec<f32>,
    ) -> Self {
        GaussianNb {
            var_smoothing: 0.0,
            means,
            variances,
            priors,
        }
    }
}

impl Classifier for GaussianNb {
    fn fit(&mut self, x: &[Vec<f32>], y: &[usize], n_classes: usize) -> SigResult<()> {
        if x.is_empty() || x.len() != y.len() {
            return Err(SigError::data(
                "naive bayes fit needs matching non-empty x and y",
            ));
        }
        let dims = x[0].len();

        self.means = vec![vec![0.0; dims]; n_classes];
        self.variances = vec![vec![0.0; dims]; n_classes];
        self.priors = vec![0.0; n_classes];

        let mut counts = vec![0usize; n_classes];
        for (row, &label) in x.iter().zip(y) {
            counts[label] += 1;
            for (m, &xi) in self.means[label].iter_mut().zip(row) {
                *m += xi;
            }
        }
        for class in 0..n_classes {
            if counts[class] == 0 {
                continue;
            }
            for m in &mut self.means[class] {
                *m /= counts[class] as f32;
            }
        }
        for (row, &label) in x.iter().zip(y) {
            for ((v, m), &xi) in self.variances[label]
                .iter_mut()
                .zip(&self.means[label])
                .zip(row)
            {
                *v += (xi - m).powi(2);
            }
        }

        // Smoothing scaled by the largest feature variance, floored so a
        // fully constant feature still has nonzero width
        let mut max_var = 0.0f32;
        for class in 0..n_classes {
            if counts[class] == 0 {
                continue;
            }
            for v in &mut self.variances[class] {
                *v /= counts[class] as f32;
                max_var = max_var.max(*v);
            }
        }
        let smoothing = (self.var_smoothing * max_var).max(1e-9);
        for class_vars in &mut self.variances {
            for v in class_vars.iter_mut() {
                *v += smoothing;
            }
        }

        for class in 0..n_classes {
            self.priors[class] = counts[class] as f32 / x.len() as f32;
        }
        Ok(())
    }

    fn predict_one(&self, row: &[f32]) -> SigResult<usize> {
        if self.means.is_empty() {
            return Err(SigError::data("naive bayes predict called before fit"));
        }
        let mut best = 0;
        let mut best_log = f32::NEG_INFINITY;
        for class in 0..self.priors.len() {
            if self.priors[class] == 0.0 {
                continue;
            }
            let mut log_p = self.priors[class].ln();
            for ((&m, &v), &xi) in self.means[class]
                .iter()
                .zip(&self.variances[class])
                .zip(row)
            {
                log_p += -0.5 * ((2.0 * std::f32::consts::PI * v).ln() + (xi - m).powi(2) / v);
            }
            if log_p > best_log {
                best_log = log_p;
                best = class;
            }
        }
        Ok(best)
    }

    fn artifact(&self) -> SigResult<ModelArtifact> {
        if self.means.is_empty() {
            return Err(SigError::data("naive bayes artifact requested before fit"));
        }
        Ok(ModelArtifact::NaiveBayes {
            means: self.means.clone(),
            variances: self.variances.clone(),
            priors: self.priors.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_separates_shifted_gaussians() {
        let mut x = Vec::new();
        let mut y = Vec::new();
        for i in 0..20 {
            let j = (i as f32 - 10.0) * 0.05;
            x.push(vec![1.0 + j, 1.0 - j]);
            y.push(0);
            x.push(vec![-1.0 + j, -1.0 - j]);
            y.push(1);
        }
        let mut model = GaussianNb::new(1e-9).unwrap();
        model.fit(&x, &y, 2).unwrap();

        assert_eq!(model.predict_one(&[1.2, 0.9]).unwrap(), 0);
        assert_eq!(model.predict_one(&[-1.1, -0.8]).unwrap(), 1);
    }

    #[test]
    fn test_constant_feature_does_not_nan() {
        // Second feature is identical across all samples
        let x = vec![vec![0.0, 5.0], vec![0.1, 5.0], vec![2.0, 5.0], vec![2.1, 5.0]];
        let y = vec![0, 0, 1, 1];
        let mut model = GaussianNb::new(1e-9).unwrap();
        model.fit(&x, &y, 2).unwrap();

        let prediction = model.predict_one(&[2.05, 5.0]).unwrap();
        assert_eq!(prediction, 1);
    }

    #[test]
    fn test_negative_smoothing_rejected() {
        assert!(GaussianNb::new(-1.0).is_err());
    }
}
