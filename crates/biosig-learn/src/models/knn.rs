//! k-nearest-neighbors classifier with Euclidean distance

use super::{Classifier, ModelArtifact};
use biosig_core::{SigError, SigResult};

pub struct Knn {
    k: usize,
    x: Vec<Vec<f32>>,
    y: Vec<usize>,
    n_classes: usize,
}

impl Knn {
    pub fn new(k: usize) -> SigResult<Self> {
        if k == 0 {
            return Err(SigError::config("knn k must be at least 1"));
        }
        Ok(Knn {
            k,
            x: Vec::new(),
            y: Vec::new(),
            n_classes: 0,
        })
    }

    pub(super) fn from_fitted(
        x: Vec<Vec<f32>>,
        y: Vec<usize>,
        k: usize,
        n_classes: usize,
    ) -> Self {
        Knn { k, x, y, n_classes }
    }
}

fn squared_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum()
}

impl Classifier for Knn {
    fn fit(&mut self, x: &[Vec<f32>], y: &[usize], n_classes: usize) -> SigResult<()> {
        if x.is_empty() || x.len() != y.len() {
            return Err(SigError::data("knn fit needs matching non-empty x and y"));
        }
        self.x = x.to_vec();
        self.y = y.to_vec();
        self.n_classes = n_classes;
        Ok(())
    }

    fn predict_one(&self, row: &[f32]) -> SigResult<usize> {
        if self.x.is_empty() {
            return Err(SigError::data("knn predict called before fit"));
        }
        let mut distances: Vec<(f32, usize)> = self
            .x
            .iter()
            .zip(&self.y)
            .map(|(train_row, &label)| (squared_distance(row, train_row), label))
            .collect();
        distances
            .sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

        let k = self.k.min(distances.len());
        let mut votes = vec![0usize; self.n_classes];
        for &(_, label) in &distances[..k] {
            votes[label] += 1;
        }
        // Tie goes to the lowest class index
        let mut best = 0;
        for (class, &count) in votes.iter().enumerate() {
            if count > votes[best] {
                best = class;
            }
        }
        Ok(best)
    }

    fn artifact(&self) -> SigResult<ModelArtifact> {
        if self.x.is_empty() {
            return Err(SigError::data("knn artifact requested before fit"));
        }
        Ok(ModelArtifact::Knn {
            x: self.x.clone(),
            y: self.y.clone(),
            k: self.k,
            n_classes: self.n_classes,
        })
    }
}
