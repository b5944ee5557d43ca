//! Single-hidden-layer perceptron with ReLU units and a softmax head

use super::{Classifier, ModelArtifact};
use biosig_core::{SigError, SigResult};
use rand::{Rng, SeedableRng};

const INIT_SEED: u64 = 17;

pub struct Mlp {
    hidden: usize,
    learning_rate: f32,
    epochs: usize,
    // Row-major: w1[h] weighs the input for hidden unit h,
    // w2[c] weighs the hidden layer for class c
    w1: Vec<Vec<f32>>,
    b1: Vec<f32>,
    w2: Vec<Vec<f32>>,
    b2: Vec<f32>,
    n_classes: usize,
}

impl Mlp {
    pub fn new(hidden: usize, learning_rate: f32, epochs: usize) -> SigResult<Self> {
        if hidden == 0 || epochs == 0 {
            return Err(SigError::config(
                "mlp needs at least one hidden unit and one epoch",
            ));
        }
        if learning_rate <= 0.0 {
            return Err(SigError::config(format!(
                "mlp learning rate must be positive, got {}",
                learning_rate
            )));
        }
        Ok(Mlp {
            hidden,
            learning_rate,
            epochs,
            w1: Vec::new(),
            b1: Vec::new(),
            w2: Vec::new(),
            b2: Vec::new(),
            n_classes: 0,
        })
    }

    pub(super) fn from_fitted(
        w1: Vec<Vec<f32>>,
        b1: Vec<f32>,
        w2: Vec<Vec<f32>>,
        b2: Vec<f32>,
        n_classes: usize,
    ) -> Self {
        Mlp {
            hidden: b1.len(),
            learning_rate: 0.0,
            epochs: 0,
            w1,
            b1,
            w2,
            b2,
            n_classes,
        }
    }

    fn forward(&self, row: &[f32]) -> (Vec<f32>, Vec<f32>) {
        let hidden: Vec<f32> = self
            .w1
            .iter()
            .zip(&self.b1)
            .map(|(weights, &bias)| {
                let z: f32 = weights.iter().zip(row).map(|(w, x)| w * x).sum::<f32>() + bias;
                z.max(0.0)
            })
            .collect();
        let logits: Vec<f32> = self
            .w2
            .iter()
            .zip(&self.b2)
            .map(|(weights, &bias)| {
                weights.iter().zip(&hidden).map(|(w, h)| w * h).sum::<f32>() + bias
            })
            .collect();
        (hidden, softmax(&logits))
    }
}

fn softmax(logits: &[f32]) -> Vec<f32> {
    let peak = logits.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|&z| (z - peak).exp()).collect();
    let total: f32 = exps.iter().sum();
    exps.iter().map(|&e| e / total).collect()
}

impl Classifier for Mlp {
    fn fit(&mut self, x: &[Vec<f32>], y: &[usize], n_classes: usize) -> SigResult<()> {
        if x.is_empty() || x.len() != y.len() {
            return Err(SigError::data("mlp fit needs matching non-empty x and y"));
        }
        let dims = x[0].len();
        self.n_classes = n_classes;

        // Deterministic small-uniform init so repeated fits agree
        let mut rng = rand::rngs::StdRng::seed_from_u64(INIT_SEED);
        let scale = (1.0 / dims.max(1) as f32).sqrt();
        self.w1 = (0..self.hidden)
            .map(|_| (0..dims).map(|_| rng.gen_range(-scale..scale)).collect())
            .collect();
        self.b1 = vec![0.0; self.hidden];
        let hidden_scale = (1.0 / self.hidden as f32).sqrt();
        self.w2 = (0..n_classes)
            .map(|_| {
                (0..self.hidden)
                    .map(|_| rng.gen_range(-hidden_scale..hidden_scale))
                    .collect()
            })
            .collect();
        self.b2 = vec![0.0; n_classes];

        let n = x.len() as f32;
        for _ in 0..self.epochs {
            let mut grad_w1 = vec![vec![0.0f32; dims]; self.hidden];
            let mut grad_b1 = vec![0.0f32; self.hidden];
            let mut grad_w2 = vec![vec![0.0f32; self.hidden]; n_classes];
            let mut grad_b2 = vec![0.0f32; n_classes];

            for (row, &label) in x.iter().zip(y) {
                let (hidden, probs) = self.forward(row);

                // d(cross entropy)/d(logit c) = p_c - [c == label]
                let delta_out: Vec<f32> = probs
                    .iter()
                    .enumerate()
                    .map(|(c, &p)| if c == label { p - 1.0 } else { p })
                    .collect();
                for (c, &d) in delta_out.iter().enumerate() {
                    for (g, &h) in grad_w2[c].iter_mut().zip(&hidden) {
                        *g += d * h;
                    }
                    grad_b2[c] += d;
                }

                for h in 0..self.hidden {
                    if hidden[h] <= 0.0 {
                        continue;
                    }
                    let back: f32 = delta_out
                        .iter()
                        .enumerate()
                        .map(|(c, &d)| d * self.w2[c][h])
                        .sum();
                    for (g, &xv) in grad_w1[h].iter_mut().zip(row) {
                        *g += back * xv;
                    }
                    grad_b1[h] += back;
                }
            }

            let rate = self.learning_rate / n;
            for (weights, grads) in self.w1.iter_mut().zip(&grad_w1) {
                for (w, &g) in weights.iter_mut().zip(grads) {
                    *w -= rate * g;
                }
            }
            for (b, &g) in self.b1.iter_mut().zip(&grad_b1) {
                *b -= rate * g;
            }
            for (weights, grads) in self.w2.iter_mut().zip(&grad_w2) {
                for (w, &g) in weights.iter_mut().zip(grads) {
                    *w -= rate * g;
                }
            }
            for (b, &g) in self.b2.iter_mut().zip(&grad_b2) {
                *b -= rate * g;
            }
        }
        Ok(())
    }

    fn predict_one(&self, row: &[f32]) -> SigResult<usize> {
        if self.w1.is_empty() {
            return Err(SigError::data("mlp predict called before fit"));
        }
        let (_, probs) = self.forward(row);
        let mut best = 0;
        for (class, &p) in probs.iter().enumerate() {
            if p > probs[best] {
                best = class;
            }
        }
        Ok(best)
    }

    fn artifact(&self) -> SigResult<ModelArtifact> {
        if self.w1.is_empty() {
            return Err(SigError::data("mlp artifact requested before fit"));
        }
        Ok(ModelArtifact::Mlp {
            w1: self.w1.clone(),
            b1: self.b1.clone(),
            w2: self.w2.clone(),
            b2: self.b2.clone(),
            n_classes: self.n_classes,
        })
    }
}
