//! Random forest: bagged CART trees with Gini splits and feature subsampling

use super::{Classifier, ModelArtifact};
use biosig_core::{SigError, SigResult};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TreeNode {
    Leaf {
        class: usize,
    },
    Split {
        feature: usize,
        threshold: f32,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
}

impl TreeNode {
    fn classify(&self, row: &[f32]) -> usize {
        match self {
            TreeNode::Leaf { class } => *class,
            TreeNode::Split {
                feature,
                threshold,
                left,
                right,
            } => {
                if row[*feature] <= *threshold {
                    left.classify(row)
                } else {
                    right.classify(row)
                }
            }
        }
    }
}

pub struct RandomForest {
    n_trees: usize,
    max_depth: usize,
    trees: Vec<TreeNode>,
    n_classes: usize,
}

impl RandomForest {
    pub fn new(n_trees: usize, max_depth: usize) -> SigResult<Self> {
        if n_trees == 0 || max_depth == 0 {
            return Err(SigError::config(
                "random forest needs at least one tree and depth of one",
            ));
        }
        Ok(RandomForest {
            n_trees,
            max_depth,
            trees: Vec::new(),
            n_classes: 0,
        })
    }

    pub(super) fn from_fitted(trees: Vec<TreeNode>, n_classes: usize) -> Self {
        RandomForest {
            n_trees: trees.len(),
            max_depth: 0,
            trees,
            n_classes,
        }
    }
}

fn majority(indices: &[usize], y: &[usize], n_classes: usize) -> usize {
    let mut counts = vec![0usize; n_classes];
    for &i in indices {
        counts[y[i]] += 1;
    }
    let mut best = 0;
    for (class, &count) in counts.iter().enumerate() {
        if count > counts[best] {
            best = class;
        }
    }
    best
}

fn gini(indices: &[usize], y: &[usize], n_classes: usize) -> f32 {
    if indices.is_empty() {
        return 0.0;
    }
    let mut counts = vec![0usize; n_classes];
    for &i in indices {
        counts[y[i]] += 1;
    }
    let n = indices.len() as f32;
    1.0 - counts
        .iter()
        .map(|&c| {
            let p = c as f32 / n;
            p * p
        })
        .sum::<f32>()
}

fn is_pure(indices: &[usize], y: &[usize]) -> bool {
    indices.windows(2).all(|w| y[w[0]] == y[w[1]])
}

fn build_tree(
    x: &[Vec<f32>],
    y: &[usize],
    indices: &[usize],
    n_classes: usize,
    depth: usize,
    max_depth: usize,
    rng: &mut rand::rngs::StdRng,
) -> TreeNode {
    if depth >= max_depth || indices.len() < 2 || is_pure(indices, y) {
        return TreeNode::Leaf {
            class: majority(indices, y, n_classes),
        };
    }

    // Consider sqrt(d) features, sampled without replacement
    let dims = x[0].len();
    let n_candidates = ((dims as f32).sqrt().ceil() as usize).clamp(1, dims);
    let mut features: Vec<usize> = (0..dims).collect();
    features.shuffle(rng);
    features.truncate(n_candidates);

    let parent_impurity = gini(indices, y, n_classes);
    let mut best: Option<(usize, f32, f32)> = None;

    for &feature in &features {
        let mut values: Vec<f32> = indices.iter().map(|&i| x[i][feature]).collect();
        values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        values.dedup();

        for pair in values.windows(2) {
            let threshold = 0.5 * (pair[0] + pair[1]);
            let (left, right): (Vec<usize>, Vec<usize>) = indices
                .iter()
                .copied()
                .partition(|&i| x[i][feature] <= threshold);
            if left.is_empty() || right.is_empty() {
                continue;
            }
            let n = indices.len() as f32;
            let weighted = gini(&left, y, n_classes) * left.len() as f32 / n
                + gini(&right, y, n_classes) * right.len() as f32 / n;
            let gain = parent_impurity - weighted;
            match best {
                Some((_, _, g)) if g >= gain => {}
                _ => best = Some((feature, threshold, gain)),
            }
        }
    }

    match best {
        Some((feature, threshold, gain)) if gain > 0.0 => {
            let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
                .iter()
                .copied()
                .partition(|&i| x[i][feature] <= threshold);
            TreeNode::Split {
                feature,
                threshold,
                left: Box::new(build_tree(
                    x, y, &left_idx, n_classes, depth + 1, max_depth, rng,
                )),
                right: Box::new(build_tree(
                    x, y, &right_idx, n_classes, depth + 1, max_depth, rng,
                )),
            }
        }
        _ => TreeNode::Leaf {
            class: majority(indices, y, n_classes),
        },
    }
}

impl Classifier for RandomForest {
    fn fit(&mut self, x: &[Vec<f32>], y: &[usize], n_classes: usize) -> SigResult<()> {
        if x.is_empty() || x.len() != y.len() {
            return Err(SigError::data(
                "random forest fit needs matching non-empty x and y",
            ));
        }
        self.n_classes = n_classes;
        self.trees.clear();

        // Per-tree seeds keep the ensemble reproducible
        for tree_index in 0..self.n_trees {
            let mut rng = rand::rngs::StdRng::seed_from_u64(tree_index as u64);
            let bootstrap: Vec<usize> =
                (0..x.len()).map(|_| rng.gen_range(0..x.len())).collect();
            self.trees.push(build_tree(
                x,
                y,
                &bootstrap,
                n_classes,
                0,
                self.max_depth,
                &mut rng,
            ));
        }
        Ok(())
    }

    fn predict_one(&self, row: &[f32]) -> SigResult<usize> {
        if self.trees.is_empty() {
            return Err(SigError::data("random forest predict called before fit"));
        }
        let mut votes = vec![0usize; self.n_classes];
        for tree in &self.trees {
            votes[tree.classify(row)] += 1;
        }
        let mut best = 0;
        for (class, &count) in votes.iter().enumerate() {
            if count > votes[best] {
                best = class;
            }
        }
        Ok(best)
    }

    fn artifact(&self) -> SigResult<ModelArtifact> {
        if self.trees.is_empty() {
            return Err(SigError::data(
                "random forest artifact requested before fit",
            ));
        }
        Ok(ModelArtifact::RandomForest {
            trees: self.trees.clone(),
            n_classes: self.n_classes,
        })
    }
}
