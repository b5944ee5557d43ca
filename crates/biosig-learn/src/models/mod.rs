//! Classifier suite: a closed registry of model families, hyperparameter
//! grids and a serializable fitted-model artifact.

pub mod ann;
pub mod bayes;
pub mod forest;
pub mod knn;
pub mod logistic;
pub mod svm;

use biosig_core::{SigError, SigResult};
use serde::{Deserialize, Serialize};

pub use ann::Mlp;
pub use bayes::GaussianNb;
pub use forest::RandomForest;
pub use knn::Knn;
pub use logistic::LogisticRegression;
pub use svm::LinearSvm;

/// One concrete hyperparameter assignment, in grid declaration order
pub type ParamSet = Vec<(String, f32)>;

/// Closed set of known model families. Unknown names fail at configuration
/// time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelKind {
    LinearSvm,
    LogisticRegression,
    Knn,
    NaiveBayes,
    RandomForest,
    Mlp,
}

impl ModelKind {
    pub fn from_name(name: &str) -> SigResult<Self> {
        Ok(match name {
            "svm" => ModelKind::LinearSvm,
            "logistic_regression" => ModelKind::LogisticRegression,
            "knn" => ModelKind::Knn,
            "naive_bayes" => ModelKind::NaiveBayes,
            "random_forest" => ModelKind::RandomForest,
            "ann" => ModelKind::Mlp,
            other => {
                return Err(SigError::config(format!(
                    "unknown model family '{}'",
                    other
                )))
            }
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            ModelKind::LinearSvm => "svm",
            ModelKind::LogisticRegression => "logistic_regression",
            ModelKind::Knn => "knn",
            ModelKind::NaiveBayes => "naive_bayes",
            ModelKind::RandomForest => "random_forest",
            ModelKind::Mlp => "ann",
        }
    }

    /// Parameter names this family accepts
    fn known_params(&self) -> &'static [&'static str] {
        match self {
            ModelKind::LinearSvm => &["c", "learning_rate", "epochs"],
            ModelKind::LogisticRegression => &["learning_rate", "l2", "epochs"],
            ModelKind::Knn => &["k"],
            ModelKind::NaiveBayes => &["var_smoothing"],
            ModelKind::RandomForest => &["n_trees", "max_depth"],
            ModelKind::Mlp => &["hidden", "learning_rate", "epochs"],
        }
    }

    /// A reasonable search grid for this family
    pub fn default_grid(&self) -> ParamGrid {
        match self {
            ModelKind::LinearSvm => ParamGrid::new()
                .add("c", vec![0.1, 1.0, 10.0])
                .add("learning_rate", vec![0.01])
                .add("epochs", vec![200.0]),
            ModelKind::LogisticRegression => ParamGrid::new()
                .add("learning_rate", vec![0.1, 0.01])
                .add("l2", vec![0.0, 0.01])
                .add("epochs", vec![300.0]),
            ModelKind::Knn => ParamGrid::new().add("k", vec![1.0, 3.0, 5.0, 7.0]),
            ModelKind::NaiveBayes => {
                ParamGrid::new().add("var_smoothing", vec![1e-9, 1e-6])
            }
            ModelKind::RandomForest => ParamGrid::new()
                .add("n_trees", vec![25.0])
                .add("max_depth", vec![4.0, 8.0]),
            ModelKind::Mlp => ParamGrid::new()
                .add("hidden", vec![8.0, 16.0])
                .add("learning_rate", vec![0.3])
                .add("epochs", vec![300.0]),
        }
    }
}

/// Hyperparameter grid with deterministic enumeration order.
///
/// Combinations are enumerated with the last-added parameter varying fastest,
/// matching the declaration order of `add` calls.
#[derive(Debug, Clone, Default)]
pub struct ParamGrid {
    entries: Vec<(String, Vec<f32>)>,
}

impl ParamGrid {
    pub fn new() -> Self {
        ParamGrid::default()
    }

    pub fn add(mut self, name: impl Into<String>, values: Vec<f32>) -> Self {
        self.entries.push((name.into(), values));
        self
    }

    /// Every concrete assignment. An empty grid yields one empty set, so a
    /// family with no tunables is still searched once.
    pub fn combinations(&self) -> Vec<ParamSet> {
        let mut combos: Vec<ParamSet> = vec![Vec::new()];
        for (name, values) in &self.entries {
            let mut next = Vec::with_capacity(combos.len() * values.len());
            for combo in &combos {
                for &value in values {
                    let mut extended = combo.clone();
                    extended.push((name.clone(), value));
                    next.push(extended);
                }
            }
            combos = next;
        }
        combos
    }
}

/// Fetch a parameter by name, falling back to a default
fn param_or(params: &ParamSet, name: &str, default: f32) -> f32 {
    params
        .iter()
        .find(|(n, _)| n == name)
        .map(|(_, v)| *v)
        .unwrap_or(default)
}

/// A trainable classifier over row-major feature matrices
pub trait Classifier: Send {
    fn fit(&mut self, x: &[Vec<f32>], y: &[usize], n_classes: usize) -> SigResult<()>;

    fn predict_one(&self, row: &[f32]) -> SigResult<usize>;

    fn predict(&self, x: &[Vec<f32>]) -> SigResult<Vec<usize>> {
        x.iter().map(|row| self.predict_one(row)).collect()
    }

    /// Serializable snapshot of the fitted state
    fn artifact(&self) -> SigResult<ModelArtifact>;
}

/// Instantiate a family with a concrete parameter set.
///
/// Parameter names the family does not recognize are configuration errors.
pub fn build_model(kind: ModelKind, params: &ParamSet) -> SigResult<Box<dyn Classifier>> {
    for (name, _) in params {
        if !kind.known_params().contains(&name.as_str()) {
            return Err(SigError::config(format!(
                "model '{}' does not accept parameter '{}'",
                kind.name(),
                name
            )));
        }
    }
    Ok(match kind {
        ModelKind::LinearSvm => Box::new(LinearSvm::new(
            param_or(params, "c", 1.0),
            param_or(params, "learning_rate", 0.01),
            param_or(params, "epochs", 200.0) as usize,
        )?),
        ModelKind::LogisticRegression => Box::new(LogisticRegression::new(
            param_or(params, "learning_rate", 0.1),
            param_or(params, "l2", 0.0),
            param_or(params, "epochs", 300.0) as usize,
        )?),
        ModelKind::Knn => Box::new(Knn::new(param_or(params, "k", 5.0) as usize)?),
        ModelKind::NaiveBayes => {
            Box::new(GaussianNb::new(param_or(params, "var_smoothing", 1e-9))?)
        }
        ModelKind::RandomForest => Box::new(RandomForest::new(
            param_or(params, "n_trees", 25.0) as usize,
            param_or(params, "max_depth", 6.0) as usize,
        )?),
        ModelKind::Mlp => Box::new(Mlp::new(
            param_or(params, "hidden", 16.0) as usize,
            param_or(params, "learning_rate", 0.3),
            param_or(params, "epochs", 300.0) as usize,
        )?),
    })
}

/// Fitted model state, serializable to JSON for persistence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ModelArtifact {
    LinearSvm {
        weights: Vec<Vec<f32>>,
        bias: Vec<f32>,
        n_classes: usize,
    },
    LogisticRegression {
        weights: Vec<Vec<f32>>,
        bias: Vec<f32>,
        n_classes: usize,
    },
    Knn {
        x: Vec<Vec<f32>>,
        y: Vec<usize>,
        k: usize,
        n_classes: usize,
    },
    NaiveBayes {
        means: Vec<Vec<f32>>,
        variances: Vec<Vec<f32>>,
        priors: Vec<f32>,
    },
    RandomForest {
        trees: Vec<forest::TreeNode>,
        n_classes: usize,
    },
    Mlp {
        w1: Vec<Vec<f32>>,
        b1: Vec<f32>,
        w2: Vec<Vec<f32>>,
        b2: Vec<f32>,
        n_classes: usize,
    },
}

impl ModelArtifact {
    pub fn family(&self) -> ModelKind {
        match self {
            ModelArtifact::LinearSvm { .. } => ModelKind::LinearSvm,
            ModelArtifact::LogisticRegression { .. } => ModelKind::LogisticRegression,
            ModelArtifact::Knn { .. } => ModelKind::Knn,
            ModelArtifact::NaiveBayes { .. } => ModelKind::NaiveBayes,
            ModelArtifact::RandomForest { .. } => ModelKind::RandomForest,
            ModelArtifact::Mlp { .. } => ModelKind::Mlp,
        }
    }

    pub fn to_json(&self) -> SigResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| SigError::PersistenceError {
                message: format!("failed to serialize model artifact: {}", e),
            })
    }

    pub fn from_json(json: &str) -> SigResult<Self> {
        serde_json::from_str(json).map_err(|e| SigError::PersistenceError {
            message: format!("failed to parse model artifact: {}", e),
        })
    }

    /// Rehydrate a usable classifier from the stored state
    pub fn into_classifier(self) -> Box<dyn Classifier> {
        match self {
            ModelArtifact::LinearSvm {
                weights,
                bias,
                n_classes,
            } => Box::new(LinearSvm::from_fitted(weights, bias, n_classes)),
            ModelArtifact::LogisticRegression {
                weights,
                bias,
                n_classes,
            } => Box::new(LogisticRegression::from_fitted(weights, bias, n_classes)),
            ModelArtifact::Knn { x, y, k, n_classes } => {
                Box::new(Knn::from_fitted(x, y, k, n_classes))
            }
            ModelArtifact::NaiveBayes {
                means,
                variances,
                priors,
            } => Box::new(GaussianNb::from_fitted(means, variances, priors)),
            ModelArtifact::RandomForest { trees, n_classes } => {
                Box::new(RandomForest::from_fitted(trees, n_classes))
            }
            ModelArtifact::Mlp {
                w1,
                b1,
                w2,
                b2,
                n_classes,
            } => Box::new(Mlp::from_fitted(w1, b1, w2, b2, n_classes)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_family_is_config_error() {
        assert!(ModelKind::from_name("knn").is_ok());
        assert!(matches!(
            ModelKind::from_name("gradient_boosting"),
            Err(SigError::ConfigError { .. })
        ));
    }

    #[test]
    fn test_every_family_round_trips_by_name() {
        let all = [
            ModelKind::LinearSvm,
            ModelKind::LogisticRegression,
            ModelKind::Knn,
            ModelKind::NaiveBayes,
            ModelKind::RandomForest,
            ModelKind::Mlp,
        ];
        for kind in all {
            assert_eq!(ModelKind::from_name(kind.name()).unwrap(), kind);
            // Every default grid builds with its own first combination
            let combos = kind.default_grid().combinations();
            assert!(!combos.is_empty());
            assert!(build_model(kind, &combos[0]).is_ok());
        }
    }

    #[test]
    fn test_grid_enumeration_order() {
        let grid = ParamGrid::new()
            .add("a", vec![1.0, 2.0])
            .add("b", vec![10.0, 20.0]);
        let combos = grid.combinations();
        assert_eq!(combos.len(), 4);
        // Last-added parameter varies fastest
        assert_eq!(combos[0], vec![("a".to_string(), 1.0), ("b".to_string(), 10.0)]);
        assert_eq!(combos[1], vec![("a".to_string(), 1.0), ("b".to_string(), 20.0)]);
        assert_eq!(combos[2], vec![("a".to_string(), 2.0), ("b".to_string(), 10.0)]);
    }

    #[test]
    fn test_empty_grid_yields_one_combo() {
        assert_eq!(ParamGrid::new().combinations(), vec![Vec::new()]);
    }

    #[test]
    fn test_unknown_param_rejected() {
        let params = vec![("gamma".to_string(), 0.1)];
        assert!(matches!(
            build_model(ModelKind::Knn, &params),
            Err(SigError::ConfigError { .. })
        ));
    }

    #[test]
    fn test_artifact_json_round_trip() {
        let artifact = ModelArtifact::NaiveBayes {
            means: vec![vec![0.0, 1.0]],
            variances: vec![vec![1.0, 1.0]],
            priors: vec![1.0],
        };
        let json = artifact.to_json().unwrap();
        let parsed = ModelArtifact::from_json(&json).unwrap();
        assert_eq!(parsed.family(), ModelKind::NaiveBayes);
    }
}
