//! biosig-learn: dataset assembly, classifiers and model selection
//!
//! Consumes feature vectors from biosig-processing, stacks them into labeled
//! datasets and searches classifier families for the best configuration.

pub mod dataset;
pub mod metrics;
pub mod models;
pub mod optimiser;
pub mod selection;

pub use dataset::{Dataset, DatasetBuilder};
pub use models::{build_model, Classifier, ModelArtifact, ModelKind, ParamGrid, ParamSet};
pub use optimiser::{
    BestResult, Optimiser, OptimiserStage, RunOptions, RunSummary, SelectionSpec,
};
pub use selection::{SelectionMethod, SelectionOutcome};
