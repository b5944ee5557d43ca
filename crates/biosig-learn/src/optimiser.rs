//! Model selection: staged hyperparameter search over classifier families
//!
//! A run walks a fixed stage sequence and is not re-entrant; a new search
//! starts a fresh instance. The grid search is parallel across (family,
//! combination) pairs, with the best result chosen in a single reduction
//! after all workers finish so ties resolve to the first-enumerated entry.

use crate::dataset::Dataset;
use crate::metrics::{accuracy, classification_report, weighted_f1};
use crate::models::{build_model, ModelArtifact, ModelKind, ParamGrid, ParamSet};
use crate::selection::{self, SelectionMethod, SelectionOutcome};
use biosig_core::{SigError, SigResult};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptimiserStage {
    Idle,
    FeatureExtraction,
    FeatureSelection,
    Search,
    BestSelected,
    FinalEvaluation,
    Done,
}

/// Optional feature-selection pass before the search
#[derive(Debug, Clone)]
pub struct SelectionSpec {
    pub method: SelectionMethod,
    /// Number of columns to keep
    pub keep: usize,
    /// Shuffle repeats, used by permutation importance
    pub n_repeats: usize,
}

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub test_fraction: f32,
    pub seed: u64,
    pub selection: Option<SelectionSpec>,
}

impl Default for RunOptions {
    fn default() -> Self {
        RunOptions {
            test_fraction: 0.25,
            seed: 42,
            selection: None,
        }
    }
}

/// The winning (family, parameters, score) triple
#[derive(Debug, Clone)]
pub struct BestResult {
    pub kind: ModelKind,
    pub params: ParamSet,
    pub score: f32,
}

/// Everything a completed run produced
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub best: BestResult,
    pub accuracy: f32,
    pub weighted_f1: f32,
    pub report: String,
    pub artifact: ModelArtifact,
    /// Original column indices kept by the selection pass, if one ran
    pub selected_columns: Option<Vec<usize>>,
    pub selection_report: Option<String>,
}

fn evaluate(
    kind: ModelKind,
    params: &ParamSet,
    train: &Dataset,
    test: &Dataset,
) -> SigResult<f32> {
    let mut model = build_model(kind, params)?;
    model.fit(&train.x, &train.y, train.class_count())?;
    let predictions = model.predict(&test.x)?;
    Ok(accuracy(&test.y, &predictions))
}

pub struct Optimiser {
    tag: String,
    stage: OptimiserStage,
}

impl Optimiser {
    pub fn new(tag: impl Into<String>) -> Self {
        Optimiser {
            tag: tag.into(),
            stage: OptimiserStage::Idle,
        }
    }

    pub fn stage(&self) -> OptimiserStage {
        self.stage
    }

    fn advance(&mut self, to: OptimiserStage) {
        info!(?to, tag = %self.tag, "optimiser stage");
        self.stage = to;
    }

    /// Run the full search over the given families and their grids.
    ///
    /// Ties on the held-out score keep the first-enumerated combination;
    /// a later equal score never replaces it. Combinations that fail are
    /// logged and excluded from consideration.
    pub fn run(
        &mut self,
        dataset: &Dataset,
        families: &[(ModelKind, ParamGrid)],
        options: &RunOptions,
    ) -> SigResult<RunSummary> {
        if self.stage != OptimiserStage::Idle {
            return Err(SigError::SearchError {
                message: "optimiser already ran; start a fresh instance".to_string(),
            });
        }
        if families.is_empty() {
            return Err(SigError::config("no model families given"));
        }

        self.advance(OptimiserStage::FeatureExtraction);
        if dataset.is_empty() {
            return Err(SigError::data("dataset has no rows"));
        }
        info!(
            rows = dataset.len(),
            features = dataset.feature_count(),
            classes = dataset.class_count(),
            "dataset ready"
        );
        let (full_train, full_test) = dataset.train_test_split(options.test_fraction, options.seed)?;

        let (train, test, selected_columns, selection_report) = match &options.selection {
            Some(spec) => {
                self.advance(OptimiserStage::FeatureSelection);
                let outcome =
                    self.select_features(spec, families, &full_train, &full_test, options.seed)?;
                let kept = &outcome.selected[..spec.keep.min(outcome.selected.len())];
                let report =
                    selection::render_report(&self.tag, &[outcome.clone()], &dataset.columns, 20);
                (
                    full_train.select_columns(kept)?,
                    full_test.select_columns(kept)?,
                    Some(kept.to_vec()),
                    Some(report),
                )
            }
            None => (full_train, full_test, None, None),
        };

        self.advance(OptimiserStage::Search);
        let mut jobs: Vec<(ModelKind, ParamSet)> = Vec::new();
        for (kind, grid) in families {
            for params in grid.combinations() {
                jobs.push((*kind, params));
            }
        }

        // Parallel evaluation; collect preserves enumeration order so the
        // reduction below can apply the first-seen tie rule
        let scores: Vec<Option<f32>> = jobs
            .par_iter()
            .map(|(kind, params)| match evaluate(*kind, params, &train, &test) {
                Ok(score) => Some(score),
                Err(e) => {
                    warn!(family = kind.name(), error = %e, "combination failed, skipping");
                    None
                }
            })
            .collect();

        let mut best: Option<(usize, f32)> = None;
        for (index, score) in scores.iter().enumerate() {
            if let Some(score) = score {
                match best {
                    Some((_, s)) if *score <= s => {}
                    _ => best = Some((index, *score)),
                }
            }
        }
        let (best_index, best_score) = best.ok_or_else(|| SigError::SearchError {
            message: "every parameter combination failed".to_string(),
        })?;
        let (best_kind, best_params) = jobs.swap_remove(best_index);

        self.advance(OptimiserStage::BestSelected);
        info!(
            family = best_kind.name(),
            score = best_score,
            "best configuration"
        );

        self.advance(OptimiserStage::FinalEvaluation);
        let mut model = build_model(best_kind, &best_params)?;
        model.fit(&train.x, &train.y, train.class_count())?;
        let predictions = model.predict(&test.x)?;
        let final_accuracy = accuracy(&test.y, &predictions);
        let final_f1 = weighted_f1(&test.y, &predictions, test.class_count());
        let report = classification_report(&test.y, &predictions, &test.class_names);
        let artifact = model.artifact()?;

        self.advance(OptimiserStage::Done);
        Ok(RunSummary {
            best: BestResult {
                kind: best_kind,
                params: best_params,
                score: best_score,
            },
            accuracy: final_accuracy,
            weighted_f1: final_f1,
            report,
            artifact,
            selected_columns,
            selection_report,
        })
    }

    /// Selection uses the first family's first grid combination as the
    /// wrapped estimator
    fn select_features(
        &self,
        spec: &SelectionSpec,
        families: &[(ModelKind, ParamGrid)],
        train: &Dataset,
        test: &Dataset,
        seed: u64,
    ) -> SigResult<SelectionOutcome> {
        let (kind, grid) = &families[0];
        let params = grid
            .combinations()
            .into_iter()
            .next()
            .unwrap_or_default();

        match spec.method {
            SelectionMethod::RecursiveElimination => {
                selection::recursive_elimination(*kind, &params, train, test, spec.keep)
            }
            SelectionMethod::SequentialForward => {
                selection::sequential_forward(*kind, &params, train, test, spec.keep)
            }
            SelectionMethod::SequentialBackward => {
                selection::sequential_backward(*kind, &params, train, test, spec.keep)
            }
            SelectionMethod::PermutationImportance => selection::permutation_importance(
                *kind,
                &params,
                train,
                test,
                spec.n_repeats,
                seed,
            ),
        }
    }

    /// Artifact file stem for a family under this run's tag
    pub fn artifact_key(&self, kind: ModelKind) -> String {
        format!("{}_{}_best_model", self.tag, kind.name())
    }

    /// Persist the winning model as JSON under `dir`, keyed by tag and family
    pub fn save_best(&self, summary: &RunSummary, dir: &Path) -> SigResult<PathBuf> {
        if self.stage != OptimiserStage::Done {
            return Err(SigError::SearchError {
                message: "cannot save before the run completes".to_string(),
            });
        }
        std::fs::create_dir_all(dir).map_err(|e| SigError::PersistenceError {
            message: format!("failed to create {}: {}", dir.display(), e),
        })?;
        let path = dir.join(format!("{}.json", self.artifact_key(summary.best.kind)));
        let json = summary.artifact.to_json()?;
        std::fs::write(&path, json).map_err(|e| SigError::PersistenceError {
            message: format!("failed to write {}: {}", path.display(), e),
        })?;
        info!(path = %path.display(), "saved best model");
        Ok(path)
    }
}
