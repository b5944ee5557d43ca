//! Wrapper-based feature selection and permutation importance

use crate::dataset::Dataset;
use crate::metrics::accuracy;
use crate::models::{build_model, ModelKind, ParamSet};
use biosig_core::{SigError, SigResult};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::fmt;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionMethod {
    RecursiveElimination,
    SequentialForward,
    SequentialBackward,
    PermutationImportance,
}

impl fmt::Display for SelectionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SelectionMethod::RecursiveElimination => "recursive elimination",
            SelectionMethod::SequentialForward => "sequential forward",
            SelectionMethod::SequentialBackward => "sequential backward",
            SelectionMethod::PermutationImportance => "permutation importance",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankedFeature {
    pub column: usize,
    pub score: f32,
}

/// Result of one selection pass: the surviving column subset plus a full
/// ranking, best first
#[derive(Debug, Clone)]
pub struct SelectionOutcome {
    pub method: SelectionMethod,
    pub selected: Vec<usize>,
    pub ranking: Vec<RankedFeature>,
}

/// Fit on train restricted to `columns` and score accuracy on test
fn score_subset(
    kind: ModelKind,
    params: &ParamSet,
    train: &Dataset,
    test: &Dataset,
    columns: &[usize],
) -> SigResult<f32> {
    let train_view = train.select_columns(columns)?;
    let test_view = test.select_columns(columns)?;
    let mut model = build_model(kind, params)?;
    model.fit(&train_view.x, &train_view.y, train.class_count())?;
    let predictions = model.predict(&test_view.x)?;
    Ok(accuracy(&test_view.y, &predictions))
}

fn check_keep(keep: usize, total: usize) -> SigResult<()> {
    if keep == 0 || keep > total {
        return Err(SigError::config(format!(
            "cannot keep {} of {} features",
            keep, total
        )));
    }
    Ok(())
}

/// Recursive elimination: repeatedly drop the column whose removal hurts the
/// held-out score least, until `keep` remain.
///
/// The ranking lists survivors first (sharing the final subset score), then
/// eliminated columns from last-dropped to first-dropped.
pub fn recursive_elimination(
    kind: ModelKind,
    params: &ParamSet,
    train: &Dataset,
    test: &Dataset,
    keep: usize,
) -> SigResult<SelectionOutcome> {
    check_keep(keep, train.feature_count())?;
    let mut active: Vec<usize> = (0..train.feature_count()).collect();
    let mut eliminated: Vec<RankedFeature> = Vec::new();

    while active.len() > keep {
        let mut best: Option<(usize, f32)> = None;
        for position in 0..active.len() {
            let mut candidate = active.clone();
            let column = candidate.remove(position);
            let score = score_subset(kind, params, train, test, &candidate)?;
            match best {
                Some((_, s)) if s >= score => {}
                _ => best = Some((column, score)),
            }
        }
        // best is always set: active.len() > keep >= 1
        let (column, score) = best.ok_or_else(|| SigError::data("empty candidate set"))?;
        active.retain(|&c| c != column);
        eliminated.push(RankedFeature { column, score });
        info!(column, score, "eliminated feature");
    }

    let final_score = score_subset(kind, params, train, test, &active)?;
    let mut ranking: Vec<RankedFeature> = active
        .iter()
        .map(|&column| RankedFeature {
            column,
            score: final_score,
        })
        .collect();
    ranking.extend(eliminated.into_iter().rev());

    Ok(SelectionOutcome {
        method: SelectionMethod::RecursiveElimination,
        selected: active,
        ranking,
    })
}

/// Sequential forward selection: greedily add the column that improves the
/// held-out score most, until `keep` are chosen
pub fn sequential_forward(
    kind: ModelKind,
    params: &ParamSet,
    train: &Dataset,
    test: &Dataset,
    keep: usize,
) -> SigResult<SelectionOutcome> {
    check_keep(keep, train.feature_count())?;
    let mut chosen: Vec<usize> = Vec::new();
    let mut ranking: Vec<RankedFeature> = Vec::new();

    while chosen.len() < keep {
        let mut best: Option<(usize, f32)> = None;
        for column in 0..train.feature_count() {
            if chosen.contains(&column) {
                continue;
            }
            let mut candidate = chosen.clone();
            candidate.push(column);
            let score = score_subset(kind, params, train, test, &candidate)?;
            match best {
                Some((_, s)) if s >= score => {}
                _ => best = Some((column, score)),
            }
        }
        let (column, score) = best.ok_or_else(|| SigError::data("no candidate columns"))?;
        chosen.push(column);
        ranking.push(RankedFeature { column, score });
        info!(column, score, "added feature");
    }

    Ok(SelectionOutcome {
        method: SelectionMethod::SequentialForward,
        selected: chosen,
        ranking,
    })
}

/// Sequential backward selection: recursive elimination reported under its
/// own method tag
pub fn sequential_backward(
    kind: ModelKind,
    params: &ParamSet,
    train: &Dataset,
    test: &Dataset,
    keep: usize,
) -> SigResult<SelectionOutcome> {
    let outcome = recursive_elimination(kind, params, train, test, keep)?;
    Ok(SelectionOutcome {
        method: SelectionMethod::SequentialBackward,
        ..outcome
    })
}

/// Permutation importance: fit once, then measure the held-out accuracy drop
/// when each column is shuffled, averaged over `n_repeats` seeded shuffles.
///
/// The ranking is sorted by importance, largest drop first.
pub fn permutation_importance(
    kind: ModelKind,
    params: &ParamSet,
    train: &Dataset,
    test: &Dataset,
    n_repeats: usize,
    seed: u64,
) -> SigResult<SelectionOutcome> {
    if n_repeats == 0 {
        return Err(SigError::config("n_repeats must be at least 1"));
    }
    let mut model = build_model(kind, params)?;
    model.fit(&train.x, &train.y, train.class_count())?;
    let baseline = accuracy(&test.y, &model.predict(&test.x)?);

    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    let mut ranking: Vec<RankedFeature> = Vec::new();

    for column in 0..test.feature_count() {
        let mut drop_total = 0.0;
        for _ in 0..n_repeats {
            let mut shuffled: Vec<f32> = test.x.iter().map(|row| row[column]).collect();
            shuffled.shuffle(&mut rng);

            let permuted: Vec<Vec<f32>> = test
                .x
                .iter()
                .zip(&shuffled)
                .map(|(row, &value)| {
                    let mut row = row.clone();
                    row[column] = value;
                    row
                })
                .collect();
            drop_total += baseline - accuracy(&test.y, &model.predict(&permuted)?);
        }
        ranking.push(RankedFeature {
            column,
            score: drop_total / n_repeats as f32,
        });
    }

    ranking.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.column.cmp(&b.column))
    });
    Ok(SelectionOutcome {
        method: SelectionMethod::PermutationImportance,
        selected: ranking.iter().map(|r| r.column).collect(),
        ranking,
    })
}

/// Plain-text ranking report across selection passes
pub fn render_report(
    run_name: &str,
    outcomes: &[SelectionOutcome],
    columns: &[biosig_processing::ColumnLabel],
    top_n: usize,
) -> String {
    let rule_heavy = "=".repeat(60);
    let rule_light = "-".repeat(60);
    let mut report = String::new();

    report.push_str(&rule_heavy);
    report.push('\n');
    report.push_str(&format!("Feature selection report: {}\n", run_name));
    report.push_str(&rule_heavy);
    report.push('\n');

    for outcome in outcomes {
        report.push_str(&format!("\nMethod: {}\n", outcome.method));
        report.push_str(&rule_light);
        report.push('\n');
        report.push_str(&format!("{:<6} {:<30} {:>10}\n", "rank", "feature", "score"));
        for (rank, feature) in outcome.ranking.iter().take(top_n).enumerate() {
            let label = columns
                .get(feature.column)
                .map(|c| c.to_string())
                .unwrap_or_else(|| format!("column {}", feature.column));
            report.push_str(&format!(
                "{:<6} {:<30} {:>10.4}\n",
                rank + 1,
                label,
                feature.score
            ));
        }
    }

    report.push('\n');
    report.push_str(&rule_heavy);
    report.push('\n');
    report.push_str("End of Report\n");
    report
}
