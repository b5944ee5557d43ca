//! Dataset builder: stacks per-file feature vectors into one labeled matrix

use biosig_core::{SigError, SigResult};
use biosig_processing::{ColumnLabel, ExtractionResult};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Row-major labeled feature matrix.
///
/// Labels are indices into `class_names`; columns carry the labels fixed at
/// extraction time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dataset {
    pub x: Vec<Vec<f32>>,
    pub y: Vec<usize>,
    pub columns: Vec<ColumnLabel>,
    pub class_names: Vec<String>,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    pub fn feature_count(&self) -> usize {
        self.columns.len()
    }

    pub fn class_count(&self) -> usize {
        self.class_names.len()
    }

    /// Project onto a subset of columns, in the given order
    pub fn select_columns(&self, indices: &[usize]) -> SigResult<Dataset> {
        for &i in indices {
            if i >= self.feature_count() {
                return Err(SigError::config(format!(
                    "column index {} out of bounds ({} columns)",
                    i,
                    self.feature_count()
                )));
            }
        }
        Ok(Dataset {
            x: self
                .x
                .iter()
                .map(|row| indices.iter().map(|&i| row[i]).collect())
                .collect(),
            y: self.y.clone(),
            columns: indices.iter().map(|&i| self.columns[i].clone()).collect(),
            class_names: self.class_names.clone(),
        })
    }

    /// Seeded shuffle-and-split into (train, test)
    pub fn train_test_split(&self, test_fraction: f32, seed: u64) -> SigResult<(Dataset, Dataset)> {
        if !(0.0..1.0).contains(&test_fraction) || test_fraction == 0.0 {
            return Err(SigError::config(format!(
                "test fraction must be in (0, 1), got {}",
                test_fraction
            )));
        }
        if self.len() < 2 {
            return Err(SigError::data("need at least 2 rows to split"));
        }

        let mut indices: Vec<usize> = (0..self.len()).collect();
        let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
        indices.shuffle(&mut rng);

        let test_len = ((self.len() as f32 * test_fraction).round() as usize)
            .clamp(1, self.len() - 1);
        let (test_idx, train_idx) = indices.split_at(test_len);

        let subset = |idx: &[usize]| Dataset {
            x: idx.iter().map(|&i| self.x[i].clone()).collect(),
            y: idx.iter().map(|&i| self.y[i]).collect(),
            columns: self.columns.clone(),
            class_names: self.class_names.clone(),
        };
        Ok((subset(train_idx), subset(test_idx)))
    }
}

/// Accumulates extraction results per class and produces the stacked matrix.
///
/// Vectors flagged as corrupt (NaN) are excluded with a warning. Any
/// length disagreement between stacked vectors is a fatal configuration
/// error, never silently padded or truncated.
#[derive(Debug, Default)]
pub struct DatasetBuilder {
    x: Vec<Vec<f32>>,
    y: Vec<usize>,
    columns: Option<Vec<ColumnLabel>>,
    class_names: Vec<String>,
}

impl DatasetBuilder {
    pub fn new() -> Self {
        DatasetBuilder::default()
    }

    fn class_index(&mut self, label: &str) -> usize {
        match self.class_names.iter().position(|n| n == label) {
            Some(i) => i,
            None => {
                self.class_names.push(label.to_string());
                self.class_names.len() - 1
            }
        }
    }

    /// Stack one file's vectors under the given class label
    pub fn add_result(&mut self, label: &str, result: ExtractionResult) -> SigResult<()> {
        let expected = match &self.columns {
            Some(columns) => columns.len(),
            None => {
                self.columns = Some(result.columns.clone());
                result.columns.len()
            }
        };
        let class = self.class_index(label);

        for vector in result.vectors {
            if vector.values.len() != expected {
                return Err(SigError::ShapeMismatch {
                    expected,
                    actual: vector.values.len(),
                });
            }
            if vector.flagged {
                warn!(label, "excluding flagged feature vector");
                continue;
            }
            self.x.push(vector.values);
            self.y.push(class);
        }
        Ok(())
    }

    /// Stack a whole file group under one label, in file-list order
    pub fn add_group(
        &mut self,
        label: &str,
        results: impl IntoIterator<Item = ExtractionResult>,
    ) -> SigResult<()> {
        for result in results {
            self.add_result(label, result)?;
        }
        Ok(())
    }

    /// Run the full pipeline over a group of recordings and stack the
    /// resulting vectors under one label, in list order
    pub fn add_recordings(
        &mut self,
        label: &str,
        recordings: &[biosig_core::Recording],
        config: &biosig_processing::PipelineConfig,
    ) -> SigResult<()> {
        for recording in recordings {
            let result = biosig_processing::extract_recording(recording, config)?;
            self.add_result(label, result)?;
        }
        Ok(())
    }

    pub fn build(self) -> SigResult<Dataset> {
        let columns = self
            .columns
            .ok_or_else(|| SigError::data("no extraction results added"))?;
        if self.x.is_empty() {
            return Err(SigError::data("all feature vectors were excluded"));
        }
        Ok(Dataset {
            x: self.x,
            y: self.y,
            columns,
            class_names: self.class_names,
        })
    }
}
