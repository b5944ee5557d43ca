//! biosig-processing: signal conditioning and feature extraction
//!
//! Turns raw multi-channel recordings into fixed-length feature vectors:
//! a per-channel preprocessing chain, a deterministic overlapping-window
//! segmenter and a compiled feature plan with stable column semantics.

pub mod config;
pub mod extract;
pub mod features;
pub mod preprocess;
pub mod windowing;

pub use config::{BandpassSettings, NotchSettings, PipelineConfig, PreprocessConfig};
pub use extract::{extract_recording, ExtractionResult};
pub use features::{
    ColumnLabel, FeatureConfig, FeatureExtractor, FeatureKind, FeaturePlan, FeatureVector,
    FrequencyBand,
};
pub use windowing::{WindowIter, WindowPlan};
