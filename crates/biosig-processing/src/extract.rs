//! End-to-end extraction: preprocess, window and featurize one recording

use crate::config::PipelineConfig;
use crate::features::{ColumnLabel, FeatureExtractor, FeatureVector};
use crate::preprocess;
use crate::windowing::{WindowIter, WindowPlan};
use biosig_core::{ChannelSelection, Recording, SigError, SigResult};
use tracing::info;

/// Feature vectors for every window of one recording, plus the column labels
/// shared by all of them
#[derive(Debug, Clone)]
pub struct ExtractionResult {
    pub vectors: Vec<FeatureVector>,
    pub columns: Vec<ColumnLabel>,
}

/// Run the full pipeline over one recording.
///
/// Each enabled channel is cleaned by the preprocessing chain, the cleaned
/// channels are re-assembled into a derived recording at the post-resampling
/// rate, and every window of that recording is reduced to one feature vector.
pub fn extract_recording(
    recording: &Recording,
    config: &PipelineConfig,
) -> SigResult<ExtractionResult> {
    config.validate()?;

    let enabled: Vec<String> = config.channels.enabled().map(str::to_string).collect();
    let source_rate = recording.sampling_rate();

    let mut cleaned: Vec<Vec<f32>> = Vec::with_capacity(enabled.len());
    let mut effective_rate = source_rate;
    for name in &enabled {
        let raw = recording.channel_by_name(name).map_err(|_| {
            SigError::config(format!(
                "selected channel '{}' not present in recording",
                name
            ))
        })?;
        let (samples, rate) = preprocess::apply_chain(&config.preprocess, raw, source_rate)?;
        cleaned.push(samples);
        effective_rate = rate;
    }

    let derived = recording.derived(enabled.clone(), cleaned, 1.0 / effective_rate)?;
    let plan = WindowPlan::new(
        config.window_len,
        config.overlap,
        derived.epoch_count(),
        derived.epoch_duration(),
    )?;
    info!(
        windows = plan.iterations,
        rate = effective_rate,
        "windowing recording"
    );

    let enabled_refs: Vec<&str> = enabled.iter().map(String::as_str).collect();
    let selection = ChannelSelection::all(&enabled_refs);
    let extractor = FeatureExtractor::new(config.features.clone(), &selection, effective_rate)?;

    let mut vectors = Vec::with_capacity(plan.iterations);
    for window in WindowIter::new(&derived, &selection, plan)? {
        vectors.push(extractor.extract(&window)?);
    }

    Ok(ExtractionResult {
        vectors,
        columns: extractor.plan().columns().to_vec(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PreprocessConfig;
    use crate::features::{FeatureConfig, FeatureKind};

    fn sine(freq: f32, fs: f32, n: usize) -> Vec<f32> {
        (0..n)
            .map(|i| (2.0 * std::f32::consts::PI * freq * i as f32 / fs).sin())
            .collect()
    }

    fn emg_recording(channels: usize, samples: usize) -> Recording {
        let names: Vec<String> = (1..=channels).map(|i| format!("CH{}", i)).collect();
        let data: Vec<Vec<f32>> = (0..channels)
            .map(|c| sine(10.0 + c as f32 * 5.0, 500.0, samples))
            .collect();
        Recording::new(names, data, 1.0 / 500.0).unwrap()
    }

    #[test]
    fn test_extraction_shape() {
        let recording = emg_recording(8, 2000);
        let config = PipelineConfig::emg_default("run");
        let result = extract_recording(&recording, &config).unwrap();

        // 2000 samples, 250-sample windows, 50% overlap: ceil(1875/125) = 15
        assert_eq!(result.vectors.len(), 15);
        let expected_len = result.columns.len();
        assert!(expected_len > 0);
        for vector in &result.vectors {
            assert_eq!(vector.values.len(), expected_len);
        }
    }

    #[test]
    fn test_downsampling_propagates_to_windowing() {
        let names = vec!["C3".to_string()];
        let recording =
            Recording::new(names, vec![sine(10.0, 256.0, 1024)], 1.0 / 256.0).unwrap();

        let mut config = PipelineConfig::eeg_default("run");
        config.channels = ChannelSelection::all(&["C3"]);
        let result = extract_recording(&recording, &config).unwrap();

        // After downsampling to 128Hz: 512 samples, 128-sample windows,
        // 50% overlap: ceil(448/64) = 7
        assert_eq!(result.vectors.len(), 7);
    }

    #[test]
    fn test_missing_channel_is_config_error() {
        let recording = emg_recording(2, 1000);
        let mut config = PipelineConfig::emg_default("run");
        config.channels = ChannelSelection::all(&["CH1", "CH7"]);

        assert!(matches!(
            extract_recording(&recording, &config),
            Err(SigError::ConfigError { .. })
        ));
    }

    #[test]
    fn test_plain_features_without_preprocessing() {
        let recording = emg_recording(2, 500);
        let config = PipelineConfig {
            name: "raw".to_string(),
            channels: ChannelSelection::emg_cuff(2),
            epoch_duration: 1.0 / 500.0,
            window_len: 0.25,
            overlap: 0.0,
            preprocess: PreprocessConfig::disabled(),
            features: FeatureConfig::only(vec![
                FeatureKind::MeanAbsoluteValue,
                FeatureKind::RootMeanSquare,
            ]),
        };
        let result = extract_recording(&recording, &config).unwrap();

        assert_eq!(result.vectors.len(), 4);
        assert_eq!(result.columns.len(), 4);
        assert_eq!(result.columns[0].to_string(), "CH1.mav");
        assert!(result.vectors.iter().all(|v| !v.flagged));
    }
}
