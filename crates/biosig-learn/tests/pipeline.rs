//! End-to-end run: synthetic recordings through extraction, dataset assembly
//! and model selection.

use biosig_core::{ChannelSelection, Recording};
use biosig_learn::{
    DatasetBuilder, ModelKind, Optimiser, OptimiserStage, RunOptions,
};
use biosig_processing::{
    extract_recording, FeatureConfig, FeatureKind, PipelineConfig, PreprocessConfig,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// Two-channel recording dominated by one tone, with a deterministic ripple
/// so windows are not identical
fn synthetic_recording(tone_hz: f32, amplitude: f32, phase: f32) -> Recording {
    let fs = 500.0;
    let n = 1500;
    let channel = |gain: f32| -> Vec<f32> {
        (0..n)
            .map(|i| {
                let t = i as f32 / fs;
                let ripple = (2.0 * std::f32::consts::PI * 3.0 * t + phase).sin() * 0.1;
                gain * amplitude * (2.0 * std::f32::consts::PI * tone_hz * t + phase).sin()
                    + ripple
            })
            .collect()
    };
    Recording::new(
        vec!["CH1".to_string(), "CH2".to_string()],
        vec![channel(1.0), channel(0.8)],
        1.0 / fs,
    )
    .unwrap()
}

fn pipeline_config() -> PipelineConfig {
    PipelineConfig {
        name: "integration".to_string(),
        channels: ChannelSelection::emg_cuff(2),
        epoch_duration: 1.0 / 500.0,
        window_len: 0.25,
        overlap: 0.5,
        preprocess: PreprocessConfig {
            baseline: true,
            ..PreprocessConfig::disabled()
        },
        features: FeatureConfig::only(vec![
            FeatureKind::MeanAbsoluteValue,
            FeatureKind::RootMeanSquare,
            FeatureKind::ZeroCrossings,
            FeatureKind::WaveformLength,
        ]),
    }
}

#[test]
fn full_pipeline_selects_a_working_model() {
    init_tracing();
    let config = pipeline_config();

    let mut builder = DatasetBuilder::new();
    for phase in [0.0, 0.7, 1.4] {
        let low = extract_recording(&synthetic_recording(8.0, 1.0, phase), &config).unwrap();
        builder.add_result("rest", low).unwrap();
        let high = extract_recording(&synthetic_recording(60.0, 2.5, phase), &config).unwrap();
        builder.add_result("grip", high).unwrap();
    }
    let dataset = builder.build().unwrap();

    assert_eq!(dataset.feature_count(), 8);
    assert_eq!(dataset.class_count(), 2);
    assert!(dataset.len() > 40);

    let families = vec![
        (ModelKind::Knn, ModelKind::Knn.default_grid()),
        (ModelKind::NaiveBayes, ModelKind::NaiveBayes.default_grid()),
        (ModelKind::LinearSvm, ModelKind::LinearSvm.default_grid()),
    ];
    let mut optimiser = Optimiser::new("integration");
    let summary = optimiser
        .run(&dataset, &families, &RunOptions::default())
        .unwrap();

    assert_eq!(optimiser.stage(), OptimiserStage::Done);
    assert!(summary.accuracy > 0.9, "accuracy {}", summary.accuracy);
    assert!(summary.weighted_f1 > 0.9);
    assert!(summary.report.contains("rest") && summary.report.contains("grip"));
}

#[test]
fn saved_artifact_predicts_after_reload() {
    init_tracing();
    let config = pipeline_config();

    let mut builder = DatasetBuilder::new();
    let low = extract_recording(&synthetic_recording(8.0, 1.0, 0.0), &config).unwrap();
    builder.add_result("rest", low).unwrap();
    let high = extract_recording(&synthetic_recording(60.0, 2.5, 0.0), &config).unwrap();
    builder.add_result("grip", high).unwrap();
    let dataset = builder.build().unwrap();

    let families = vec![(ModelKind::NaiveBayes, ModelKind::NaiveBayes.default_grid())];
    let mut optimiser = Optimiser::new("reload");
    let summary = optimiser
        .run(&dataset, &families, &RunOptions::default())
        .unwrap();

    let dir = std::env::temp_dir().join(format!("biosig-artifact-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = optimiser.save_best(&summary, &dir).unwrap();
    assert!(path
        .file_name()
        .unwrap()
        .to_string_lossy()
        .starts_with("reload_naive_bayes_best_model"));

    let json = std::fs::read_to_string(&path).unwrap();
    let restored = biosig_learn::ModelArtifact::from_json(&json)
        .unwrap()
        .into_classifier();
    let predictions = restored.predict(&dataset.x).unwrap();
    let agreement = predictions
        .iter()
        .zip(&dataset.y)
        .filter(|(a, b)| a == b)
        .count() as f32
        / dataset.y.len() as f32;
    assert!(agreement > 0.9, "agreement {}", agreement);

    std::fs::remove_dir_all(&dir).ok();
}
