//! Feature extraction: a closed registry of feature kinds, a compiled
//! per-run plan with deterministic column ordering, and the extractor that
//! turns windows into fixed-length vectors.
//!
//! Column ordering contract: channels in selection order, and within each
//! channel the enabled kinds in configuration order, each kind contributing
//! its outputs in its documented internal order. The compiled plan exposes
//! one label per column so downstream reports can map indices back to
//! (channel, feature-name) pairs.

pub mod complexity;
pub mod spectral;
pub mod time;

use biosig_core::{ChannelSelection, SigError, SigResult, Window};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

/// Closed set of known feature kinds.
///
/// Each kind is bound to a pure computation; unknown names fail at
/// configuration time, not mid-extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeatureKind {
    Mean,
    Variance,
    Skewness,
    Kurtosis,
    MeanAbsoluteValue,
    RootMeanSquare,
    WaveformLength,
    IntegratedValue,
    ZeroCrossings,
    SlopeSignChanges,
    /// Absolute and relative power per configured band
    BandPowers,
    /// Strongest frequency per configured band
    PeakFrequency,
    SpectralEntropy,
    MeanFrequency,
    MedianFrequency,
    Bandwidth,
    SpectralFlatness,
    /// Activity, mobility, complexity
    Hjorth,
    /// Autoregressive coefficients, `ar_order` of them
    ArCoefficients,
}

impl FeatureKind {
    /// Look up a kind by its canonical name
    pub fn from_name(name: &str) -> SigResult<Self> {
        use FeatureKind::*;
        Ok(match name {
            "mean" => Mean,
            "variance" => Variance,
            "skewness" => Skewness,
            "kurtosis" => Kurtosis,
            "mav" => MeanAbsoluteValue,
            "rms" => RootMeanSquare,
            "waveform_length" => WaveformLength,
            "integrated_value" => IntegratedValue,
            "zero_crossings" => ZeroCrossings,
            "slope_sign_changes" => SlopeSignChanges,
            "band_powers" => BandPowers,
            "peak_frequency" => PeakFrequency,
            "spectral_entropy" => SpectralEntropy,
            "mean_frequency" => MeanFrequency,
            "median_frequency" => MedianFrequency,
            "bandwidth" => Bandwidth,
            "spectral_flatness" => SpectralFlatness,
            "hjorth" => Hjorth,
            "ar_coefficients" => ArCoefficients,
            other => {
                return Err(SigError::config(format!(
                    "unknown feature kind '{}'",
                    other
                )))
            }
        })
    }

    /// Canonical name
    pub fn name(&self) -> &'static str {
        use FeatureKind::*;
        match self {
            Mean => "mean",
            Variance => "variance",
            Skewness => "skewness",
            Kurtosis => "kurtosis",
            MeanAbsoluteValue => "mav",
            RootMeanSquare => "rms",
            WaveformLength => "waveform_length",
            IntegratedValue => "integrated_value",
            ZeroCrossings => "zero_crossings",
            SlopeSignChanges => "slope_sign_changes",
            BandPowers => "band_powers",
            PeakFrequency => "peak_frequency",
            SpectralEntropy => "spectral_entropy",
            MeanFrequency => "mean_frequency",
            MedianFrequency => "median_frequency",
            Bandwidth => "bandwidth",
            SpectralFlatness => "spectral_flatness",
            Hjorth => "hjorth",
            ArCoefficients => "ar_coefficients",
        }
    }

    /// True for kinds computed from the power spectral density
    pub fn is_spectral(&self) -> bool {
        use FeatureKind::*;
        matches!(
            self,
            BandPowers
                | PeakFrequency
                | SpectralEntropy
                | MeanFrequency
                | MedianFrequency
                | Bandwidth
                | SpectralFlatness
        )
    }

    /// Number of scalars this kind contributes per channel
    pub fn output_len(&self, config: &FeatureConfig) -> usize {
        use FeatureKind::*;
        match self {
            BandPowers => 2 * config.bands.len(),
            PeakFrequency => config.bands.len(),
            Hjorth => 3,
            ArCoefficients => config.ar_order,
            _ => 1,
        }
    }

    /// Per-column names within this kind, in output order
    fn column_names(&self, config: &FeatureConfig) -> Vec<String> {
        use FeatureKind::*;
        match self {
            BandPowers => config
                .bands
                .iter()
                .flat_map(|b| {
                    [format!("{}_power", b.name), format!("{}_rel_power", b.name)]
                })
                .collect(),
            PeakFrequency => config
                .bands
                .iter()
                .map(|b| format!("{}_peak_freq", b.name))
                .collect(),
            Hjorth => vec![
                "hjorth_activity".to_string(),
                "hjorth_mobility".to_string(),
                "hjorth_complexity".to_string(),
            ],
            ArCoefficients => (0..config.ar_order).map(|i| format!("ar_{}", i)).collect(),
            other => vec![other.name().to_string()],
        }
    }
}

/// A named frequency band in Hz
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrequencyBand {
    pub name: String,
    pub low: f32,
    pub high: f32,
}

impl FrequencyBand {
    pub fn new(name: impl Into<String>, low: f32, high: f32) -> Self {
        FrequencyBand {
            name: name.into(),
            low,
            high,
        }
    }
}

/// The canonical EEG rhythm bands
pub fn eeg_bands() -> Vec<FrequencyBand> {
    vec![
        FrequencyBand::new("delta", 0.5, 4.0),
        FrequencyBand::new("theta", 4.0, 8.0),
        FrequencyBand::new("alpha", 8.0, 13.0),
        FrequencyBand::new("beta", 13.0, 30.0),
        FrequencyBand::new("gamma", 30.0, 50.0),
    ]
}

/// Which feature kinds to compute and their shared parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureConfig {
    /// Enabled kinds, in the order their columns appear per channel
    pub enabled: Vec<FeatureKind>,
    /// Autoregressive model order
    pub ar_order: usize,
    /// Bands for band-power and peak-frequency kinds
    pub bands: Vec<FrequencyBand>,
    /// Amplitude threshold for crossing/slope counts
    pub crossing_threshold: f32,
}

impl FeatureConfig {
    /// Spectral-heavy set for EEG work
    pub fn eeg_default() -> Self {
        use FeatureKind::*;
        FeatureConfig {
            enabled: vec![
                MeanAbsoluteValue,
                RootMeanSquare,
                Variance,
                BandPowers,
                PeakFrequency,
                SpectralEntropy,
                MeanFrequency,
                MedianFrequency,
                Hjorth,
                ArCoefficients,
            ],
            ar_order: 4,
            bands: eeg_bands(),
            crossing_threshold: 0.01,
        }
    }

    /// Amplitude-heavy set for EMG work
    pub fn emg_default() -> Self {
        use FeatureKind::*;
        FeatureConfig {
            enabled: vec![
                MeanAbsoluteValue,
                RootMeanSquare,
                WaveformLength,
                IntegratedValue,
                ZeroCrossings,
                SlopeSignChanges,
                ArCoefficients,
            ],
            ar_order: 4,
            bands: eeg_bands(),
            crossing_threshold: 0.01,
        }
    }

    /// A minimal config with only the given kinds enabled
    pub fn only(enabled: Vec<FeatureKind>) -> Self {
        FeatureConfig {
            enabled,
            ar_order: 4,
            bands: eeg_bands(),
            crossing_threshold: 0.01,
        }
    }

    pub fn validate(&self) -> SigResult<()> {
        if self.enabled.is_empty() {
            return Err(SigError::config("no features enabled"));
        }
        for (i, kind) in self.enabled.iter().enumerate() {
            if self.enabled[..i].contains(kind) {
                return Err(SigError::config(format!(
                    "feature '{}' enabled twice",
                    kind.name()
                )));
            }
        }
        if self.enabled.contains(&FeatureKind::ArCoefficients) && self.ar_order == 0 {
            return Err(SigError::config("ar_order must be at least 1"));
        }
        let needs_bands = self
            .enabled
            .iter()
            .any(|k| matches!(k, FeatureKind::BandPowers | FeatureKind::PeakFrequency));
        if needs_bands && self.bands.is_empty() {
            return Err(SigError::config("band features enabled but no bands given"));
        }
        for band in &self.bands {
            if band.low >= band.high {
                return Err(SigError::config(format!(
                    "band '{}' must satisfy low < high, got {}..{}",
                    band.name, band.low, band.high
                )));
            }
        }
        if self.crossing_threshold < 0.0 {
            return Err(SigError::config("crossing threshold must not be negative"));
        }
        Ok(())
    }
}

/// Label of one feature-vector column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnLabel {
    pub channel: String,
    pub feature: String,
}

impl fmt::Display for ColumnLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.channel, self.feature)
    }
}

/// The enabled-feature configuration compiled against a channel selection.
///
/// Compiled once per run; fixes the column count and the meaning of every
/// position for all windows of that run.
#[derive(Debug, Clone)]
pub struct FeaturePlan {
    columns: Vec<ColumnLabel>,
    channel_count: usize,
}

impl FeaturePlan {
    pub fn compile(config: &FeatureConfig, selection: &ChannelSelection) -> SigResult<Self> {
        config.validate()?;
        if selection.enabled_count() == 0 {
            return Err(SigError::config("no channels enabled"));
        }

        let mut columns = Vec::new();
        for channel in selection.enabled() {
            for kind in &config.enabled {
                for feature in kind.column_names(config) {
                    columns.push(ColumnLabel {
                        channel: channel.to_string(),
                        feature,
                    });
                }
            }
        }
        Ok(FeaturePlan {
            columns,
            channel_count: selection.enabled_count(),
        })
    }

    /// Fixed vector length for this plan
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Column labels in position order
    pub fn columns(&self) -> &[ColumnLabel] {
        &self.columns
    }

    pub fn channel_count(&self) -> usize {
        self.channel_count
    }
}

/// One extracted vector. `flagged` marks a vector that contained NaN after
/// fallback handling; callers exclude flagged rows when building datasets.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    pub values: Vec<f32>,
    pub flagged: bool,
}

/// Computes feature vectors from windows, following a compiled plan
pub struct FeatureExtractor {
    config: FeatureConfig,
    plan: FeaturePlan,
    sampling_rate: f32,
    needs_psd: bool,
}

impl FeatureExtractor {
    pub fn new(
        config: FeatureConfig,
        selection: &ChannelSelection,
        sampling_rate: f32,
    ) -> SigResult<Self> {
        if sampling_rate <= 0.0 {
            return Err(SigError::config(format!(
                "sampling rate must be positive, got {}",
                sampling_rate
            )));
        }
        let plan = FeaturePlan::compile(&config, selection)?;
        let needs_psd = config.enabled.iter().any(|k| k.is_spectral());
        Ok(FeatureExtractor {
            config,
            plan,
            sampling_rate,
            needs_psd,
        })
    }

    pub fn plan(&self) -> &FeaturePlan {
        &self.plan
    }

    /// Extract one fixed-length vector from a window.
    ///
    /// The window's channel rows must match the plan's channel count. Any NaN
    /// surviving the degeneracy fallbacks flags the vector and is logged.
    pub fn extract(&self, window: &Window) -> SigResult<FeatureVector> {
        if window.channel_count() != self.plan.channel_count {
            return Err(SigError::ShapeMismatch {
                expected: self.plan.channel_count,
                actual: window.channel_count(),
            });
        }

        let mut values = Vec::with_capacity(self.plan.len());
        for samples in &window.data {
            let samples = samples.as_slice();
            let psd = if self.needs_psd {
                spectral::welch_psd(samples, self.sampling_rate)
            } else {
                (Vec::new(), Vec::new())
            };
            for kind in &self.config.enabled {
                self.push_kind(*kind, samples, &psd, &mut values);
            }
        }
        debug_assert_eq!(values.len(), self.plan.len());

        let flagged = values.iter().any(|v| v.is_nan());
        if flagged {
            warn!(
                start = window.start,
                end = window.end,
                "NaN in extracted features, window flagged"
            );
        }
        Ok(FeatureVector { values, flagged })
    }

    fn push_kind(
        &self,
        kind: FeatureKind,
        samples: &[f32],
        psd: &(Vec<f32>, Vec<f32>),
        out: &mut Vec<f32>,
    ) {
        use FeatureKind::*;
        let threshold = self.config.crossing_threshold;
        let (freqs, density) = psd;
        match kind {
            Mean => out.push(time::mean(samples)),
            Variance => out.push(time::variance(samples)),
            Skewness => out.push(time::skewness(samples)),
            Kurtosis => out.push(time::kurtosis(samples)),
            MeanAbsoluteValue => out.push(time::mean_absolute_value(samples)),
            RootMeanSquare => out.push(time::root_mean_square(samples)),
            WaveformLength => out.push(time::waveform_length(samples)),
            IntegratedValue => out.push(time::integrated_value(samples)),
            ZeroCrossings => out.push(time::zero_crossings(samples, threshold)),
            SlopeSignChanges => out.push(time::slope_sign_changes(samples, threshold)),
            Hjorth => out.extend(complexity::hjorth(samples)),
            ArCoefficients => {
                out.extend(complexity::ar_coefficients(samples, self.config.ar_order))
            }
            BandPowers => {
                for band in &self.config.bands {
                    out.push(spectral::band_power(freqs, density, band.low, band.high));
                    out.push(spectral::relative_band_power(
                        freqs, density, band.low, band.high,
                    ));
                }
            }
            PeakFrequency => {
                for band in &self.config.bands {
                    out.push(spectral::peak_frequency(
                        freqs, density, band.low, band.high,
                    ));
                }
            }
            SpectralEntropy => out.push(spectral::spectral_entropy(density)),
            MeanFrequency => out.push(spectral::mean_frequency(freqs, density)),
            MedianFrequency => out.push(spectral::median_frequency(freqs, density)),
            Bandwidth => out.push(spectral::bandwidth(freqs, density)),
            SpectralFlatness => out.push(spectral::spectral_flatness(density)),
        }
    }
}
