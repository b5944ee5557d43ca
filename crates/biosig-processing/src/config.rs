//! Pipeline configuration: strongly-typed, validated once, immutable per run

use crate::features::FeatureConfig;
use biosig_core::{ChannelSelection, SigError, SigResult};
use serde::{Deserialize, Serialize};

/// Band-limiting filter settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BandpassSettings {
    /// Low cutoff in Hz
    pub low: f32,
    /// High cutoff in Hz
    pub high: f32,
    /// Filter order (counted in 2nd-order section pairs)
    pub order: usize,
}

/// Narrow-band rejection filter settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NotchSettings {
    /// Center frequency in Hz
    pub freq: f32,
    /// Quality factor (bandwidth = freq / q)
    pub q: f32,
}

/// Per-stage preprocessing toggles, applied in declaration order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreprocessConfig {
    pub bandpass: Option<BandpassSettings>,
    pub notch: Option<NotchSettings>,
    pub baseline: bool,
    pub zscore: bool,
    pub artifact_suppression: bool,
    /// Target rate in Hz; `None` keeps the source rate
    pub downsample: Option<f32>,
}

impl PreprocessConfig {
    /// Every stage off; the chain is an identity transform
    pub fn disabled() -> Self {
        PreprocessConfig {
            bandpass: None,
            notch: None,
            baseline: false,
            zscore: false,
            artifact_suppression: false,
            downsample: None,
        }
    }
}

/// Full configuration for one pipeline run.
///
/// Supplied once, validated up front, never mutated mid-run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Human-readable run name, used to key saved artifacts
    pub name: String,
    pub channels: ChannelSelection,
    /// Nominal duration of one epoch in seconds
    pub epoch_duration: f32,
    /// Window length in seconds
    pub window_len: f32,
    /// Overlap fraction between consecutive windows, in [0, 1)
    pub overlap: f32,
    pub preprocess: PreprocessConfig,
    pub features: FeatureConfig,
}

impl PipelineConfig {
    /// Preset for the 8-electrode EEG headset at 256Hz: 0.5-50Hz bandpass,
    /// 60Hz notch, baseline and z-score, downsample to 128Hz
    pub fn eeg_default(name: impl Into<String>) -> Self {
        PipelineConfig {
            name: name.into(),
            channels: ChannelSelection::eeg_headset(),
            epoch_duration: 1.0 / 256.0,
            window_len: 1.0,
            overlap: 0.5,
            preprocess: PreprocessConfig {
                bandpass: Some(BandpassSettings {
                    low: 0.5,
                    high: 50.0,
                    order: 5,
                }),
                notch: Some(NotchSettings { freq: 60.0, q: 30.0 }),
                baseline: true,
                zscore: true,
                artifact_suppression: true,
                downsample: Some(128.0),
            },
            features: FeatureConfig::eeg_default(),
        }
    }

    /// Preset for an 8-channel EMG cuff at 500Hz: 20-200Hz bandpass,
    /// 60Hz notch, baseline and z-score, no resampling
    pub fn emg_default(name: impl Into<String>) -> Self {
        PipelineConfig {
            name: name.into(),
            channels: ChannelSelection::emg_cuff(8),
            epoch_duration: 1.0 / 500.0,
            window_len: 0.5,
            overlap: 0.5,
            preprocess: PreprocessConfig {
                bandpass: Some(BandpassSettings {
                    low: 20.0,
                    high: 200.0,
                    order: 4,
                }),
                notch: Some(NotchSettings { freq: 60.0, q: 30.0 }),
                baseline: true,
                zscore: true,
                artifact_suppression: false,
                downsample: None,
            },
            features: FeatureConfig::emg_default(),
        }
    }

    /// Effective sampling rate before any resampling, in Hz
    pub fn sampling_rate(&self) -> f32 {
        1.0 / self.epoch_duration
    }

    /// Check every field against the rules the pipeline assumes.
    ///
    /// Called once at the start of a run; all violations are configuration
    /// errors and fatal.
    pub fn validate(&self) -> SigResult<()> {
        if self.name.is_empty() {
            return Err(SigError::config("run name must not be empty"));
        }
        if self.channels.enabled_count() == 0 {
            return Err(SigError::config("no channels enabled"));
        }
        if self.epoch_duration <= 0.0 {
            return Err(SigError::config(format!(
                "epoch duration must be positive, got {}",
                self.epoch_duration
            )));
        }
        if self.window_len <= 0.0 {
            return Err(SigError::config(format!(
                "window length must be positive, got {}",
                self.window_len
            )));
        }
        if !(0.0..1.0).contains(&self.overlap) {
            return Err(SigError::config(format!(
                "overlap must be in [0, 1), got {}",
                self.overlap
            )));
        }

        let nyquist = self.sampling_rate() / 2.0;
        if let Some(bp) = &self.preprocess.bandpass {
            if bp.low <= 0.0 || bp.low >= bp.high {
                return Err(SigError::config(format!(
                    "bandpass cutoffs must satisfy 0 < low < high, got {}..{}",
                    bp.low, bp.high
                )));
            }
            if bp.high >= nyquist {
                return Err(SigError::config(format!(
                    "bandpass high cutoff {}Hz must be below Nyquist ({}Hz)",
                    bp.high, nyquist
                )));
            }
            if bp.order == 0 {
                return Err(SigError::config("bandpass order must be at least 1"));
            }
        }
        if let Some(notch) = &self.preprocess.notch {
            if notch.freq >= nyquist {
                return Err(SigError::config(format!(
                    "notch frequency {}Hz must be below Nyquist ({}Hz)",
                    notch.freq, nyquist
                )));
            }
            if notch.q <= 0.0 {
                return Err(SigError::config("notch quality factor must be positive"));
            }
        }
        if let Some(target) = self.preprocess.downsample {
            if target <= 0.0 {
                return Err(SigError::config(format!(
                    "downsample target must be positive, got {}",
                    target
                )));
            }
            if target > self.sampling_rate() {
                return Err(SigError::config(format!(
                    "downsample target {}Hz exceeds source rate {}Hz",
                    target,
                    self.sampling_rate()
                )));
            }
        }

        self.features.validate()
    }

    /// Serialize to a JSON string
    pub fn to_json(&self) -> SigResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| SigError::config(format!("failed to serialize config: {}", e)))
    }

    /// Parse from a JSON string and validate
    pub fn from_json(json: &str) -> SigResult<Self> {
        let config: PipelineConfig = serde_json::from_str(json)
            .map_err(|e| SigError::config(format!("failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }
}
