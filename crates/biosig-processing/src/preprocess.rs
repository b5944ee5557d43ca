//! Preprocessing chain: per-channel signal transforms applied before windowing
//!
//! Each stage is a pure function from a sample sequence to a sample sequence.
//! Stages compose in a fixed order (bandpass, notch, baseline, z-score,
//! artifact suppression, downsample) and any stage can be disabled without
//! affecting the others. Resampling changes the effective sampling rate, and
//! the new rate is returned so later stages and spectral features see it.

use crate::config::PreprocessConfig;
use biosig_core::{SigError, SigResult};
use num_complex::Complex;
use rustfft::FftPlanner;
use tracing::debug;

/// Single biquad section (2nd order IIR), direct form I
#[derive(Debug, Clone, Copy)]
struct Biquad {
    b0: f32,
    b1: f32,
    b2: f32,
    a1: f32,
    a2: f32,
}

impl Biquad {
    /// 2nd order Butterworth lowpass via bilinear transform
    fn lowpass(cutoff: f32, fs: f32) -> SigResult<Self> {
        if cutoff >= fs / 2.0 {
            return Err(SigError::config(format!(
                "lowpass cutoff {}Hz must be below Nyquist ({}Hz)",
                cutoff,
                fs / 2.0
            )));
        }
        let omega_c = 2.0 * std::f32::consts::PI * cutoff / fs;
        let k = (omega_c / 2.0).tan();
        let sqrt2 = std::f32::consts::SQRT_2;
        let k2 = k * k;
        let norm = k2 + sqrt2 * k + 1.0;

        let b0 = k2 / norm;
        Ok(Biquad {
            b0,
            b1: 2.0 * b0,
            b2: b0,
            a1: (2.0 * (k2 - 1.0)) / norm,
            a2: (k2 - sqrt2 * k + 1.0) / norm,
        })
    }

    /// 2nd order Butterworth highpass via bilinear transform
    fn highpass(cutoff: f32, fs: f32) -> SigResult<Self> {
        if cutoff >= fs / 2.0 {
            return Err(SigError::config(format!(
                "highpass cutoff {}Hz must be below Nyquist ({}Hz)",
                cutoff,
                fs / 2.0
            )));
        }
        let omega_c = 2.0 * std::f32::consts::PI * cutoff / fs;
        let k = (omega_c / 2.0).tan();
        let sqrt2 = std::f32::consts::SQRT_2;
        let k2 = k * k;
        let norm = k2 + sqrt2 * k + 1.0;

        let b0 = 1.0 / norm;
        Ok(Biquad {
            b0,
            b1: -2.0 * b0,
            b2: b0,
            a1: (2.0 * (k2 - 1.0)) / norm,
            a2: (k2 - sqrt2 * k + 1.0) / norm,
        })
    }

    /// Notch (band-reject) section for narrow-band interference
    fn notch(freq: f32, q: f32, fs: f32) -> SigResult<Self> {
        if freq >= fs / 2.0 {
            return Err(SigError::config(format!(
                "notch frequency {}Hz must be below Nyquist ({}Hz)",
                freq,
                fs / 2.0
            )));
        }
        let omega = 2.0 * std::f32::consts::PI * freq / fs;
        let alpha = omega.sin() / (2.0 * q);
        let cos_omega = omega.cos();

        let a0 = 1.0 + alpha;
        Ok(Biquad {
            b0: 1.0 / a0,
            b1: -2.0 * cos_omega / a0,
            b2: 1.0 / a0,
            a1: -2.0 * cos_omega / a0,
            a2: (1.0 - alpha) / a0,
        })
    }

    /// Run the section over a full sequence with zeroed initial state
    fn apply(&self, data: &[f32]) -> Vec<f32> {
        let (mut x1, mut x2, mut y1, mut y2) = (0.0f32, 0.0f32, 0.0f32, 0.0f32);
        let mut out = Vec::with_capacity(data.len());

        for &sample in data {
            let y = self.b0 * sample + self.b1 * x1 + self.b2 * x2 - self.a1 * y1 - self.a2 * y2;
            x2 = x1;
            x1 = sample;
            y2 = y1;
            y1 = y;
            out.push(y);
        }
        out
    }
}

/// Band-limiting filter: cascaded highpass + lowpass Butterworth sections.
///
/// `order` counts 2nd-order section pairs: order 2 gives one highpass and one
/// lowpass section, order 4 gives two of each, and so on.
pub fn bandpass_filter(
    data: &[f32],
    low: f32,
    high: f32,
    order: usize,
    fs: f32,
) -> SigResult<Vec<f32>> {
    if low <= 0.0 || low >= high {
        return Err(SigError::config(format!(
            "bandpass cutoffs must satisfy 0 < low < high, got {}..{}",
            low, high
        )));
    }
    let highpass = Biquad::highpass(low, fs)?;
    let lowpass = Biquad::lowpass(high, fs)?;
    let sections = (order.max(1) + 1) / 2;

    let mut out = data.to_vec();
    for _ in 0..sections {
        out = highpass.apply(&out);
        out = lowpass.apply(&out);
    }
    Ok(out)
}

/// Narrow-band noise rejection (powerline interference)
pub fn notch_filter(data: &[f32], freq: f32, q: f32, fs: f32) -> SigResult<Vec<f32>> {
    let section = Biquad::notch(freq, q, fs)?;
    Ok(section.apply(data))
}

/// Baseline (mean) removal
pub fn baseline_correction(data: &[f32]) -> Vec<f32> {
    if data.is_empty() {
        return Vec::new();
    }
    let mean = data.iter().sum::<f32>() / data.len() as f32;
    data.iter().map(|x| x - mean).collect()
}

/// Z-score normalization to zero mean and unit variance.
///
/// A constant (zero-variance) input returns the zero-mean series unscaled
/// instead of dividing by zero.
pub fn zscore(data: &[f32]) -> Vec<f32> {
    if data.is_empty() {
        return Vec::new();
    }
    let n = data.len() as f32;
    let mean = data.iter().sum::<f32>() / n;
    let variance = data.iter().map(|x| (x - mean).powi(2)).sum::<f32>() / n;
    let std_dev = variance.sqrt();

    if std_dev == 0.0 {
        return data.iter().map(|x| x - mean).collect();
    }
    data.iter().map(|x| (x - mean) / std_dev).collect()
}

/// Blind-source artifact suppression, single-component reconstruction.
///
/// The signal is centered and whitened, and the retained component is mixed
/// back. With every component retained the reconstruction reduces to the
/// centered signal; component rejection would hook in between the two steps.
/// Zero-variance input passes through untouched.
pub fn suppress_artifacts(data: &[f32]) -> Vec<f32> {
    if data.is_empty() {
        return Vec::new();
    }
    let n = data.len() as f32;
    let mean = data.iter().sum::<f32>() / n;
    let variance = data.iter().map(|x| (x - mean).powi(2)).sum::<f32>() / n;
    let scale = variance.sqrt();

    if scale == 0.0 {
        return data.to_vec();
    }

    let sources: Vec<f32> = data.iter().map(|x| (x - mean) / scale).collect();
    sources.iter().map(|s| s * scale).collect()
}

/// FFT-based resampling to a target rate.
///
/// Returns the resampled sequence and the new effective rate. The spectrum is
/// truncated (downsampling) or zero-padded (upsampling) and transformed back,
/// with the shared Nyquist bin folded or split for even lengths.
pub fn resample(data: &[f32], source_fs: f32, target_fs: f32) -> SigResult<(Vec<f32>, f32)> {
    if target_fs <= 0.0 {
        return Err(SigError::config(format!(
            "resample target rate must be positive, got {}",
            target_fs
        )));
    }
    let n = data.len();
    if n == 0 {
        return Ok((Vec::new(), target_fs));
    }
    let m = ((n as f32 * target_fs / source_fs).round() as usize).max(1);
    if m == n {
        return Ok((data.to_vec(), target_fs));
    }

    let mut planner = FftPlanner::<f32>::new();
    let fft = planner.plan_fft_forward(n);
    let mut spectrum: Vec<Complex<f32>> =
        data.iter().map(|&x| Complex::new(x, 0.0)).collect();
    fft.process(&mut spectrum);

    let mut out_spectrum = vec![Complex::new(0.0, 0.0); m];
    let k = n.min(m);
    let half = k / 2;
    out_spectrum[0] = spectrum[0];
    for i in 1..half {
        out_spectrum[i] = spectrum[i];
        out_spectrum[m - i] = spectrum[n - i];
    }
    if k % 2 == 0 && half > 0 {
        if m < n {
            // Fold positive and negative halves into the shared bin
            out_spectrum[half] = spectrum[half] + spectrum[n - half];
        } else {
            // Split the source Nyquist bin across both slots
            out_spectrum[half] = spectrum[half] * 0.5;
            out_spectrum[m - half] = spectrum[half] * 0.5;
        }
    }

    let ifft = planner.plan_fft_inverse(m);
    ifft.process(&mut out_spectrum);

    // rustfft leaves the inverse unnormalized; 1/n folds in the m/n amplitude
    // correction at the same time
    let out: Vec<f32> = out_spectrum.iter().map(|c| c.re / n as f32).collect();
    Ok((out, target_fs))
}

/// Apply the configured stages in their fixed order.
///
/// Returns the cleaned sequence and the effective sampling rate after any
/// resampling stage.
pub fn apply_chain(
    config: &PreprocessConfig,
    data: &[f32],
    fs: f32,
) -> SigResult<(Vec<f32>, f32)> {
    let mut samples = data.to_vec();
    let mut rate = fs;

    if let Some(bandpass) = &config.bandpass {
        samples = bandpass_filter(&samples, bandpass.low, bandpass.high, bandpass.order, rate)?;
        debug!(low = bandpass.low, high = bandpass.high, "applied bandpass");
    }
    if let Some(notch) = &config.notch {
        samples = notch_filter(&samples, notch.freq, notch.q, rate)?;
        debug!(freq = notch.freq, "applied notch");
    }
    if config.baseline {
        samples = baseline_correction(&samples);
    }
    if config.zscore {
        samples = zscore(&samples);
    }
    if config.artifact_suppression {
        samples = suppress_artifacts(&samples);
    }
    if let Some(target) = config.downsample {
        if target > rate {
            return Err(SigError::config(format!(
                "downsample target {}Hz exceeds source rate {}Hz",
                target, rate
            )));
        }
        let (resampled, new_rate) = resample(&samples, rate, target)?;
        samples = resampled;
        rate = new_rate;
        debug!(from = fs, to = rate, "downsampled");
    }

    Ok((samples, rate))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BandpassSettings, NotchSettings};

    fn sine(freq: f32, fs: f32, n: usize) -> Vec<f32> {
        (0..n)
            .map(|i| (2.0 * std::f32::consts::PI * freq * i as f32 / fs).sin())
            .collect()
    }

    #[test]
    fn test_zscore_normalizes() {
        let data = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let out = zscore(&data);
        let mean = out.iter().sum::<f32>() / out.len() as f32;
        let var = out.iter().map(|x| (x - mean).powi(2)).sum::<f32>() / out.len() as f32;
        assert!(mean.abs() < 1e-6);
        assert!((var - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_zscore_zero_variance_is_noop_scale() {
        let data = vec![3.0; 64];
        let out = zscore(&data);
        // Zero-mean, unscaled: all zeros, no NaN or Inf
        assert!(out.iter().all(|x| *x == 0.0));
    }

    #[test]
    fn test_baseline_correction() {
        let data = vec![2.0, 4.0, 6.0];
        let out = baseline_correction(&data);
        assert_eq!(out, vec![-2.0, 0.0, 2.0]);
    }

    #[test]
    fn test_notch_attenuates_target_frequency() {
        let fs = 1000.0;
        let clean = sine(10.0, fs, 2000);
        let noisy: Vec<f32> = clean
            .iter()
            .zip(sine(50.0, fs, 2000))
            .map(|(a, b)| a + 0.5 * b)
            .collect();

        let filtered = notch_filter(&noisy, 50.0, 30.0, fs).unwrap();

        // Compare steady-state power against the unfiltered mix
        let tail = 1000;
        let power = |d: &[f32]| d[d.len() - tail..].iter().map(|x| x * x).sum::<f32>();
        assert!(power(&filtered) < power(&noisy));
        assert_eq!(filtered.len(), noisy.len());
    }

    #[test]
    fn test_bandpass_rejects_out_of_band() {
        let fs = 500.0;
        let low_drift = sine(0.2, fs, 2000);
        let in_band = sine(20.0, fs, 2000);

        let drift_out = bandpass_filter(&low_drift, 5.0, 100.0, 4, fs).unwrap();
        let band_out = bandpass_filter(&in_band, 5.0, 100.0, 4, fs).unwrap();

        let tail = 500;
        let power = |d: &[f32]| d[d.len() - tail..].iter().map(|x| x * x).sum::<f32>();
        assert!(power(&drift_out) < 0.2 * power(&band_out));
    }

    #[test]
    fn test_bandpass_rejects_bad_cutoffs() {
        let data = vec![0.0; 100];
        assert!(bandpass_filter(&data, 50.0, 20.0, 4, 500.0).is_err());
        assert!(bandpass_filter(&data, 5.0, 300.0, 4, 500.0).is_err());
    }

    #[test]
    fn test_resample_halves_length() {
        let data = sine(5.0, 256.0, 256);
        let (out, rate) = resample(&data, 256.0, 128.0).unwrap();
        assert_eq!(out.len(), 128);
        assert!((rate - 128.0).abs() < 1e-6);
        // A 5Hz tone survives downsampling to 128Hz nearly unchanged
        let expected = sine(5.0, 128.0, 128);
        for (a, b) in out.iter().zip(&expected).skip(4).take(120) {
            assert!((a - b).abs() < 0.05, "{} vs {}", a, b);
        }
    }

    #[test]
    fn test_suppress_artifacts_centers() {
        let data = vec![1.0, 3.0, 5.0, 7.0];
        let out = suppress_artifacts(&data);
        let mean = out.iter().sum::<f32>() / out.len() as f32;
        assert!(mean.abs() < 1e-6);

        let flat = vec![2.5; 8];
        assert_eq!(suppress_artifacts(&flat), flat);
    }

    #[test]
    fn test_chain_rate_propagation() {
        let config = PreprocessConfig {
            bandpass: Some(BandpassSettings {
                low: 1.0,
                high: 50.0,
                order: 4,
            }),
            notch: Some(NotchSettings { freq: 60.0, q: 30.0 }),
            baseline: true,
            zscore: true,
            artifact_suppression: false,
            downsample: Some(128.0),
        };
        let data = sine(10.0, 256.0, 512);
        let (out, rate) = apply_chain(&config, &data, 256.0).unwrap();
        assert_eq!(out.len(), 256);
        assert!((rate - 128.0).abs() < 1e-6);
    }

    #[test]
    fn test_chain_disabled_stages_are_identity() {
        let config = PreprocessConfig::disabled();
        let data = sine(10.0, 256.0, 64);
        let (out, rate) = apply_chain(&config, &data, 256.0).unwrap();
        assert_eq!(out, data);
        assert!((rate - 256.0).abs() < 1e-6);
    }
}
