//! Frequency-domain statistics derived from a Welch power spectral density
//!
//! Every feature in this module is guarded against zero total power and empty
//! band slices: the defined fallback is 0.0, never NaN or a division by zero.

use num_complex::Complex;
use rustfft::FftPlanner;

const FLATNESS_FLOOR: f32 = 1e-12;

/// One-sided Welch power spectral density estimate.
///
/// Segments of `min(256, n)` samples with 50% overlap, Hann windowed, mean
/// removed per segment. Returns parallel (frequency, density) vectors.
pub fn welch_psd(data: &[f32], fs: f32) -> (Vec<f32>, Vec<f32>) {
    let n = data.len();
    if n < 2 {
        return (Vec::new(), Vec::new());
    }
    let nperseg = n.min(256);
    let step = (nperseg / 2).max(1);

    let hann: Vec<f32> = (0..nperseg)
        .map(|i| {
            let phase = 2.0 * std::f32::consts::PI * i as f32 / nperseg as f32;
            0.5 * (1.0 - phase.cos())
        })
        .collect();
    let window_power: f32 = hann.iter().map(|w| w * w).sum();

    let mut planner = FftPlanner::<f32>::new();
    let fft = planner.plan_fft_forward(nperseg);

    let n_bins = nperseg / 2 + 1;
    let mut psd = vec![0.0f32; n_bins];
    let mut segments = 0usize;

    let mut start = 0;
    while start + nperseg <= n {
        let segment = &data[start..start + nperseg];
        let seg_mean = segment.iter().sum::<f32>() / nperseg as f32;

        let mut buffer: Vec<Complex<f32>> = segment
            .iter()
            .zip(&hann)
            .map(|(&x, &w)| Complex::new((x - seg_mean) * w, 0.0))
            .collect();
        fft.process(&mut buffer);

        for (bin, value) in buffer[..n_bins].iter().enumerate() {
            let mut power = value.norm_sqr() / (fs * window_power);
            // One-sided: double everything except DC and Nyquist
            if bin != 0 && !(nperseg % 2 == 0 && bin == n_bins - 1) {
                power *= 2.0;
            }
            psd[bin] += power;
        }
        segments += 1;
        start += step;
    }

    if segments == 0 {
        return (Vec::new(), Vec::new());
    }
    for value in &mut psd {
        *value /= segments as f32;
    }
    let freqs: Vec<f32> = (0..n_bins)
        .map(|i| i as f32 * fs / nperseg as f32)
        .collect();
    (freqs, psd)
}

/// Trapezoidal integral of the density over [low, high]
pub fn band_power(freqs: &[f32], psd: &[f32], low: f32, high: f32) -> f32 {
    let mut power = 0.0;
    for i in 1..freqs.len() {
        if freqs[i - 1] >= low && freqs[i] <= high {
            power += 0.5 * (psd[i - 1] + psd[i]) * (freqs[i] - freqs[i - 1]);
        }
    }
    power
}

/// Total power over the full estimated spectrum
pub fn total_power(freqs: &[f32], psd: &[f32]) -> f32 {
    if freqs.is_empty() {
        return 0.0;
    }
    band_power(freqs, psd, freqs[0], freqs[freqs.len() - 1])
}

/// Band power as a fraction of total power; 0.0 when total power is zero
pub fn relative_band_power(freqs: &[f32], psd: &[f32], low: f32, high: f32) -> f32 {
    let total = total_power(freqs, psd);
    if total == 0.0 {
        return 0.0;
    }
    band_power(freqs, psd, low, high) / total
}

/// Frequency of the strongest bin inside [low, high]; 0.0 for an empty or
/// zero-power band
pub fn peak_frequency(freqs: &[f32], psd: &[f32], low: f32, high: f32) -> f32 {
    let mut best: Option<(f32, f32)> = None;
    for (&f, &p) in freqs.iter().zip(psd) {
        if f >= low && f <= high {
            match best {
                Some((_, bp)) if bp >= p => {}
                _ => best = Some((f, p)),
            }
        }
    }
    match best {
        Some((f, p)) if p > 0.0 => f,
        _ => 0.0,
    }
}

/// Shannon entropy of the normalized density (natural log); 0.0 at zero power
pub fn spectral_entropy(psd: &[f32]) -> f32 {
    let total: f32 = psd.iter().sum();
    if total == 0.0 {
        return 0.0;
    }
    psd.iter()
        .filter(|&&p| p > 0.0)
        .map(|&p| {
            let q = p / total;
            -q * q.ln()
        })
        .sum()
}

/// Power-weighted mean frequency; 0.0 at zero power
pub fn mean_frequency(freqs: &[f32], psd: &[f32]) -> f32 {
    let total: f32 = psd.iter().sum();
    if total == 0.0 {
        return 0.0;
    }
    freqs.iter().zip(psd).map(|(&f, &p)| f * p).sum::<f32>() / total
}

/// Frequency splitting the cumulative power in half; 0.0 at zero power
pub fn median_frequency(freqs: &[f32], psd: &[f32]) -> f32 {
    let total: f32 = psd.iter().sum();
    if total == 0.0 {
        return 0.0;
    }
    let mut cumulative = 0.0;
    for (&f, &p) in freqs.iter().zip(psd) {
        cumulative += p;
        if cumulative >= total / 2.0 {
            return f;
        }
    }
    *freqs.last().unwrap_or(&0.0)
}

/// Width of the region where the density stays within 3dB of its peak;
/// 0.0 at zero power
pub fn bandwidth(freqs: &[f32], psd: &[f32]) -> f32 {
    let peak = psd.iter().cloned().fold(0.0f32, f32::max);
    if peak == 0.0 {
        return 0.0;
    }
    let half = peak / 2.0;
    let mut low = None;
    let mut high = 0.0;
    for (&f, &p) in freqs.iter().zip(psd) {
        if p >= half {
            if low.is_none() {
                low = Some(f);
            }
            high = f;
        }
    }
    match low {
        Some(l) => high - l,
        None => 0.0,
    }
}

/// Geometric over arithmetic mean of the density; 0.0 at zero power.
/// Bins are floored at a small epsilon before the geometric mean.
pub fn spectral_flatness(psd: &[f32]) -> f32 {
    if psd.is_empty() {
        return 0.0;
    }
    let arithmetic = psd.iter().sum::<f32>() / psd.len() as f32;
    if arithmetic == 0.0 {
        return 0.0;
    }
    let log_sum: f32 = psd.iter().map(|&p| p.max(FLATNESS_FLOOR).ln()).sum();
    (log_sum / psd.len() as f32).exp() / arithmetic
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f32, fs: f32, n: usize) -> Vec<f32> {
        (0..n)
            .map(|i| (2.0 * std::f32::consts::PI * freq * i as f32 / fs).sin())
            .collect()
    }

    #[test]
    fn test_welch_peak_at_tone_frequency() {
        let fs = 128.0;
        let data = sine(10.0, fs, 512);
        let (freqs, psd) = welch_psd(&data, fs);

        let peak_bin = psd
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .unwrap()
            .0;
        assert!((freqs[peak_bin] - 10.0).abs() < 1.0);
    }

    #[test]
    fn test_band_power_concentrates_around_tone() {
        let fs = 128.0;
        let data = sine(10.0, fs, 1024);
        let (freqs, psd) = welch_psd(&data, fs);

        let alpha = relative_band_power(&freqs, &psd, 8.0, 13.0);
        let gamma = relative_band_power(&freqs, &psd, 30.0, 50.0);
        assert!(alpha > 0.8, "alpha fraction {}", alpha);
        assert!(gamma < 0.05, "gamma fraction {}", gamma);
    }

    #[test]
    fn test_zero_power_yields_zero_not_nan() {
        let data = vec![0.0f32; 512];
        let (freqs, psd) = welch_psd(&data, 128.0);

        assert_eq!(relative_band_power(&freqs, &psd, 8.0, 13.0), 0.0);
        assert_eq!(peak_frequency(&freqs, &psd, 8.0, 13.0), 0.0);
        assert_eq!(spectral_entropy(&psd), 0.0);
        assert_eq!(mean_frequency(&freqs, &psd), 0.0);
        assert_eq!(median_frequency(&freqs, &psd), 0.0);
        assert_eq!(bandwidth(&freqs, &psd), 0.0);
        assert_eq!(spectral_flatness(&psd), 0.0);
    }

    #[test]
    fn test_mean_and_median_frequency_track_tone() {
        let fs = 128.0;
        let data = sine(20.0, fs, 1024);
        let (freqs, psd) = welch_psd(&data, fs);

        assert!((mean_frequency(&freqs, &psd) - 20.0).abs() < 2.0);
        assert!((median_frequency(&freqs, &psd) - 20.0).abs() < 1.0);
    }

    #[test]
    fn test_flatness_orders_noise_above_tone() {
        let fs = 128.0;
        let tone = sine(10.0, fs, 1024);
        // Deterministic wideband signal: sum of many incommensurate tones
        let wideband: Vec<f32> = (0..1024)
            .map(|i| {
                (1..30)
                    .map(|k| {
                        (2.0 * std::f32::consts::PI * (k as f32 * 2.13) * i as f32 / fs).sin()
                    })
                    .sum::<f32>()
            })
            .collect();

        let (_, tone_psd) = welch_psd(&tone, fs);
        let (_, wide_psd) = welch_psd(&wideband, fs);
        assert!(spectral_flatness(&wide_psd) > spectral_flatness(&tone_psd));
    }

    #[test]
    fn test_entropy_orders_noise_above_tone() {
        let fs = 128.0;
        let tone = sine(10.0, fs, 1024);
        let wideband: Vec<f32> = (0..1024)
            .map(|i| {
                (1..30)
                    .map(|k| {
                        (2.0 * std::f32::consts::PI * (k as f32 * 2.13) * i as f32 / fs).sin()
                    })
                    .sum::<f32>()
            })
            .collect();

        let (_, tone_psd) = welch_psd(&tone, fs);
        let (_, wide_psd) = welch_psd(&wideband, fs);
        assert!(spectral_entropy(&wide_psd) > spectral_entropy(&tone_psd));
    }

    #[test]
    fn test_short_input_returns_empty_spectrum() {
        let (freqs, psd) = welch_psd(&[1.0], 128.0);
        assert!(freqs.is_empty());
        assert!(psd.is_empty());
    }
}
