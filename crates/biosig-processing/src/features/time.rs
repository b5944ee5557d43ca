//! Time-domain statistics computed directly on the sample sequence

/// Arithmetic mean
pub fn mean(data: &[f32]) -> f32 {
    if data.is_empty() {
        return 0.0;
    }
    data.iter().sum::<f32>() / data.len() as f32
}

/// Population variance
pub fn variance(data: &[f32]) -> f32 {
    if data.is_empty() {
        return 0.0;
    }
    let mu = mean(data);
    data.iter().map(|x| (x - mu).powi(2)).sum::<f32>() / data.len() as f32
}

/// Third standardized moment. Zero-variance input yields 0.0.
pub fn skewness(data: &[f32]) -> f32 {
    if data.is_empty() {
        return 0.0;
    }
    let mu = mean(data);
    let n = data.len() as f32;
    let m2 = data.iter().map(|x| (x - mu).powi(2)).sum::<f32>() / n;
    if m2 == 0.0 {
        return 0.0;
    }
    let m3 = data.iter().map(|x| (x - mu).powi(3)).sum::<f32>() / n;
    m3 / m2.powf(1.5)
}

/// Excess kurtosis (fourth standardized moment minus 3).
/// Zero-variance input yields 0.0.
pub fn kurtosis(data: &[f32]) -> f32 {
    if data.is_empty() {
        return 0.0;
    }
    let mu = mean(data);
    let n = data.len() as f32;
    let m2 = data.iter().map(|x| (x - mu).powi(2)).sum::<f32>() / n;
    if m2 == 0.0 {
        return 0.0;
    }
    let m4 = data.iter().map(|x| (x - mu).powi(4)).sum::<f32>() / n;
    m4 / (m2 * m2) - 3.0
}

/// Mean absolute value
pub fn mean_absolute_value(data: &[f32]) -> f32 {
    if data.is_empty() {
        return 0.0;
    }
    data.iter().map(|x| x.abs()).sum::<f32>() / data.len() as f32
}

/// Root mean square
pub fn root_mean_square(data: &[f32]) -> f32 {
    if data.is_empty() {
        return 0.0;
    }
    (data.iter().map(|x| x * x).sum::<f32>() / data.len() as f32).sqrt()
}

/// Cumulative length of the waveform (sum of absolute successive differences)
pub fn waveform_length(data: &[f32]) -> f32 {
    data.windows(2).map(|w| (w[1] - w[0]).abs()).sum()
}

/// Integrated value (sum of absolute amplitudes)
pub fn integrated_value(data: &[f32]) -> f32 {
    data.iter().map(|x| x.abs()).sum()
}

/// Count of sign changes whose amplitude step clears the threshold
pub fn zero_crossings(data: &[f32], threshold: f32) -> f32 {
    data.windows(2)
        .filter(|w| w[0] * w[1] < 0.0 && (w[1] - w[0]).abs() >= threshold)
        .count() as f32
}

/// Count of slope direction reversals whose amplitude step clears the threshold
pub fn slope_sign_changes(data: &[f32], threshold: f32) -> f32 {
    data.windows(3)
        .filter(|w| {
            let left = w[1] - w[0];
            let right = w[1] - w[2];
            left * right > 0.0 && (left.abs() >= threshold || right.abs() >= threshold)
        })
        .count() as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_moments() {
        let data = vec![1.0, 2.0, 3.0, 4.0];
        assert!((mean(&data) - 2.5).abs() < 1e-6);
        assert!((variance(&data) - 1.25).abs() < 1e-6);
    }

    #[test]
    fn test_symmetric_signal_has_zero_skew() {
        let data = vec![-2.0, -1.0, 0.0, 1.0, 2.0];
        assert!(skewness(&data).abs() < 1e-6);
    }

    #[test]
    fn test_zero_variance_moments_are_zero() {
        let data = vec![5.0; 32];
        assert_eq!(skewness(&data), 0.0);
        assert_eq!(kurtosis(&data), 0.0);
    }

    #[test]
    fn test_amplitude_features() {
        let data = vec![1.0, -1.0, 1.0, -1.0];
        assert!((mean_absolute_value(&data) - 1.0).abs() < 1e-6);
        assert!((root_mean_square(&data) - 1.0).abs() < 1e-6);
        assert!((integrated_value(&data) - 4.0).abs() < 1e-6);
        assert!((waveform_length(&data) - 6.0).abs() < 1e-6);
    }

    #[test]
    fn test_zero_crossings_respects_threshold() {
        let data = vec![1.0, -1.0, 1.0, -1.0];
        assert_eq!(zero_crossings(&data, 0.01), 3.0);
        // Steps of 2.0 are below a huge threshold
        assert_eq!(zero_crossings(&data, 5.0), 0.0);

        let tiny = vec![0.004, -0.004, 0.004];
        assert_eq!(zero_crossings(&tiny, 0.01), 0.0);
    }

    #[test]
    fn test_slope_sign_changes() {
        // Peaks at indices 1 and 3
        let data = vec![0.0, 1.0, 0.0, 1.0, 0.0];
        assert_eq!(slope_sign_changes(&data, 0.01), 3.0);
        // Monotone ramp has none
        let ramp = vec![0.0, 1.0, 2.0, 3.0];
        assert_eq!(slope_sign_changes(&ramp, 0.01), 0.0);
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(root_mean_square(&[]), 0.0);
        assert_eq!(waveform_length(&[]), 0.0);
        assert_eq!(zero_crossings(&[], 0.01), 0.0);
    }
}
