//! Second-order complexity descriptors and linear-prediction coefficients

use super::time::variance;

/// Hjorth parameters: activity, mobility, complexity.
///
/// Built from variance ratios of successive differences. A constant signal
/// yields [0, 0, 0] rather than dividing by zero.
pub fn hjorth(data: &[f32]) -> [f32; 3] {
    let activity = variance(data);
    if activity == 0.0 || data.len() < 3 {
        return [activity, 0.0, 0.0];
    }
    let d1: Vec<f32> = data.windows(2).map(|w| w[1] - w[0]).collect();
    let d2: Vec<f32> = d1.windows(2).map(|w| w[1] - w[0]).collect();

    let var_d1 = variance(&d1);
    let mobility = (var_d1 / activity).sqrt();
    if var_d1 == 0.0 || mobility == 0.0 {
        return [activity, mobility, 0.0];
    }
    let complexity = (variance(&d2) / var_d1).sqrt() / mobility;
    [activity, mobility, complexity]
}

/// Autoregressive model coefficients via Levinson-Durbin on the biased
/// autocorrelation.
///
/// Returns exactly `order` coefficients. Degenerate input (constant signal,
/// too few samples, or a vanishing prediction error mid-recursion) fills the
/// unresolved tail with zeros instead of failing.
pub fn ar_coefficients(data: &[f32], order: usize) -> Vec<f32> {
    if order == 0 {
        return Vec::new();
    }
    let n = data.len();
    if n <= order {
        return vec![0.0; order];
    }

    // Biased autocorrelation
    let mut r = vec![0.0f32; order + 1];
    for (lag, slot) in r.iter_mut().enumerate() {
        *slot = data[..n - lag]
            .iter()
            .zip(&data[lag..])
            .map(|(a, b)| a * b)
            .sum::<f32>()
            / n as f32;
    }
    if r[0] == 0.0 {
        return vec![0.0; order];
    }

    let mut a = vec![0.0f32; order + 1];
    a[0] = 1.0;
    let mut error = r[0];

    for i in 1..=order {
        let mut acc = r[i];
        for j in 1..i {
            acc += a[j] * r[i - j];
        }
        if error <= 0.0 {
            break;
        }
        let reflection = -acc / error;

        let previous = a.clone();
        for j in 1..i {
            a[j] = previous[j] + reflection * previous[i - j];
        }
        a[i] = reflection;
        error *= 1.0 - reflection * reflection;
    }

    a[1..].to_vec()
}
