//! Classification metrics: accuracy, weighted F1 and a plain-text report

/// Fraction of correct predictions
pub fn accuracy(y_true: &[usize], y_pred: &[usize]) -> f32 {
    if y_true.is_empty() {
        return 0.0;
    }
    let correct = y_true
        .iter()
        .zip(y_pred)
        .filter(|(a, b)| a == b)
        .count();
    correct as f32 / y_true.len() as f32
}

/// Per-class precision, recall, F1 and support
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassScores {
    pub precision: f32,
    pub recall: f32,
    pub f1: f32,
    pub support: usize,
}

/// Scores for one class, with zero-division guarded to 0.0
pub fn class_scores(y_true: &[usize], y_pred: &[usize], class: usize) -> ClassScores {
    let mut tp = 0usize;
    let mut fp = 0usize;
    let mut fn_ = 0usize;
    for (&t, &p) in y_true.iter().zip(y_pred) {
        match (t == class, p == class) {
            (true, true) => tp += 1,
            (false, true) => fp += 1,
            (true, false) => fn_ += 1,
            (false, false) => {}
        }
    }
    let precision = if tp + fp == 0 {
        0.0
    } else {
        tp as f32 / (tp + fp) as f32
    };
    let recall = if tp + fn_ == 0 {
        0.0
    } else {
        tp as f32 / (tp + fn_) as f32
    };
    let f1 = if precision + recall == 0.0 {
        0.0
    } else {
        2.0 * precision * recall / (precision + recall)
    };
    ClassScores {
        precision,
        recall,
        f1,
        support: tp + fn_,
    }
}

/// Support-weighted mean of per-class F1 scores
pub fn weighted_f1(y_true: &[usize], y_pred: &[usize], n_classes: usize) -> f32 {
    if y_true.is_empty() {
        return 0.0;
    }
    let mut total = 0.0;
    for class in 0..n_classes {
        let scores = class_scores(y_true, y_pred, class);
        total += scores.f1 * scores.support as f32;
    }
    total / y_true.len() as f32
}

/// Plain-text per-class breakdown plus overall accuracy
pub fn classification_report(
    y_true: &[usize],
    y_pred: &[usize],
    class_names: &[String],
) -> String {
    let mut report = String::new();
    report.push_str(&format!(
        "{:<16} {:>9} {:>9} {:>9} {:>9}\n",
        "", "precision", "recall", "f1-score", "support"
    ));
    report.push('\n');
    for (class, name) in class_names.iter().enumerate() {
        let s = class_scores(y_true, y_pred, class);
        report.push_str(&format!(
            "{:<16} {:>9.3} {:>9.3} {:>9.3} {:>9}\n",
            name, s.precision, s.recall, s.f1, s.support
        ));
    }
    report.push('\n');
    report.push_str(&format!(
        "{:<16} {:>9.3} (n={})\n",
        "accuracy",
        accuracy(y_true, y_pred),
        y_true.len()
    ));
    report.push_str(&format!(
        "{:<16} {:>9.3}\n",
        "weighted f1",
        weighted_f1(y_true, y_pred, class_names.len())
    ));
    report
}
