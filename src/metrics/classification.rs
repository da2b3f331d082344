//! Classification metrics
//!
//! Provides multi-class classification metrics including:
//! - Confusion matrix computation over arbitrary integer labels
//! - Per-class precision, recall, F1
//! - Macro and weighted averaging
//! - sklearn-style classification reports
//!
//! Labels are `i64` so that sentinel values (e.g. −100) can flow through
//! unfiltered paths: a sentinel simply becomes one more class with zero
//! true positives, degrading the score instead of crashing.

use std::fmt;

/// Averaging strategy for multi-class metrics
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Average {
    /// Calculate metrics for each label, return unweighted mean
    Macro,
    /// Weighted mean by support (number of true instances per label)
    Weighted,
}

/// Confusion matrix for multi-class classification
///
/// Element [i][j] counts samples with true label `labels[i]` predicted as
/// `labels[j]`, where `labels` is the sorted union of values observed in
/// predictions and targets.
#[derive(Clone, Debug)]
pub struct ConfusionMatrix {
    matrix: Vec<Vec<usize>>,
    labels: Vec<i64>,
}

impl ConfusionMatrix {
    /// Build from predictions and ground truth
    pub fn from_predictions(y_pred: &[i64], y_true: &[i64]) -> Self {
        assert_eq!(
            y_pred.len(),
            y_true.len(),
            "Predictions and targets must have same length"
        );

        let mut labels: Vec<i64> = y_pred.iter().chain(y_true.iter()).copied().collect();
        labels.sort_unstable();
        labels.dedup();

        let n = labels.len();
        let mut matrix = vec![vec![0usize; n]; n];
        let index_of = |v: i64| labels.binary_search(&v).expect("label in set");

        for (&pred, &true_label) in y_pred.iter().zip(y_true.iter()) {
            matrix[index_of(true_label)][index_of(pred)] += 1;
        }

        Self { matrix, labels }
    }

    /// The distinct labels, sorted ascending
    pub fn labels(&self) -> &[i64] {
        &self.labels
    }

    /// Number of distinct labels
    pub fn n_classes(&self) -> usize {
        self.labels.len()
    }

    /// Count at [true_label_index][predicted_label_index]
    pub fn get(&self, true_idx: usize, pred_idx: usize) -> usize {
        self.matrix[true_idx][pred_idx]
    }

    /// True positives for the class at `idx`
    pub fn true_positives(&self, idx: usize) -> usize {
        self.matrix[idx][idx]
    }

    /// False positives for the class at `idx`
    pub fn false_positives(&self, idx: usize) -> usize {
        (0..self.n_classes())
            .filter(|&i| i != idx)
            .map(|i| self.matrix[i][idx])
            .sum()
    }

    /// False negatives for the class at `idx`
    pub fn false_negatives(&self, idx: usize) -> usize {
        (0..self.n_classes())
            .filter(|&j| j != idx)
            .map(|j| self.matrix[idx][j])
            .sum()
    }

    /// Support (true instance count) for the class at `idx`
    pub fn support(&self, idx: usize) -> usize {
        self.matrix[idx].iter().sum()
    }

    /// Total number of samples
    pub fn total(&self) -> usize {
        self.matrix.iter().flatten().sum()
    }

    /// Fraction of samples on the diagonal
    pub fn accuracy(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        let correct: usize = (0..self.n_classes()).map(|i| self.matrix[i][i]).sum();
        correct as f64 / total as f64
    }
}

impl fmt::Display for ConfusionMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Confusion Matrix:")?;
        write!(f, "          ")?;
        for label in &self.labels {
            write!(f, "Pred {label:>5} ")?;
        }
        writeln!(f)?;
        for (i, label) in self.labels.iter().enumerate() {
            write!(f, "True {label:>5}")?;
            for j in 0..self.n_classes() {
                write!(f, "{:>10} ", self.matrix[i][j])?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Per-class precision/recall/F1 with support counts
#[derive(Clone, Debug)]
pub struct MultiClassMetrics {
    /// Per-class precision
    pub precision: Vec<f64>,
    /// Per-class recall
    pub recall: Vec<f64>,
    /// Per-class F1 score
    pub f1: Vec<f64>,
    /// Per-class support (count)
    pub support: Vec<usize>,
}

impl MultiClassMetrics {
    /// Compute metrics from a confusion matrix
    pub fn from_confusion_matrix(cm: &ConfusionMatrix) -> Self {
        let n = cm.n_classes();
        let mut precision = Vec::with_capacity(n);
        let mut recall = Vec::with_capacity(n);
        let mut f1 = Vec::with_capacity(n);
        let mut support = Vec::with_capacity(n);

        for idx in 0..n {
            let tp = cm.true_positives(idx) as f64;
            let fp = cm.false_positives(idx) as f64;
            let fn_ = cm.false_negatives(idx) as f64;

            let p = if tp + fp > 0.0 { tp / (tp + fp) } else { 0.0 };
            let r = if tp + fn_ > 0.0 { tp / (tp + fn_) } else { 0.0 };
            let f = if p + r > 0.0 { 2.0 * p * r / (p + r) } else { 0.0 };

            precision.push(p);
            recall.push(r);
            f1.push(f);
            support.push(cm.support(idx));
        }

        Self { precision, recall, f1, support }
    }

    /// Compute from predictions and ground truth
    pub fn from_predictions(y_pred: &[i64], y_true: &[i64]) -> Self {
        Self::from_confusion_matrix(&ConfusionMatrix::from_predictions(y_pred, y_true))
    }

    /// Averaged precision
    pub fn precision_avg(&self, average: Average) -> f64 {
        self.average_metric(&self.precision, average)
    }

    /// Averaged recall
    pub fn recall_avg(&self, average: Average) -> f64 {
        self.average_metric(&self.recall, average)
    }

    /// Averaged F1
    pub fn f1_avg(&self, average: Average) -> f64 {
        self.average_metric(&self.f1, average)
    }

    fn average_metric(&self, values: &[f64], average: Average) -> f64 {
        match average {
            Average::Macro => {
                if values.is_empty() {
                    0.0
                } else {
                    values.iter().sum::<f64>() / values.len() as f64
                }
            }
            Average::Weighted => {
                let total_support: usize = self.support.iter().sum();
                if total_support == 0 {
                    return 0.0;
                }
                values
                    .iter()
                    .zip(self.support.iter())
                    .map(|(&v, &s)| v * s as f64)
                    .sum::<f64>()
                    / total_support as f64
            }
        }
    }
}

/// Fraction of positions where prediction equals target
pub fn accuracy(y_pred: &[i64], y_true: &[i64]) -> f64 {
    assert_eq!(
        y_pred.len(),
        y_true.len(),
        "Predictions and targets must have same length"
    );
    if y_pred.is_empty() {
        return 0.0;
    }
    let correct = y_pred
        .iter()
        .zip(y_true.iter())
        .filter(|(p, t)| p == t)
        .count();
    correct as f64 / y_pred.len() as f64
}

/// Binary precision over the positive (true) class
pub fn binary_precision(y_pred: &[bool], y_true: &[bool]) -> f64 {
    assert_eq!(
        y_pred.len(),
        y_true.len(),
        "Predictions and targets must have same length"
    );
    let mut tp = 0usize;
    let mut predicted_pos = 0usize;
    for (&p, &t) in y_pred.iter().zip(y_true.iter()) {
        if p {
            predicted_pos += 1;
            if t {
                tp += 1;
            }
        }
    }
    if predicted_pos == 0 {
        return 0.0;
    }
    tp as f64 / predicted_pos as f64
}

/// Binary recall over the positive (true) class
pub fn binary_recall(y_pred: &[bool], y_true: &[bool]) -> f64 {
    assert_eq!(
        y_pred.len(),
        y_true.len(),
        "Predictions and targets must have same length"
    );
    let mut tp = 0usize;
    let mut actual_pos = 0usize;
    for (&p, &t) in y_pred.iter().zip(y_true.iter()) {
        if t {
            actual_pos += 1;
            if p {
                tp += 1;
            }
        }
    }
    if actual_pos == 0 {
        return 0.0;
    }
    tp as f64 / actual_pos as f64
}

/// Binary F1: harmonic mean of positive-class precision and recall
pub fn binary_f1(y_pred: &[bool], y_true: &[bool]) -> f64 {
    let p = binary_precision(y_pred, y_true);
    let r = binary_recall(y_pred, y_true);
    if p + r == 0.0 {
        return 0.0;
    }
    2.0 * p * r / (p + r)
}

/// Weighted-average F1 over integer labels
pub fn weighted_f1(y_pred: &[i64], y_true: &[i64]) -> f64 {
    MultiClassMetrics::from_predictions(y_pred, y_true).f1_avg(Average::Weighted)
}

/// Generate an sklearn-style classification report
pub fn classification_report(y_pred: &[i64], y_true: &[i64]) -> String {
    let cm = ConfusionMatrix::from_predictions(y_pred, y_true);
    let metrics = MultiClassMetrics::from_confusion_matrix(&cm);

    let mut report = String::new();
    report.push_str(&format!(
        "{:>10} {:>10} {:>10} {:>10} {:>10}\n",
        "class", "precision", "recall", "f1-score", "support"
    ));
    for (i, label) in cm.labels().iter().enumerate() {
        report.push_str(&format!(
            "{:>10} {:>10.3} {:>10.3} {:>10.3} {:>10}\n",
            label, metrics.precision[i], metrics.recall[i], metrics.f1[i], metrics.support[i]
        ));
    }
    report.push_str(&format!(
        "\n{:>10} {:>10.3}\n{:>10} {:>10.3}\n",
        "accuracy",
        cm.accuracy(),
        "wgt f1",
        metrics.f1_avg(Average::Weighted)
    ));
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_accuracy_all_correct() {
        assert_relative_eq!(accuracy(&[1, 0, 1], &[1, 0, 1]), 1.0);
    }

    #[test]
    fn test_accuracy_partial() {
        assert_relative_eq!(accuracy(&[1, 0, 1], &[1, 1, 1]), 2.0 / 3.0);
    }

    #[test]
    fn test_accuracy_empty() {
        assert_relative_eq!(accuracy(&[], &[]), 0.0);
    }

    #[test]
    #[should_panic(expected = "same length")]
    fn test_accuracy_length_mismatch() {
        accuracy(&[1, 0], &[1]);
    }

    #[test]
    fn test_accuracy_with_sentinel_targets() {
        // Sentinel −100 in targets never matches a real prediction,
        // so it counts as an error rather than panicking.
        let acc = accuracy(&[1, 0, 1], &[1, -100, 0]);
        assert_relative_eq!(acc, 1.0 / 3.0);
    }

    #[test]
    fn test_confusion_matrix_basic() {
        let y_pred = vec![0, 1, 1, 2, 0];
        let y_true = vec![0, 1, 0, 2, 1];
        let cm = ConfusionMatrix::from_predictions(&y_pred, &y_true);

        assert_eq!(cm.n_classes(), 3);
        assert_eq!(cm.get(0, 0), 1); // true 0, pred 0
        assert_eq!(cm.get(0, 1), 1); // true 0, pred 1
        assert_eq!(cm.true_positives(1), 1);
        assert_eq!(cm.support(0), 2);
        assert_eq!(cm.total(), 5);
    }

    #[test]
    fn test_confusion_matrix_negative_labels() {
        let cm = ConfusionMatrix::from_predictions(&[1, 0, 1], &[1, -100, 0]);
        assert_eq!(cm.labels(), &[-100, 0, 1]);
        // Sentinel row has support 1, zero true positives
        assert_eq!(cm.support(0), 1);
        assert_eq!(cm.true_positives(0), 0);
    }

    #[test]
    fn test_confusion_matrix_display() {
        let cm = ConfusionMatrix::from_predictions(&[0, 1, 1], &[0, 1, 0]);
        let rendered = cm.to_string();

        assert!(rendered.starts_with("Confusion Matrix:"));
        // One header plus one row per label
        assert_eq!(rendered.lines().count(), 2 + cm.n_classes());
        for label in cm.labels() {
            assert!(rendered.contains(&format!("Pred {label:>5}")));
            assert!(rendered.contains(&format!("True {label:>5}")));
        }
    }

    #[test]
    fn test_binary_precision_recall() {
        let pred = vec![true, true, false];
        let truth = vec![true, false, false];
        assert_relative_eq!(binary_precision(&pred, &truth), 0.5);
        assert_relative_eq!(binary_recall(&pred, &truth), 1.0);
    }

    #[test]
    fn test_binary_f1_perfect() {
        let pred = vec![true, false, true];
        assert_relative_eq!(binary_f1(&pred, &pred), 1.0);
    }

    #[test]
    fn test_binary_f1_no_positives() {
        let pred = vec![false, false];
        let truth = vec![false, false];
        assert_relative_eq!(binary_f1(&pred, &truth), 0.0);
    }

    #[test]
    fn test_weighted_f1_matches_per_class_weighting() {
        // Two classes, support 3 and 1
        let y_true = vec![0, 0, 0, 1];
        let y_pred = vec![0, 0, 1, 1];
        let metrics = MultiClassMetrics::from_predictions(&y_pred, &y_true);

        // class 0: p=1.0, r=2/3, f1=0.8; class 1: p=0.5, r=1.0, f1=2/3
        assert_relative_eq!(metrics.f1[0], 0.8, epsilon = 1e-9);
        assert_relative_eq!(metrics.f1[1], 2.0 / 3.0, epsilon = 1e-9);

        let expected = (0.8 * 3.0 + (2.0 / 3.0) * 1.0) / 4.0;
        assert_relative_eq!(weighted_f1(&y_pred, &y_true), expected, epsilon = 1e-9);
    }

    #[test]
    fn test_macro_vs_weighted_average() {
        let y_true = vec![0, 0, 0, 1];
        let y_pred = vec![0, 0, 1, 1];
        let metrics = MultiClassMetrics::from_predictions(&y_pred, &y_true);
        let macro_f1 = metrics.f1_avg(Average::Macro);
        let wgt_f1 = metrics.f1_avg(Average::Weighted);
        // Majority class scores higher, so weighted > macro here
        assert!(wgt_f1 > macro_f1);
    }

    #[test]
    fn test_classification_report_contains_classes() {
        let report = classification_report(&[0, 1, 1], &[0, 1, 0]);
        assert!(report.contains("precision"));
        assert!(report.contains("accuracy"));
    }
}
