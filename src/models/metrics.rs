//! Evaluation metrics for binary classifiers
//!
//! Includes:
//! - Confusion matrix (rows = actual, columns = predicted)
//! - Classification report: precision, recall, F1 and support per class,
//!   plus accuracy, macro and weighted averages
//! - Log-loss on predicted probabilities

use serde::{Deserialize, Serialize};
use std::fmt;

/// Binary classes reported on, in display order
pub const CLASSES: [u8; 2] = [0, 1];

/// 2x2 confusion matrix indexed `[actual][predicted]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    counts: [[usize; 2]; 2],
}

impl ConfusionMatrix {
    pub fn from_labels(y_true: &[u8], y_pred: &[u8]) -> Self {
        assert_eq!(y_true.len(), y_pred.len(), "Arrays must have same length");

        let mut counts = [[0usize; 2]; 2];
        for (&t, &p) in y_true.iter().zip(y_pred.iter()) {
            counts[usize::from(t > 0)][usize::from(p > 0)] += 1;
        }
        Self { counts }
    }

    /// Number of rows with the given actual and predicted class
    pub fn get(&self, actual: u8, predicted: u8) -> usize {
        self.counts[usize::from(actual > 0)][usize::from(predicted > 0)]
    }

    pub fn total(&self) -> usize {
        self.counts.iter().flatten().sum()
    }

    pub fn correct(&self) -> usize {
        self.counts[0][0] + self.counts[1][1]
    }

    pub fn accuracy(&self) -> f64 {
        ratio(self.correct(), self.total())
    }

    /// Rows actually in `class`
    pub fn support(&self, class: u8) -> usize {
        CLASSES.iter().map(|&p| self.get(class, p)).sum()
    }

    /// Rows predicted as `class`
    pub fn predicted(&self, class: u8) -> usize {
        CLASSES.iter().map(|&a| self.get(a, class)).sum()
    }

    /// precision = TP / (TP + FP), 0 when nothing was predicted as `class`
    pub fn precision(&self, class: u8) -> f64 {
        ratio(self.get(class, class), self.predicted(class))
    }

    /// recall = TP / (TP + FN), 0 when `class` never occurs
    pub fn recall(&self, class: u8) -> f64 {
        ratio(self.get(class, class), self.support(class))
    }

    /// F1 = 2 * (precision * recall) / (precision + recall)
    pub fn f1_score(&self, class: u8) -> f64 {
        let precision = self.precision(class);
        let recall = self.recall(class);
        if precision + recall == 0.0 {
            0.0
        } else {
            2.0 * precision * recall / (precision + recall)
        }
    }
}

impl fmt::Display for ConfusionMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .counts
            .iter()
            .flatten()
            .map(|c| c.to_string().len())
            .max()
            .unwrap_or(1);

        let [[tn, fp], [fn_, tp]] = self.counts;
        writeln!(f, "[[{:>w$} {:>w$}]", tn, fp, w = width)?;
        write!(f, " [{:>w$} {:>w$}]]", fn_, tp, w = width)
    }
}

/// Scores for one class
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub class: u8,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

/// Averaged scores across classes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AverageMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

/// Per-class precision/recall/F1 with accuracy and averages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    pub classes: Vec<ClassMetrics>,
    pub accuracy: f64,
    pub macro_avg: AverageMetrics,
    pub weighted_avg: AverageMetrics,
}

impl ClassificationReport {
    pub fn from_labels(y_true: &[u8], y_pred: &[u8]) -> Self {
        Self::from_confusion(&ConfusionMatrix::from_labels(y_true, y_pred))
    }

    pub fn from_confusion(matrix: &ConfusionMatrix) -> Self {
        let classes: Vec<ClassMetrics> = CLASSES
            .iter()
            .map(|&class| ClassMetrics {
                class,
                precision: matrix.precision(class),
                recall: matrix.recall(class),
                f1: matrix.f1_score(class),
                support: matrix.support(class),
            })
            .collect();

        let total = matrix.total();
        let n_classes = classes.len() as f64;
        let macro_avg = AverageMetrics {
            precision: classes.iter().map(|c| c.precision).sum::<f64>() / n_classes,
            recall: classes.iter().map(|c| c.recall).sum::<f64>() / n_classes,
            f1: classes.iter().map(|c| c.f1).sum::<f64>() / n_classes,
            support: total,
        };

        let weighted = |score: fn(&ClassMetrics) -> f64| {
            if total == 0 {
                0.0
            } else {
                classes
                    .iter()
                    .map(|c| score(c) * c.support as f64)
                    .sum::<f64>()
                    / total as f64
            }
        };
        let weighted_avg = AverageMetrics {
            precision: weighted(|c| c.precision),
            recall: weighted(|c| c.recall),
            f1: weighted(|c| c.f1),
            support: total,
        };

        Self {
            accuracy: matrix.accuracy(),
            classes,
            macro_avg,
            weighted_avg,
        }
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:>12} {:>9} {:>9} {:>9} {:>9}",
            "", "precision", "recall", "f1-score", "support"
        )?;
        writeln!(f)?;
        for c in &self.classes {
            writeln!(
                f,
                "{:>12} {:>9.2} {:>9.2} {:>9.2} {:>9}",
                c.class, c.precision, c.recall, c.f1, c.support
            )?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "{:>12} {:>9} {:>9} {:>9.2} {:>9}",
            "accuracy", "", "", self.accuracy, self.weighted_avg.support
        )?;
        for (name, avg) in [("macro avg", &self.macro_avg), ("weighted avg", &self.weighted_avg)] {
            writeln!(
                f,
                "{:>12} {:>9.2} {:>9.2} {:>9.2} {:>9}",
                name, avg.precision, avg.recall, avg.f1, avg.support
            )?;
        }
        Ok(())
    }
}

/// Mean binary cross-entropy, with probabilities clipped away from 0 and 1
pub fn log_loss(y_true: &[u8], probabilities: &[f64]) -> f64 {
    assert_eq!(y_true.len(), probabilities.len(), "Arrays must have same length");

    if y_true.is_empty() {
        return 0.0;
    }

    const EPS: f64 = 1e-15;
    let total: f64 = y_true
        .iter()
        .zip(probabilities.iter())
        .map(|(&y, &p)| {
            let p = p.clamp(EPS, 1.0 - EPS);
            if y > 0 {
                -p.ln()
            } else {
                -(1.0 - p).ln()
            }
        })
        .sum();

    total / y_true.len() as f64
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}
