//! Scores for held-out species predictions.

/// Probabilities are clipped to `[EPS, 1 - EPS]` before taking logs.
const LOG_LOSS_EPS: f32 = 1e-15;

/// Counts of (true species, predicted species) pairs.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfusionMatrix {
    pub n_classes: usize,
    /// Row-major, rows are the true class.
    pub counts: Vec<u32>,
}

impl ConfusionMatrix {
    pub fn new(n_classes: usize) -> Self {
        Self {
            n_classes,
            counts: vec![0; n_classes * n_classes],
        }
    }

    /// Tally aligned label codes; pairs with an out-of-range code are skipped.
    pub fn from_predictions(n_classes: usize, truth: &[usize], predicted: &[usize]) -> Self {
        truth
            .iter()
            .zip(predicted)
            .fold(Self::new(n_classes), |mut cm, (&t, &p)| {
                cm.add(t, p);
                cm
            })
    }

    pub fn add(&mut self, truth: usize, predicted: usize) {
        if let Some(cell) = self.cell(truth, predicted) {
            self.counts[cell] = self.counts[cell].saturating_add(1);
        }
    }

    pub fn get(&self, truth: usize, predicted: usize) -> u32 {
        self.cell(truth, predicted)
            .map_or(0, |cell| self.counts[cell])
    }

    fn cell(&self, truth: usize, predicted: usize) -> Option<usize> {
        (truth < self.n_classes && predicted < self.n_classes)
            .then(|| truth * self.n_classes + predicted)
    }

    fn row_total(&self, truth: usize) -> u32 {
        (0..self.n_classes).map(|p| self.get(truth, p)).sum()
    }

    fn column_total(&self, predicted: usize) -> u32 {
        (0..self.n_classes).map(|t| self.get(t, predicted)).sum()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PerClassStats {
    pub precision: f32,
    pub recall: f32,
    /// Rows whose true label is this class.
    pub support: u32,
}

/// Precision and recall for each class; an empty denominator scores 0.
pub fn precision_recall_by_class(cm: &ConfusionMatrix) -> Vec<PerClassStats> {
    let ratio = |hits: u32, total: u32| {
        if total == 0 {
            0.0
        } else {
            hits as f32 / total as f32
        }
    };
    (0..cm.n_classes)
        .map(|class| {
            let hits = cm.get(class, class);
            let support = cm.row_total(class);
            PerClassStats {
                precision: ratio(hits, cm.column_total(class)),
                recall: ratio(hits, support),
                support,
            }
        })
        .collect()
}

/// Diagonal share of all tallied pairs.
pub fn accuracy(cm: &ConfusionMatrix) -> f32 {
    let total: u64 = cm.counts.iter().map(|&c| u64::from(c)).sum();
    if total == 0 {
        return 0.0;
    }
    let correct: u64 = (0..cm.n_classes).map(|c| u64::from(cm.get(c, c))).sum();
    correct as f32 / total as f32
}

/// Fraction of positions where `predicted` equals `truth`.
pub fn accuracy_score(truth: &[usize], predicted: &[usize]) -> f32 {
    if truth.is_empty() {
        return 0.0;
    }
    let correct = truth.iter().zip(predicted).filter(|(t, p)| t == p).count();
    correct as f32 / truth.len() as f32
}

/// Mean negative log-likelihood of the true class (`mlogloss`).
///
/// `probs[i]` holds one probability per class for row `i`.
pub fn log_loss(probs: &[Vec<f32>], truth: &[usize]) -> f32 {
    if truth.is_empty() {
        return 0.0;
    }
    let total: f64 = probs
        .iter()
        .zip(truth)
        .map(|(row, &label)| {
            let p = row.get(label).copied().unwrap_or(0.0);
            -f64::from(p.clamp(LOG_LOSS_EPS, 1.0 - LOG_LOSS_EPS)).ln()
        })
        .sum();
    (total / truth.len() as f64) as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confusion_matrix_drives_accuracy_and_recall() {
        let truth = [0, 0, 1, 1, 2, 2];
        let predicted = [0, 1, 1, 1, 2, 0];
        let cm = ConfusionMatrix::from_predictions(3, &truth, &predicted);

        assert_eq!(cm.get(0, 1), 1);
        assert_eq!(cm.get(2, 0), 1);
        assert!((accuracy(&cm) - 4.0 / 6.0).abs() < 1e-6);
        assert!((accuracy_score(&truth, &predicted) - 4.0 / 6.0).abs() < 1e-6);

        let stats = precision_recall_by_class(&cm);
        assert_eq!(stats[1].support, 2);
        assert!((stats[1].recall - 1.0).abs() < 1e-6);
        assert!((stats[1].precision - 2.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn out_of_range_codes_are_ignored() {
        let mut cm = ConfusionMatrix::new(2);
        cm.add(5, 0);
        cm.add(0, 5);
        assert_eq!(accuracy(&cm), 0.0);
        assert!(cm.counts.iter().all(|&c| c == 0));
    }

    #[test]
    fn log_loss_matches_hand_computation() {
        let probs = vec![vec![0.8, 0.2], vec![0.4, 0.6]];
        let loss = log_loss(&probs, &[0, 1]);
        let expected = -((0.8f64).ln() + (0.6f64).ln()) / 2.0;
        assert!((loss as f64 - expected).abs() < 1e-6);
    }

    #[test]
    fn log_loss_clips_zero_probability() {
        let loss = log_loss(&[vec![1.0, 0.0]], &[1]);
        assert!(loss.is_finite());
        assert!(loss > 30.0);
    }
}
