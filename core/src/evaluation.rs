//! Live evaluation of the loaded model against the dataset's ground truth.

use crate::{
    dataset::Dataset,
    error::{ChurnError, ChurnResult},
    model::ChurnModel,
    risk::ChurnPrediction,
    scorer::{assess_batch, ProbabilitySource},
};
use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ConfusionMatrix {
    pub true_negative:  usize,
    pub false_positive: usize,
    pub false_negative: usize,
    pub true_positive:  usize,
}

impl ConfusionMatrix {
    pub fn total(&self) -> usize {
        self.true_negative + self.false_positive + self.false_negative + self.true_positive
    }

    pub fn accuracy(&self) -> f64 {
        ratio(self.true_positive + self.true_negative, self.total())
    }

    pub fn precision(&self) -> f64 {
        ratio(self.true_positive, self.true_positive + self.false_positive)
    }

    pub fn recall(&self) -> f64 {
        ratio(self.true_positive, self.true_positive + self.false_negative)
    }

    pub fn f1(&self) -> f64 {
        let (p, r) = (self.precision(), self.recall());
        if p + r == 0.0 { 0.0 } else { 2.0 * p * r / (p + r) }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Evaluation {
    pub model:     String,
    pub confusion: ConfusionMatrix,
    pub accuracy:  f64,
    pub precision: f64,
    pub recall:    f64,
    pub f1:        f64,
    /// None when the dataset holds a single class.
    pub auc:       Option<f64>,
}

pub fn evaluate(model: &dyn ChurnModel, dataset: &Dataset) -> ChurnResult<Evaluation> {
    if dataset.is_empty() {
        return Err(ChurnError::DegenerateBatch { size: 0 });
    }

    let records = dataset.records();
    let assessments = assess_batch(&records, &ProbabilitySource::Model(model))?;

    let mut confusion = ConfusionMatrix::default();
    let mut scored = Vec::with_capacity(assessments.len());

    for (entry, a) in dataset.entries().iter().zip(&assessments) {
        let predicted = a.prediction == ChurnPrediction::WillChurn;
        match (entry.exited, predicted) {
            (false, false) => confusion.true_negative += 1,
            (false, true)  => confusion.false_positive += 1,
            (true, false)  => confusion.false_negative += 1,
            (true, true)   => confusion.true_positive += 1,
        }
        scored.push((a.probability, entry.exited));
    }

    Ok(Evaluation {
        model:     model.name().to_string(),
        confusion,
        accuracy:  confusion.accuracy(),
        precision: confusion.precision(),
        recall:    confusion.recall(),
        f1:        confusion.f1(),
        auc:       roc_auc(&scored),
    })
}

/// ROC AUC via the Mann-Whitney rank statistic; tied scores share the
/// average rank, which counts positive/negative ties as one half.
pub fn roc_auc(scored: &[(f64, bool)]) -> Option<f64> {
    let positives = scored.iter().filter(|(_, y)| *y).count();
    let negatives = scored.len() - positives;
    if positives == 0 || negatives == 0 {
        return None;
    }

    let mut sorted: Vec<(f64, bool)> = scored.to_vec();
    sorted.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

    let mut rank_sum = 0.0;
    let mut i = 0;
    while i < sorted.len() {
        let mut j = i;
        while j + 1 < sorted.len() && sorted[j + 1].0 == sorted[i].0 {
            j += 1;
        }
        // ranks are 1-based: i+1 ..= j+1
        let avg_rank = (i + j + 2) as f64 / 2.0;
        rank_sum += avg_rank * sorted[i..=j].iter().filter(|(_, y)| *y).count() as f64;
        i = j + 1;
    }

    let p = positives as f64;
    let n = negatives as f64;
    Some((rank_sum - p * (p + 1.0) / 2.0) / (p * n))
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 { 0.0 } else { num as f64 / den as f64 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auc_of_perfect_ranking_is_one() {
        let scored = [(0.1, false), (0.2, false), (0.8, true), (0.9, true)];
        assert_eq!(roc_auc(&scored), Some(1.0));
    }

    #[test]
    fn auc_of_all_ties_is_one_half() {
        let scored = [(0.5, false), (0.5, true), (0.5, false), (0.5, true)];
        assert_eq!(roc_auc(&scored), Some(0.5));
    }

    #[test]
    fn auc_undefined_for_one_class() {
        assert_eq!(roc_auc(&[(0.3, true), (0.7, true)]), None);
    }

    #[test]
    fn f1_is_zero_without_positives() {
        let m = ConfusionMatrix { true_negative: 5, ..Default::default() };
        assert_eq!(m.precision(), 0.0);
        assert_eq!(m.f1(), 0.0);
        assert_eq!(m.accuracy(), 1.0);
    }
}
