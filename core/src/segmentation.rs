//! Risk segmentation view: simulated segments over a seeded sample.
//!
//! Draws a sample of customers, scores them with the heuristic source,
//! and compares the simulated segments against ground truth. The real
//! model is not called here.

use crate::{
    dataset::{percent, Dataset, DatasetEntry},
    error::{ChurnError, ChurnResult},
    risk::RiskLabel,
    rng::{RngBank, StreamSlot},
    scorer::{assess_batch, AgeBounds, HeuristicSource, ProbabilitySource},
    types::{CustomerId, Probability},
};
use serde::Serialize;

pub const DEFAULT_SAMPLE_SIZE: usize = 2000;
pub const HIGH_RISK_TABLE_ROWS: usize = 20;

#[derive(Debug, Clone, Copy)]
pub struct SegmentationOptions {
    pub sample_size: usize,
    pub heuristic:   HeuristicSource,
}

impl Default for SegmentationOptions {
    fn default() -> Self {
        Self {
            sample_size: DEFAULT_SAMPLE_SIZE,
            heuristic:   HeuristicSource::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentSummary {
    pub label:             RiskLabel,
    pub count:             usize,
    pub share:             f64,
    /// Observed churn rate (%) inside the segment; None when empty.
    pub actual_churn_rate: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HighRiskProfile {
    pub count:             usize,
    pub avg_age:           f64,
    pub avg_balance:       f64,
    pub avg_credit_score:  f64,
    pub actual_churn_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HighRiskRow {
    pub customer_id:       CustomerId,
    pub age:               u32,
    pub geography:         String,
    pub balance:           f64,
    pub num_products:      u32,
    pub is_active_member:  bool,
    pub churn_probability: Probability,
    pub exited:            bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentationReport {
    pub seed:        u64,
    pub sample_size: usize,
    pub segments:    Vec<SegmentSummary>,
    pub high_risk:   Option<HighRiskProfile>,
    pub high_risk_customers: Vec<HighRiskRow>,
}

impl SegmentationReport {
    pub fn segment(&self, label: RiskLabel) -> Option<&SegmentSummary> {
        self.segments.iter().find(|s| s.label == label)
    }

    pub fn count(&self, label: RiskLabel) -> usize {
        self.segment(label).map(|s| s.count).unwrap_or(0)
    }
}

pub fn segment(dataset: &Dataset, options: &SegmentationOptions) -> ChurnResult<SegmentationReport> {
    if dataset.is_empty() || options.sample_size == 0 {
        return Err(ChurnError::DegenerateBatch { size: 0 });
    }

    let seed = options.heuristic.seed;
    let mut sampler = RngBank::new(seed).for_stream(StreamSlot::Sample);
    let sample: Vec<&DatasetEntry> = dataset.sample(options.sample_size, &mut sampler);
    let records: Vec<_> = sample.iter().map(|e| e.record.clone()).collect();

    let source = ProbabilitySource::Heuristic(options.heuristic);
    let assessments = assess_batch(&records, &source)?;
    let n = sample.len();

    let segments = RiskLabel::ALL
        .iter()
        .map(|&label| {
            let members: Vec<&DatasetEntry> = sample
                .iter()
                .zip(&assessments)
                .filter(|(_, a)| a.label == label)
                .map(|(e, _)| *e)
                .collect();
            let churned = members.iter().filter(|e| e.exited).count();
            SegmentSummary {
                label,
                count: members.len(),
                share: percent(members.len(), n),
                actual_churn_rate: if members.is_empty() {
                    None
                } else {
                    Some(percent(churned, members.len()))
                },
            }
        })
        .collect();

    let high: Vec<(&DatasetEntry, Probability)> = sample
        .iter()
        .zip(&assessments)
        .filter(|(_, a)| a.label == RiskLabel::High)
        .map(|(e, a)| (*e, a.probability))
        .collect();

    let high_risk = if high.is_empty() {
        None
    } else {
        let k = high.len() as f64;
        Some(HighRiskProfile {
            count:             high.len(),
            avg_age:           high.iter().map(|(e, _)| e.record.age as f64).sum::<f64>() / k,
            avg_balance:       high.iter().map(|(e, _)| e.record.balance).sum::<f64>() / k,
            avg_credit_score:  high.iter().map(|(e, _)| e.record.credit_score as f64).sum::<f64>() / k,
            actual_churn_rate: percent(high.iter().filter(|(e, _)| e.exited).count(), high.len()),
        })
    };

    let high_risk_customers = high
        .iter()
        .take(HIGH_RISK_TABLE_ROWS)
        .map(|(e, p)| HighRiskRow {
            customer_id:       e.customer_id,
            age:               e.record.age,
            geography:         e.record.geography.clone(),
            balance:           e.record.balance,
            num_products:      e.record.num_products,
            is_active_member:  e.record.is_active_member,
            churn_probability: *p,
            exited:            e.exited,
        })
        .collect();

    log::info!(
        "segmentation: seed={seed} sample={n} high_risk={}",
        high.len(),
    );

    Ok(SegmentationReport {
        seed,
        sample_size: n,
        segments,
        high_risk,
        high_risk_customers,
    })
}

/// Age bounds for the heuristic, per the configured normalization mode.
pub fn age_bounds_for(dataset: &Dataset, use_dataset_bounds: bool) -> AgeBounds {
    match (use_dataset_bounds, dataset.age_bounds()) {
        (true, Some((min, max))) if max > min => AgeBounds::Fixed { min, max },
        _ => AgeBounds::Batch,
    }
}
