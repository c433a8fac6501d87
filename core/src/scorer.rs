//! Risk scorer: maps customer records to churn probabilities and labels.
//!
//! Two probability sources:
//!   1. Heuristic: a fixed additive formula over age, activity and product
//!      count, plus seeded Gaussian noise. Used for bulk segmentation
//!      without calling the real model.
//!   2. Model: shapes the 12-column feature row and defers to the loaded
//!      classifier.
//!
//! Both feed the same labeling (see `risk`). Scoring is pure: the only
//! state is the noise stream, re-derived from the seed for every batch.

use crate::{
    customer::{CustomerRecord, FeatureRow, MAX_PRODUCTS},
    error::{ChurnError, ChurnResult},
    model::ChurnModel,
    risk::RiskAssessment,
    rng::{RngBank, StreamSlot},
    types::{Probability, DEFAULT_SEED},
};
use serde::{Deserialize, Serialize};

// ── Heuristic source ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeuristicWeights {
    pub base:               f64,
    pub age_weight:         f64,
    pub inactivity_penalty: f64,
    pub product_penalty:    f64,
    pub noise_std:          f64,
}

impl Default for HeuristicWeights {
    fn default() -> Self {
        Self {
            base:               0.2,
            age_weight:         0.5,
            inactivity_penalty: 0.2,
            product_penalty:    0.1,
            noise_std:          0.1,
        }
    }
}

/// Where the age normalization takes its min/max from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum AgeBounds {
    /// Min/max of whatever batch is being scored.
    Batch,
    /// Fixed bounds, typically the full dataset's.
    Fixed { min: u32, max: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeuristicSource {
    pub weights: HeuristicWeights,
    pub bounds:  AgeBounds,
    pub seed:    u64,
}

impl Default for HeuristicSource {
    fn default() -> Self {
        Self {
            weights: HeuristicWeights::default(),
            bounds:  AgeBounds::Batch,
            seed:    DEFAULT_SEED,
        }
    }
}

impl HeuristicSource {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_bounds(mut self, bounds: AgeBounds) -> Self {
        self.bounds = bounds;
        self
    }

    /// One probability per record, in batch order. Noise is drawn in the
    /// same order, so identical batches give bit-identical output.
    pub fn probabilities(&self, records: &[CustomerRecord]) -> ChurnResult<Vec<Probability>> {
        if records.is_empty() {
            return Err(ChurnError::DegenerateBatch { size: 0 });
        }

        let (min_age, max_age) = match self.bounds {
            AgeBounds::Batch => {
                let min = records.iter().map(|r| r.age).min().unwrap_or(0);
                let max = records.iter().map(|r| r.age).max().unwrap_or(0);
                (min, max)
            }
            AgeBounds::Fixed { min, max } => {
                if max <= min {
                    return Err(ChurnError::invalid(
                        "age_bounds",
                        format!("max ({max}) must exceed min ({min})"),
                    ));
                }
                (min, max)
            }
        };

        let spread = max_age.saturating_sub(min_age) as f64;
        if spread == 0.0 {
            log::warn!(
                "scorer: no age spread across {} record(s); age factor falls back to 0",
                records.len(),
            );
        }

        let w = &self.weights;
        let mut noise = RngBank::new(self.seed).for_stream(StreamSlot::Noise);

        let probabilities = records
            .iter()
            .map(|r| {
                let age_factor = if spread == 0.0 {
                    0.0
                } else {
                    ((r.age as f64 - min_age as f64) / spread).clamp(0.0, 1.0)
                };
                let inactivity = if r.is_active_member { 0.0 } else { w.inactivity_penalty };
                let products = (MAX_PRODUCTS as f64 - r.num_products as f64) * w.product_penalty;
                let eps = noise.gaussian(0.0, w.noise_std);

                (w.base + age_factor * w.age_weight + inactivity + products + eps).clamp(0.0, 1.0)
            })
            .collect();

        Ok(probabilities)
    }
}

// ── Probability source ───────────────────────────────────────────────────────

/// Strategy selector for `assess` / `assess_batch`.
#[derive(Clone, Copy)]
pub enum ProbabilitySource<'a> {
    Heuristic(HeuristicSource),
    Model(&'a dyn ChurnModel),
}

impl<'a> ProbabilitySource<'a> {
    /// The model-backed source, or MissingArtifact when nothing was loaded.
    pub fn model(model: Option<&'a dyn ChurnModel>, path: &str) -> ChurnResult<Self> {
        model
            .map(ProbabilitySource::Model)
            .ok_or_else(|| ChurnError::missing("model bundle", path))
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Heuristic(_) => "heuristic",
            Self::Model(m)     => m.name(),
        }
    }
}

/// Score one record. A heuristic score of a single record is a batch of one.
pub fn assess(record: &CustomerRecord, source: &ProbabilitySource<'_>) -> ChurnResult<RiskAssessment> {
    let mut out = assess_batch(std::slice::from_ref(record), source)?;
    out.pop().ok_or(ChurnError::DegenerateBatch { size: 0 })
}

pub fn assess_batch(
    records: &[CustomerRecord],
    source: &ProbabilitySource<'_>,
) -> ChurnResult<Vec<RiskAssessment>> {
    let probabilities = match source {
        ProbabilitySource::Heuristic(h) => h.probabilities(records)?,
        ProbabilitySource::Model(model) => records
            .iter()
            .map(|r| model_probability(*model, r))
            .collect::<ChurnResult<Vec<_>>>()?,
    };

    log::debug!(
        "scorer: assessed {} record(s) with {} source",
        probabilities.len(),
        source.name(),
    );

    Ok(probabilities
        .into_iter()
        .map(RiskAssessment::from_probability)
        .collect())
}

fn model_probability(model: &dyn ChurnModel, record: &CustomerRecord) -> ChurnResult<Probability> {
    let row = FeatureRow::assemble(record)?;

    for (feature, value) in [("Geography", &row.geography), ("Gender", &row.gender)] {
        let vocab = model.vocabulary(feature).ok_or_else(|| {
            ChurnError::invalid(feature, "model has no trained vocabulary for this feature")
        })?;
        if !vocab.iter().any(|v| v == value) {
            return Err(ChurnError::invalid(
                feature,
                format!("'{value}' is not in the model's trained vocabulary"),
            ));
        }
    }

    let p = model.predict_probability(&row)?;
    if !(0.0..=1.0).contains(&p) {
        return Err(ChurnError::invalid(
            "probability",
            format!("model returned {p}, expected a value in [0, 1]"),
        ));
    }
    Ok(p)
}
