//! The dashboard engine. Owns the loaded artifacts and answers page queries.
//!
//! RULES:
//!   - Artifacts load exactly once, in `Artifacts::load`, and are immutable after.
//!   - A missing or unreadable artifact disables the views that need it.
//!     It never aborts the process.
//!   - Every query is a pure function of the config and the artifacts.

use crate::{
    config::{AgeNormalization, DashboardConfig},
    customer::CustomerRecord,
    dataset::{ColumnStats, Dataset, Dimension, GroupChurn, Overview},
    error::{ChurnError, ChurnResult},
    evaluation::{evaluate, Evaluation},
    impact::{HighRiskFocus, InterventionScenario},
    model::{ChurnModel, ModelBundle, ModelCard},
    risk::{RiskAssessment, RiskLabel, Recommendation},
    scorer::{assess, AgeBounds, HeuristicSource, ProbabilitySource},
    segmentation::{age_bounds_for, segment, SegmentationOptions, SegmentationReport},
};
use serde::Serialize;
use std::path::Path;

pub struct Artifacts {
    pub dataset: Option<Dataset>,
    pub model:   Option<ModelBundle>,
}

impl Artifacts {
    /// Load both artifacts. Failures are logged and leave the slot empty.
    pub fn load(config: &DashboardConfig) -> Self {
        let dataset = match Dataset::load(Path::new(&config.dataset_path)) {
            Ok(d) => Some(d),
            Err(e) => {
                log::warn!("dataset unavailable, dependent views disabled: {e}");
                None
            }
        };
        let model = match ModelBundle::load(Path::new(&config.model_path)) {
            Ok(m) => Some(m),
            Err(e) => {
                log::warn!("model unavailable, dependent views disabled: {e}");
                None
            }
        };
        Self { dataset, model }
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct ArtifactStatus {
    pub dataset_loaded: bool,
    pub model_loaded:   bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct Exploration {
    pub overview:      Overview,
    pub by_geography:  Vec<GroupChurn>,
    pub by_gender:     Vec<GroupChurn>,
    pub by_products:   Vec<GroupChurn>,
    pub statistics:    Vec<ColumnStats>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Performance {
    pub card:       ModelCard,
    /// None when the dataset is unavailable.
    pub evaluation: Option<Evaluation>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Prediction {
    pub assessment:       RiskAssessment,
    pub recommendation:   Recommendation,
    pub headline:         &'static str,
    pub actions:          &'static [&'static str],
    pub engagement_score: f64,
    pub clv_proxy:        f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Insights {
    pub overview:        Overview,
    pub revenue_at_risk: f64,
    pub scenarios:       Vec<InterventionScenario>,
    pub high_risk_focus: Option<HighRiskFocus>,
}

pub struct ChurnEngine {
    pub config: DashboardConfig,
    artifacts:  Artifacts,
}

impl ChurnEngine {
    pub fn new(config: DashboardConfig, artifacts: Artifacts) -> Self {
        Self { config, artifacts }
    }

    /// Build the engine, loading artifacts from the configured paths.
    pub fn load(config: DashboardConfig) -> Self {
        let artifacts = Artifacts::load(&config);
        Self::new(config, artifacts)
    }

    pub fn status(&self) -> ArtifactStatus {
        ArtifactStatus {
            dataset_loaded: self.artifacts.dataset.is_some(),
            model_loaded:   self.artifacts.model.is_some(),
        }
    }

    pub fn dataset(&self) -> ChurnResult<&Dataset> {
        self.artifacts
            .dataset
            .as_ref()
            .ok_or_else(|| ChurnError::missing("dataset", self.config.dataset_path.as_str()))
    }

    pub fn model(&self) -> ChurnResult<&ModelBundle> {
        self.artifacts
            .model
            .as_ref()
            .ok_or_else(|| ChurnError::missing("model bundle", self.config.model_path.as_str()))
    }

    pub fn model_source(&self) -> ChurnResult<ProbabilitySource<'_>> {
        let model = self.artifacts.model.as_ref().map(|m| m as &dyn ChurnModel);
        ProbabilitySource::model(model, &self.config.model_path)
    }

    /// Heuristic source with the configured weights, seed and age bounds.
    pub fn heuristic_source(&self) -> HeuristicSource {
        let use_dataset_bounds = self.config.age_normalization == AgeNormalization::Dataset;
        let bounds = self
            .artifacts
            .dataset
            .as_ref()
            .map(|d| age_bounds_for(d, use_dataset_bounds))
            .unwrap_or(AgeBounds::Batch);
        HeuristicSource {
            weights: self.config.heuristic,
            bounds,
            seed:    self.config.seed,
        }
    }

    pub fn overview(&self) -> ChurnResult<Overview> {
        Ok(self.dataset()?.overview())
    }

    pub fn exploration(&self) -> ChurnResult<Exploration> {
        let d = self.dataset()?;
        Ok(Exploration {
            overview:     d.overview(),
            by_geography: d.churn_rate_by(Dimension::Geography),
            by_gender:    d.churn_rate_by(Dimension::Gender),
            by_products:  d.churn_rate_by(Dimension::NumOfProducts),
            statistics:   d.describe(),
        })
    }

    pub fn performance(&self) -> ChurnResult<Performance> {
        let model = self.model()?;
        let evaluation = match self.dataset().and_then(|d| evaluate(model, d)) {
            Ok(e) => Some(e),
            Err(e) => {
                log::warn!("performance: skipping live evaluation: {e}");
                None
            }
        };
        Ok(Performance {
            card: model.card().clone(),
            evaluation,
        })
    }

    pub fn segmentation(&self, sample_size: Option<usize>) -> ChurnResult<SegmentationReport> {
        let options = SegmentationOptions {
            sample_size: sample_size.unwrap_or(self.config.sample_size),
            heuristic:   self.heuristic_source(),
        };
        segment(self.dataset()?, &options)
    }

    /// What-if prediction through the real model.
    pub fn predict(&self, record: &CustomerRecord) -> ChurnResult<Prediction> {
        let source = self.model_source()?;
        let assessment = assess(record, &source)?;
        let recommendation = assessment.recommendation();

        log::info!(
            "predict: p={:.3} label={:?} prediction={:?}",
            assessment.probability,
            assessment.label,
            assessment.prediction,
        );

        Ok(Prediction {
            assessment,
            recommendation,
            headline:         recommendation.headline(),
            actions:          recommendation.actions(),
            engagement_score: record.engagement_score(),
            clv_proxy:        record.clv_proxy(),
        })
    }

    pub fn insights(&self) -> ChurnResult<Insights> {
        let overview = self.overview()?;
        let impact = &self.config.impact;
        let churned = overview.churned as u64;

        let high_risk_focus = match self.segmentation(None) {
            Ok(report) => report.segment(RiskLabel::High).and_then(|s| {
                s.actual_churn_rate
                    .map(|rate| impact.high_risk_focus(s.count as u64, rate / 100.0))
            }),
            Err(e) => {
                log::warn!("insights: no high-risk focus: {e}");
                None
            }
        };

        Ok(Insights {
            overview,
            revenue_at_risk: impact.revenue_at_risk(churned),
            scenarios:       impact.scenarios(churned),
            high_risk_focus,
        })
    }
}
