use crate::{
    impact::ImpactEconomics,
    scorer::HeuristicWeights,
    segmentation::DEFAULT_SAMPLE_SIZE,
    types::DEFAULT_SEED,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgeNormalization {
    /// Normalize age within the sampled batch.
    Batch,
    /// Normalize age against the full dataset's min/max.
    Dataset,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub dataset_path:      String,
    pub model_path:        String,
    pub seed:              u64,
    pub sample_size:       usize,
    pub age_normalization: AgeNormalization,
    pub heuristic:         HeuristicWeights,
    pub impact:            ImpactEconomics,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            dataset_path:      "Churn_Modelling.csv".into(),
            model_path:        "best_churn_model_random_forest.json".into(),
            seed:              DEFAULT_SEED,
            sample_size:       DEFAULT_SAMPLE_SIZE,
            age_normalization: AgeNormalization::Batch,
            heuristic:         HeuristicWeights::default(),
            impact:            ImpactEconomics::default(),
        }
    }
}

impl DashboardConfig {
    /// Load from a JSON file. Missing keys take their defaults.
    /// In tests, use DashboardConfig::default().
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: DashboardConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        let w = &self.heuristic;
        if w.noise_std.is_nan() || w.noise_std < 0.0 {
            anyhow::bail!("heuristic.noise_std must be >= 0, got {}", w.noise_std);
        }
        if !(0.0..=1.0).contains(&self.impact.success_rate) {
            anyhow::bail!("impact.success_rate must be in [0, 1], got {}", self.impact.success_rate);
        }
        if self.impact.scenario_rates.iter().any(|r| !(0.0..=1.0).contains(r)) {
            anyhow::bail!("impact.scenario_rates must all be in [0, 1]");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let config: DashboardConfig =
            serde_json::from_str(r#"{ "seed": 7, "age_normalization": "dataset" }"#).unwrap();
        assert_eq!(config.seed, 7);
        assert_eq!(config.age_normalization, AgeNormalization::Dataset);
        assert_eq!(config.sample_size, DEFAULT_SAMPLE_SIZE);
        assert_eq!(config.heuristic, HeuristicWeights::default());
    }

    #[test]
    fn partial_nested_sections_keep_defaults() {
        let config: DashboardConfig = serde_json::from_str(
            r#"{ "heuristic": { "base": 0.3 }, "impact": { "cost_per_customer": 150.0 } }"#,
        )
        .unwrap();
        assert_eq!(config.heuristic.base, 0.3);
        assert_eq!(config.heuristic.noise_std, 0.1);
        assert_eq!(config.impact.cost_per_customer, 150.0);
        assert_eq!(config.impact.revenue_per_customer, 15_000.0);
        assert_eq!(config.impact.scenario_rates, vec![0.10, 0.20, 0.30]);
    }

    #[test]
    fn rejects_out_of_range_success_rate() {
        let mut config = DashboardConfig::default();
        config.impact.success_rate = 1.5;
        assert!(config.validate().is_err());
    }
}
