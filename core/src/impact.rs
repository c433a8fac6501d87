//! Financial impact of retention interventions.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImpactEconomics {
    /// Revenue lost per churned customer.
    pub revenue_per_customer: f64,
    /// Outreach cost per targeted customer.
    pub cost_per_customer:    f64,
    /// Fraction of targeted churners an intervention saves.
    pub success_rate:         f64,
    /// Retention rates for the scenario table.
    pub scenario_rates:       Vec<f64>,
}

impl Default for ImpactEconomics {
    fn default() -> Self {
        Self {
            revenue_per_customer: 15_000.0,
            cost_per_customer:    200.0,
            success_rate:         0.5,
            scenario_rates:       vec![0.10, 0.20, 0.30],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InterventionScenario {
    pub retention_rate:     f64,
    pub customers_targeted: u64,
    pub customers_retained: u64,
    pub revenue_preserved:  f64,
    pub intervention_cost:  f64,
    pub net_benefit:        f64,
    /// Net benefit over cost, in percent. None when the cost is zero.
    pub roi_percent:        Option<f64>,
}

impl ImpactEconomics {
    /// Scenario table over the annual churner population.
    ///
    /// Retaining `rate` of churners takes reaching `rate / success_rate`
    /// of them, capped at the full population.
    pub fn scenarios(&self, churned: u64) -> Vec<InterventionScenario> {
        self.scenario_rates
            .iter()
            .map(|&rate| {
                let retained = (churned as f64 * rate).round() as u64;
                let targeted = if self.success_rate > 0.0 {
                    ((retained as f64 / self.success_rate).round() as u64).min(churned)
                } else {
                    churned
                };
                self.scenario(rate, targeted, retained)
            })
            .collect()
    }

    /// Outreach to every high-risk customer.
    pub fn high_risk_focus(&self, high_risk_count: u64, actual_churn_rate: f64) -> HighRiskFocus {
        let expected_churners = (high_risk_count as f64 * actual_churn_rate).round() as u64;
        let saved = (expected_churners as f64 * self.success_rate).round() as u64;
        let s = self.scenario(self.success_rate, high_risk_count, saved);
        HighRiskFocus {
            customers:         high_risk_count,
            expected_churners,
            customers_saved:   saved,
            revenue_preserved: s.revenue_preserved,
            intervention_cost: s.intervention_cost,
            net_benefit:       s.net_benefit,
            roi_percent:       s.roi_percent,
        }
    }

    fn scenario(&self, rate: f64, targeted: u64, retained: u64) -> InterventionScenario {
        let revenue_preserved = retained as f64 * self.revenue_per_customer;
        let intervention_cost = targeted as f64 * self.cost_per_customer;
        let net_benefit = revenue_preserved - intervention_cost;
        InterventionScenario {
            retention_rate:     rate,
            customers_targeted: targeted,
            customers_retained: retained,
            revenue_preserved,
            intervention_cost,
            net_benefit,
            roi_percent: if intervention_cost > 0.0 {
                Some(net_benefit / intervention_cost * 100.0)
            } else {
                None
            },
        }
    }

    /// Revenue at risk if every churner leaves.
    pub fn revenue_at_risk(&self, churned: u64) -> f64 {
        churned as f64 * self.revenue_per_customer
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HighRiskFocus {
    pub customers:         u64,
    pub expected_churners: u64,
    pub customers_saved:   u64,
    pub revenue_preserved: f64,
    pub intervention_cost: f64,
    pub net_benefit:       f64,
    pub roi_percent:       Option<f64>,
}
