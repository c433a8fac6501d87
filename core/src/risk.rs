//! Risk labels, churn predictions, and the recommendation tiers keyed on them.
//!
//! The three cut points below are business constants. They drive the
//! segment labels, the binary prediction, and the recommendation text,
//! so they are not configurable.

use crate::types::Probability;
use serde::{Deserialize, Serialize};

pub const MEDIUM_RISK_THRESHOLD: f64 = 0.30;
pub const HIGH_RISK_THRESHOLD: f64 = 0.70;
pub const CHURN_DECISION_THRESHOLD: f64 = 0.50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLabel {
    Low,
    Medium,
    High,
}

impl RiskLabel {
    pub const ALL: [RiskLabel; 3] = [RiskLabel::Low, RiskLabel::Medium, RiskLabel::High];

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Low    => "Low Risk",
            Self::Medium => "Medium Risk",
            Self::High   => "High Risk",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChurnPrediction {
    WillChurn,
    WontChurn,
}

impl ChurnPrediction {
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::WillChurn => "WILL CHURN",
            Self::WontChurn => "WON'T CHURN",
        }
    }
}

/// p < 0.30 → Low, 0.30 ≤ p < 0.70 → Medium, p ≥ 0.70 → High.
pub fn label(p: Probability) -> RiskLabel {
    if p < MEDIUM_RISK_THRESHOLD {
        RiskLabel::Low
    } else if p < HIGH_RISK_THRESHOLD {
        RiskLabel::Medium
    } else {
        RiskLabel::High
    }
}

pub fn predict(p: Probability) -> ChurnPrediction {
    if p >= CHURN_DECISION_THRESHOLD {
        ChurnPrediction::WillChurn
    } else {
        ChurnPrediction::WontChurn
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RiskAssessment {
    pub probability: Probability,
    pub label:       RiskLabel,
    pub prediction:  ChurnPrediction,
}

impl RiskAssessment {
    pub fn from_probability(p: Probability) -> Self {
        Self {
            probability: p,
            label:       label(p),
            prediction:  predict(p),
        }
    }

    pub fn recommendation(&self) -> Recommendation {
        Recommendation::for_label(self.label)
    }
}

// ── Recommendations ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    UrgentOutreach,
    ProactiveEngagement,
    StandardService,
}

impl Recommendation {
    pub fn for_label(label: RiskLabel) -> Self {
        match label {
            RiskLabel::High   => Self::UrgentOutreach,
            RiskLabel::Medium => Self::ProactiveEngagement,
            RiskLabel::Low    => Self::StandardService,
        }
    }

    pub fn headline(&self) -> &'static str {
        match self {
            Self::UrgentOutreach      => "URGENT ACTION REQUIRED",
            Self::ProactiveEngagement => "PROACTIVE ENGAGEMENT RECOMMENDED",
            Self::StandardService     => "CUSTOMER IN GOOD STANDING",
        }
    }

    pub fn actions(&self) -> &'static [&'static str] {
        match self {
            Self::UrgentOutreach => &[
                "Contact customer immediately",
                "Offer retention incentive (fee waiver, service upgrade)",
                "Schedule personal consultation",
                "Fast-track complaint resolution if any",
            ],
            Self::ProactiveEngagement => &[
                "Monitor account activity closely",
                "Send personalized offers",
                "Improve customer service touchpoints",
                "Consider loyalty rewards",
            ],
            Self::StandardService => &[
                "Continue standard service",
                "Maintain satisfaction through quality service",
                "Consider upsell opportunities",
            ],
        }
    }
}
