//! Customer records and the derived features fed to the classifier.

use crate::error::{ChurnError, ChurnResult};
use serde::{Deserialize, Serialize};

pub const MIN_CREDIT_SCORE: u32 = 300;
pub const MAX_CREDIT_SCORE: u32 = 850;
pub const MIN_AGE: u32 = 18;
pub const MAX_AGE: u32 = 100;
pub const MAX_TENURE: u32 = 10;
pub const MIN_PRODUCTS: u32 = 1;
pub const MAX_PRODUCTS: u32 = 4;

const CLV_FACTOR: f64 = 0.0001;

/// One customer, either read from the dataset or entered as a what-if.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerRecord {
    pub credit_score:     u32,
    pub age:              u32,
    pub tenure:           u32,
    pub balance:          f64,
    pub num_products:     u32,
    pub has_credit_card:  bool,
    pub is_active_member: bool,
    pub estimated_salary: f64,
    pub geography:        String,
    pub gender:           String,
}

impl CustomerRecord {
    /// Check every numeric field against its domain bounds.
    /// Categorical vocabularies are checked by whoever consumes them
    /// (the model knows what it was trained on).
    pub fn validate(&self) -> ChurnResult<()> {
        check_range("CreditScore", self.credit_score, MIN_CREDIT_SCORE, MAX_CREDIT_SCORE)?;
        check_range("Age", self.age, MIN_AGE, MAX_AGE)?;
        check_range("Tenure", self.tenure, 0, MAX_TENURE)?;
        check_range("NumOfProducts", self.num_products, MIN_PRODUCTS, MAX_PRODUCTS)?;
        check_amount("Balance", self.balance)?;
        check_amount("EstimatedSalary", self.estimated_salary)?;
        if self.geography.trim().is_empty() {
            return Err(ChurnError::invalid("Geography", "value is missing"));
        }
        if self.gender.trim().is_empty() {
            return Err(ChurnError::invalid("Gender", "value is missing"));
        }
        Ok(())
    }

    pub fn engagement_score(&self) -> f64 {
        engagement_score(self.is_active_member, self.has_credit_card, self.num_products)
    }

    pub fn clv_proxy(&self) -> f64 {
        clv_proxy(self.balance, self.tenure)
    }
}

/// (2 × active + card + products) / 4
pub fn engagement_score(is_active: bool, has_card: bool, num_products: u32) -> f64 {
    let active = if is_active { 2.0 } else { 0.0 };
    let card = if has_card { 1.0 } else { 0.0 };
    (active + card + num_products as f64) / 4.0
}

pub fn clv_proxy(balance: f64, tenure: u32) -> f64 {
    balance * tenure as f64 * CLV_FACTOR
}

fn check_range(field: &str, value: u32, min: u32, max: u32) -> ChurnResult<()> {
    if value < min || value > max {
        return Err(ChurnError::invalid(
            field,
            format!("{value} outside [{min}, {max}]"),
        ));
    }
    Ok(())
}

fn check_amount(field: &str, value: f64) -> ChurnResult<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(ChurnError::invalid(
            field,
            format!("{value} is not a finite non-negative amount"),
        ));
    }
    Ok(())
}

// ── Feature row ──────────────────────────────────────────────────────────────

/// Column names the classifier was trained on, in order.
pub const FEATURE_NAMES: [&str; 12] = [
    "CreditScore",
    "Age",
    "Tenure",
    "Balance",
    "NumOfProducts",
    "HasCrCard",
    "IsActiveMember",
    "EstimatedSalary",
    "EngagementScore",
    "CLV_Proxy",
    "Geography",
    "Gender",
];

/// The ten numeric columns of a feature row, in training order.
pub const NUMERIC_FEATURES: [&str; 10] = [
    "CreditScore",
    "Age",
    "Tenure",
    "Balance",
    "NumOfProducts",
    "HasCrCard",
    "IsActiveMember",
    "EstimatedSalary",
    "EngagementScore",
    "CLV_Proxy",
];

/// A single row of model input: ten numeric columns plus two categoricals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureRow {
    pub numeric:   [f64; 10],
    pub geography: String,
    pub gender:    String,
}

impl FeatureRow {
    /// Shape a record into the 12-column row. Fails on out-of-domain values.
    pub fn assemble(record: &CustomerRecord) -> ChurnResult<Self> {
        record.validate()?;
        Ok(Self {
            numeric: [
                record.credit_score as f64,
                record.age as f64,
                record.tenure as f64,
                record.balance,
                record.num_products as f64,
                if record.has_credit_card { 1.0 } else { 0.0 },
                if record.is_active_member { 1.0 } else { 0.0 },
                record.estimated_salary,
                record.engagement_score(),
                record.clv_proxy(),
            ],
            geography: record.geography.clone(),
            gender:    record.gender.clone(),
        })
    }

    /// Look up a numeric column by its training name.
    pub fn numeric_value(&self, name: &str) -> Option<f64> {
        NUMERIC_FEATURES
            .iter()
            .position(|n| *n == name)
            .map(|i| self.numeric[i])
    }

    /// Look up a categorical column by its training name.
    pub fn categorical_value(&self, name: &str) -> Option<&str> {
        match name {
            "Geography" => Some(&self.geography),
            "Gender"    => Some(&self.gender),
            _           => None,
        }
    }
}
