//! The customer dataset: CSV loading, headline metrics and group summaries.

use crate::{
    customer::CustomerRecord,
    error::{ChurnError, ChurnResult},
    rng::ScoringRng,
    types::CustomerId,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Column layout of the churn CSV. Extra columns are ignored.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CsvRow {
    customer_id:      CustomerId,
    credit_score:     u32,
    geography:        String,
    gender:           String,
    age:              u32,
    tenure:           u32,
    balance:          f64,
    num_of_products:  u32,
    has_cr_card:      u8,
    is_active_member: u8,
    estimated_salary: f64,
    exited:           u8,
}

#[derive(Debug, Clone, Serialize)]
pub struct DatasetEntry {
    pub customer_id: CustomerId,
    pub record:      CustomerRecord,
    /// Ground truth. Display only, never an input to scoring.
    pub exited:      bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Overview {
    pub total:      usize,
    pub churned:    usize,
    pub retained:   usize,
    pub churn_rate: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Geography,
    Gender,
    NumOfProducts,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupChurn {
    pub group:      String,
    pub count:      usize,
    pub churned:    usize,
    pub churn_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnStats {
    pub column: &'static str,
    pub count:  usize,
    pub mean:   f64,
    pub std:    f64,
    pub min:    f64,
    pub max:    f64,
}

#[derive(Debug, Clone)]
pub struct Dataset {
    entries: Vec<DatasetEntry>,
}

impl Dataset {
    pub fn load(path: &Path) -> ChurnResult<Self> {
        if !path.exists() {
            return Err(ChurnError::missing("dataset", path.display().to_string()));
        }
        let mut reader = csv::Reader::from_path(path)?;
        let mut entries = Vec::new();

        for (i, result) in reader.deserialize::<CsvRow>().enumerate() {
            let row = result?;
            let entry = entry_from_row(row).map_err(|e| match e {
                ChurnError::InvalidInput { field, reason } => ChurnError::InvalidInput {
                    field,
                    reason: format!("data row {}: {reason}", i + 1),
                },
                other => other,
            })?;
            entries.push(entry);
        }

        log::info!("dataset: loaded {} customers from {}", entries.len(), path.display());
        Ok(Self { entries })
    }

    pub fn from_entries(entries: Vec<DatasetEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[DatasetEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn records(&self) -> Vec<CustomerRecord> {
        self.entries.iter().map(|e| e.record.clone()).collect()
    }

    pub fn overview(&self) -> Overview {
        let total = self.entries.len();
        let churned = self.entries.iter().filter(|e| e.exited).count();
        Overview {
            total,
            churned,
            retained: total - churned,
            churn_rate: percent(churned, total),
        }
    }

    /// Churn rate (%) per group, ordered by group key.
    pub fn churn_rate_by(&self, dimension: Dimension) -> Vec<GroupChurn> {
        let mut groups: BTreeMap<String, (usize, usize)> = BTreeMap::new();
        for e in &self.entries {
            let key = match dimension {
                Dimension::Geography     => e.record.geography.clone(),
                Dimension::Gender        => e.record.gender.clone(),
                Dimension::NumOfProducts => e.record.num_products.to_string(),
            };
            let slot = groups.entry(key).or_insert((0, 0));
            slot.0 += 1;
            if e.exited {
                slot.1 += 1;
            }
        }

        groups
            .into_iter()
            .map(|(group, (count, churned))| GroupChurn {
                group,
                count,
                churned,
                churn_rate: percent(churned, count),
            })
            .collect()
    }

    /// Count, mean, sample std, min and max for each numeric column.
    pub fn describe(&self) -> Vec<ColumnStats> {
        let columns: [(&'static str, fn(&CustomerRecord) -> f64); 6] = [
            ("CreditScore",     |r| r.credit_score as f64),
            ("Age",             |r| r.age as f64),
            ("Tenure",          |r| r.tenure as f64),
            ("Balance",         |r| r.balance),
            ("NumOfProducts",   |r| r.num_products as f64),
            ("EstimatedSalary", |r| r.estimated_salary),
        ];

        columns
            .iter()
            .map(|&(column, get)| {
                let values: Vec<f64> = self.entries.iter().map(|e| get(&e.record)).collect();
                column_stats(column, &values)
            })
            .collect()
    }

    /// Dataset-wide (min, max) age, or None when empty.
    pub fn age_bounds(&self) -> Option<(u32, u32)> {
        let min = self.entries.iter().map(|e| e.record.age).min()?;
        let max = self.entries.iter().map(|e| e.record.age).max()?;
        Some((min, max))
    }

    /// Draw up to `size` distinct entries. Deterministic for a given stream.
    pub fn sample(&self, size: usize, rng: &mut ScoringRng) -> Vec<&DatasetEntry> {
        rng.sample_indices(self.entries.len(), size)
            .into_iter()
            .map(|i| &self.entries[i])
            .collect()
    }
}

fn entry_from_row(row: CsvRow) -> ChurnResult<DatasetEntry> {
    let record = CustomerRecord {
        credit_score:     row.credit_score,
        age:              row.age,
        tenure:           row.tenure,
        balance:          row.balance,
        num_products:     row.num_of_products,
        has_credit_card:  flag("HasCrCard", row.has_cr_card)?,
        is_active_member: flag("IsActiveMember", row.is_active_member)?,
        estimated_salary: row.estimated_salary,
        geography:        row.geography,
        gender:           row.gender,
    };
    record.validate()?;

    Ok(DatasetEntry {
        customer_id: row.customer_id,
        record,
        exited: flag("Exited", row.exited)?,
    })
}

fn flag(field: &str, value: u8) -> ChurnResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        v => Err(ChurnError::invalid(field, format!("expected 0 or 1, got {v}"))),
    }
}

pub(crate) fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

fn column_stats(column: &'static str, values: &[f64]) -> ColumnStats {
    let count = values.len();
    if count == 0 {
        return ColumnStats { column, count, mean: 0.0, std: 0.0, min: 0.0, max: 0.0 };
    }
    let mean = values.iter().sum::<f64>() / count as f64;
    let var = if count > 1 {
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (count - 1) as f64
    } else {
        0.0
    };
    ColumnStats {
        column,
        count,
        mean,
        std: var.sqrt(),
        min: values.iter().cloned().fold(f64::INFINITY, f64::min),
        max: values.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_of_empty_is_zero() {
        assert_eq!(percent(0, 0), 0.0);
        assert_eq!(percent(1, 4), 25.0);
    }

    #[test]
    fn sample_std_matches_hand_computation() {
        let stats = column_stats("Age", &[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert_eq!(stats.mean, 5.0);
        assert!((stats.std - 2.138_089_935).abs() < 1e-6);
        assert_eq!(stats.min, 2.0);
        assert_eq!(stats.max, 9.0);
    }

    #[test]
    fn flags_reject_values_other_than_zero_or_one() {
        assert!(flag("HasCrCard", 1).unwrap());
        assert!(!flag("HasCrCard", 0).unwrap());
        assert!(flag("HasCrCard", 2).is_err());
    }
}
