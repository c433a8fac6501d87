//! Shared fixtures for the integration tests.
#![allow(dead_code)]

use churnwatch_core::{customer::CustomerRecord, model::ModelBundle};
use std::path::PathBuf;

pub const CSV_HEADER: &str = "RowNumber,CustomerId,Surname,CreditScore,Geography,Gender,Age,Tenure,Balance,NumOfProducts,HasCrCard,IsActiveMember,EstimatedSalary,Exited";

pub fn customer(age: u32, active: bool, products: u32) -> CustomerRecord {
    CustomerRecord {
        credit_score:     650,
        age,
        tenure:           5,
        balance:          75_000.0,
        num_products:     products,
        has_credit_card:  true,
        is_active_member: active,
        estimated_salary: 100_000.0,
        geography:        "France".into(),
        gender:           "Male".into(),
    }
}

/// Two-tree forest: tree 0 splits on Age at 40, tree 1 on Geography_Germany.
pub fn forest_json() -> serde_json::Value {
    serde_json::json!({
        "feature_info": {
            "numeric_features": [
                "CreditScore", "Age", "Tenure", "Balance", "NumOfProducts",
                "HasCrCard", "IsActiveMember", "EstimatedSalary",
                "EngagementScore", "CLV_Proxy"
            ],
            "categorical_features": [
                { "name": "Geography", "categories": ["France", "Spain", "Germany"] },
                { "name": "Gender",    "categories": ["Male", "Female"] }
            ]
        },
        "estimator": {
            "kind": "random_forest",
            "trees": [
                { "nodes": [
                    { "type": "split", "feature": "Age", "threshold": 40.0, "left": 1, "right": 2 },
                    { "type": "leaf", "probability": 0.1 },
                    { "type": "leaf", "probability": 0.9 }
                ]},
                { "nodes": [
                    { "type": "split", "feature": "Geography_Germany", "threshold": 0.5, "left": 1, "right": 2 },
                    { "type": "leaf", "probability": 0.2 },
                    { "type": "leaf", "probability": 0.7 }
                ]}
            ]
        },
        "card": {
            "name": "Random Forest",
            "comparison": [
                { "model": "Logistic Regression", "auc": 0.777, "accuracy": 0.716, "precision": 0.389, "recall": 0.703, "f1": 0.501 },
                { "model": "Random Forest",       "auc": 0.854, "accuracy": 0.857, "precision": 0.724, "recall": 0.477, "f1": 0.575 }
            ],
            "feature_importance": [
                { "feature": "NumOfProducts", "importance": 0.115 },
                { "feature": "Age",           "importance": 0.238 },
                { "feature": "HasCrCard",     "importance": 0.018 }
            ]
        }
    })
}

pub fn forest() -> ModelBundle {
    ModelBundle::from_json(&forest_json().to_string()).expect("fixture bundle is valid")
}

pub fn temp_path(name: &str, ext: &str) -> PathBuf {
    std::env::temp_dir().join(format!("churnwatch-{name}-{}.{ext}", std::process::id()))
}

/// One CSV line in dataset column order.
#[allow(clippy::too_many_arguments)]
pub fn csv_line(
    id: u64,
    credit: u32,
    geo: &str,
    gender: &str,
    age: u32,
    tenure: u32,
    balance: f64,
    products: u32,
    card: u8,
    active: u8,
    salary: f64,
    exited: u8,
) -> String {
    format!("{id},{id},Smith,{credit},{geo},{gender},{age},{tenure},{balance},{products},{card},{active},{salary},{exited}")
}

/// `n` synthetic customers with ages spread over 18..=92 and ~1 in 5 churned.
pub fn synthetic_csv(n: u64) -> String {
    let geos = ["France", "Spain", "Germany"];
    let genders = ["Male", "Female"];
    let mut out = String::from(CSV_HEADER);
    for i in 0..n {
        out.push('\n');
        out.push_str(&csv_line(
            15_600_000 + i,
            350 + (i as u32 * 37) % 500,
            geos[(i % 3) as usize],
            genders[(i % 2) as usize],
            18 + (i as u32 * 7) % 75,
            (i as u32) % 11,
            ((i * 9_973) % 250_000) as f64,
            1 + (i as u32) % 4,
            (i % 2) as u8,
            ((i / 2) % 2) as u8,
            10_000.0 + ((i * 7_919) % 190_000) as f64,
            (i % 5 == 0) as u8,
        ));
    }
    out.push('\n');
    out
}

pub fn write_temp(name: &str, ext: &str, content: &str) -> PathBuf {
    let path = temp_path(name, ext);
    std::fs::write(&path, content).expect("write temp fixture");
    path
}
